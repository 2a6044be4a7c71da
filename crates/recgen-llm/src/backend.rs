//! The generation backend interface and a name-keyed registry of backends.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::chain::BackendChain;
use crate::error::BackendError;
use crate::types::{GenerationRequest, TimeoutBudget};

/// One generative text backend.
///
/// Implementations report every failure as a [`BackendError`]; they must not
/// panic across this boundary.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Stable name used in logs, provenance and registry lookups.
    fn name(&self) -> &str;

    /// Run one request and return the raw text output.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError>;
}

/// Tier number of a subject's preferred backend.
pub const PREFERRED_TIER: usize = 0;

/// Backends registered by name, plus the default fallback order.
///
/// Subjects can name a preferred backend; [`BackendRegistry::chain_for`]
/// puts it in front of the defaults as tier [`PREFERRED_TIER`]. Defaults are
/// numbered from tier 1 in registration order whether or not a preferred
/// backend is present. Ordering is data, not branching.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    named: HashMap<String, Arc<dyn GenerationBackend>>,
    default_order: Vec<String>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend that is only used when a subject prefers it.
    pub fn register(&mut self, backend: Arc<dyn GenerationBackend>) {
        self.named.insert(backend.name().to_string(), backend);
    }

    /// Register a backend and append it to the default fallback order.
    pub fn register_default(&mut self, backend: Arc<dyn GenerationBackend>) {
        let name = backend.name().to_string();
        if !self.default_order.contains(&name) {
            self.default_order.push(name);
        }
        self.register(backend);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn GenerationBackend>> {
        self.named.get(name).cloned()
    }

    #[must_use]
    pub fn default_order(&self) -> &[String] {
        &self.default_order
    }

    /// Build the chain for one run: the preferred backend (when registered)
    /// followed by the defaults, without duplicates.
    #[must_use]
    pub fn chain_for(&self, preferred: Option<&str>, budget: TimeoutBudget) -> BackendChain {
        let mut order: Vec<(usize, &str)> = Vec::with_capacity(self.default_order.len() + 1);

        match preferred {
            Some(name) if self.named.contains_key(name) => order.push((PREFERRED_TIER, name)),
            Some(name) => {
                tracing::warn!(
                    backend = name,
                    "preferred backend is not registered; using defaults"
                );
            }
            None => {}
        }

        for (i, name) in self.default_order.iter().enumerate() {
            if !order.iter().any(|(_, n)| *n == name.as_str()) {
                order.push((PREFERRED_TIER + 1 + i, name));
            }
        }

        let tiers = order
            .into_iter()
            .filter_map(|(tier, name)| self.named.get(name).map(|b| (tier, Arc::clone(b))))
            .collect();
        BackendChain::numbered(tiers, budget)
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.named.keys().collect();
        names.sort();
        f.debug_struct("BackendRegistry")
            .field("named", &names)
            .field("default_order", &self.default_order)
            .finish()
    }
}
