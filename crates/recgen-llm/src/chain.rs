//! Ordered fallback over generation backends.
//!
//! Each tier gets exactly one attempt bounded by the request's time budget.
//! A timeout, error status or empty answer advances to the next tier with no
//! retry and no back-off. A timed-out call is dropped, so a late answer is
//! discarded rather than awaited.

use std::sync::Arc;

use crate::backend::GenerationBackend;
use crate::error::BackendError;
use crate::fence::strip_code_fences;
use crate::types::{GenerationRequest, TimeoutBudget};

/// Text produced by the first tier that answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    /// Output with code fences removed.
    pub text: String,
    pub tier: usize,
    pub backend: String,
}

/// A tier that was abandoned, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub tier: usize,
    pub backend: String,
    pub reason: String,
}

/// Outcome of driving a request through the chain.
#[derive(Debug, Clone, Default)]
pub struct ChainRun {
    pub output: Option<ChainOutput>,
    pub failures: Vec<TierFailure>,
}

/// Backends in attempt order, each tagged with the tier number recorded in
/// provenance.
#[derive(Clone)]
pub struct BackendChain {
    tiers: Vec<(usize, Arc<dyn GenerationBackend>)>,
    budget: TimeoutBudget,
}

impl BackendChain {
    /// A chain whose tier numbers are the backends' positions.
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn GenerationBackend>>, budget: TimeoutBudget) -> Self {
        Self::numbered(tiers.into_iter().enumerate().collect(), budget)
    }

    /// A chain with explicit tier numbers, tried in the given order.
    #[must_use]
    pub fn numbered(
        tiers: Vec<(usize, Arc<dyn GenerationBackend>)>,
        budget: TimeoutBudget,
    ) -> Self {
        Self { tiers, budget }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|(_, b)| b.name()).collect()
    }

    #[must_use]
    pub fn tier_numbers(&self) -> Vec<usize> {
        self.tiers.iter().map(|(tier, _)| *tier).collect()
    }

    /// Try every tier in order until one returns non-empty text.
    pub async fn generate(&self, request: &GenerationRequest) -> ChainRun {
        self.run(request, self.tiers.len()).await
    }

    /// Make exactly one attempt, against the first tier only.
    pub async fn generate_once(&self, request: &GenerationRequest) -> ChainRun {
        self.run(request, 1).await
    }

    async fn run(&self, request: &GenerationRequest, max_tiers: usize) -> ChainRun {
        let budget = self.budget.for_weight(request.weight);
        let mut failures = Vec::new();
        let tiers = &self.tiers[..max_tiers.min(self.tiers.len())];

        for (tier, backend) in tiers {
            let tier = *tier;
            match attempt(backend.as_ref(), request, budget).await {
                Ok(text) => {
                    tracing::info!(
                        tier,
                        backend = backend.name(),
                        chars = text.len(),
                        "generation backend answered"
                    );
                    return ChainRun {
                        output: Some(ChainOutput {
                            text,
                            tier,
                            backend: backend.name().to_string(),
                        }),
                        failures,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        tier,
                        backend = backend.name(),
                        error = %e,
                        "generation tier failed; advancing to next tier"
                    );
                    failures.push(TierFailure {
                        tier,
                        backend: backend.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::warn!(
            tiers = tiers.len(),
            "all generation tiers exhausted without output"
        );
        ChainRun {
            output: None,
            failures,
        }
    }
}

impl std::fmt::Debug for BackendChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendChain")
            .field("tiers", &self.tier_names())
            .field("budget", &self.budget)
            .finish()
    }
}

async fn attempt(
    backend: &dyn GenerationBackend,
    request: &GenerationRequest,
    budget: std::time::Duration,
) -> Result<String, BackendError> {
    let raw = tokio::time::timeout(budget, backend.generate(request))
        .await
        .map_err(|_| BackendError::Timeout(budget))??;

    let text = strip_code_fences(&raw);
    if text.is_empty() {
        return Err(BackendError::Empty);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::types::RequestWeight;

    enum Script {
        Answer(&'static str),
        Fail,
        Hang,
    }

    struct Scripted {
        name: &'static str,
        script: Script,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(name: &'static str, script: Script) -> Arc<Self> {
            Arc::new(Self {
                name,
                script,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Answer(text) => Ok(text.to_string()),
                Script::Fail => Err(BackendError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3_600)).await;
                    Ok("[]".to_string())
                }
            }
        }
    }

    fn request(weight: RequestWeight) -> GenerationRequest {
        GenerationRequest {
            system: "sys".to_string(),
            prompt: "prompt".to_string(),
            max_output_tokens: 512,
            temperature: 0.2,
            require_structured: true,
            weight,
        }
    }

    fn chain(backends: &[&Arc<Scripted>]) -> BackendChain {
        let tiers = backends
            .iter()
            .map(|b| Arc::clone(b) as Arc<dyn GenerationBackend>)
            .collect();
        BackendChain::new(
            tiers,
            TimeoutBudget {
                light: Duration::from_secs(1),
                heavy: Duration::from_secs(2),
            },
        )
    }

    #[tokio::test]
    async fn first_answering_tier_wins() {
        let a = Scripted::new("a", Script::Answer("[1]"));
        let b = Scripted::new("b", Script::Answer("[2]"));
        let run = chain(&[&a, &b])
            .generate(&request(RequestWeight::Light))
            .await;
        let out = run.output.unwrap();
        assert_eq!(out.text, "[1]");
        assert_eq!(out.tier, 0);
        assert_eq!(b.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_tier_advances_without_retry() {
        let a = Scripted::new("a", Script::Fail);
        let b = Scripted::new("b", Script::Answer("```json\n[2]\n```"));
        let run = chain(&[&a, &b])
            .generate(&request(RequestWeight::Light))
            .await;
        let out = run.output.unwrap();
        assert_eq!(out.text, "[2]");
        assert_eq!(out.tier, 1);
        assert_eq!(out.backend, "b");
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].backend, "a");
    }

    #[tokio::test]
    async fn empty_answer_counts_as_failure() {
        let a = Scripted::new("a", Script::Answer("```\n```"));
        let b = Scripted::new("b", Script::Answer("[3]"));
        let run = chain(&[&a, &b]).generate(&request(RequestWeight::Heavy)).await;
        assert_eq!(run.output.unwrap().tier, 1);
        assert!(run.failures[0].reason.contains("empty"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_tier_times_out_and_falls_through() {
        let a = Scripted::new("a", Script::Hang);
        let b = Scripted::new("b", Script::Answer("[4]"));
        let run = chain(&[&a, &b]).generate(&request(RequestWeight::Light)).await;
        assert_eq!(run.output.unwrap().text, "[4]");
        assert!(run.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn exhausted_chain_returns_no_output() {
        let a = Scripted::new("a", Script::Fail);
        let b = Scripted::new("b", Script::Fail);
        let c = Scripted::new("c", Script::Fail);
        let run = chain(&[&a, &b, &c])
            .generate(&request(RequestWeight::Light))
            .await;
        assert!(run.output.is_none());
        assert_eq!(run.failures.len(), 3);
    }

    #[tokio::test]
    async fn empty_chain_returns_no_output() {
        let run = chain(&[]).generate(&request(RequestWeight::Light)).await;
        assert!(run.output.is_none());
        assert!(run.failures.is_empty());
    }

    #[tokio::test]
    async fn explicit_tier_numbers_are_reported() {
        let a = Scripted::new("a", Script::Fail);
        let b = Scripted::new("b", Script::Answer("[6]"));
        let tiers = [&a, &b]
            .into_iter()
            .zip([1, 2])
            .map(|(backend, tier)| (tier, Arc::clone(backend) as Arc<dyn GenerationBackend>))
            .collect();
        let chain = BackendChain::numbered(tiers, TimeoutBudget::default());

        let run = chain.generate(&request(RequestWeight::Light)).await;
        assert_eq!(run.failures[0].tier, 1);
        assert_eq!(run.output.unwrap().tier, 2);
    }

    #[tokio::test]
    async fn generate_once_never_touches_later_tiers() {
        let a = Scripted::new("a", Script::Fail);
        let b = Scripted::new("b", Script::Answer("[5]"));
        let run = chain(&[&a, &b])
            .generate_once(&request(RequestWeight::Light))
            .await;
        assert!(run.output.is_none());
        assert_eq!(run.failures.len(), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 0);

        let run = chain(&[&b, &a])
            .generate_once(&request(RequestWeight::Light))
            .await;
        assert_eq!(run.output.unwrap().text, "[5]");
    }
}
