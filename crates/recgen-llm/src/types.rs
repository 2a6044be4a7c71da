use std::time::Duration;

/// A rendered generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Ask the backend for a JSON response format when it supports one.
    pub require_structured: bool,
    pub weight: RequestWeight,
}

/// How heavy a request is; selects the per-attempt timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestWeight {
    Light,
    Heavy,
}

/// Per-attempt time budgets by request weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    pub light: Duration,
    pub heavy: Duration,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self {
            light: Duration::from_secs(90),
            heavy: Duration::from_secs(180),
        }
    }
}

impl TimeoutBudget {
    #[must_use]
    pub fn for_weight(&self, weight: RequestWeight) -> Duration {
        match weight {
            RequestWeight::Light => self.light,
            RequestWeight::Heavy => self.heavy,
        }
    }
}
