use std::time::Duration;

use recgen_core::AppConfig;
use recgen_llm::TimeoutBudget;

/// Tunables for one [`crate::RecommendationPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Rolling telemetry window in days.
    pub window_days: u32,
    /// How many top source domains to aggregate.
    pub top_sources: u32,
    /// Upper bound on concurrent competitor metric lookups.
    pub aggregation_batch_size: usize,
    /// Cap on persisted candidates per generation.
    pub max_recommendations: usize,
    pub allow_competitor_mentions: bool,
    pub timeouts: TimeoutBudget,
    /// Spawn the source score backfill after a successful run.
    pub backfill_source_scores: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            top_sources: 20,
            aggregation_batch_size: 5,
            max_recommendations: 10,
            allow_competitor_mentions: true,
            timeouts: TimeoutBudget::default(),
            backfill_source_scores: true,
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            window_days: config.window_days,
            top_sources: config.top_sources,
            aggregation_batch_size: config.aggregation_batch_size.max(1),
            max_recommendations: config.max_recommendations,
            allow_competitor_mentions: config.allow_competitor_mentions,
            timeouts: TimeoutBudget {
                light: Duration::from_secs(config.llm_light_timeout_secs),
                heavy: Duration::from_secs(config.llm_heavy_timeout_secs),
            },
            backfill_source_scores: true,
        }
    }

    /// Items to request from a direct generation for low-signal subjects.
    #[must_use]
    pub fn low_data_items(&self) -> usize {
        (self.max_recommendations / 2).max(3).min(self.max_recommendations.max(1))
    }
}
