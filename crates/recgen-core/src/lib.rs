//! Core domain types and configuration for the recommendation pipeline.

pub mod app_config;
pub mod candidate;
pub mod config;
pub mod generation;
pub mod normalize;
pub mod telemetry;

pub use app_config::{AppConfig, Environment};
pub use candidate::{
    AttachedMetrics, Candidate, CandidateStatus, Effort, FocusDimension, Priority, StrategicRole,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use generation::{GenerationStrategy, Maturity, NewGeneration, Provenance};
pub use normalize::{domain_stem, name_variations, normalize_domain, normalize_name};
pub use telemetry::{
    CompetitorRecord, CompetitorSummary, KeywordFrequency, MetricTrends, QualitativeContext,
    ScalarMetrics, SourceMetric, SubjectRecord, TelemetrySnapshot, Trend, TrendDirection,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
