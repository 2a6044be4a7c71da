//! Recommendation generation and safety pipeline.
//!
//! [`RecommendationPipeline`] aggregates telemetry for a subject, classifies
//! its maturity, drives generation backends, recovers structured candidates
//! from their output, removes unsafe and low-quality candidates, ranks the
//! rest and persists them as a new generation.

pub mod aggregate;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod generate;
pub mod maturity;
pub mod persist;
pub mod pipeline;
pub mod prompt;
pub mod quality;
pub mod rank;
pub mod recovery;
pub mod safety;
pub mod settings;
pub mod stages;
pub mod templates;

#[cfg(test)]
mod testing;

pub use aggregate::aggregate_telemetry;
pub use error::FailureKind;
pub use exclusion::{build_exclusion_list, ExclusionList, ExclusionMatch};
pub use filter::{FilterOutcome, Rejected, RemovedCandidate};
pub use generate::{generate_direct, generate_from_templates, Generated, GenerationOutcome};
pub use maturity::classify_maturity;
pub use persist::{persist_generation, PersistError, PersistOutcome};
pub use pipeline::{GenerationResult, RecommendationPipeline};
pub use quality::{apply_quality_gate, quality_issues, QualityIssue};
pub use rank::{rank, score_candidate};
pub use recovery::{recover_candidates, recover_records, Recovered, RecoveryError, RecoveryStrategy};
pub use safety::{SafetyFilter, SafetyViolation};
pub use settings::PipelineSettings;
pub use templates::{TemplateCatalog, TemplateVars};
