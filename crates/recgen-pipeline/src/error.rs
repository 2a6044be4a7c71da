use serde::Serialize;

/// Why a generation run did not produce a persisted generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SubjectNotFound,
    /// The Telemetry Store could not be read.
    UpstreamUnavailable,
    /// Every backend tier failed or timed out.
    NoOutput,
    /// Backend output held no recoverable candidate records.
    NoRecoverableCandidates,
    /// Candidates were produced but the safety or quality gates removed all of them.
    FilteringExhausted,
    PersistenceFailed,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubjectNotFound => "subject_not_found",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::NoOutput => "no_output",
            Self::NoRecoverableCandidates => "no_recoverable_candidates",
            Self::FilteringExhausted => "filtering_exhausted",
            Self::PersistenceFailed => "persistence_failed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
