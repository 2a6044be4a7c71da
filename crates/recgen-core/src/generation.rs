//! Generation runs: maturity classification and provenance.

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

/// How much reliable telemetry exists for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    ColdStart,
    LowData,
    Normal,
}

impl Maturity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ColdStart => "cold_start",
            Self::LowData => "low_data",
            Self::Normal => "normal",
        }
    }
}

impl std::fmt::Display for Maturity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced a batch of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// Free generation through the backend chain.
    Direct,
    /// Cold-start templates rewritten by a backend.
    Template,
    /// Cold-start templates used as-is after the rewrite failed.
    TemplateVerbatim,
}

impl GenerationStrategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Template => "template",
            Self::TemplateVerbatim => "template_verbatim",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub strategy: GenerationStrategy,
    /// Tier of the backend that answered: 0 for a preferred backend, 1 and
    /// up for the defaults in fallback order.
    pub tier: Option<usize>,
    pub backend: Option<String>,
    /// Hex SHA-256 of the rendered prompt.
    pub prompt_digest: Option<String>,
}

/// A generation ready to be written.
#[derive(Debug, Clone)]
pub struct NewGeneration<'a> {
    pub subject_id: i64,
    pub maturity: Maturity,
    pub provenance: &'a Provenance,
    pub candidates: &'a [Candidate],
}
