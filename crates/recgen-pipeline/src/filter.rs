//! Typed outcome shared by the filtering stages.

use recgen_core::Candidate;
use serde::Serialize;

/// A candidate removed by a filter, with every reason that applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected<R> {
    pub candidate: Candidate,
    pub reasons: Vec<R>,
}

/// Result of running a filter over an ordered candidate list.
///
/// `kept` preserves the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<R> {
    pub kept: Vec<Candidate>,
    pub removed: Vec<Rejected<R>>,
}

impl<R> Default for FilterOutcome<R> {
    fn default() -> Self {
        Self {
            kept: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<R: std::fmt::Display> FilterOutcome<R> {
    /// Partition `candidates` with `check`, which returns the reasons a
    /// candidate must be removed (empty means keep).
    pub(crate) fn partition<F>(stage: &'static str, candidates: Vec<Candidate>, check: F) -> Self
    where
        F: Fn(&Candidate) -> Vec<R>,
    {
        let mut outcome = Self::default();
        for candidate in candidates {
            let reasons = check(&candidate);
            if reasons.is_empty() {
                outcome.kept.push(candidate);
            } else {
                tracing::debug!(
                    stage,
                    action = %candidate.action,
                    source = %candidate.citation_source,
                    reasons = %join_reasons(&reasons),
                    "candidate removed"
                );
                outcome.removed.push(Rejected { candidate, reasons });
            }
        }
        if !outcome.removed.is_empty() {
            tracing::info!(
                stage,
                kept = outcome.kept.len(),
                removed = outcome.removed.len(),
                "filter stage removed candidates"
            );
        }
        outcome
    }
}

/// A removal flattened for reporting, independent of the stage's reason type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCandidate {
    pub stage: String,
    pub action: String,
    pub citation_source: String,
    pub reasons: Vec<String>,
}

impl<R: std::fmt::Display> FilterOutcome<R> {
    /// Kept candidates plus removals rendered as [`RemovedCandidate`]s.
    pub(crate) fn into_report(self, stage: &str) -> (Vec<Candidate>, Vec<RemovedCandidate>) {
        let removed = self
            .removed
            .into_iter()
            .map(|r| RemovedCandidate {
                stage: stage.to_string(),
                action: r.candidate.action,
                citation_source: r.candidate.citation_source,
                reasons: r.reasons.iter().map(ToString::to_string).collect(),
            })
            .collect();
        (self.kept, removed)
    }
}

fn join_reasons<R: std::fmt::Display>(reasons: &[R]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
