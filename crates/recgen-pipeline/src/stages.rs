//! Small in-order transforms between the filtering stages.

use std::collections::HashSet;

use recgen_core::{AttachedMetrics, Candidate, TelemetrySnapshot};

fn action_key(action: &str) -> String {
    action
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop candidates whose normalized action repeats an earlier one.
#[must_use]
pub fn dedupe_by_action(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let before = candidates.len();
    let mut seen = HashSet::new();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(action_key(&c.action)))
        .collect();
    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), "duplicate candidates dropped");
    }
    kept
}

/// Copy each candidate's matching source metrics onto it. Candidates whose
/// source is not in the snapshot keep `metrics: None`.
pub fn attach_source_metrics(candidates: &mut [Candidate], snapshot: &TelemetrySnapshot) {
    for candidate in candidates {
        candidate.metrics = snapshot
            .source_for(&candidate.citation_source)
            .map(AttachedMetrics::from);
    }
}
