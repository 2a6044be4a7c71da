//! Writes a ranked batch after re-running the gates over it.

use recgen_core::{Candidate, Maturity, NewGeneration, Provenance};
use recgen_db::{StoreError, TelemetryStore};
use uuid::Uuid;

use crate::filter::RemovedCandidate;
use crate::quality::apply_quality_gate;
use crate::safety::SafetyFilter;

#[derive(Debug, Clone)]
pub struct PersistOutcome {
    pub generation_id: i64,
    pub public_id: Uuid,
    /// Written candidates with their assigned ids, in rank order.
    pub candidates: Vec<Candidate>,
    /// Candidates the final gate pass removed.
    pub removed: Vec<RemovedCandidate>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no candidate survived the final safety and quality pass")]
    Exhausted { removed: Vec<RemovedCandidate> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persist `candidates` as a new generation for `subject_id`.
///
/// Safety and quality are checked again so that nothing unsafe is written
/// even if an earlier stage was skipped or reordered.
///
/// # Errors
///
/// Returns [`PersistError::Exhausted`] when the re-check leaves nothing to
/// write, or [`PersistError::Store`] when the write fails. No partial
/// generation is ever visible.
pub async fn persist_generation(
    store: &dyn TelemetryStore,
    safety: &SafetyFilter,
    subject_id: i64,
    maturity: Maturity,
    provenance: &Provenance,
    candidates: Vec<Candidate>,
) -> Result<PersistOutcome, PersistError> {
    let (safe, mut removed) = safety.apply(candidates).into_report("persist_safety");
    let (mut candidates, quality_removed) = apply_quality_gate(safe).into_report("persist_quality");
    removed.extend(quality_removed);

    if candidates.is_empty() {
        return Err(PersistError::Exhausted { removed });
    }
    if !removed.is_empty() {
        tracing::warn!(
            subject_id,
            removed = removed.len(),
            "final gate pass removed candidates that earlier stages kept"
        );
    }

    let persisted = store
        .insert_generation(&NewGeneration {
            subject_id,
            maturity,
            provenance,
            candidates: &candidates,
        })
        .await?;

    for (candidate, id) in candidates.iter_mut().zip(&persisted.candidate_ids) {
        candidate.id = Some(*id);
    }

    tracing::info!(
        subject_id,
        generation_id = persisted.generation_id,
        public_id = %persisted.public_id,
        candidates = candidates.len(),
        strategy = provenance.strategy.as_str(),
        "generation persisted"
    );

    Ok(PersistOutcome {
        generation_id: persisted.generation_id,
        public_id: persisted.public_id,
        candidates,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use recgen_core::{GenerationStrategy, SubjectRecord};
    use recgen_db::MemoryTelemetryStore;

    use super::*;
    use crate::exclusion::build_exclusion_list;
    use crate::testing::candidate;

    fn provenance() -> Provenance {
        Provenance {
            strategy: GenerationStrategy::Direct,
            tier: Some(0),
            backend: Some("primary".to_string()),
            prompt_digest: Some("ab".repeat(32)),
        }
    }

    fn store() -> MemoryTelemetryStore {
        let store = MemoryTelemetryStore::new();
        store.add_subject(SubjectRecord {
            id: 1,
            name: "Acme".to_string(),
            domain: Some("acme.com".to_string()),
            vertical: None,
            preferred_backend: None,
        });
        store
    }

    fn safety() -> SafetyFilter {
        SafetyFilter::new(
            build_exclusion_list([("Rival Labs", Some("rival.com"))], "Acme", Some("acme.com")),
            true,
        )
    }

    #[tokio::test]
    async fn assigns_ids_in_rank_order() {
        let store = store();
        let out = persist_generation(
            &store,
            &safety(),
            1,
            Maturity::Normal,
            &provenance(),
            vec![
                candidate("Publish a buyer's guide", "g2.com"),
                candidate("Answer community threads", "reddit.com"),
            ],
        )
        .await
        .unwrap();

        let ids: Vec<Option<i64>> = out.candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, [Some(1), Some(2)]);
        assert!(out.removed.is_empty());
        let rows = store.recommendations();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, "Publish a buyer's guide");
    }

    #[tokio::test]
    async fn final_pass_catches_unsafe_candidates() {
        let store = store();
        let out = persist_generation(
            &store,
            &safety(),
            1,
            Maturity::Normal,
            &provenance(),
            vec![
                candidate("Publish a buyer's guide", "blog.rival.com"),
                candidate("Answer community threads", "reddit.com"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.removed.len(), 1);
        assert_eq!(out.removed[0].stage, "persist_safety");
        assert_eq!(store.recommendations().len(), 1);
    }

    #[tokio::test]
    async fn nothing_is_written_when_everything_is_removed() {
        let store = store();
        let err = persist_generation(
            &store,
            &safety(),
            1,
            Maturity::Normal,
            &provenance(),
            vec![candidate("Publish a buyer's guide", "rival.com")],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PersistError::Exhausted { ref removed } if removed.len() == 1));
        assert!(store.generations().is_empty());
    }

    #[tokio::test]
    async fn store_failures_surface() {
        let store = store();
        store.fail_writes(true);
        let err = persist_generation(
            &store,
            &safety(),
            1,
            Maturity::Normal,
            &provenance(),
            vec![candidate("Publish a buyer's guide", "g2.com")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PersistError::Store(StoreError::Unavailable(_))));
    }
}
