//! The Telemetry Store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recgen_core::{
    CandidateStatus, CompetitorRecord, NewGeneration, QualitativeContext, ScalarMetrics,
    SourceMetric, SubjectRecord,
};

use crate::rows::{PersistedGeneration, StoredGeneration};
use crate::StoreError;

/// Reads telemetry for a subject and writes generation results.
///
/// Implementations must be safe to share across concurrent runs; the
/// pipeline provides no locking of its own.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the subject does not exist.
    async fn fetch_subject(&self, subject_id: i64) -> Result<SubjectRecord, StoreError>;

    /// Scalar metrics for any tracked entity (subject or competitor) over
    /// `[start, end)`. Entities without observations yield zeros.
    async fn fetch_metrics(
        &self,
        entity_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ScalarMetrics, StoreError>;

    async fn fetch_competitors(&self, subject_id: i64)
        -> Result<Vec<CompetitorRecord>, StoreError>;

    /// Top `limit` source domains for `[start, end)`, highest impact first.
    async fn fetch_top_sources(
        &self,
        subject_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SourceMetric>, StoreError>;

    async fn fetch_qualitative(
        &self,
        subject_id: i64,
    ) -> Result<Option<QualitativeContext>, StoreError>;

    /// Writes a generation and its candidates atomically and marks earlier
    /// generations of the same subject as superseded.
    ///
    /// Returned candidate ids follow the order of `generation.candidates`.
    async fn insert_generation(
        &self,
        generation: &NewGeneration<'_>,
    ) -> Result<PersistedGeneration, StoreError>;

    async fn fetch_generation(&self, generation_id: i64) -> Result<StoredGeneration, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no candidate has this id.
    async fn update_candidate_status(
        &self,
        candidate_id: i64,
        status: CandidateStatus,
    ) -> Result<(), StoreError>;

    /// Backfills missing source impact scores. Returns the number of rows touched.
    async fn refresh_source_scores(&self, subject_id: i64) -> Result<u64, StoreError>;
}
