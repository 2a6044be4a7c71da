//! Row types returned by the Telemetry Store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A row from the `generations` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GenerationRow {
    pub id: i64,
    pub public_id: Uuid,
    pub subject_id: i64,
    pub maturity: String,
    pub strategy: String,
    pub backend_tier: Option<i32>,
    pub backend_name: Option<String>,
    pub prompt_digest: Option<String>,
    /// `active` or `superseded`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `recommendations` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecommendationRow {
    pub id: i64,
    pub generation_id: i64,
    pub position: i32,
    pub action: String,
    pub citation_source: String,
    pub focus: String,
    pub priority: String,
    pub effort: String,
    pub kpi: String,
    pub reason: String,
    pub explanation: String,
    pub expected_impact: String,
    pub timeline: String,
    pub confidence: i16,
    pub content: Option<String>,
    pub impact_score: Option<f64>,
    pub calculated_score: Option<f64>,
    pub strategic_role: Option<String>,
    pub status: String,
}

/// A generation together with its recommendations, in rank order.
#[derive(Debug, Clone)]
pub struct StoredGeneration {
    pub generation: GenerationRow,
    pub recommendations: Vec<RecommendationRow>,
}

/// Identifiers assigned by a successful [`crate::TelemetryStore::insert_generation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedGeneration {
    pub generation_id: i64,
    pub public_id: Uuid,
    /// One id per written candidate, in input order.
    pub candidate_ids: Vec<i64>,
}

/// Impact estimate used when a source row has no stored score.
///
/// Mirrors the SQL backfill in [`crate::PgTelemetryStore`]: clamped to 0–10.
#[must_use]
pub fn estimate_impact_score(mention_rate: f64, share_of_voice: f64, citation_count: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let citations = citation_count.max(0) as f64;
    (mention_rate / 10.0 + share_of_voice / 20.0 + citations.ln_1p()).clamp(0.0, 10.0)
}
