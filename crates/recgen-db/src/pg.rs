//! Postgres-backed [`TelemetryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recgen_core::{
    CandidateStatus, CompetitorRecord, KeywordFrequency, NewGeneration, QualitativeContext,
    ScalarMetrics, SourceMetric, SubjectRecord,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::rows::{GenerationRow, PersistedGeneration, RecommendationRow, StoredGeneration};
use crate::store::TelemetryStore;
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct PgTelemetryStore {
    pool: PgPool,
}

impl PgTelemetryStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct SubjectDbRow {
    id: i64,
    name: String,
    domain: Option<String>,
    vertical: Option<String>,
    preferred_backend: Option<String>,
}

#[derive(sqlx::FromRow)]
struct MetricsDbRow {
    visibility: f64,
    share_of_voice: f64,
    sentiment: f64,
    total_citations: i64,
}

#[derive(sqlx::FromRow)]
struct SourceDbRow {
    domain: String,
    mention_rate: f64,
    share_of_voice: f64,
    sentiment: f64,
    citation_count: i64,
    impact_score: f64,
    visibility: f64,
}

#[derive(sqlx::FromRow)]
struct QualitativeDbRow {
    keywords: serde_json::Value,
    narrative: Option<String>,
    quotes: serde_json::Value,
}

const RECOMMENDATION_COLUMNS: &str = "id, generation_id, position, action, citation_source, \
     focus, priority, effort, kpi, reason, explanation, expected_impact, timeline, confidence, \
     content, impact_score, calculated_score, strategic_role, status";

#[async_trait]
impl TelemetryStore for PgTelemetryStore {
    async fn fetch_subject(&self, subject_id: i64) -> Result<SubjectRecord, StoreError> {
        let row = sqlx::query_as::<_, SubjectDbRow>(
            "SELECT id, name, domain, vertical, preferred_backend \
             FROM subjects WHERE id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "subject",
            id: subject_id,
        })?;

        Ok(SubjectRecord {
            id: row.id,
            name: row.name,
            domain: row.domain,
            vertical: row.vertical,
            preferred_backend: row.preferred_backend,
        })
    }

    async fn fetch_metrics(
        &self,
        entity_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ScalarMetrics, StoreError> {
        let row = sqlx::query_as::<_, MetricsDbRow>(
            "SELECT COALESCE(AVG(visibility), 0)::DOUBLE PRECISION AS visibility, \
                    COALESCE(AVG(share_of_voice), 0)::DOUBLE PRECISION AS share_of_voice, \
                    COALESCE(AVG(sentiment), 0)::DOUBLE PRECISION AS sentiment, \
                    COALESCE(SUM(citations), 0)::BIGINT AS total_citations \
             FROM metric_observations \
             WHERE entity_id = $1 AND observed_at >= $2 AND observed_at < $3",
        )
        .bind(entity_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(ScalarMetrics {
            visibility: row.visibility,
            share_of_voice: row.share_of_voice,
            sentiment: row.sentiment,
            total_citations: row.total_citations,
        })
    }

    async fn fetch_competitors(
        &self,
        subject_id: i64,
    ) -> Result<Vec<CompetitorRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SubjectDbRow>(
            "SELECT s.id, s.name, s.domain, s.vertical, s.preferred_backend \
             FROM subject_competitors sc \
             JOIN subjects s ON s.id = sc.competitor_id \
             WHERE sc.subject_id = $1 \
             ORDER BY s.name",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CompetitorRecord {
                id: r.id,
                name: r.name,
                domain: r.domain,
            })
            .collect())
    }

    async fn fetch_top_sources(
        &self,
        subject_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SourceMetric>, StoreError> {
        let rows = sqlx::query_as::<_, SourceDbRow>(
            "SELECT domain, \
                    AVG(mention_rate)::DOUBLE PRECISION AS mention_rate, \
                    AVG(share_of_voice)::DOUBLE PRECISION AS share_of_voice, \
                    AVG(sentiment)::DOUBLE PRECISION AS sentiment, \
                    SUM(citation_count)::BIGINT AS citation_count, \
                    COALESCE(AVG(impact_score), 0)::DOUBLE PRECISION AS impact_score, \
                    AVG(visibility)::DOUBLE PRECISION AS visibility \
             FROM source_citations \
             WHERE subject_id = $1 AND observed_at >= $2 AND observed_at < $3 \
             GROUP BY domain \
             ORDER BY impact_score DESC, citation_count DESC, domain \
             LIMIT $4",
        )
        .bind(subject_id)
        .bind(start)
        .bind(end)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SourceMetric {
                domain: r.domain,
                mention_rate: r.mention_rate,
                share_of_voice: r.share_of_voice,
                sentiment: r.sentiment,
                citation_count: r.citation_count,
                impact_score: r.impact_score,
                visibility: r.visibility,
            })
            .collect())
    }

    async fn fetch_qualitative(
        &self,
        subject_id: i64,
    ) -> Result<Option<QualitativeContext>, StoreError> {
        let row = sqlx::query_as::<_, QualitativeDbRow>(
            "SELECT keywords, narrative, quotes FROM qualitative_cache WHERE subject_id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let keywords: Vec<KeywordFrequency> = serde_json::from_value(row.keywords)
            .map_err(|e| StoreError::Decode(format!("qualitative_cache.keywords: {e}")))?;
        let quotes: Vec<String> = serde_json::from_value(row.quotes)
            .map_err(|e| StoreError::Decode(format!("qualitative_cache.quotes: {e}")))?;

        Ok(Some(QualitativeContext {
            keywords,
            narrative: row.narrative,
            quotes,
        }))
    }

    async fn insert_generation(
        &self,
        generation: &NewGeneration<'_>,
    ) -> Result<PersistedGeneration, StoreError> {
        let public_id = Uuid::new_v4();
        let provenance = generation.provenance;
        let tier = provenance
            .tier
            .map(|t| i32::try_from(t).unwrap_or(i32::MAX));

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE generations SET status = 'superseded' \
             WHERE subject_id = $1 AND status = 'active'",
        )
        .bind(generation.subject_id)
        .execute(&mut *tx)
        .await?;

        let generation_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO generations \
               (public_id, subject_id, maturity, strategy, backend_tier, backend_name, prompt_digest) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(public_id)
        .bind(generation.subject_id)
        .bind(generation.maturity.as_str())
        .bind(provenance.strategy.as_str())
        .bind(tier)
        .bind(provenance.backend.as_deref())
        .bind(provenance.prompt_digest.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let mut candidate_ids = Vec::with_capacity(generation.candidates.len());
        for (position, candidate) in generation.candidates.iter().enumerate() {
            let metrics = candidate.metrics.as_ref();
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO recommendations \
                   (generation_id, position, action, citation_source, focus, priority, effort, \
                    kpi, reason, explanation, expected_impact, timeline, confidence, content, \
                    impact_score, mention_rate, source_share_of_voice, source_sentiment, \
                    source_visibility, citation_count, calculated_score, strategic_role) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                         $15, $16, $17, $18, $19, $20, $21, $22) \
                 RETURNING id",
            )
            .bind(generation_id)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(&candidate.action)
            .bind(&candidate.citation_source)
            .bind(candidate.focus.as_str())
            .bind(candidate.priority.as_str())
            .bind(candidate.effort.as_str())
            .bind(&candidate.kpi)
            .bind(&candidate.reason)
            .bind(&candidate.explanation)
            .bind(&candidate.expected_impact)
            .bind(&candidate.timeline)
            .bind(i16::from(candidate.confidence))
            .bind(candidate.content.as_deref())
            .bind(metrics.map(|m| m.impact_score))
            .bind(metrics.map(|m| m.mention_rate))
            .bind(metrics.map(|m| m.share_of_voice))
            .bind(metrics.map(|m| m.sentiment))
            .bind(metrics.map(|m| m.visibility))
            .bind(metrics.map(|m| m.citation_count))
            .bind(candidate.calculated_score)
            .bind(candidate.strategic_role.map(|r| r.as_str()))
            .fetch_one(&mut *tx)
            .await?;
            candidate_ids.push(id);
        }

        tx.commit().await?;

        Ok(PersistedGeneration {
            generation_id,
            public_id,
            candidate_ids,
        })
    }

    async fn fetch_generation(&self, generation_id: i64) -> Result<StoredGeneration, StoreError> {
        let generation = sqlx::query_as::<_, GenerationRow>(
            "SELECT id, public_id, subject_id, maturity, strategy, backend_tier, backend_name, \
                    prompt_digest, status, created_at \
             FROM generations WHERE id = $1",
        )
        .bind(generation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "generation",
            id: generation_id,
        })?;

        let recommendations = sqlx::query_as::<_, RecommendationRow>(&format!(
            "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations \
             WHERE generation_id = $1 ORDER BY position"
        ))
        .bind(generation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StoredGeneration {
            generation,
            recommendations,
        })
    }

    async fn update_candidate_status(
        &self,
        candidate_id: i64,
        status: CandidateStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE recommendations SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(candidate_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "candidate",
                id: candidate_id,
            });
        }
        Ok(())
    }

    async fn refresh_source_scores(&self, subject_id: i64) -> Result<u64, StoreError> {
        // Keep in sync with rows::estimate_impact_score.
        let result = sqlx::query(
            "UPDATE source_citations \
             SET impact_score = LEAST(10, GREATEST(0, \
                 mention_rate / 10 + share_of_voice / 20 + LN(1 + GREATEST(citation_count, 0)))) \
             WHERE subject_id = $1 AND impact_score IS NULL",
        )
        .bind(subject_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
