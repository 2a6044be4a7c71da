//! Shared fixtures for unit tests.

use chrono::{Duration, Utc};
use recgen_core::{
    Candidate, CompetitorSummary, Effort, FocusDimension, MetricTrends, ScalarMetrics,
    SourceMetric, TelemetrySnapshot,
};

pub(crate) fn source(domain: &str, impact: f64, citations: i64) -> SourceMetric {
    SourceMetric {
        domain: domain.to_string(),
        mention_rate: 25.0,
        share_of_voice: 12.0,
        sentiment: 70.0,
        citation_count: citations,
        impact_score: impact,
        visibility: 35.0,
    }
}

/// Snapshot with `domains` sources named `source{i}.com` and flat trends.
pub(crate) fn snapshot_with(
    visibility: f64,
    share_of_voice: f64,
    citations: i64,
    domains: usize,
) -> TelemetrySnapshot {
    let metrics = ScalarMetrics {
        visibility,
        share_of_voice,
        sentiment: 60.0,
        total_citations: citations,
    };
    let sources = (0..domains)
        .map(|i| source(&format!("source{i}.com"), 5.0, 10))
        .collect();
    TelemetrySnapshot {
        subject_id: 1,
        window_start: Utc::now() - Duration::days(30),
        window_end: Utc::now(),
        metrics,
        trends: MetricTrends::between(&metrics, &metrics),
        sources,
        competitors: vec![CompetitorSummary {
            name: "Rival Labs".to_string(),
            domain: Some("rival.com".to_string()),
            metrics,
        }],
        qualitative: None,
    }
}

pub(crate) fn candidate(action: &str, source: &str) -> Candidate {
    let mut c = Candidate::new(action, source);
    c.focus = FocusDimension::Visibility;
    c.effort = Effort::Medium;
    c.kpi = "AI visibility".to_string();
    c.reason = "The source is heavily cited for category questions.".to_string();
    c.explanation = "Placing expert content here raises inclusion in answers.".to_string();
    c.expected_impact = "+5 visibility points".to_string();
    c.timeline = "4-6 weeks".to_string();
    c.confidence = 70;
    c
}
