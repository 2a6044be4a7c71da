//! Lenient mapping from recovered records to candidates.

use recgen_core::{Candidate, Effort, FocusDimension, Priority};
use serde_json::Value;

use super::{recover_records, Record, RecoveryStrategy};

pub const ACTION_KEYS: [&str; 5] = [
    "action",
    "title",
    "recommendation",
    "actionText",
    "action_text",
];
pub const SOURCE_KEYS: [&str; 9] = [
    "citationSource",
    "citation_source",
    "source",
    "domain",
    "sourceDomain",
    "source_domain",
    "targetSource",
    "target_source",
    "citationDomain",
];
const FOCUS_KEYS: [&str; 5] = ["focus", "focusArea", "focus_area", "dimension", "metric"];
const PRIORITY_KEYS: [&str; 1] = ["priority"];
const EFFORT_KEYS: [&str; 3] = ["effort", "effortLevel", "effort_level"];
const KPI_KEYS: [&str; 4] = ["kpi", "linkedKpi", "linked_kpi", "kpiName"];
const REASON_KEYS: [&str; 3] = ["reason", "rationale", "why"];
const EXPLANATION_KEYS: [&str; 3] = ["explanation", "details", "description"];
const IMPACT_KEYS: [&str; 3] = ["expectedImpact", "expected_impact", "impact"];
const TIMELINE_KEYS: [&str; 3] = ["timeline", "timeframe", "time_frame"];
const CONFIDENCE_KEYS: [&str; 3] = ["confidence", "confidenceScore", "confidence_score"];
const CONTENT_KEYS: [&str; 4] = ["content", "draft", "longForm", "long_form"];

/// First string (or number, rendered) value under any of `keys`, trimmed.
fn text(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match record.get(*k)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Confidence as an integer percentage.
///
/// Accepts numbers and numeric strings (`"85"`, `"85%"`). Fractions in
/// `(0, 1)` are read as ratios. Out-of-range values are clamped.
fn confidence(record: &Record) -> Option<u8> {
    let raw = CONFIDENCE_KEYS.iter().find_map(|k| match record.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    })?;
    if !raw.is_finite() {
        return None;
    }
    let percent = if raw > 0.0 && raw < 1.0 { raw * 100.0 } else { raw };
    // Clamped to 0..=100 so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = percent.round().clamp(0.0, 100.0) as u8;
    Some(percent)
}

/// Map one recovered record onto a [`Candidate`].
///
/// Returns `None` when the record has no action or source string. Missing
/// or unrecognized enum values fall back to the [`Candidate::new`] defaults.
#[must_use]
pub fn candidate_from_record(record: &Record) -> Option<Candidate> {
    let action = text(record, &ACTION_KEYS)?;
    let source = text(record, &SOURCE_KEYS)?;

    let mut candidate = Candidate::new(action, source);
    if let Some(focus) = text(record, &FOCUS_KEYS).and_then(|f| FocusDimension::parse_loose(&f)) {
        candidate.focus = focus;
    }
    if let Some(priority) = text(record, &PRIORITY_KEYS).and_then(|p| Priority::parse_loose(&p)) {
        candidate.priority = priority;
    }
    if let Some(effort) = text(record, &EFFORT_KEYS).and_then(|e| Effort::parse_loose(&e)) {
        candidate.effort = effort;
    }
    if let Some(confidence) = confidence(record) {
        candidate.confidence = confidence;
    }
    candidate.kpi = text(record, &KPI_KEYS).unwrap_or_default();
    candidate.reason = text(record, &REASON_KEYS).unwrap_or_default();
    candidate.explanation = text(record, &EXPLANATION_KEYS).unwrap_or_default();
    candidate.expected_impact = text(record, &IMPACT_KEYS).unwrap_or_default();
    candidate.timeline = text(record, &TIMELINE_KEYS).unwrap_or_default();
    candidate.content = text(record, &CONTENT_KEYS).filter(|c| !c.is_empty());

    Some(candidate)
}

/// Recover records from raw output and map them to candidates, in order.
///
/// `None` when no strategy recovers anything.
#[must_use]
pub fn recover_candidates(raw: &str) -> Option<(Vec<Candidate>, RecoveryStrategy)> {
    let recovered = recover_records(raw)?;
    let candidates: Vec<Candidate> = recovered
        .records
        .iter()
        .filter_map(candidate_from_record)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some((candidates, recovered.strategy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> Record {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn camel_and_snake_aliases_are_accepted() {
        let c = candidate_from_record(&record(
            r#"{
                "title": "Pitch editors",
                "citation_source": "wired.com",
                "focus_area": "Share of Voice",
                "priority": "high",
                "effortLevel": "LOW",
                "linked_kpi": "SOV",
                "rationale": "Cited often",
                "details": "Editors shape answers",
                "impact": "+3 SOV",
                "timeframe": "2 weeks",
                "confidenceScore": "85%"
            }"#,
        ))
        .unwrap();

        assert_eq!(c.action, "Pitch editors");
        assert_eq!(c.citation_source, "wired.com");
        assert_eq!(c.focus, FocusDimension::ShareOfVoice);
        assert_eq!(c.priority, Priority::High);
        assert_eq!(c.effort, Effort::Low);
        assert_eq!(c.kpi, "SOV");
        assert_eq!(c.reason, "Cited often");
        assert_eq!(c.explanation, "Editors shape answers");
        assert_eq!(c.expected_impact, "+3 SOV");
        assert_eq!(c.timeline, "2 weeks");
        assert_eq!(c.confidence, 85);
        assert!(c.id.is_none());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let c = candidate_from_record(&record(
            r#"{"action": "Pitch editors", "source": "wired.com", "effort": "extreme"}"#,
        ))
        .unwrap();
        assert_eq!(c.focus, FocusDimension::Visibility);
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.effort, Effort::Medium);
        assert_eq!(c.confidence, 50);
        assert!(c.content.is_none());
    }

    #[test]
    fn confidence_is_clamped_and_ratios_scaled() {
        let conf = |v: &str| {
            candidate_from_record(&record(&format!(
                r#"{{"action": "Pitch editors", "source": "wired.com", "confidence": {v}}}"#
            )))
            .unwrap()
            .confidence
        };
        assert_eq!(conf("140"), 100);
        assert_eq!(conf("-3"), 0);
        assert_eq!(conf("0.72"), 72);
        assert_eq!(conf("1"), 1);
        assert_eq!(conf("\"sure\""), 50);
    }

    #[test]
    fn records_without_action_or_source_are_skipped() {
        assert!(candidate_from_record(&record(r#"{"action": "Pitch editors"}"#)).is_none());
        assert!(candidate_from_record(&record(r#"{"source": "wired.com"}"#)).is_none());
    }

    #[test]
    fn recover_candidates_keeps_order_and_strategy() {
        let (candidates, strategy) = recover_candidates(
            "```json\n[{\"action\":\"First\",\"source\":\"a.com\"},{\"action\":\"Second\",\"source\":\"b.com\"}]\n```",
        )
        .unwrap();
        assert_eq!(strategy, RecoveryStrategy::StripFences);
        let actions: Vec<&str> = candidates.iter().map(|c| c.action.as_str()).collect();
        assert_eq!(actions, ["First", "Second"]);
    }
}
