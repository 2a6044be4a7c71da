//! Request rendering for direct generation and template personalization.

use recgen_core::{Candidate, SubjectRecord, TelemetrySnapshot, Trend};
use recgen_llm::{GenerationRequest, RequestWeight};
use serde_json::json;
use sha2::{Digest, Sha256};

const DIRECT_SYSTEM: &str = "You are a brand visibility strategist. You recommend concrete \
actions that increase how often and how favorably answer engines mention a brand. Only target \
the citation sources you are given. Never recommend publishing on or partnering with a listed \
competitor. Respond with JSON only.";

const PERSONALIZE_SYSTEM: &str = "You tailor existing brand recommendations to one brand. \
Rewrite the wording of each item so it is specific to the brand. Do not add, remove or reorder \
items, and keep each item's source unchanged. Respond with JSON only.";

const RECORD_SHAPE: &str = r#"{"recommendations": [{"action": string, "citationSource": string, "focus": "visibility" | "share_of_voice" | "sentiment", "priority": "High" | "Medium" | "Low", "effort": "Low" | "Medium" | "High", "kpi": string, "reason": string, "explanation": string, "expectedImpact": string, "timeline": string, "confidence": integer 0-100}]}"#;

const DIRECT_TEMPERATURE: f32 = 0.4;
const PERSONALIZE_TEMPERATURE: f32 = 0.3;
const TOKENS_PER_ITEM: u32 = 400;
const BASE_OUTPUT_TOKENS: u32 = 512;

/// Most keywords and quotes included from the qualitative cache.
const MAX_QUALITATIVE_ITEMS: usize = 10;

fn output_budget(items: usize) -> u32 {
    let items = u32::try_from(items).unwrap_or(u32::MAX);
    BASE_OUTPUT_TOKENS.saturating_add(TOKENS_PER_ITEM.saturating_mul(items))
}

fn describe_trend(name: &str, trend: &Trend) -> String {
    format!(
        "{name}: {:.1} (previous {:.1}, {:+.1}%, {})",
        trend.current,
        trend.previous,
        trend.change_percent,
        trend.direction
    )
}

/// Request for free generation of up to `items` recommendations.
#[must_use]
pub fn direct_request(
    subject: &SubjectRecord,
    snapshot: &TelemetrySnapshot,
    items: usize,
    weight: RequestWeight,
) -> GenerationRequest {
    let mut lines = vec![format!("Brand: {}", subject.name)];
    if let Some(domain) = &subject.domain {
        lines.push(format!("Brand domain: {domain}"));
    }
    if let Some(vertical) = &subject.vertical {
        lines.push(format!("Vertical: {vertical}"));
    }

    let trends = &snapshot.trends;
    lines.push(String::new());
    lines.push("Metrics over the last window:".to_string());
    lines.push(format!("- {}", describe_trend("visibility", &trends.visibility)));
    lines.push(format!("- {}", describe_trend("share of voice", &trends.share_of_voice)));
    lines.push(format!("- {}", describe_trend("sentiment", &trends.sentiment)));
    lines.push(format!("- citations: {}", snapshot.metrics.total_citations));

    let sources: Vec<_> = snapshot
        .sources
        .iter()
        .map(|s| {
            json!({
                "domain": s.domain,
                "mentionRate": s.mention_rate,
                "shareOfVoice": s.share_of_voice,
                "sentiment": s.sentiment,
                "citations": s.citation_count,
                "impactScore": s.impact_score,
            })
        })
        .collect();
    lines.push(String::new());
    lines.push("Allowed citation sources (use the domain exactly):".to_string());
    lines.push(serde_json::Value::Array(sources).to_string());

    if !snapshot.competitors.is_empty() {
        let names: Vec<&str> = snapshot.competitors.iter().map(|c| c.name.as_str()).collect();
        lines.push(String::new());
        lines.push(format!(
            "Competitors (never use as a citation source): {}",
            names.join(", ")
        ));
    }

    if let Some(q) = &snapshot.qualitative {
        let keywords: Vec<&str> = q
            .keywords
            .iter()
            .take(MAX_QUALITATIVE_ITEMS)
            .map(|k| k.keyword.as_str())
            .collect();
        if !keywords.is_empty() {
            lines.push(String::new());
            lines.push(format!("Frequent keywords: {}", keywords.join(", ")));
        }
        if let Some(narrative) = &q.narrative {
            lines.push(String::new());
            lines.push(format!("How answer engines describe the brand: {narrative}"));
        }
        lines.extend(
            q.quotes
                .iter()
                .take(MAX_QUALITATIVE_ITEMS)
                .map(|quote| format!("> {quote}")),
        );
    }

    lines.push(String::new());
    lines.push(format!("Return up to {items} recommendations, most valuable first, as:"));
    lines.push(RECORD_SHAPE.to_string());
    let prompt = lines.join("\n");

    GenerationRequest {
        system: DIRECT_SYSTEM.to_string(),
        prompt,
        max_output_tokens: output_budget(items),
        temperature: DIRECT_TEMPERATURE,
        require_structured: true,
        weight,
    }
}

/// Request asking a backend to reword expanded templates for the subject.
#[must_use]
pub fn personalization_request(
    subject: &SubjectRecord,
    snapshot: &TelemetrySnapshot,
    templates: &[Candidate],
) -> GenerationRequest {
    let items: Vec<_> = templates
        .iter()
        .map(|t| {
            json!({
                "action": t.action,
                "citationSource": t.citation_source,
                "reason": t.reason,
                "explanation": t.explanation,
                "expectedImpact": t.expected_impact,
                "timeline": t.timeline,
            })
        })
        .collect();

    let mut lines = vec![format!("Brand: {}", subject.name)];
    if let Some(vertical) = &subject.vertical {
        lines.push(format!("Vertical: {vertical}"));
    }
    if let Some(narrative) = snapshot.qualitative.as_ref().and_then(|q| q.narrative.as_ref()) {
        lines.push(format!("Current description: {narrative}"));
    }
    lines.push(String::new());
    lines.push(format!(
        "Rewrite these {} items and return them in the same order as \
         {{\"recommendations\": [...]}} with the same keys:",
        templates.len()
    ));
    lines.push(json!({ "recommendations": items }).to_string());
    let prompt = lines.join("\n");

    GenerationRequest {
        system: PERSONALIZE_SYSTEM.to_string(),
        prompt,
        max_output_tokens: output_budget(templates.len()),
        temperature: PERSONALIZE_TEMPERATURE,
        require_structured: true,
        weight: RequestWeight::Light,
    }
}

/// Hex SHA-256 over the system instruction and prompt.
#[must_use]
pub fn prompt_digest(request: &GenerationRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.system.as_bytes());
    hasher.update([0u8]);
    hasher.update(request.prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{candidate, snapshot_with};

    fn subject() -> SubjectRecord {
        SubjectRecord {
            id: 1,
            name: "Acme".to_string(),
            domain: Some("acme.com".to_string()),
            vertical: Some("saas".to_string()),
            preferred_backend: None,
        }
    }

    #[test]
    fn direct_request_lists_sources_and_competitors() {
        let snapshot = snapshot_with(40.0, 20.0, 250, 3);
        let req = direct_request(&subject(), &snapshot, 7, RequestWeight::Heavy);
        assert!(req.prompt.contains("source0.com"));
        assert!(req.prompt.contains("source2.com"));
        assert!(req.prompt.contains("Rival Labs"));
        assert!(req.prompt.contains("up to 7 recommendations"));
        assert!(req.require_structured);
        assert_eq!(req.weight, RequestWeight::Heavy);
        assert_eq!(req.max_output_tokens, BASE_OUTPUT_TOKENS + 7 * TOKENS_PER_ITEM);
    }

    #[test]
    fn direct_prompt_separates_sections_and_ends_with_the_shape() {
        let snapshot = snapshot_with(40.0, 20.0, 250, 2);
        let req = direct_request(&subject(), &snapshot, 5, RequestWeight::Heavy);
        assert!(req.prompt.starts_with("Brand: Acme\nBrand domain: acme.com\nVertical: saas\n"));
        assert!(req.prompt.contains("\n\nMetrics over the last window:\n- visibility: 40.0"));
        assert!(req.prompt.contains("\n\nCompetitors (never use as a citation source): Rival Labs"));
        assert!(req.prompt.ends_with(&format!("most valuable first, as:\n{RECORD_SHAPE}")));
    }

    #[test]
    fn personalization_request_is_light_and_carries_items() {
        let snapshot = snapshot_with(4.0, 2.0, 10, 1);
        let templates = vec![candidate("Publish an explainer on g2", "g2.com")];
        let req = personalization_request(&subject(), &snapshot, &templates);
        assert_eq!(req.weight, RequestWeight::Light);
        assert!(req.prompt.contains("Publish an explainer on g2"));
        assert!(req.prompt.contains("Rewrite these 1 items"));
    }

    #[test]
    fn digest_is_stable_hex_and_input_sensitive() {
        let snapshot = snapshot_with(40.0, 20.0, 250, 3);
        let a = direct_request(&subject(), &snapshot, 5, RequestWeight::Heavy);
        let b = direct_request(&subject(), &snapshot, 5, RequestWeight::Heavy);
        let c = direct_request(&subject(), &snapshot, 6, RequestWeight::Heavy);

        let digest = prompt_digest(&a);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(digest, prompt_digest(&b));
        assert_ne!(digest, prompt_digest(&c));
    }
}
