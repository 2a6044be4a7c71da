//! Cold-start template catalog and personalization merge.

use std::collections::BTreeMap;

use recgen_core::{Candidate, Effort, FocusDimension, Priority};
use serde::Deserialize;

const EMBEDDED_CATALOG: &str = include_str!("../templates/cold_start.yaml");

/// Used for `{top_source}` when the subject has neither sources nor a domain.
const FALLBACK_TOP_SOURCE: &str = "wikipedia.org";
const FALLBACK_VERTICAL: &str = "your category";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateTemplate {
    pub action: String,
    pub source: String,
    pub focus: FocusDimension,
    pub priority: Priority,
    pub effort: Effort,
    pub kpi: String,
    pub reason: String,
    pub explanation: String,
    pub expected_impact: String,
    pub timeline: String,
    pub confidence: u8,
}

#[derive(Debug, Clone, Deserialize)]
struct VerticalTemplates {
    #[serde(default)]
    aliases: Vec<String>,
    templates: Vec<CandidateTemplate>,
}

/// Hand-authored templates keyed by vertical, with a default set.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateCatalog {
    default: Vec<CandidateTemplate>,
    #[serde(default)]
    verticals: BTreeMap<String, VerticalTemplates>,
}

fn vertical_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl TemplateCatalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`serde_yaml::Error`] if the embedded YAML is malformed.
    pub fn embedded() -> Result<Self, serde_yaml::Error> {
        Self::from_yaml(EMBEDDED_CATALOG)
    }

    /// # Errors
    ///
    /// Returns [`serde_yaml::Error`] if `yaml` does not describe a catalog.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Templates for `vertical`, matched on key or alias; the default set
    /// otherwise.
    #[must_use]
    pub fn templates_for(&self, vertical: Option<&str>) -> &[CandidateTemplate] {
        let Some(wanted) = vertical.map(vertical_key).filter(|v| !v.is_empty()) else {
            return &self.default;
        };
        self.verticals
            .iter()
            .find(|(key, set)| {
                vertical_key(key) == wanted || set.aliases.iter().any(|a| vertical_key(a) == wanted)
            })
            .map_or(self.default.as_slice(), |(_, set)| set.templates.as_slice())
    }
}

/// Values substituted into template text.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub brand: &'a str,
    pub vertical: Option<&'a str>,
    /// Highest-impact source domain, or the subject's own domain.
    pub top_source: Option<&'a str>,
}

impl TemplateVars<'_> {
    fn render(&self, text: &str) -> String {
        text.replace("{brand}", self.brand)
            .replace(
                "{vertical}",
                self.vertical
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(FALLBACK_VERTICAL),
            )
            .replace("{top_source}", self.top_source.unwrap_or(FALLBACK_TOP_SOURCE))
    }
}

/// Render templates into candidates, in catalog order.
#[must_use]
pub fn expand_templates(
    templates: &[CandidateTemplate],
    vars: &TemplateVars<'_>,
) -> Vec<Candidate> {
    templates
        .iter()
        .map(|t| {
            let mut c = Candidate::new(vars.render(&t.action), vars.render(&t.source));
            c.focus = t.focus;
            c.priority = t.priority;
            c.effort = t.effort;
            c.kpi = vars.render(&t.kpi);
            c.reason = vars.render(&t.reason);
            c.explanation = vars.render(&t.explanation);
            c.expected_impact = vars.render(&t.expected_impact);
            c.timeline = vars.render(&t.timeline);
            c.confidence = t.confidence.min(100);
            c
        })
        .collect()
}

/// Merge personalized text onto expanded templates by position.
///
/// Only text fields are taken from `rewritten`; source, focus, priority,
/// effort, KPI and confidence stay from the template. Output beyond the
/// template count is ignored. A merged item that `accept` rejects keeps the
/// template verbatim at its position. Returns `None` when no rewrite was
/// accepted.
#[must_use]
pub fn apply_personalization<F>(
    templates: &[Candidate],
    rewritten: &[Candidate],
    accept: F,
) -> Option<Vec<Candidate>>
where
    F: Fn(&Candidate) -> bool,
{
    let mut usable = 0;
    let merged = templates
        .iter()
        .enumerate()
        .map(|(i, template)| {
            let Some(r) = rewritten.get(i).filter(|r| !r.action.trim().is_empty()) else {
                return template.clone();
            };
            let mut out = template.clone();
            out.action = r.action.clone();
            for (field, value) in [
                (&mut out.reason, &r.reason),
                (&mut out.explanation, &r.explanation),
                (&mut out.expected_impact, &r.expected_impact),
                (&mut out.timeline, &r.timeline),
            ] {
                if !value.trim().is_empty() {
                    field.clone_from(value);
                }
            }
            if !accept(&out) {
                tracing::debug!(position = i, "personalized item rejected; keeping template");
                return template.clone();
            }
            usable += 1;
            out
        })
        .collect();

    (usable > 0).then_some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(vertical: Option<&'a str>, top_source: Option<&'a str>) -> TemplateVars<'a> {
        TemplateVars {
            brand: "Acme",
            vertical,
            top_source,
        }
    }

    #[test]
    fn embedded_catalog_parses_and_has_sets() {
        let catalog = TemplateCatalog::embedded().unwrap();
        assert!(!catalog.templates_for(None).is_empty());
        assert_eq!(catalog.templates_for(Some("SaaS")).len(), 5);
        assert_eq!(catalog.templates_for(Some("b2b  software")).len(), 5);
        assert_eq!(catalog.templates_for(Some("retail")).len(), 4);
        assert_eq!(catalog.templates_for(Some("fintech")).len(), 3);
        assert_eq!(
            catalog.templates_for(Some("agriculture")),
            catalog.templates_for(None)
        );
    }

    #[test]
    fn expansion_fills_every_placeholder() {
        let catalog = TemplateCatalog::embedded().unwrap();
        for vertical in [None, Some("saas"), Some("ecommerce"), Some("finance")] {
            let expanded = expand_templates(
                catalog.templates_for(vertical),
                &vars(vertical, Some("techradar.com")),
            );
            for c in &expanded {
                for text in [&c.action, &c.citation_source, &c.reason, &c.explanation] {
                    assert!(!text.contains('{'), "unrendered placeholder in {text}");
                }
            }
        }
    }

    #[test]
    fn missing_values_use_fallbacks() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let expanded = expand_templates(catalog.templates_for(None), &vars(None, None));
        assert_eq!(expanded[0].citation_source, FALLBACK_TOP_SOURCE);
        assert!(expanded[0].reason.contains(FALLBACK_VERTICAL));
    }

    #[test]
    fn personalization_rewrites_text_only_by_position() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let templates = expand_templates(catalog.templates_for(None), &vars(None, Some("x.com")));

        let mut first = Candidate::new("Publish a founder Q&A about Acme on x.com", "evil.com");
        first.reason = "Tailored reason".to_string();
        first.effort = Effort::High;
        let second = Candidate::new("   ", "wikipedia.org");
        let extra: Vec<Candidate> = (0..10)
            .map(|i| Candidate::new(format!("Extra {i}"), "extra.com"))
            .collect();
        let rewritten: Vec<Candidate> = [first, second].into_iter().chain(extra).collect();

        let merged = apply_personalization(&templates, &rewritten, |_| true).unwrap();
        assert_eq!(merged.len(), templates.len());

        assert_eq!(merged[0].action, "Publish a founder Q&A about Acme on x.com");
        assert_eq!(merged[0].reason, "Tailored reason");
        assert_eq!(merged[0].citation_source, templates[0].citation_source);
        assert_eq!(merged[0].effort, templates[0].effort);
        assert_eq!(merged[0].explanation, templates[0].explanation);

        // Blank rewrite keeps the template.
        assert_eq!(merged[1], templates[1]);
        assert_eq!(merged[2].action, "Extra 0");
        assert_eq!(merged[2].citation_source, templates[2].citation_source);
    }

    #[test]
    fn personalization_without_usable_items_is_none() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let templates = expand_templates(catalog.templates_for(None), &vars(None, None));
        assert!(apply_personalization(&templates, &[], |_| true).is_none());
        assert!(
            apply_personalization(&templates, &[Candidate::new("", "a.com")], |_| true).is_none()
        );
    }

    #[test]
    fn rejected_rewrites_keep_their_template() {
        let catalog = TemplateCatalog::embedded().unwrap();
        let templates = expand_templates(catalog.templates_for(None), &vars(None, Some("x.com")));
        let rewritten = [
            Candidate::new("[Action]", "x.com"),
            Candidate::new("Host a live Acme teardown on x.com", "x.com"),
        ];
        let accept = |c: &Candidate| !c.action.contains('[');

        let merged = apply_personalization(&templates, &rewritten, accept).unwrap();
        assert_eq!(merged[0], templates[0]);
        assert_eq!(merged[1].action, "Host a live Acme teardown on x.com");

        let all_rejected = [
            Candidate::new("[Action]", "x.com"),
            Candidate::new("[Action]", "x.com"),
        ];
        assert!(apply_personalization(&templates, &all_rejected, accept).is_none());
    }
}
