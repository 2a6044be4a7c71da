//! Candidate Generator: direct generation through the backend chain, or
//! cold-start template expansion with one personalization call.

use recgen_core::{
    normalize_domain, Candidate, GenerationStrategy, Provenance, SubjectRecord, TelemetrySnapshot,
};
use recgen_llm::{BackendChain, ChainOutput, GenerationRequest, TierFailure};

use crate::prompt::{personalization_request, prompt_digest};
use crate::quality::quality_issues;
use crate::recovery::recover_candidates;
use crate::safety::SafetyFilter;
use crate::templates::{apply_personalization, expand_templates, TemplateCatalog, TemplateVars};

/// Candidates produced by one strategy, with where they came from.
#[derive(Debug, Clone)]
pub struct Generated {
    pub candidates: Vec<Candidate>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Produced(Generated),
    /// Every tier failed; nothing was returned.
    NoOutput { failures: Vec<TierFailure> },
    /// A tier answered but nothing could be recovered from its text.
    NoRecoverable { provenance: Provenance },
}

fn provenance_for(
    strategy: GenerationStrategy,
    output: &ChainOutput,
    request: &GenerationRequest,
) -> Provenance {
    Provenance {
        strategy,
        tier: Some(output.tier),
        backend: Some(output.backend.clone()),
        prompt_digest: Some(prompt_digest(request)),
    }
}

/// Drive `request` through every tier and recover candidates from the first answer.
pub async fn generate_direct(
    chain: &BackendChain,
    request: &GenerationRequest,
) -> GenerationOutcome {
    let run = chain.generate(request).await;
    let Some(output) = run.output else {
        return GenerationOutcome::NoOutput {
            failures: run.failures,
        };
    };

    let provenance = provenance_for(GenerationStrategy::Direct, &output, request);
    match recover_candidates(&output.text) {
        Some((candidates, strategy)) => {
            tracing::info!(
                backend = %output.backend,
                tier = output.tier,
                recovery = strategy.as_str(),
                candidates = candidates.len(),
                "direct generation produced candidates"
            );
            GenerationOutcome::Produced(Generated {
                candidates,
                provenance,
            })
        }
        None => {
            tracing::warn!(
                backend = %output.backend,
                tier = output.tier,
                "backend output held no recoverable candidates"
            );
            GenerationOutcome::NoRecoverable { provenance }
        }
    }
}

/// Expand the cold-start templates for the subject's vertical and ask the
/// first tier, once, to personalize them.
///
/// A rewritten item is used only if it passes the quality gate and `safety`;
/// otherwise its template stays. Falls back to the expanded templates
/// verbatim when the call fails or no rewrite passes, so the result is never
/// empty while the catalog has templates.
pub async fn generate_from_templates(
    chain: &BackendChain,
    catalog: &TemplateCatalog,
    safety: &SafetyFilter,
    subject: &SubjectRecord,
    snapshot: &TelemetrySnapshot,
) -> Generated {
    let own_domain = subject.domain.as_deref().map(normalize_domain);
    let top_source = snapshot
        .sources
        .first()
        .map(|s| s.domain.as_str())
        .or(own_domain.as_deref())
        .filter(|d| !d.is_empty());
    let vars = TemplateVars {
        brand: &subject.name,
        vertical: subject.vertical.as_deref(),
        top_source,
    };
    let templates = expand_templates(catalog.templates_for(subject.vertical.as_deref()), &vars);

    let verbatim = |templates: Vec<Candidate>| Generated {
        candidates: templates,
        provenance: Provenance {
            strategy: GenerationStrategy::TemplateVerbatim,
            tier: None,
            backend: None,
            prompt_digest: None,
        },
    };

    if templates.is_empty() || chain.is_empty() {
        return verbatim(templates);
    }

    let request = personalization_request(subject, snapshot, &templates);
    let run = chain.generate_once(&request).await;
    let Some(output) = run.output else {
        tracing::warn!(
            subject_id = subject.id,
            "template personalization failed; using templates verbatim"
        );
        return verbatim(templates);
    };

    let rewritten = recover_candidates(&output.text)
        .map(|(candidates, _)| candidates)
        .unwrap_or_default();
    let passes_gates =
        |c: &Candidate| quality_issues(c).is_empty() && safety.violations(c).is_empty();
    match apply_personalization(&templates, &rewritten, passes_gates) {
        Some(candidates) => Generated {
            candidates,
            provenance: provenance_for(GenerationStrategy::Template, &output, &request),
        },
        None => {
            tracing::warn!(
                subject_id = subject.id,
                backend = %output.backend,
                "personalization returned no usable items; using templates verbatim"
            );
            verbatim(templates)
        }
    }
}
