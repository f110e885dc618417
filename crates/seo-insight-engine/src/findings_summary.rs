use crate::executive::dominant_among;
use seo_insight_core::{
    FindingsPillar, FindingsSummary, InsightError, PillarId, Result, SectionSummary,
};
use std::collections::BTreeMap;

/// Precedence for picking the key message among the three specialist pillars.
const KEY_MESSAGE_PRECEDENCE: [PillarId; 3] =
    [PillarId::Technical, PillarId::Content, PillarId::Authority];

fn key_message(pillar: PillarId) -> &'static str {
    match pillar {
        PillarId::Content => {
            "Content gaps and on-page optimization represent the primary growth lever."
        }
        PillarId::Authority => {
            "Authority constraints limit competitive reach regardless of content quality."
        }
        PillarId::Technical | PillarId::General => {
            "Technical barriers must be resolved before content investments can deliver full ROI."
        }
    }
}

fn pillar_entry(section: &SectionSummary) -> FindingsPillar {
    FindingsPillar {
        priority: section.priority,
        issues: section.issues.clone(),
        actions: section.actions.clone(),
    }
}

/// Build the cross-pillar findings slide from the four section summaries.
pub fn build_findings_summary(
    sections: &BTreeMap<PillarId, SectionSummary>,
) -> Result<FindingsSummary> {
    let section = |pillar: PillarId| {
        sections
            .get(&pillar)
            .ok_or_else(|| InsightError::IncompleteSectionSet {
                missing: PillarId::ALL
                    .into_iter()
                    .filter(|p| !sections.contains_key(p))
                    .collect(),
            })
    };

    let general = section(PillarId::General)?;
    let technical = section(PillarId::Technical)?;
    let content = section(PillarId::Content)?;
    let authority = section(PillarId::Authority)?;

    let lead = dominant_among(sections, &KEY_MESSAGE_PRECEDENCE).unwrap_or(PillarId::Technical);

    Ok(FindingsSummary {
        key_message: key_message(lead).to_string(),
        subtitle: general.key_highlight.clone(),
        technical: pillar_entry(technical),
        content: pillar_entry(content),
        authority: pillar_entry(authority),
    })
}
