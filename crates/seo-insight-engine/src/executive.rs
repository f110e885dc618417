// ABOUTME: Executive synthesis over exactly four section summaries
// ABOUTME: Each pillar's text restates its own headline and top issue; any foreign token is rejected
use lazy_static::lazy_static;
use regex::Regex;
use seo_insight_core::{
    ExecutiveSummary, InsightError, PillarId, Priority, Result, SectionSummary,
};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[[:alnum:]]+").expect("valid token regex");
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN.find_iter(text).map(|m| m.as_str().to_lowercase())
}

fn sentence_body(text: &str) -> &str {
    text.trim().trim_end_matches(['.', '!', '?'])
}

/// Reject `text` if it carries a token absent from the section's headline,
/// issues and impacts.
pub fn check_closed_world(pillar: PillarId, text: &str, section: &SectionSummary) -> Result<()> {
    let admitted: HashSet<String> = tokens(&section.key_highlight)
        .chain(section.issues.iter().flat_map(|issue| tokens(issue)))
        .chain(section.impacts.iter().flat_map(|impact| tokens(impact)))
        .collect();

    match TOKEN
        .find_iter(text)
        .find(|m| !admitted.contains(&m.as_str().to_lowercase()))
    {
        Some(m) => Err(InsightError::ClosedWorld {
            pillar,
            token: m.as_str().to_string(),
        }),
        None => Ok(()),
    }
}

/// Pillar with the highest section priority, ties resolved by theme precedence.
pub fn dominant_theme(sections: &BTreeMap<PillarId, SectionSummary>) -> Option<PillarId> {
    dominant_among(sections, &PillarId::THEME_PRECEDENCE)
}

pub(crate) fn dominant_among(
    sections: &BTreeMap<PillarId, SectionSummary>,
    precedence: &[PillarId],
) -> Option<PillarId> {
    let mut best: Option<(PillarId, Priority)> = None;
    for pillar in precedence {
        if let Some(section) = sections.get(pillar) {
            if best.map_or(true, |(_, priority)| section.priority > priority) {
                best = Some((*pillar, section.priority));
            }
        }
    }
    best.map(|(pillar, _)| pillar)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutiveSynthesizer;

impl ExecutiveSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(
        &self,
        sections: &BTreeMap<PillarId, SectionSummary>,
    ) -> Result<ExecutiveSummary> {
        let missing: Vec<PillarId> = PillarId::ALL
            .into_iter()
            .filter(|pillar| !sections.contains_key(pillar))
            .collect();
        if !missing.is_empty() {
            return Err(InsightError::IncompleteSectionSet { missing });
        }

        let mut texts = BTreeMap::new();
        for (pillar, section) in sections {
            texts.insert(*pillar, self.pillar_text(*pillar, section)?);
        }

        let mut take = |pillar: PillarId| texts.remove(&pillar).unwrap_or_default();
        Ok(ExecutiveSummary {
            general: take(PillarId::General),
            content: take(PillarId::Content),
            technical: take(PillarId::Technical),
            authority: take(PillarId::Authority),
        })
    }

    /// `"<keyHighlight>. <top issue>: <its impact>."`
    pub fn pillar_text(&self, pillar: PillarId, section: &SectionSummary) -> Result<String> {
        if !section.is_aligned() {
            return Err(InsightError::MisalignedSection { pillar });
        }

        let headline = sentence_body(&section.key_highlight);
        let text = match section.top_issue() {
            Some((issue, impact)) => format!(
                "{}. {}: {}.",
                headline,
                sentence_body(issue),
                sentence_body(impact)
            ),
            None => format!("{}.", headline),
        };

        check_closed_world(pillar, &text, section)?;
        debug!(pillar = %pillar, "executive text composed");
        Ok(text)
    }
}
