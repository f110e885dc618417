use crate::finding::Finding;
use crate::narrative::{headline, NarrativeCatalog};
use seo_insight_core::{EngineConfig, InsightError, PillarId, Result, SectionSummary};
use std::sync::Arc;
use tracing::debug;

/// Selects the top findings of a pillar and expresses them as aligned
/// issue/impact/action triples.
#[derive(Debug, Clone)]
pub struct SectionAggregator {
    catalog: Arc<NarrativeCatalog>,
    max_items: usize,
}

impl SectionAggregator {
    pub fn new(catalog: Arc<NarrativeCatalog>) -> Self {
        Self {
            catalog,
            max_items: EngineConfig::MAX_SECTION_ITEMS,
        }
    }

    /// Cap the number of surfaced findings, clamped to `1..=MAX_SECTION_ITEMS`.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.clamp(1, EngineConfig::MAX_SECTION_ITEMS);
        self
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn aggregate(&self, pillar: PillarId, findings: &[Finding]) -> Result<SectionSummary> {
        if findings.is_empty() {
            return Err(InsightError::EmptySection { pillar });
        }
        if let Some(stray) = findings.iter().find(|f| f.topic().pillar() != pillar) {
            return Err(InsightError::PillarMismatch {
                pillar,
                topic: stray.topic(),
            });
        }

        // sort_by is stable: equal priorities keep their input order
        let mut ranked: Vec<&Finding> = findings.iter().collect();
        ranked.sort_by(|a, b| b.priority().cmp(&a.priority()));
        ranked.truncate(self.max_items);

        let top = ranked[0];
        let priority = ranked
            .iter()
            .map(|f| f.priority())
            .max()
            .unwrap_or(top.priority());

        let mut issues = Vec::with_capacity(ranked.len());
        let mut impacts = Vec::with_capacity(ranked.len());
        let mut actions = Vec::with_capacity(ranked.len());
        for finding in &ranked {
            let narrative = self.catalog.topic(finding.topic())?;
            issues.push(finding.issue().to_string());
            impacts.push(finding.impact());
            actions.push(narrative.action(finding.priority(), finding.metrics())?);
        }

        debug!(
            pillar = %pillar,
            priority = %priority,
            selected = ranked.len(),
            available = findings.len(),
            "section aggregated"
        );

        Ok(SectionSummary {
            section_id: pillar,
            key_highlight: headline(pillar, priority).to_string(),
            observation: top.observation().to_string(),
            priority,
            issues,
            impacts,
            actions,
        })
    }
}
