// ABOUTME: Derived narrative values computed fresh for every run
// ABOUTME: Section summaries, executive summary, conflict reports and the output document
use crate::config::WebsiteType;
use crate::types::{DateRange, PillarId, Polarity, Priority, TopicId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top findings of one pillar as index-aligned issue/impact/action triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub section_id: PillarId,
    pub key_highlight: String,
    pub observation: String,
    pub priority: Priority,
    pub issues: Vec<String>,
    pub impacts: Vec<String>,
    pub actions: Vec<String>,
}

impl SectionSummary {
    pub fn is_aligned(&self) -> bool {
        self.issues.len() == self.impacts.len() && self.impacts.len() == self.actions.len()
    }

    /// Highest-priority issue together with its impact.
    pub fn top_issue(&self) -> Option<(&str, &str)> {
        Some((self.issues.first()?.as_str(), self.impacts.first()?.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveSummary {
    pub general: String,
    pub content: String,
    pub technical: String,
    pub authority: String,
}

impl ExecutiveSummary {
    pub fn get(&self, pillar: PillarId) -> &str {
        match pillar {
            PillarId::General => &self.general,
            PillarId::Content => &self.content,
            PillarId::Technical => &self.technical,
            PillarId::Authority => &self.authority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindingsPillar {
    pub priority: Priority,
    pub issues: Vec<String>,
    pub actions: Vec<String>,
}

/// Cross-pillar findings slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindingsSummary {
    pub key_message: String,
    pub subtitle: String,
    pub technical: FindingsPillar,
    pub content: FindingsPillar,
    pub authority: FindingsPillar,
}

/// Identifies a finding inside a conflict report without copying its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindingRef {
    pub topic: TopicId,
    pub priority: Priority,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionBasis {
    SampleSize,
    Recency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFinding {
    pub preferred: FindingRef,
    pub basis: ResolutionBasis,
    pub harmonized_phrasing: String,
}

/// Advisory record of two findings whose polarities contradict each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicting_pair: (FindingRef, FindingRef),
    pub rationale: String,
    pub resolution: Option<ResolvedFinding>,
}

impl ConflictReport {
    pub fn involves(&self, topic: TopicId) -> bool {
        self.conflicting_pair.0.topic == topic || self.conflicting_pair.1.topic == topic
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

/// Who the audit is for and the span of data it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    pub brand_name: Option<String>,
    pub audit_period: DateRange,
}

/// Document handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub website_type: WebsiteType,
    pub metadata: AuditMetadata,
    pub section_summaries: BTreeMap<PillarId, SectionSummary>,
    pub executive_summary: ExecutiveSummary,
    pub dominant_theme: PillarId,
    pub findings_summary: FindingsSummary,
    pub conflicts: Vec<ConflictReport>,
}
