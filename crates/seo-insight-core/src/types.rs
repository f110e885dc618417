// ABOUTME: Normalized measurement types shared by the engine and its collaborators
// ABOUTME: Topic and pillar identifiers, priorities, polarity tags and metric records
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One analysis area. Declaration order is the stable tie-break order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TopicId {
    OrganicTraffic,
    Competitive,
    Engagement,
    SiteHealth,
    MetaTags,
    KeywordGap,
    KeywordIntent,
    TechnicalIssues,
    DomainAuthority,
}

impl TopicId {
    pub const ALL: [TopicId; 9] = [
        TopicId::OrganicTraffic,
        TopicId::Competitive,
        TopicId::Engagement,
        TopicId::SiteHealth,
        TopicId::MetaTags,
        TopicId::KeywordGap,
        TopicId::KeywordIntent,
        TopicId::TechnicalIssues,
        TopicId::DomainAuthority,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicId::OrganicTraffic => "organic_traffic",
            TopicId::Competitive => "competitive",
            TopicId::Engagement => "engagement",
            TopicId::SiteHealth => "site_health",
            TopicId::MetaTags => "meta_tags",
            TopicId::KeywordGap => "keyword_gap",
            TopicId::KeywordIntent => "keyword_intent",
            TopicId::TechnicalIssues => "technical_issues",
            TopicId::DomainAuthority => "domain_authority",
        }
    }

    /// Pillar this topic reports into.
    pub fn pillar(&self) -> PillarId {
        match self {
            TopicId::OrganicTraffic
            | TopicId::Competitive
            | TopicId::Engagement
            | TopicId::SiteHealth => PillarId::General,
            TopicId::MetaTags | TopicId::KeywordGap | TopicId::KeywordIntent => PillarId::Content,
            TopicId::TechnicalIssues => PillarId::Technical,
            TopicId::DomainAuthority => PillarId::Authority,
        }
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicId::ALL
            .iter()
            .copied()
            .find(|topic| topic.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown topic: {}", s))
    }
}

/// Top-level grouping feeding the executive summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PillarId {
    General,
    Content,
    Technical,
    Authority,
}

impl PillarId {
    pub const ALL: [PillarId; 4] = [
        PillarId::General,
        PillarId::Content,
        PillarId::Technical,
        PillarId::Authority,
    ];

    /// Precedence used when two pillars share the highest priority.
    /// Traffic and technical blockers are usually the root cause, so they lead.
    pub const THEME_PRECEDENCE: [PillarId; 4] = [
        PillarId::General,
        PillarId::Technical,
        PillarId::Content,
        PillarId::Authority,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PillarId::General => "general",
            PillarId::Content => "content",
            PillarId::Technical => "technical",
            PillarId::Authority => "authority",
        }
    }

    /// Slide title of the pillar's section summary.
    pub fn title(&self) -> &'static str {
        match self {
            PillarId::General => "Where You Stand",
            PillarId::Content => "Content SEO",
            PillarId::Technical => "Technical SEO",
            PillarId::Authority => "Domain Authority",
        }
    }

    pub fn topics(&self) -> impl Iterator<Item = TopicId> + '_ {
        TopicId::ALL
            .into_iter()
            .filter(move |topic| topic.pillar() == *self)
    }
}

impl fmt::Display for PillarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PillarId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PillarId::ALL
            .iter()
            .copied()
            .find(|pillar| pillar.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown pillar: {}", s))
    }
}

/// Severity of a finding. `Critical > High > Medium > Low`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Slide badge letter.
    pub fn badge(&self) -> char {
        match self {
            Priority::Low => 'L',
            Priority::Medium => 'M',
            Priority::High => 'H',
            Priority::Critical => 'C',
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Direction-of-effect tag attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    Weak,
    Strong,
    Constrained,
    NoConstraint,
    Declining,
    Growing,
    Neutral,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Polarity::Weak => "weak",
            Polarity::Strong => "strong",
            Polarity::Constrained => "constrained",
            Polarity::NoConstraint => "no-constraint",
            Polarity::Declining => "declining",
            Polarity::Growing => "growing",
            Polarity::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// A single measured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Integer(v) => Some(*v as f64),
            ScalarValue::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    #[schemars(with = "String")]
    pub start: NaiveDate,
    #[schemars(with = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Earliest start to latest end over `ranges`, `None` when empty.
    pub fn spanning<'a>(ranges: impl IntoIterator<Item = &'a DateRange>) -> Option<DateRange> {
        ranges.into_iter().fold(None, |acc, range| {
            Some(match acc {
                None => *range,
                Some(span) => DateRange::new(span.start.min(range.start), span.end.max(range.end)),
            })
        })
    }
}

/// Field carrying the number of observations behind a record.
pub const SAMPLE_SIZE_FIELD: &str = "sampleSize";

/// Normalized measurement for one topic, produced by ingestion and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricRecord {
    pub topic: TopicId,
    #[serde(default)]
    pub fields: BTreeMap<String, ScalarValue>,
    pub period: DateRange,
}

impl MetricRecord {
    pub fn new(topic: TopicId, period: DateRange) -> Self {
        Self {
            topic,
            fields: BTreeMap::new(),
            period,
        }
    }

    /// Builder-style field insertion used by ingestion adapters and tests.
    pub fn with_field(mut self, name: &str, value: impl Into<ScalarValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&ScalarValue> {
        self.fields.get(name)
    }

    pub fn sample_size(&self) -> Option<f64> {
        self.field(SAMPLE_SIZE_FIELD).and_then(ScalarValue::as_f64)
    }
}
