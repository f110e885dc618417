use crate::config::ConfigError;
use crate::types::{PillarId, TopicId};
use std::fmt;
use thiserror::Error;

/// Which part of the single-sentence message contract a rendered message broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFormatViolation {
    NotSingleSentence { terminators: usize },
    MissingTransitionWord,
    TooManyWords { max: usize, actual: usize },
    ProblemClauseTooLong { max: usize, actual: usize },
    MissingConsequence,
}

impl fmt::Display for MessageFormatViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSingleSentence { terminators } => {
                write!(f, "expected exactly one sentence, found {} terminators", terminators)
            }
            Self::MissingTransitionWord => write!(f, "no transition word present"),
            Self::TooManyWords { max, actual } => {
                write!(f, "{} words exceeds the limit of {}", actual, max)
            }
            Self::ProblemClauseTooLong { max, actual } => {
                write!(f, "problem clause has {} words, limit is {}", actual, max)
            }
            Self::MissingConsequence => write!(f, "message does not end on a consequence"),
        }
    }
}

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Missing metric for topic '{topic}': field '{field}' is required")]
    MissingMetric { topic: TopicId, field: String },

    #[error("Invalid metric for topic '{topic}': field '{field}' {reason}")]
    InvalidMetric {
        topic: TopicId,
        field: String,
        reason: String,
    },

    #[error("Metric record for topic '{found}' submitted under topic '{expected}'")]
    TopicMismatch { expected: TopicId, found: TopicId },

    #[error("Message for topic '{topic}' violates the format contract ({violation}): {message}")]
    MessageFormat {
        topic: TopicId,
        message: String,
        violation: MessageFormatViolation,
    },

    #[error("No rule table registered for topic '{topic}'")]
    RuleTableMissing { topic: TopicId },

    #[error("Template error for topic '{topic}': {reason}")]
    Template { topic: TopicId, reason: String },

    #[error("Section '{pillar}' received no findings")]
    EmptySection { pillar: PillarId },

    #[error("Finding for topic '{topic}' does not belong to section '{pillar}'")]
    PillarMismatch { pillar: PillarId, topic: TopicId },

    #[error("Section '{pillar}' has misaligned issues, impacts and actions")]
    MisalignedSection { pillar: PillarId },

    #[error("Executive synthesis requires all four pillars, missing: {}", format_pillars(.missing))]
    IncompleteSectionSet { missing: Vec<PillarId> },

    #[error("Executive text for '{pillar}' contains '{token}' which is not traceable to its section summary")]
    ClosedWorld { pillar: PillarId, token: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InsightError {
    /// Topic the failure is attributed to, if any.
    pub fn topic(&self) -> Option<TopicId> {
        match self {
            Self::MissingMetric { topic, .. }
            | Self::InvalidMetric { topic, .. }
            | Self::MessageFormat { topic, .. }
            | Self::RuleTableMissing { topic }
            | Self::Template { topic, .. }
            | Self::PillarMismatch { topic, .. } => Some(*topic),
            Self::TopicMismatch { expected, .. } => Some(*expected),
            _ => None,
        }
    }

    /// Pillar the failure is attributed to, if any.
    pub fn pillar(&self) -> Option<PillarId> {
        match self {
            Self::EmptySection { pillar }
            | Self::PillarMismatch { pillar, .. }
            | Self::MisalignedSection { pillar }
            | Self::ClosedWorld { pillar, .. } => Some(*pillar),
            Self::IncompleteSectionSet { missing } => missing.first().copied(),
            _ => self.topic().map(|topic| topic.pillar()),
        }
    }
}

fn format_pillars(pillars: &[PillarId]) -> String {
    pillars
        .iter()
        .map(PillarId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, InsightError>;
