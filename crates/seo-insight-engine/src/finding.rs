use crate::template::{capitalize_first, RenderedMessage, TransitionWord};
use crate::topics::polarity_for;
use seo_insight_core::{FindingRef, MetricRecord, Polarity, Priority, TopicId};
use std::sync::Arc;

/// A classified, templated insight for one topic.
///
/// Findings are only built by [`crate::FindingSynthesizer`] and expose no
/// mutators. The priority is the one handed to the synthesizer and polarity is
/// derived from it; [`crate::InsightPipeline`] always passes the classifier's
/// verdict for the same record.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    topic: TopicId,
    priority: Priority,
    polarity: Polarity,
    message: RenderedMessage,
    observation: String,
    used_fallback: bool,
    metrics: Arc<MetricRecord>,
}

impl Finding {
    pub(crate) fn new(
        topic: TopicId,
        priority: Priority,
        message: RenderedMessage,
        observation: String,
        used_fallback: bool,
        metrics: Arc<MetricRecord>,
    ) -> Self {
        Self {
            topic,
            priority,
            polarity: polarity_for(topic, priority),
            message,
            observation,
            used_fallback,
            metrics,
        }
    }

    pub fn topic(&self) -> TopicId {
        self.topic
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// The full single-sentence message.
    pub fn message(&self) -> &str {
        &self.message.text
    }

    pub fn transition(&self) -> TransitionWord {
        self.message.transition
    }

    /// Problem clause, already capitalized.
    pub fn issue(&self) -> &str {
        &self.message.problem
    }

    /// Consequence clause without its transition word, capitalized.
    pub fn impact(&self) -> String {
        capitalize_first(&self.message.consequence)
    }

    pub fn observation(&self) -> &str {
        &self.observation
    }

    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Read-only back-reference to the record this finding was derived from.
    pub fn metrics(&self) -> &MetricRecord {
        &self.metrics
    }

    pub fn to_ref(&self) -> FindingRef {
        FindingRef {
            topic: self.topic,
            priority: self.priority,
            polarity: self.polarity,
        }
    }
}
