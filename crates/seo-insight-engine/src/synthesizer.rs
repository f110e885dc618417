use crate::finding::Finding;
use crate::narrative::NarrativeCatalog;
use crate::template::MessageTemplate;
use seo_insight_core::{InsightError, MetricRecord, Priority, Result, TopicId};
use std::sync::Arc;
use tracing::debug;

/// Turns a classified metric record into a [`Finding`].
#[derive(Debug, Clone)]
pub struct FindingSynthesizer {
    catalog: Arc<NarrativeCatalog>,
}

impl FindingSynthesizer {
    pub fn new(catalog: Arc<NarrativeCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &NarrativeCatalog {
        &self.catalog
    }

    /// Render the topic's message template for `priority` and validate it.
    ///
    /// `priority` is taken as given and should be the classification of
    /// `metrics`; the finding carries it unchanged.
    ///
    /// A rendered message that breaks the format contract is returned as
    /// `InsightError::MessageFormat`; nothing is truncated or rewritten.
    pub fn synthesize(
        &self,
        topic: TopicId,
        metrics: &Arc<MetricRecord>,
        priority: Priority,
    ) -> Result<Finding> {
        let template = self.catalog.topic(topic)?.message(priority);
        self.build(topic, metrics, priority, template, false)
    }

    /// Same as [`synthesize`](Self::synthesize) using the topic's fallback template.
    pub fn synthesize_fallback(
        &self,
        topic: TopicId,
        metrics: &Arc<MetricRecord>,
        priority: Priority,
    ) -> Result<Finding> {
        let template = self.catalog.topic(topic)?.fallback();
        self.build(topic, metrics, priority, template, true)
    }

    /// Synthesize with a caller-supplied message template.
    pub fn synthesize_with(
        &self,
        topic: TopicId,
        metrics: &Arc<MetricRecord>,
        priority: Priority,
        template: &MessageTemplate,
    ) -> Result<Finding> {
        self.build(topic, metrics, priority, template, false)
    }

    fn build(
        &self,
        topic: TopicId,
        metrics: &Arc<MetricRecord>,
        priority: Priority,
        template: &MessageTemplate,
        used_fallback: bool,
    ) -> Result<Finding> {
        if metrics.topic != topic {
            return Err(InsightError::TopicMismatch {
                expected: topic,
                found: metrics.topic,
            });
        }

        let message = template.render(metrics)?;
        message.validate(topic)?;
        let observation = self.catalog.topic(topic)?.observation(metrics)?;

        debug!(
            topic = %topic,
            priority = %priority,
            fallback = used_fallback,
            "finding synthesized"
        );
        Ok(Finding::new(
            topic,
            priority,
            message,
            observation,
            used_fallback,
            Arc::clone(metrics),
        ))
    }
}
