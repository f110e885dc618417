use crate::rules::{Classification, RuleTable};
use crate::topics::{rule_table, ThresholdProfile};
use seo_insight_core::{InsightError, MetricRecord, Priority, Result, TopicId, WebsiteType};
use std::collections::BTreeMap;
use tracing::debug;

/// Maps a topic's metric record to a priority using that topic's rule table.
///
/// Built once per run for a website type; classification is a pure lookup over
/// immutable tables, so one classifier can be shared across threads.
#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    website_type: WebsiteType,
    tables: BTreeMap<TopicId, RuleTable>,
}

impl PriorityClassifier {
    pub fn new(website_type: WebsiteType) -> Self {
        let profile = ThresholdProfile::for_website(website_type);
        let tables = TopicId::ALL
            .into_iter()
            .map(|topic| (topic, rule_table(topic, &profile)))
            .collect();
        Self {
            website_type,
            tables,
        }
    }

    /// Classifier over a custom set of tables. Topics without a table fail to classify.
    pub fn from_tables(
        website_type: WebsiteType,
        tables: impl IntoIterator<Item = RuleTable>,
    ) -> Self {
        Self {
            website_type,
            tables: tables.into_iter().map(|table| (table.topic, table)).collect(),
        }
    }

    /// Replace one topic's table.
    pub fn with_table(mut self, table: RuleTable) -> Self {
        self.tables.insert(table.topic, table);
        self
    }

    pub fn website_type(&self) -> WebsiteType {
        self.website_type
    }

    pub fn table(&self, topic: TopicId) -> Option<&RuleTable> {
        self.tables.get(&topic)
    }

    pub fn classify(&self, topic: TopicId, metrics: &MetricRecord) -> Result<Priority> {
        self.classify_detailed(topic, metrics)
            .map(|classification| classification.priority)
    }

    pub fn classify_detailed(
        &self,
        topic: TopicId,
        metrics: &MetricRecord,
    ) -> Result<Classification> {
        if metrics.topic != topic {
            return Err(InsightError::TopicMismatch {
                expected: topic,
                found: metrics.topic,
            });
        }

        let table = self
            .tables
            .get(&topic)
            .ok_or(InsightError::RuleTableMissing { topic })?;
        let classification = table.evaluate(metrics)?;

        match classification.matched_rule {
            Some(index) => debug!(
                topic = %topic,
                priority = %classification.priority,
                rule = %table.rules[index].predicate,
                "topic classified"
            ),
            None => debug!(topic = %topic, "no rule matched, defaulting to Low"),
        }

        Ok(classification)
    }
}
