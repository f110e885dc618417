use crate::{InsightReport, MetricRecord, Result, TopicId};
use std::collections::BTreeMap;

/// Ingestion collaborator: yields one normalized record per recognized topic.
pub trait MetricSource {
    fn load(&self) -> Result<BTreeMap<TopicId, MetricRecord>>;
}

/// Rendering collaborator: consumes the finished document.
pub trait ReportSink {
    fn publish(&mut self, report: &InsightReport) -> Result<()>;
}
