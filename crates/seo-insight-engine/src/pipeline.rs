// ABOUTME: Run-level state machine: Ingested -> Classified -> Synthesized -> Aggregated -> Validated -> ExecutiveReady
// ABOUTME: Topic work fans out over rayon and joins before aggregation; any failure halts the run with its stage
use crate::aggregator::SectionAggregator;
use crate::classifier::PriorityClassifier;
use crate::consistency::ConsistencyValidator;
use crate::executive::{dominant_theme, ExecutiveSynthesizer};
use crate::finding::Finding;
use crate::findings_summary::build_findings_summary;
use crate::narrative::NarrativeCatalog;
use crate::synthesizer::FindingSynthesizer;
use rayon::prelude::*;
use seo_insight_core::{
    AuditMetadata, DateRange, InsightConfig, InsightError, InsightReport, MetricRecord,
    MetricSource, PillarId, Priority, Result, SectionSummary, TopicId,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Ingested,
    Classified,
    Synthesized,
    Aggregated,
    Validated,
    ExecutiveReady,
}

impl PipelineStage {
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Ingested => Some(PipelineStage::Classified),
            PipelineStage::Classified => Some(PipelineStage::Synthesized),
            PipelineStage::Synthesized => Some(PipelineStage::Aggregated),
            PipelineStage::Aggregated => Some(PipelineStage::Validated),
            PipelineStage::Validated => Some(PipelineStage::ExecutiveReady),
            PipelineStage::ExecutiveReady => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PipelineStage::ExecutiveReady
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Ingested => "ingested",
            PipelineStage::Classified => "classified",
            PipelineStage::Synthesized => "synthesized",
            PipelineStage::Aggregated => "aggregated",
            PipelineStage::Validated => "validated",
            PipelineStage::ExecutiveReady => "executive-ready",
        };
        f.write_str(s)
    }
}

/// A run that stopped before `ExecutiveReady`. `stage` is the stage that could not be reached.
#[derive(Error, Debug)]
#[error("pipeline halted at stage '{stage}': {error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: InsightError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: InsightError) -> Self {
        Self { stage, error }
    }

    pub fn topic(&self) -> Option<TopicId> {
        self.error.topic()
    }

    pub fn pillar(&self) -> Option<PillarId> {
        self.error.pillar()
    }
}

trait AtStage<T> {
    fn at(self, stage: PipelineStage) -> std::result::Result<T, PipelineFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: PipelineStage) -> std::result::Result<T, PipelineFailure> {
        self.map_err(|error| PipelineFailure::new(stage, error))
    }
}

/// One audit run over a topic -> record map, configured for a single website type.
pub struct InsightPipeline {
    config: InsightConfig,
    brand_name: Option<String>,
    classifier: PriorityClassifier,
    synthesizer: FindingSynthesizer,
    aggregator: SectionAggregator,
    executive: ExecutiveSynthesizer,
    validator: ConsistencyValidator,
}

impl InsightPipeline {
    /// Rejects configurations that fail [`InsightConfig::validate`].
    pub fn new(config: InsightConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(NarrativeCatalog::new()?);
        Ok(Self {
            classifier: PriorityClassifier::new(config.website_type),
            synthesizer: FindingSynthesizer::new(Arc::clone(&catalog)),
            aggregator: SectionAggregator::new(catalog)
                .with_max_items(config.engine.max_section_items),
            executive: ExecutiveSynthesizer::new(),
            validator: ConsistencyValidator::new(),
            brand_name: None,
            config,
        })
    }

    /// Swap the narrative templates used for synthesis and section actions.
    pub fn with_catalog(mut self, catalog: Arc<NarrativeCatalog>) -> Self {
        self.synthesizer = FindingSynthesizer::new(Arc::clone(&catalog));
        self.aggregator =
            SectionAggregator::new(catalog).with_max_items(self.config.engine.max_section_items);
        self
    }

    pub fn with_brand_name(mut self, brand_name: impl Into<String>) -> Self {
        self.brand_name = Some(brand_name.into());
        self
    }

    pub fn with_classifier(mut self, classifier: PriorityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_validator(mut self, validator: ConsistencyValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn classifier(&self) -> &PriorityClassifier {
        &self.classifier
    }

    pub fn run_source<S: MetricSource + ?Sized>(
        &self,
        source: &S,
    ) -> std::result::Result<InsightReport, PipelineFailure> {
        let records = source.load().at(PipelineStage::Ingested)?;
        self.run(records)
    }

    pub fn run(
        &self,
        records: BTreeMap<TopicId, MetricRecord>,
    ) -> std::result::Result<InsightReport, PipelineFailure> {
        info!(
            stage = %PipelineStage::Ingested,
            website_type = %self.config.website_type,
            topics = records.len(),
            "pipeline started"
        );
        let audit_period = DateRange::spanning(records.values().map(|record| &record.period));
        let records: Vec<(TopicId, Arc<MetricRecord>)> = records
            .into_iter()
            .map(|(topic, record)| (topic, Arc::new(record)))
            .collect();

        let classified = self
            .map_topics(&records, |(topic, record)| {
                let priority = self.classifier.classify(*topic, record)?;
                Ok((*topic, Arc::clone(record), priority))
            })
            .at(PipelineStage::Classified)?;
        info!(stage = %PipelineStage::Classified, topics = classified.len(), "stage complete");

        let findings = self
            .map_topics(&classified, |(topic, record, priority)| {
                self.synthesize(*topic, record, *priority)
            })
            .at(PipelineStage::Synthesized)?;
        info!(stage = %PipelineStage::Synthesized, findings = findings.len(), "stage complete");

        let sections = self.aggregate(&findings).at(PipelineStage::Aggregated)?;
        // every section holds a finding, so at least one record was ingested
        let audit_period = audit_period
            .ok_or(InsightError::EmptySection {
                pillar: PillarId::General,
            })
            .at(PipelineStage::Aggregated)?;
        info!(stage = %PipelineStage::Aggregated, sections = sections.len(), "stage complete");

        let conflicts = self.validator.validate(&findings);
        if !conflicts.is_empty() {
            warn!(count = conflicts.len(), "conflicting findings reported");
        }
        info!(stage = %PipelineStage::Validated, conflicts = conflicts.len(), "stage complete");

        let executive_summary = self
            .executive
            .synthesize(&sections)
            .at(PipelineStage::ExecutiveReady)?;
        let findings_summary =
            build_findings_summary(&sections).at(PipelineStage::ExecutiveReady)?;
        let dominant_theme = dominant_theme(&sections).unwrap_or(PillarId::General);
        info!(
            stage = %PipelineStage::ExecutiveReady,
            dominant_theme = %dominant_theme,
            "pipeline complete"
        );

        Ok(InsightReport {
            website_type: self.config.website_type,
            metadata: AuditMetadata {
                brand_name: self.brand_name.clone(),
                audit_period,
            },
            section_summaries: sections,
            executive_summary,
            dominant_theme,
            findings_summary,
            conflicts,
        })
    }

    /// Primary template first; a format violation retries once with the fallback when allowed.
    fn synthesize(
        &self,
        topic: TopicId,
        record: &Arc<MetricRecord>,
        priority: Priority,
    ) -> Result<Finding> {
        match self.synthesizer.synthesize(topic, record, priority) {
            Err(err @ InsightError::MessageFormat { .. })
                if self.config.engine.allow_fallback_templates =>
            {
                warn!(
                    topic = %topic,
                    error = %err,
                    "message rejected, retrying with fallback template"
                );
                self.synthesizer.synthesize_fallback(topic, record, priority)
            }
            other => other,
        }
    }

    fn aggregate(&self, findings: &[Finding]) -> Result<BTreeMap<PillarId, SectionSummary>> {
        PillarId::ALL
            .into_iter()
            .map(|pillar| {
                let members: Vec<Finding> = findings
                    .iter()
                    .filter(|f| f.topic().pillar() == pillar)
                    .cloned()
                    .collect();
                self.aggregator
                    .aggregate(pillar, &members)
                    .map(|summary| (pillar, summary))
            })
            .collect()
    }

    /// Map over topics in declaration order, in parallel when configured.
    /// Output order matches input order. When several topics fail, the error
    /// reported is the one earliest in that order, on either path.
    fn map_topics<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> Result<U> + Sync + Send,
    {
        if self.config.engine.parallel_topics {
            let results: Vec<Result<U>> = items.par_iter().map(f).collect();
            results.into_iter().collect()
        } else {
            items.iter().map(f).collect()
        }
    }
}
