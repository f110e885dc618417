pub mod aggregator;
pub mod classifier;
pub mod consistency;
pub mod executive;
pub mod finding;
pub mod findings_summary;
pub mod narrative;
pub mod pipeline;
pub mod rules;
pub mod synthesizer;
pub mod template;
pub mod topics;

pub use aggregator::SectionAggregator;
pub use classifier::PriorityClassifier;
pub use consistency::{default_relationships, ConsistencyValidator, Relationship};
pub use executive::{check_closed_world, dominant_theme, ExecutiveSynthesizer};
pub use finding::Finding;
pub use findings_summary::build_findings_summary;
pub use narrative::{headline, NarrativeCatalog, TopicNarrative};
pub use pipeline::{InsightPipeline, PipelineFailure, PipelineStage};
pub use rules::{Classification, Comparison, Operand, Predicate, Rule, RuleTable};
pub use synthesizer::FindingSynthesizer;
pub use template::{
    MessageTemplate, RenderedMessage, SlotFormat, Template, TemplateError, TransitionWord,
    MAX_ISSUE_WORDS, MAX_MESSAGE_WORDS,
};
pub use topics::{polarity_axis, polarity_for, rule_table, ThresholdProfile};
