use chrono::NaiveDate;
use seo_insight_core::{
    DateRange, EngineConfig, InsightConfig, InsightError, MetricRecord, PillarId, Polarity,
    Priority, TopicId, WebsiteType,
};
use seo_insight_engine::{
    ConsistencyValidator, Finding, FindingSynthesizer, InsightPipeline, NarrativeCatalog,
    Operand, PipelineStage, Predicate, PriorityClassifier, RuleTable, SectionAggregator,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn record(topic: TopicId, fields: &[(&str, f64)]) -> MetricRecord {
    let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    fields
        .iter()
        .fold(MetricRecord::new(topic, DateRange::new(start, end)), |rec, (name, value)| {
            rec.with_field(name, *value)
        })
}

/// site_health and meta_tags critical, technical medium, the rest healthy.
fn scenario_records() -> BTreeMap<TopicId, MetricRecord> {
    [
        record(
            TopicId::OrganicTraffic,
            &[("organicPct", 62.0), ("page2PlusPct", 30.0), ("yoyChangePct", 4.0)],
        ),
        record(
            TopicId::Competitive,
            &[("trafficSharePct", 75.0), ("page1KeywordSharePct", 40.0)],
        ),
        record(TopicId::SiteHealth, &[("score", 55.0)]),
        record(TopicId::MetaTags, &[("titleIssuePct", 25.0)]),
        record(
            TopicId::TechnicalIssues,
            &[("blockedPagesPct", 6.0), ("errorCount", 40.0)],
        ),
        record(
            TopicId::DomainAuthority,
            &[("domainRating", 50.0), ("competitorAvgDr", 52.0)],
        ),
    ]
    .into_iter()
    .map(|rec| (rec.topic, rec))
    .collect()
}

struct Engine {
    classifier: PriorityClassifier,
    synthesizer: FindingSynthesizer,
    aggregator: SectionAggregator,
}

impl Engine {
    fn new(website_type: WebsiteType) -> Self {
        let catalog = Arc::new(NarrativeCatalog::new().unwrap());
        Self {
            classifier: PriorityClassifier::new(website_type),
            synthesizer: FindingSynthesizer::new(Arc::clone(&catalog)),
            aggregator: SectionAggregator::new(catalog),
        }
    }

    fn finding(&self, rec: MetricRecord) -> Finding {
        let topic = rec.topic;
        let priority = self.classifier.classify(topic, &rec).unwrap();
        self.synthesizer
            .synthesize(topic, &Arc::new(rec), priority)
            .unwrap()
    }
}

fn general_findings(engine: &Engine) -> Vec<Finding> {
    vec![
        engine.finding(record(
            TopicId::OrganicTraffic,
            &[("organicPct", 25.0), ("page2PlusPct", 55.0)],
        )),
        engine.finding(record(
            TopicId::Competitive,
            &[("trafficSharePct", 35.0), ("page1KeywordSharePct", 30.0)],
        )),
        engine.finding(record(
            TopicId::Engagement,
            &[("engagementRate", 45.0), ("trendPct", -5.0)],
        )),
        engine.finding(record(TopicId::SiteHealth, &[("score", 90.0)])),
    ]
}

#[test]
fn classification_is_deterministic() {
    let engine = Engine::new(WebsiteType::Saas);
    for (topic, rec) in scenario_records() {
        let first = engine.classifier.classify(topic, &rec).unwrap();
        let second = engine.classifier.classify(topic, &rec).unwrap();
        assert_eq!(first, second, "{topic}");
    }
}

#[test]
fn first_matching_rule_wins() {
    let table = RuleTable::new(TopicId::KeywordGap)
        .require(&["gapKeywords", "gapVolume"])
        .rule(Predicate::gt(Operand::field("gapKeywords"), 10.0), Priority::Critical)
        .rule(Predicate::gt(Operand::field("gapKeywords"), 5.0), Priority::High);
    let classifier = PriorityClassifier::new(WebsiteType::Ecommerce).with_table(table);

    let rec = record(
        TopicId::KeywordGap,
        &[("gapKeywords", 50.0), ("gapVolume", 900.0)],
    );
    assert_eq!(
        classifier.classify(TopicId::KeywordGap, &rec).unwrap(),
        Priority::Critical
    );

    let reversed = RuleTable::new(TopicId::KeywordGap)
        .require(&["gapKeywords", "gapVolume"])
        .rule(Predicate::gt(Operand::field("gapKeywords"), 5.0), Priority::High)
        .rule(Predicate::gt(Operand::field("gapKeywords"), 10.0), Priority::Critical);
    let classifier = PriorityClassifier::new(WebsiteType::Ecommerce).with_table(reversed);
    assert_eq!(
        classifier.classify(TopicId::KeywordGap, &rec).unwrap(),
        Priority::High
    );
}

#[test]
fn section_priority_is_the_max_of_selected_findings() {
    let engine = Engine::new(WebsiteType::Ecommerce);
    let findings = general_findings(&engine);

    for take in 1..=findings.len() {
        for max_items in 1..=3 {
            let subset = &findings[..take];
            let aggregator = engine.aggregator.clone().with_max_items(max_items);
            let summary = aggregator.aggregate(PillarId::General, subset).unwrap();

            let mut priorities: Vec<Priority> = subset.iter().map(Finding::priority).collect();
            priorities.sort_by(|a, b| b.cmp(a));
            priorities.truncate(max_items);
            let expected = priorities.into_iter().max().unwrap();
            assert_eq!(summary.priority, expected);
        }
    }
}

#[test]
fn issues_are_bounded_and_aligned() {
    let engine = Engine::new(WebsiteType::Ecommerce);
    let findings = general_findings(&engine);

    for take in 1..=findings.len() {
        let summary = engine
            .aggregator
            .aggregate(PillarId::General, &findings[..take])
            .unwrap();
        assert_eq!(summary.issues.len(), take.min(3));
        assert_eq!(summary.issues.len(), summary.impacts.len());
        assert_eq!(summary.impacts.len(), summary.actions.len());
    }
}

#[test]
fn section_size_above_three_is_never_surfaced() {
    let mut config = InsightConfig::default();
    config.engine.max_section_items = 10;
    assert!(matches!(InsightPipeline::new(config), Err(InsightError::Config(_))));

    let engine = Engine::new(WebsiteType::Ecommerce);
    let findings = general_findings(&engine);
    assert_eq!(findings.len(), 4);
    let summary = engine
        .aggregator
        .clone()
        .with_max_items(10)
        .aggregate(PillarId::General, &findings)
        .unwrap();
    assert_eq!(summary.issues.len(), EngineConfig::MAX_SECTION_ITEMS);
}

/// Scenario site health is Critical; its message here overruns the problem clause limit.
fn catalog_with_verbose_site_health() -> Arc<NarrativeCatalog> {
    let catalog = NarrativeCatalog::new()
        .unwrap()
        .with_message(
            TopicId::SiteHealth,
            Priority::Critical,
            "Site health score of {score:int} reflects a long and winding list of crawl \
             barriers across many key sections, causing skipped crawls on revenue pages.",
        )
        .unwrap();
    Arc::new(catalog)
}

#[test]
fn rejected_message_is_replaced_by_fallback() {
    let report = InsightPipeline::new(InsightConfig::default())
        .unwrap()
        .with_catalog(catalog_with_verbose_site_health())
        .run(scenario_records())
        .unwrap();

    let general = &report.section_summaries[&PillarId::General];
    assert_eq!(general.priority, Priority::Critical);
    assert_eq!(general.issues[0], "Site health needs repair");
    assert_eq!(general.impacts[0], "Search engines unable to crawl key pages");
    assert!(general.issues.iter().all(|issue| !issue.contains("winding")));
}

#[test]
fn rejected_message_halts_the_run_without_fallback() {
    let mut config = InsightConfig::default();
    config.engine.allow_fallback_templates = false;
    let failure = InsightPipeline::new(config)
        .unwrap()
        .with_catalog(catalog_with_verbose_site_health())
        .run(scenario_records())
        .unwrap_err();

    assert_eq!(failure.stage, PipelineStage::Synthesized);
    match failure.error {
        InsightError::MessageFormat { topic, message, .. } => {
            assert_eq!(topic, TopicId::SiteHealth);
            assert!(message.contains("winding list of crawl barriers"));
        }
        other => panic!("expected message format error, got {other:?}"),
    }
}

#[test]
fn equal_priorities_keep_topic_order_across_runs() {
    let engine = Engine::new(WebsiteType::Ecommerce);
    let findings = vec![
        engine.finding(record(TopicId::MetaTags, &[("titleIssuePct", 15.0)])),
        engine.finding(record(
            TopicId::KeywordGap,
            &[("gapKeywords", 2500.0), ("gapVolume", 20000.0)],
        )),
        engine.finding(record(
            TopicId::KeywordIntent,
            &[("informationalPct", 80.0), ("commercialPct", 15.0)],
        )),
    ];
    assert!(findings.iter().all(|f| f.priority() == Priority::High));

    let first = engine.aggregator.aggregate(PillarId::Content, &findings).unwrap();
    for _ in 0..10 {
        let again = engine.aggregator.aggregate(PillarId::Content, &findings).unwrap();
        assert_eq!(again.issues, first.issues);
    }
    assert_eq!(first.issues[0], findings[0].issue());
    assert_eq!(first.issues[2], findings[2].issue());
}

#[test]
fn missing_site_health_score_fails_fast() {
    let classifier = PriorityClassifier::new(WebsiteType::Ecommerce);
    let empty = record(TopicId::SiteHealth, &[]);
    match classifier.classify(TopicId::SiteHealth, &empty) {
        Err(InsightError::MissingMetric { topic, field }) => {
            assert_eq!(topic, TopicId::SiteHealth);
            assert_eq!(field, "score");
        }
        other => panic!("expected missing metric, got {other:?}"),
    }
}

#[test]
fn end_to_end_critical_site_health() {
    let engine = Engine::new(WebsiteType::Ecommerce);
    let site_health = engine.finding(record(TopicId::SiteHealth, &[("score", 55.0)]));
    assert_eq!(site_health.priority(), Priority::Critical);

    let pipeline = InsightPipeline::new(InsightConfig::default()).unwrap();
    let report = pipeline.run(scenario_records()).unwrap();

    let general = &report.section_summaries[&PillarId::General];
    assert_eq!(general.priority, Priority::Critical);
    assert_eq!(general.issues[0], site_health.issue());
    assert_eq!(general.impacts[0], site_health.impact());
    assert_eq!(general.issues.len(), 3);

    let content = &report.section_summaries[&PillarId::Content];
    assert_eq!(content.priority, Priority::Critical);
    assert_eq!(content.issues.len(), 1);

    let executive = &report.executive_summary.general;
    assert!(executive.starts_with(&general.key_highlight));
    assert!(executive.contains(&site_health.impact()));

    // every number in the executive text must already be in the section
    let section_text = format!("{} {}", general.key_highlight, general.issues.join(" "));
    for number in executive
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
    {
        assert!(section_text.contains(number), "fabricated number {number}");
    }

    assert_eq!(report.dominant_theme, PillarId::General);
    assert!(report.conflicts.is_empty());
}

#[test]
fn executive_text_only_restates_section_content() {
    let report = InsightPipeline::new(InsightConfig::for_website(WebsiteType::Local))
        .unwrap()
        .run(scenario_records())
        .unwrap();

    for pillar in PillarId::ALL {
        let section = &report.section_summaries[&pillar];
        let admitted = format!(
            "{} {} {}",
            section.key_highlight,
            section.issues.join(" "),
            section.impacts.join(" ")
        )
        .to_lowercase();
        for word in report
            .executive_summary
            .get(pillar)
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            assert!(
                admitted.contains(&word.to_lowercase()),
                "{pillar}: '{word}' is not traceable"
            );
        }
        assert!(!report.executive_summary.get(pillar).contains(&section.observation));
    }
}

#[test]
fn authority_and_keyword_gap_contradiction_is_reported() {
    let engine = Engine::new(WebsiteType::Ecommerce);
    let a = engine.finding(record(
        TopicId::DomainAuthority,
        &[("domainRating", 45.0), ("competitorAvgDr", 58.0)],
    ));
    let b = engine.finding(record(
        TopicId::KeywordGap,
        &[("gapKeywords", 60.0), ("gapVolume", 3000.0)],
    ));
    assert_eq!((a.priority(), a.polarity()), (Priority::High, Polarity::Weak));
    assert_eq!(
        (b.priority(), b.polarity()),
        (Priority::Low, Polarity::NoConstraint)
    );

    let findings = vec![a, b];
    let reports = ConsistencyValidator::new().validate(&findings);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].conflicting_pair.0, findings[0].to_ref());
    assert_eq!(reports[0].conflicting_pair.1, findings[1].to_ref());
    assert_eq!(findings[0].priority(), Priority::High);
    assert_eq!(findings[1].priority(), Priority::Low);
}

#[test]
fn conflicts_do_not_block_the_run() {
    let mut records = scenario_records();
    records.insert(
        TopicId::DomainAuthority,
        record(
            TopicId::DomainAuthority,
            &[("domainRating", 30.0), ("competitorAvgDr", 70.0)],
        ),
    );
    records.insert(
        TopicId::KeywordGap,
        record(
            TopicId::KeywordGap,
            &[("gapKeywords", 40.0), ("gapVolume", 900.0), ("sampleSize", 2000.0)],
        ),
    );

    let report = InsightPipeline::new(InsightConfig::default())
        .unwrap()
        .run(records)
        .unwrap();
    // weak authority also contradicts the strong competitive position
    assert_eq!(report.conflicts.len(), 2);
    let gap: Vec<_> = report
        .conflicts
        .iter()
        .filter(|c| c.involves(TopicId::KeywordGap))
        .collect();
    assert_eq!(gap.len(), 1);
    assert!(gap[0].involves(TopicId::DomainAuthority));
    assert!(gap[0].resolution.is_none());
    assert_eq!(
        report.section_summaries[&PillarId::Authority].priority,
        Priority::Critical
    );
}

#[test]
fn output_document_shape() {
    let report = InsightPipeline::new(InsightConfig::default())
        .unwrap()
        .run(scenario_records())
        .unwrap();
    let json = serde_json::to_string(&report).unwrap();

    for key in [
        "\"websiteType\":\"ecommerce\"",
        "\"metadata\":{\"brandName\":null,\"auditPeriod\":{\"start\":\"2024-07-01\",\"end\":\"2024-12-31\"}}",
        "\"sectionSummaries\"",
        "\"executiveSummary\"",
        "\"dominantTheme\":\"general\"",
        "\"findingsSummary\"",
        "\"conflicts\":[]",
        "\"keyHighlight\"",
        "\"sectionId\":\"general\"",
        "\"priority\":\"Critical\"",
    ] {
        assert!(json.contains(key), "missing {key}");
    }

    let position = |pillar: &str| json.find(&format!("\"sectionId\":\"{pillar}\"")).unwrap();
    assert!(position("general") < position("content"));
    assert!(position("content") < position("technical"));
    assert!(position("technical") < position("authority"));
}
