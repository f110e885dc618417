use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use seo_insight_core::{DateRange, InsightConfig, MetricRecord, TopicId, WebsiteType};
use seo_insight_engine::{InsightPipeline, PriorityClassifier};
use std::collections::BTreeMap;
use std::hint::black_box;

fn audit() -> BTreeMap<TopicId, MetricRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let rec = |topic| MetricRecord::new(topic, DateRange::new(start, end));

    [
        rec(TopicId::OrganicTraffic)
            .with_field("organicPct", 34.0)
            .with_field("page2PlusPct", 52.0),
        rec(TopicId::Competitive)
            .with_field("trafficSharePct", 28.0)
            .with_field("page1KeywordSharePct", 19.0),
        rec(TopicId::Engagement)
            .with_field("engagementRate", 48.0)
            .with_field("trendPct", -9.5),
        rec(TopicId::SiteHealth).with_field("score", 68i64),
        rec(TopicId::MetaTags).with_field("titleIssuePct", 14.0),
        rec(TopicId::KeywordGap)
            .with_field("gapKeywords", 3200i64)
            .with_field("gapVolume", 88_000i64),
        rec(TopicId::KeywordIntent)
            .with_field("informationalPct", 74.0)
            .with_field("commercialPct", 12.0),
        rec(TopicId::TechnicalIssues)
            .with_field("blockedPagesPct", 8.0)
            .with_field("errorCount", 640i64),
        rec(TopicId::DomainAuthority)
            .with_field("domainRating", 41i64)
            .with_field("competitorAvgDr", 55i64),
    ]
    .into_iter()
    .map(|record| (record.topic, record))
    .collect()
}

fn bench_classification(c: &mut Criterion) {
    let records = audit();
    let classifier = PriorityClassifier::new(WebsiteType::Ecommerce);
    c.bench_function("classify_all_topics", |b| {
        b.iter(|| {
            for (topic, record) in &records {
                black_box(classifier.classify(*topic, record).unwrap());
            }
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_run");
    for parallel in [false, true] {
        let mut config = InsightConfig::default();
        config.engine.parallel_topics = parallel;
        let pipeline = InsightPipeline::new(config).unwrap();
        let label = if parallel { "parallel" } else { "sequential" };

        group.bench_with_input(BenchmarkId::new("full_audit", label), &pipeline, |b, pipeline| {
            b.iter(|| black_box(pipeline.run(audit()).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classification, bench_pipeline);
criterion_main!(benches);
