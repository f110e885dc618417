// ABOUTME: Per-topic rule tables and the website-type threshold profiles they read
// ABOUTME: Tables are written in severity-descending order; reordering changes outcomes
use crate::rules::{Operand, Predicate, RuleTable};
use seo_insight_core::{Polarity, Priority, TopicId, WebsiteType};

/// Thresholds that vary with the kind of site being audited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdProfile {
    /// Organic share of traffic below which the channel is critical.
    pub organic_critical_pct: f64,
    pub engagement_rate_floor: f64,
    /// Commercial-intent share below which the keyword mix is critical.
    pub commercial_intent_floor: f64,
    pub informational_skew_pct: f64,
    pub authority_gap_critical: f64,
    pub authority_gap_high: f64,
    pub authority_gap_medium: f64,
}

impl ThresholdProfile {
    pub fn for_website(website_type: WebsiteType) -> Self {
        let base = Self {
            organic_critical_pct: 30.0,
            engagement_rate_floor: 50.0,
            commercial_intent_floor: 10.0,
            informational_skew_pct: 70.0,
            authority_gap_critical: 20.0,
            authority_gap_high: 10.0,
            authority_gap_medium: 5.0,
        };

        match website_type {
            WebsiteType::Ecommerce | WebsiteType::Marketplace => base,
            WebsiteType::Saas => Self {
                organic_critical_pct: 25.0,
                engagement_rate_floor: 55.0,
                informational_skew_pct: 75.0,
                ..base
            },
            WebsiteType::Content => Self {
                organic_critical_pct: 40.0,
                engagement_rate_floor: 40.0,
                commercial_intent_floor: 2.0,
                informational_skew_pct: 90.0,
                ..base
            },
            WebsiteType::Local => Self {
                organic_critical_pct: 20.0,
                engagement_rate_floor: 45.0,
                commercial_intent_floor: 5.0,
                authority_gap_critical: 30.0,
                authority_gap_high: 15.0,
                authority_gap_medium: 8.0,
                ..base
            },
        }
    }
}

fn field(name: &str) -> Operand {
    Operand::field(name)
}

fn authority_gap() -> Operand {
    Operand::difference("competitorAvgDr", "domainRating")
}

/// Build the ordered rule table for `topic` under the given profile.
pub fn rule_table(topic: TopicId, p: &ThresholdProfile) -> RuleTable {
    use Priority::*;

    let table = RuleTable::new(topic);
    match topic {
        TopicId::OrganicTraffic => table
            .require(&["organicPct", "page2PlusPct"])
            .optional(&["yoyChangePct"])
            .rule(Predicate::lt(field("organicPct"), p.organic_critical_pct), Critical)
            .rule(Predicate::lt(field("yoyChangePct"), -15.0), High)
            .rule(Predicate::gt(field("page2PlusPct"), 50.0), High)
            .rule(
                Predicate::All(vec![
                    Predicate::gt(field("organicPct"), 50.0),
                    Predicate::Any(vec![
                        Predicate::absent("yoyChangePct"),
                        Predicate::gt(field("yoyChangePct"), 0.0),
                    ]),
                ]),
                Low,
            )
            .rule(Predicate::Always, Medium),

        TopicId::Competitive => table
            .require(&["trafficSharePct", "page1KeywordSharePct"])
            .rule(Predicate::lt(field("trafficSharePct"), 20.0), Critical)
            .rule(
                Predicate::Any(vec![
                    Predicate::lt(field("trafficSharePct"), 40.0),
                    Predicate::lt(field("page1KeywordSharePct"), 25.0),
                ]),
                High,
            )
            .rule(Predicate::lt(field("trafficSharePct"), 70.0), Medium),

        TopicId::Engagement => table
            .require(&["engagementRate", "trendPct"])
            .rule(Predicate::lt(field("trendPct"), -15.0), Critical)
            .rule(Predicate::lt(field("trendPct"), -8.0), High)
            .rule(
                Predicate::Any(vec![
                    Predicate::lt(field("trendPct"), -3.0),
                    Predicate::lt(field("engagementRate"), p.engagement_rate_floor),
                ]),
                Medium,
            ),

        TopicId::SiteHealth => table
            .require(&["score"])
            .optional(&["errorCount", "pagesCrawled"])
            .rule(Predicate::lt(field("score"), 60.0), Critical)
            .rule(Predicate::lt(field("score"), 75.0), High)
            .rule(Predicate::lt(field("score"), 85.0), Medium),

        TopicId::MetaTags => table
            .require(&["titleIssuePct"])
            .optional(&["metaDescriptionIssuePct", "affectedPages"])
            .rule(Predicate::gt(field("titleIssuePct"), 20.0), Critical)
            .rule(Predicate::gt(field("titleIssuePct"), 10.0), High)
            .rule(
                Predicate::Any(vec![
                    Predicate::gt(field("titleIssuePct"), 5.0),
                    Predicate::gt(field("metaDescriptionIssuePct"), 20.0),
                ]),
                Medium,
            ),

        TopicId::KeywordGap => table
            .require(&["gapKeywords", "gapVolume"])
            .rule(Predicate::gt(field("gapKeywords"), 5000.0), Critical)
            .rule(
                Predicate::Any(vec![
                    Predicate::gt(field("gapKeywords"), 1000.0),
                    Predicate::gt(field("gapVolume"), 50_000.0),
                ]),
                High,
            )
            .rule(Predicate::gt(field("gapKeywords"), 100.0), Medium),

        TopicId::KeywordIntent => table
            .require(&["informationalPct", "commercialPct"])
            .rule(Predicate::lt(field("commercialPct"), p.commercial_intent_floor), Critical)
            .rule(Predicate::gt(field("informationalPct"), p.informational_skew_pct), High)
            .rule(Predicate::lt(field("commercialPct"), 20.0), Medium),

        TopicId::TechnicalIssues => table
            .require(&["blockedPagesPct", "errorCount"])
            .optional(&["performanceScore"])
            .rule(Predicate::gt(field("blockedPagesPct"), 20.0), Critical)
            .rule(Predicate::gt(field("errorCount"), 1000.0), Critical)
            .rule(
                Predicate::Any(vec![
                    Predicate::gt(field("blockedPagesPct"), 10.0),
                    Predicate::gt(field("errorCount"), 500.0),
                ]),
                High,
            )
            .rule(
                Predicate::Any(vec![
                    Predicate::gt(field("blockedPagesPct"), 5.0),
                    Predicate::gt(field("errorCount"), 100.0),
                    Predicate::lt(field("performanceScore"), 50.0),
                ]),
                Medium,
            ),

        TopicId::DomainAuthority => table
            .require(&["domainRating", "competitorAvgDr"])
            .optional(&["drChange"])
            .rule(Predicate::gt(authority_gap(), p.authority_gap_critical), Critical)
            .rule(Predicate::gt(authority_gap(), p.authority_gap_high), High)
            .rule(Predicate::lt(field("drChange"), 0.0), High)
            .rule(Predicate::gt(authority_gap(), p.authority_gap_medium), Medium),
    }
}

/// Adverse and favorable polarity tags for a topic.
pub fn polarity_axis(topic: TopicId) -> (Polarity, Polarity) {
    match topic {
        TopicId::OrganicTraffic
        | TopicId::Competitive
        | TopicId::SiteHealth
        | TopicId::DomainAuthority => (Polarity::Weak, Polarity::Strong),
        TopicId::Engagement => (Polarity::Declining, Polarity::Growing),
        TopicId::MetaTags
        | TopicId::KeywordGap
        | TopicId::KeywordIntent
        | TopicId::TechnicalIssues => (Polarity::Constrained, Polarity::NoConstraint),
    }
}

/// Polarity follows priority: Critical/High are adverse, Low is favorable.
pub fn polarity_for(topic: TopicId, priority: Priority) -> Polarity {
    let (adverse, favorable) = polarity_axis(topic);
    match priority {
        Priority::Critical | Priority::High => adverse,
        Priority::Medium => Polarity::Neutral,
        Priority::Low => favorable,
    }
}
