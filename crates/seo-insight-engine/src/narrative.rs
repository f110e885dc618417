// ABOUTME: Narrative catalog: per-topic message, observation and action templates plus section headlines
// ABOUTME: All templates are parsed once at construction so a bad template fails before any run starts
use crate::template::{MessageTemplate, Template};
use seo_insight_core::{InsightError, MetricRecord, PillarId, Priority, Result, TopicId};
use std::collections::BTreeMap;

/// Raw template text for one topic. Priority-indexed arrays run Critical, High, Medium, Low.
struct TopicTexts {
    messages: [&'static str; 4],
    fallback: &'static str,
    observations: &'static [&'static str],
    actions: [&'static str; 4],
}

fn rank(priority: Priority) -> usize {
    match priority {
        Priority::Critical => 0,
        Priority::High => 1,
        Priority::Medium => 2,
        Priority::Low => 3,
    }
}

fn texts(topic: TopicId) -> TopicTexts {
    match topic {
        TopicId::OrganicTraffic => TopicTexts {
            messages: [
                "Organic search drives only {organicPct:pct} of sessions, leaving revenue dependent on paid and direct channels.",
                "Organic share sits at {organicPct:pct} with {page2PlusPct:pct} of rankings beyond page one, which caps qualified traffic growth.",
                "Organic search contributes {organicPct:pct} of sessions, but {page2PlusPct:pct} of rankings still sit beyond page one.",
                "Organic search leads with {organicPct:pct} of sessions, indicating a durable acquisition channel worth protecting.",
            ],
            fallback: "Organic search share needs attention, leaving growth exposed to paid channel costs.",
            observations: &[
                "Organic search accounts for {organicPct:pct} of total sessions.",
                "{page2PlusPct:pct} of ranking keywords sit on page two or deeper.",
                "Organic sessions moved {yoyChangePct:signed_pct} year over year.",
            ],
            actions: [
                "Rebuild organic acquisition by targeting the commercial queries competitors win",
                "Push the {page2PlusPct:pct} of page-two rankings onto page one with on-page upgrades",
                "Strengthen internal linking to lift page-two rankings into top positions",
                "Protect organic leadership with quarterly ranking and content refresh reviews",
            ],
        },
        TopicId::Competitive => TopicTexts {
            messages: [
                "The site captures just {trafficSharePct:pct} of competitor-set traffic, leaving most category demand to rivals.",
                "Traffic share of {trafficSharePct:pct} trails the competitor set, causing lost visibility on high-value queries.",
                "Traffic share of {trafficSharePct:pct} is competitive, but only {page1KeywordSharePct:pct} of keywords rank on page one.",
                "The site leads its competitor set with {trafficSharePct:pct} traffic share, indicating strong market visibility.",
            ],
            fallback: "Competitive visibility lags the market, leaving category demand to rivals.",
            observations: &[
                "The site holds {trafficSharePct:pct} of traffic across the tracked competitor set.",
                "{page1KeywordSharePct:pct} of tracked keywords rank on page one.",
            ],
            actions: [
                "Prioritize the category pages where competitors hold the largest traffic lead",
                "Close ranking gaps on queries where rivals hold page-one positions",
                "Expand page-one coverage beyond the current {page1KeywordSharePct:pct} of tracked keywords",
                "Defend leading positions by monitoring competitor content launches monthly",
            ],
        },
        TopicId::Engagement => TopicTexts {
            messages: [
                "Engagement fell {trendPct:abs_pct} over the period, indicating visitors are not finding what they searched for.",
                "Engagement dropped {trendPct:abs_pct} to a {engagementRate:pct} rate, causing lower conversion from organic visits.",
                "Engagement rate sits at {engagementRate:pct} with a {trendPct:signed_pct} trend, which limits conversion from organic visits.",
                "Engagement holds at {engagementRate:pct} with a {trendPct:signed_pct} trend, indicating content matches search intent.",
            ],
            fallback: "Engagement is weakening, leaving organic visits less likely to convert.",
            observations: &[
                "Engaged sessions make up {engagementRate:pct} of organic visits.",
                "Engagement moved {trendPct:signed_pct} across the reporting period.",
            ],
            actions: [
                "Audit top landing pages for intent mismatch and slow-loading content",
                "Rework landing page layouts to surface answers and calls to action sooner",
                "Test clearer calls to action on the highest-traffic organic landing pages",
                "Maintain engagement by reviewing landing page performance each quarter",
            ],
        },
        TopicId::SiteHealth => TopicTexts {
            messages: [
                "Site health score of {score:int} reflects critical crawl barriers, causing skipped crawls on key revenue pages.",
                "Site health score of {score:int} shows recurring crawl errors, leaving important pages under-indexed.",
                "Site health score of {score:int} is acceptable, but lingering errors waste crawl budget.",
                "Site health score of {score:int} is strong, indicating a solid technical foundation for growth.",
            ],
            fallback: "Site health needs repair, leaving search engines unable to crawl key pages.",
            observations: &[
                "The latest crawl scored site health at {score:int} out of 100.",
                "Scores below 75 typically coincide with indexing gaps on priority pages.",
                "The crawl covered {pagesCrawled:count} pages and found {errorCount:count} errors.",
            ],
            actions: [
                "Fix crawl-blocking errors on revenue pages before any new content work",
                "Resolve recurring crawl errors and resubmit affected URLs for indexing",
                "Schedule monthly crawls to clear remaining errors before they compound",
                "Keep site health above 85 with automated crawl monitoring",
            ],
        },
        TopicId::MetaTags => TopicTexts {
            messages: [
                "{titleIssuePct:pct} of pages have missing or duplicate titles, causing lower click-through from search listings.",
                "Title tag issues affect {titleIssuePct:pct} of pages, leaving listings less relevant to searchers.",
                "Title tags are mostly sound at {titleIssuePct:pct} affected, but weak descriptions still reduce click-through.",
                "Only {titleIssuePct:pct} of pages have title issues, indicating well-maintained search listings.",
            ],
            fallback: "Meta tags need cleanup, leaving search listings less compelling.",
            observations: &[
                "{titleIssuePct:pct} of crawled pages have title tag problems.",
                "Titles are the strongest on-page relevance signal in search results.",
                "{metaDescriptionIssuePct:pct} of pages have missing or duplicate meta descriptions.",
            ],
            actions: [
                "Rewrite missing and duplicate titles on all affected templates",
                "Fix title tags on the highest-traffic pages first",
                "Refresh meta descriptions on pages with low click-through",
                "Add title and description checks to the publishing workflow",
            ],
        },
        TopicId::KeywordGap => TopicTexts {
            messages: [
                "Competitors rank for {gapKeywords:count} keywords the site does not, leaving {gapVolume:count} monthly searches uncaptured.",
                "A gap of {gapKeywords:count} competitor keywords remains open, causing the loss of {gapVolume:count} monthly searches to rivals.",
                "The site misses {gapKeywords:count} competitor keywords, which represents modest untapped search demand.",
                "Only {gapKeywords:count} competitor keywords are uncovered, indicating no meaningful ranking limitation.",
            ],
            fallback: "Competitor keyword coverage is incomplete, leaving search demand uncaptured.",
            observations: &[
                "Competitors rank for {gapKeywords:count} keywords where the site has no presence.",
                "Those keywords carry {gapVolume:count} combined monthly searches.",
            ],
            actions: [
                "Build content clusters for the highest-volume gap keywords",
                "Prioritize gap keywords with commercial intent and low difficulty",
                "Add gap keywords to the quarterly content calendar",
                "Review competitor keyword gains each quarter to keep coverage complete",
            ],
        },
        TopicId::KeywordIntent => TopicTexts {
            messages: [
                "Only {commercialPct:pct} of ranking keywords carry commercial intent, leaving buyers to find competitors instead.",
                "Informational queries make up {informationalPct:pct} of rankings, which rarely convert into revenue.",
                "Commercial intent covers {commercialPct:pct} of rankings, but buying-stage coverage remains thin.",
                "Commercial intent covers {commercialPct:pct} of rankings, indicating a healthy mix of buyer queries.",
            ],
            fallback: "The keyword mix skews away from buyers, leaving revenue queries uncovered.",
            observations: &[
                "{informationalPct:pct} of ranking keywords are informational.",
                "{commercialPct:pct} of ranking keywords signal commercial or transactional intent.",
            ],
            actions: [
                "Create product and category content aimed at commercial queries",
                "Link informational articles to relevant commercial pages",
                "Expand comparison and buying-guide content for mid-funnel queries",
                "Keep balancing informational and commercial content in the editorial plan",
            ],
        },
        TopicId::TechnicalIssues => TopicTexts {
            messages: [
                "{blockedPagesPct:pct} of pages are blocked with {errorCount:count} crawl errors, leaving content invisible to search engines.",
                "Technical errors affect {errorCount:count} URLs with {blockedPagesPct:pct} blocked, causing slower indexing of new content.",
                "Technical issues are contained at {errorCount:count} errors, but they still slow crawling of key pages.",
                "Only {blockedPagesPct:pct} of pages are blocked, indicating no technical constraint on indexing.",
            ],
            fallback: "Technical issues restrict crawling, leaving content invisible to search engines.",
            observations: &[
                "{blockedPagesPct:pct} of pages are blocked from crawling or indexing.",
                "The crawl recorded {errorCount:count} technical errors.",
                "Mobile performance scored {performanceScore:int} out of 100.",
            ],
            actions: [
                "Unblock revenue pages in robots rules and fix critical crawl errors",
                "Work through crawl errors by template, starting with indexable pages",
                "Add crawl error alerts so new issues are fixed within a sprint",
                "Keep technical audits on a monthly cadence",
            ],
        },
        TopicId::DomainAuthority => TopicTexts {
            messages: [
                "Domain rating of {domainRating:int} trails the competitor average of {competitorAvgDr:int}, leaving rankings capped on competitive queries.",
                "Domain rating stands at {domainRating:int} versus {competitorAvgDr:int} for competitors, causing weaker rankings for contested keywords.",
                "Domain rating of {domainRating:int} is close to the competitor average of {competitorAvgDr:int}, but link growth must continue.",
                "Domain rating of {domainRating:int} matches or exceeds competitors, indicating authority supports rankings.",
            ],
            fallback: "Domain authority trails competitors, leaving rankings capped on contested queries.",
            observations: &[
                "The site has a domain rating of {domainRating:int}.",
                "Tracked competitors average a domain rating of {competitorAvgDr:int}.",
                "Domain rating changed by {drChange:int} points over the period.",
            ],
            actions: [
                "Launch a sustained link acquisition program targeting authoritative industry sites",
                "Earn links from sources that already link to top competitors",
                "Keep building links through digital PR at a steady monthly pace",
                "Protect authority by monitoring and reclaiming lost backlinks",
            ],
        },
    }
}

/// Fixed slide headline for a section at the given priority.
pub fn headline(pillar: PillarId, priority: Priority) -> &'static str {
    match (pillar, priority) {
        (PillarId::General, Priority::Critical) => {
            "Critical Foundation Gaps Are Constraining Organic Growth"
        }
        (PillarId::General, Priority::High) => "Organic Performance Is Falling Behind Its Potential",
        (PillarId::General, Priority::Medium) => "Organic Foundation Is Stable with Clear Room to Grow",
        (PillarId::General, Priority::Low) => "Organic Search Is a Strong Growth Engine",
        (PillarId::Content, Priority::Critical) => "Content Gaps Are Leaving Major Search Demand Untapped",
        (PillarId::Content, Priority::High) => "On-Page and Keyword Gaps Limit Content Reach",
        (PillarId::Content, Priority::Medium) => "Content Coverage Is Solid but Uneven",
        (PillarId::Content, Priority::Low) => "Content Is Well Aligned with Search Demand",
        (PillarId::Technical, Priority::Critical) => {
            "Technical Barriers Block Content from Reaching Searchers"
        }
        (PillarId::Technical, Priority::High) => "Technical Issues Are Slowing Indexing and Visibility",
        (PillarId::Technical, Priority::Medium) => "Technical Foundation Needs Routine Maintenance",
        (PillarId::Technical, Priority::Low) => "Technical Foundation Supports Growth",
        (PillarId::Authority, Priority::Critical) => "Authority Deficit Caps Competitive Rankings",
        (PillarId::Authority, Priority::High) => "Authority Gap Limits Competitive Reach",
        (PillarId::Authority, Priority::Medium) => "Authority Is Near Parity with Competitors",
        (PillarId::Authority, Priority::Low) => "Authority Is a Competitive Advantage",
    }
}

/// Parsed templates for one topic.
#[derive(Debug, Clone)]
pub struct TopicNarrative {
    topic: TopicId,
    messages: [MessageTemplate; 4],
    fallback: MessageTemplate,
    observations: Vec<Template>,
    actions: [Template; 4],
}

impl TopicNarrative {
    fn parse(topic: TopicId) -> Result<Self> {
        let raw = texts(topic);
        let message = |s: &str| MessageTemplate::parse(s).map_err(|e| e.for_topic(topic));
        let template = |s: &str| Template::parse(s).map_err(|e| e.for_topic(topic));

        let [mc, mh, mm, ml] = raw.messages;
        let [ac, ah, am, al] = raw.actions;
        Ok(Self {
            topic,
            messages: [message(mc)?, message(mh)?, message(mm)?, message(ml)?],
            fallback: message(raw.fallback)?,
            observations: raw
                .observations
                .iter()
                .map(|s| template(*s))
                .collect::<Result<Vec<_>>>()?,
            actions: [template(ac)?, template(ah)?, template(am)?, template(al)?],
        })
    }

    pub fn topic(&self) -> TopicId {
        self.topic
    }

    pub fn message(&self, priority: Priority) -> &MessageTemplate {
        &self.messages[rank(priority)]
    }

    pub fn fallback(&self) -> &MessageTemplate {
        &self.fallback
    }

    pub fn observation_templates(&self) -> &[Template] {
        &self.observations
    }

    /// Observation sentences whose fields are all present, joined by spaces.
    pub fn observation(&self, record: &MetricRecord) -> Result<String> {
        let mut sentences = Vec::with_capacity(self.observations.len());
        for template in &self.observations {
            if let Some(sentence) = template.try_render(record)? {
                sentences.push(sentence);
            }
        }
        Ok(sentences.join(" "))
    }

    pub fn action(&self, priority: Priority, record: &MetricRecord) -> Result<String> {
        self.actions[rank(priority)].render(record)
    }
}

/// Every topic's parsed narrative templates.
#[derive(Debug, Clone)]
pub struct NarrativeCatalog {
    topics: BTreeMap<TopicId, TopicNarrative>,
}

impl NarrativeCatalog {
    pub fn new() -> Result<Self> {
        let topics = TopicId::ALL
            .into_iter()
            .map(|topic| TopicNarrative::parse(topic).map(|narrative| (topic, narrative)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { topics })
    }

    pub fn topic(&self, topic: TopicId) -> Result<&TopicNarrative> {
        self.topics.get(&topic).ok_or_else(|| unregistered(topic))
    }

    /// Replace the message template `topic` uses at `priority`.
    pub fn with_message(
        mut self,
        topic: TopicId,
        priority: Priority,
        source: &str,
    ) -> Result<Self> {
        let template = MessageTemplate::parse(source).map_err(|e| e.for_topic(topic))?;
        let narrative = self
            .topics
            .get_mut(&topic)
            .ok_or_else(|| unregistered(topic))?;
        narrative.messages[rank(priority)] = template;
        Ok(self)
    }
}

fn unregistered(topic: TopicId) -> InsightError {
    InsightError::Template {
        topic,
        reason: "no narrative templates registered".into(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classifier::PriorityClassifier;
    use crate::finding::Finding;
    use crate::synthesizer::FindingSynthesizer;
    use crate::topics::{rule_table, ThresholdProfile};
    use std::sync::Arc;
    use chrono::NaiveDate;
    use seo_insight_core::{DateRange, WebsiteType};

    /// A record carrying every required and optional field of `topic`.
    pub(crate) fn full_record(topic: TopicId) -> MetricRecord {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let record = MetricRecord::new(topic, DateRange::new(start, end));
        match topic {
            TopicId::OrganicTraffic => record
                .with_field("organicPct", 42.5)
                .with_field("page2PlusPct", 38.0)
                .with_field("yoyChangePct", -6.2),
            TopicId::Competitive => record
                .with_field("trafficSharePct", 33.0)
                .with_field("page1KeywordSharePct", 21.4),
            TopicId::Engagement => record
                .with_field("engagementRate", 47.9)
                .with_field("trendPct", -9.3),
            TopicId::SiteHealth => record
                .with_field("score", 72i64)
                .with_field("errorCount", 412i64)
                .with_field("pagesCrawled", 18250i64),
            TopicId::MetaTags => record
                .with_field("titleIssuePct", 12.5)
                .with_field("metaDescriptionIssuePct", 31.0)
                .with_field("affectedPages", 940i64),
            TopicId::KeywordGap => record
                .with_field("gapKeywords", 12840i64)
                .with_field("gapVolume", 1_250_000i64),
            TopicId::KeywordIntent => record
                .with_field("informationalPct", 78.0)
                .with_field("commercialPct", 8.5),
            TopicId::TechnicalIssues => record
                .with_field("blockedPagesPct", 14.2)
                .with_field("errorCount", 2315i64)
                .with_field("performanceScore", 41i64),
            TopicId::DomainAuthority => record
                .with_field("domainRating", 38i64)
                .with_field("competitorAvgDr", 61i64)
                .with_field("drChange", -2i64),
        }
    }

    /// `full_record(topic)` with `fields` overridden.
    pub(crate) fn record_with(topic: TopicId, fields: &[(&str, f64)]) -> MetricRecord {
        fields
            .iter()
            .fold(full_record(topic), |record, (name, value)| {
                record.with_field(name, *value)
            })
    }

    /// Finding at the priority the ecommerce classifier assigns to `record`.
    pub(crate) fn classified_finding(record: MetricRecord) -> Finding {
        let topic = record.topic;
        let priority = PriorityClassifier::new(WebsiteType::Ecommerce)
            .classify(topic, &record)
            .unwrap();
        FindingSynthesizer::new(Arc::new(NarrativeCatalog::new().unwrap()))
            .synthesize(topic, &Arc::new(record), priority)
            .unwrap()
    }

    const PRIORITIES: [Priority; 4] =
        [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];

    #[test]
    fn catalog_parses_every_topic() {
        let catalog = NarrativeCatalog::new().unwrap();
        for topic in TopicId::ALL {
            assert_eq!(catalog.topic(topic).unwrap().topic(), topic);
        }
    }

    #[test]
    fn every_message_meets_the_format_contract() {
        let catalog = NarrativeCatalog::new().unwrap();
        for topic in TopicId::ALL {
            let narrative = catalog.topic(topic).unwrap();
            let record = full_record(topic);
            for priority in PRIORITIES {
                let rendered = narrative.message(priority).render(&record).unwrap();
                rendered
                    .validate(topic)
                    .unwrap_or_else(|e| panic!("{topic} {priority}: {e}"));
            }
            let fallback = narrative.fallback().render(&record).unwrap();
            fallback
                .validate(topic)
                .unwrap_or_else(|e| panic!("{topic} fallback: {e}"));
        }
    }

    #[test]
    fn messages_and_leading_observations_use_required_fields_only() {
        let catalog = NarrativeCatalog::new().unwrap();
        let profile = ThresholdProfile::for_website(WebsiteType::Ecommerce);
        for topic in TopicId::ALL {
            let table = rule_table(topic, &profile);
            let narrative = catalog.topic(topic).unwrap();
            let required = |name: &str| table.required.iter().any(|f| f == name);

            for priority in PRIORITIES {
                for name in narrative.message(priority).fields() {
                    assert!(required(name), "{topic} {priority} message reads {name}");
                }
            }
            assert!(narrative.fallback().fields().is_empty());
            for template in narrative.observation_templates().iter().take(2) {
                for name in template.fields() {
                    assert!(required(name), "{topic} observation reads {name}");
                }
            }
        }
    }

    #[test]
    fn observation_skips_sentences_with_absent_fields() {
        let catalog = NarrativeCatalog::new().unwrap();
        let narrative = catalog.topic(TopicId::SiteHealth).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let sparse = MetricRecord::new(TopicId::SiteHealth, DateRange::new(day, day))
            .with_field("score", 55i64);
        let observation = narrative.observation(&sparse).unwrap();
        assert!(observation.starts_with("The latest crawl scored site health at 55 out of 100."));
        assert!(!observation.contains("pages and found"));

        let full = narrative.observation(&full_record(TopicId::SiteHealth)).unwrap();
        assert!(full.ends_with("The crawl covered 18,250 pages and found 412 errors."));
    }

    #[test]
    fn actions_render_for_every_priority() {
        let catalog = NarrativeCatalog::new().unwrap();
        for topic in TopicId::ALL {
            let narrative = catalog.topic(topic).unwrap();
            for priority in PRIORITIES {
                let action = narrative.action(priority, &full_record(topic)).unwrap();
                assert!(!action.is_empty());
                assert!(!action.ends_with('.'));
            }
        }
    }

    #[test]
    fn message_override_replaces_one_priority() {
        let catalog = NarrativeCatalog::new()
            .unwrap()
            .with_message(
                TopicId::SiteHealth,
                Priority::High,
                "Site health sits at {score:int}, leaving crawl budget exposed.",
            )
            .unwrap();
        let narrative = catalog.topic(TopicId::SiteHealth).unwrap();
        let record = full_record(TopicId::SiteHealth);
        assert_eq!(
            narrative.message(Priority::High).render(&record).unwrap().text,
            "Site health sits at 72, leaving crawl budget exposed."
        );
        assert_ne!(
            narrative.message(Priority::Critical),
            narrative.message(Priority::High)
        );

        let err = NarrativeCatalog::new()
            .unwrap()
            .with_message(TopicId::SiteHealth, Priority::Low, "No joint here.")
            .unwrap_err();
        assert!(matches!(
            err,
            InsightError::Template {
                topic: TopicId::SiteHealth,
                ..
            }
        ));
    }

    #[test]
    fn every_pillar_has_a_headline_per_priority() {
        for pillar in PillarId::ALL {
            let mut seen = std::collections::HashSet::new();
            for priority in PRIORITIES {
                assert!(seen.insert(headline(pillar, priority)));
            }
        }
    }
}
