// ABOUTME: Cross-topic consistency checks driven by a fixed table of contradictory polarity pairs
// ABOUTME: Conflicts are advisory reports; findings are never dropped or re-prioritized here
use crate::finding::Finding;
use seo_insight_core::{ConflictReport, Polarity, ResolutionBasis, ResolvedFinding, TopicId};
use std::cmp::Ordering;
use tracing::warn;

/// One declared contradiction between two topic/polarity tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub first: (TopicId, Polarity),
    pub second: (TopicId, Polarity),
    pub rationale: &'static str,
    /// Suggested wording when the first finding is preferred.
    pub favor_first: &'static str,
    /// Suggested wording when the second finding is preferred.
    pub favor_second: &'static str,
}

impl Relationship {
    /// `Some(true)` when `a` plays the first role, `Some(false)` when swapped.
    fn orientation(&self, a: &Finding, b: &Finding) -> Option<bool> {
        let tag = |f: &Finding| (f.topic(), f.polarity());
        if tag(a) == self.first && tag(b) == self.second {
            Some(true)
        } else if tag(a) == self.second && tag(b) == self.first {
            Some(false)
        } else {
            None
        }
    }
}

pub fn default_relationships() -> Vec<Relationship> {
    vec![
        Relationship {
            first: (TopicId::DomainAuthority, Polarity::Weak),
            second: (TopicId::KeywordGap, Polarity::NoConstraint),
            rationale: "Weak domain authority should restrict rankings on gap keywords, yet the keyword gap finding reports no ranking limitation",
            favor_first: "Authority remains the binding constraint, so current keyword coverage is unlikely to hold without stronger backlinks",
            favor_second: "Keyword coverage is holding despite the authority gap, so authority work protects rankings rather than unlocking them",
        },
        Relationship {
            first: (TopicId::DomainAuthority, Polarity::Strong),
            second: (TopicId::Competitive, Polarity::Weak),
            rationale: "Domain authority leads competitors while competitive traffic share trails them",
            favor_first: "Authority is an asset not yet converted into traffic share, so the gap lies in content and targeting",
            favor_second: "Traffic share trails competitors, so the authority advantage is not yet reaching rankings",
        },
        Relationship {
            first: (TopicId::DomainAuthority, Polarity::Weak),
            second: (TopicId::Competitive, Polarity::Strong),
            rationale: "Competitive traffic share leads while domain authority trails competitors",
            favor_first: "Authority trails competitors, so current traffic share leadership is at risk",
            favor_second: "Traffic share leads despite lower authority, so content relevance is carrying rankings",
        },
        Relationship {
            first: (TopicId::SiteHealth, Polarity::Strong),
            second: (TopicId::TechnicalIssues, Polarity::Constrained),
            rationale: "A healthy site score contradicts severe technical blockers",
            favor_first: "Overall site health is sound and the technical blockers are concentrated on a subset of pages",
            favor_second: "Technical blockers outweigh the headline health score and should be treated as the priority",
        },
        Relationship {
            first: (TopicId::SiteHealth, Polarity::Weak),
            second: (TopicId::TechnicalIssues, Polarity::NoConstraint),
            rationale: "A poor site score contradicts the absence of technical blockers",
            favor_first: "Site health problems are real even though nothing blocks crawling, so they degrade quality rather than access",
            favor_second: "Pages remain crawlable, so the low health score reflects quality issues rather than access barriers",
        },
    ]
}

/// Which of two findings the resolution policy prefers: larger sample first, then later period end.
fn prefer(a: &Finding, b: &Finding) -> Option<(bool, ResolutionBasis)> {
    if let (Some(sa), Some(sb)) = (a.metrics().sample_size(), b.metrics().sample_size()) {
        match sa.partial_cmp(&sb) {
            Some(Ordering::Greater) => return Some((true, ResolutionBasis::SampleSize)),
            Some(Ordering::Less) => return Some((false, ResolutionBasis::SampleSize)),
            _ => {}
        }
    }

    match a.metrics().period.end.cmp(&b.metrics().period.end) {
        Ordering::Greater => Some((true, ResolutionBasis::Recency)),
        Ordering::Less => Some((false, ResolutionBasis::Recency)),
        Ordering::Equal => None,
    }
}

#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    relationships: Vec<Relationship>,
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self {
            relationships: default_relationships(),
        }
    }

    pub fn with_relationships(relationships: Vec<Relationship>) -> Self {
        Self { relationships }
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Report every contradictory pair once, in input order.
    pub fn validate(&self, findings: &[Finding]) -> Vec<ConflictReport> {
        let mut reports = Vec::new();

        for (i, a) in findings.iter().enumerate() {
            for b in &findings[i + 1..] {
                let Some((relationship, a_is_first)) = self
                    .relationships
                    .iter()
                    .find_map(|r| r.orientation(a, b).map(|o| (r, o)))
                else {
                    continue;
                };

                let resolution = prefer(a, b).map(|(a_preferred, basis)| {
                    let (preferred, favors_first) = if a_preferred {
                        (a, a_is_first)
                    } else {
                        (b, !a_is_first)
                    };
                    ResolvedFinding {
                        preferred: preferred.to_ref(),
                        basis,
                        harmonized_phrasing: if favors_first {
                            relationship.favor_first
                        } else {
                            relationship.favor_second
                        }
                        .to_string(),
                    }
                });

                warn!(
                    first = %a.topic(),
                    second = %b.topic(),
                    resolved = resolution.is_some(),
                    "conflicting findings detected"
                );

                reports.push(ConflictReport {
                    conflicting_pair: (a.to_ref(), b.to_ref()),
                    rationale: relationship.rationale.to_string(),
                    resolution,
                });
            }
        }

        reports
    }
}
