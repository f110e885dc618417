// ABOUTME: Typed classification rules evaluated top-to-bottom, first match wins
// ABOUTME: Operands and predicates only ever read the record of the topic being classified
use seo_insight_core::{InsightError, MetricRecord, Priority, Result, TopicId};
use std::fmt;

/// Numeric quantity read from a metric record.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String),
    /// `a - b`
    Difference(String, String),
    /// `a / b`
    Ratio(String, String),
}

impl Operand {
    pub fn field(name: &str) -> Self {
        Operand::Field(name.to_string())
    }

    pub fn difference(a: &str, b: &str) -> Self {
        Operand::Difference(a.to_string(), b.to_string())
    }

    pub fn ratio(a: &str, b: &str) -> Self {
        Operand::Ratio(a.to_string(), b.to_string())
    }

    pub fn fields(&self) -> Vec<&str> {
        match self {
            Operand::Field(name) => vec![name.as_str()],
            Operand::Difference(a, b) | Operand::Ratio(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    /// `Ok(None)` when any referenced field is absent.
    pub fn evaluate(&self, record: &MetricRecord) -> Result<Option<f64>> {
        match self {
            Operand::Field(name) => numeric_field(record, name),
            Operand::Difference(a, b) => {
                let (Some(a), Some(b)) = (numeric_field(record, a)?, numeric_field(record, b)?)
                else {
                    return Ok(None);
                };
                Ok(Some(a - b))
            }
            Operand::Ratio(a, b) => {
                let (Some(num), Some(den)) =
                    (numeric_field(record, a)?, numeric_field(record, b)?)
                else {
                    return Ok(None);
                };
                if den == 0.0 {
                    return Err(InsightError::InvalidMetric {
                        topic: record.topic,
                        field: b.clone(),
                        reason: "is zero and cannot be used as a ratio denominator".into(),
                    });
                }
                Ok(Some(num / den))
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(name) => write!(f, "{}", name),
            Operand::Difference(a, b) => write!(f, "({} - {})", a, b),
            Operand::Ratio(a, b) => write!(f, "({} / {})", a, b),
        }
    }
}

/// Read a field as a number. Absent is `None`; present but non-numeric is an error.
pub(crate) fn numeric_field(record: &MetricRecord, name: &str) -> Result<Option<f64>> {
    match record.field(name) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| InsightError::InvalidMetric {
                topic: record.topic,
                field: name.to_string(),
                reason: "is not a finite number".into(),
            }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// False when the operand cannot be computed because an optional field is absent.
    Compare {
        operand: Operand,
        op: Comparison,
        threshold: f64,
    },
    Absent(String),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Always,
}

impl Predicate {
    pub fn lt(operand: Operand, threshold: f64) -> Self {
        Predicate::Compare {
            operand,
            op: Comparison::Lt,
            threshold,
        }
    }

    pub fn le(operand: Operand, threshold: f64) -> Self {
        Predicate::Compare {
            operand,
            op: Comparison::Le,
            threshold,
        }
    }

    pub fn gt(operand: Operand, threshold: f64) -> Self {
        Predicate::Compare {
            operand,
            op: Comparison::Gt,
            threshold,
        }
    }

    pub fn ge(operand: Operand, threshold: f64) -> Self {
        Predicate::Compare {
            operand,
            op: Comparison::Ge,
            threshold,
        }
    }

    pub fn absent(field: &str) -> Self {
        Predicate::Absent(field.to_string())
    }

    pub fn evaluate(&self, record: &MetricRecord) -> Result<bool> {
        match self {
            Predicate::Compare {
                operand,
                op,
                threshold,
            } => Ok(operand
                .evaluate(record)?
                .map(|value| op.holds(value, *threshold))
                .unwrap_or(false)),
            Predicate::Absent(field) => Ok(record.field(field).is_none()),
            Predicate::All(parts) => {
                for part in parts {
                    if !part.evaluate(record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Any(parts) => {
                for part in parts {
                    if part.evaluate(record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Always => Ok(true),
        }
    }

    /// Every field name the predicate reads, in first-use order.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            Predicate::Compare { operand, .. } => {
                for name in operand.fields() {
                    push_unique(out, name);
                }
            }
            Predicate::Absent(field) => push_unique(out, field),
            Predicate::All(parts) | Predicate::Any(parts) => {
                for part in parts {
                    part.collect_fields(out);
                }
            }
            Predicate::Always => {}
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|f| f == name) {
        out.push(name.to_string());
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare {
                operand,
                op,
                threshold,
            } => write!(f, "{} {} {}", operand, op.symbol(), threshold),
            Predicate::Absent(field) => write!(f, "{} absent", field),
            Predicate::All(parts) => write_joined(f, parts, " and "),
            Predicate::Any(parts) => write_joined(f, parts, " or "),
            Predicate::Always => write!(f, "always"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, ")")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub predicate: Predicate,
    pub priority: Priority,
}

impl Rule {
    pub fn new(predicate: Predicate, priority: Priority) -> Self {
        Self {
            predicate,
            priority,
        }
    }
}

/// Result of running a rule table against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub priority: Priority,
    /// Index of the winning rule, `None` when the explicit Low fallback applied.
    pub matched_rule: Option<usize>,
}

/// Ordered rule list for one topic. Rule order is part of the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    pub topic: TopicId,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(topic: TopicId) -> Self {
        Self {
            topic,
            required: Vec::new(),
            optional: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn require(mut self, fields: &[&str]) -> Self {
        self.required.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn optional(mut self, fields: &[&str]) -> Self {
        self.optional.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn rule(mut self, predicate: Predicate, priority: Priority) -> Self {
        self.rules.push(Rule::new(predicate, priority));
        self
    }

    /// Check required fields, then evaluate rules top-to-bottom.
    pub fn evaluate(&self, record: &MetricRecord) -> Result<Classification> {
        for field in &self.required {
            if numeric_field(record, field)?.is_none() {
                return Err(InsightError::MissingMetric {
                    topic: self.topic,
                    field: field.clone(),
                });
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.predicate.evaluate(record)? {
                return Ok(Classification {
                    priority: rule.priority,
                    matched_rule: Some(index),
                });
            }
        }

        Ok(Classification {
            priority: Priority::Low,
            matched_rule: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use seo_insight_core::DateRange;

    fn record(topic: TopicId) -> MetricRecord {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        MetricRecord::new(topic, DateRange::new(day, day))
    }

    #[test]
    fn compare_on_absent_optional_field_is_false() {
        let rec = record(TopicId::OrganicTraffic);
        let predicate = Predicate::lt(Operand::field("yoyChangePct"), -15.0);
        assert!(!predicate.evaluate(&rec).unwrap());
        assert!(Predicate::absent("yoyChangePct").evaluate(&rec).unwrap());
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let rec = record(TopicId::SiteHealth).with_field("score", "high");
        let err = Predicate::lt(Operand::field("score"), 60.0)
            .evaluate(&rec)
            .unwrap_err();
        assert!(matches!(err, InsightError::InvalidMetric { ref field, .. } if field == "score"));
    }

    #[test]
    fn difference_and_ratio_operands() {
        let rec = record(TopicId::DomainAuthority)
            .with_field("competitorAvgDr", 60i64)
            .with_field("domainRating", 45i64);
        assert_eq!(
            Operand::difference("competitorAvgDr", "domainRating")
                .evaluate(&rec)
                .unwrap(),
            Some(15.0)
        );
        assert_eq!(
            Operand::ratio("domainRating", "competitorAvgDr")
                .evaluate(&rec)
                .unwrap(),
            Some(0.75)
        );
    }

    #[test]
    fn zero_denominator_is_an_invalid_metric() {
        let rec = record(TopicId::Competitive)
            .with_field("a", 1i64)
            .with_field("b", 0i64);
        assert!(Operand::ratio("a", "b").evaluate(&rec).is_err());
    }

    #[test]
    fn first_matching_rule_wins_even_if_later_rule_is_stricter() {
        let table = RuleTable::new(TopicId::SiteHealth)
            .require(&["score"])
            .rule(Predicate::lt(Operand::field("score"), 90.0), Priority::Medium)
            .rule(Predicate::lt(Operand::field("score"), 60.0), Priority::Critical);
        let rec = record(TopicId::SiteHealth).with_field("score", 40i64);
        let outcome = table.evaluate(&rec).unwrap();
        assert_eq!(outcome.priority, Priority::Medium);
        assert_eq!(outcome.matched_rule, Some(0));
    }

    #[test]
    fn no_match_falls_back_to_low() {
        let table = RuleTable::new(TopicId::SiteHealth)
            .require(&["score"])
            .rule(Predicate::lt(Operand::field("score"), 60.0), Priority::Critical);
        let rec = record(TopicId::SiteHealth).with_field("score", 95i64);
        let outcome = table.evaluate(&rec).unwrap();
        assert_eq!(outcome.priority, Priority::Low);
        assert_eq!(outcome.matched_rule, None);
    }

    #[test]
    fn missing_required_field_is_reported_in_declaration_order() {
        let table = RuleTable::new(TopicId::TechnicalIssues)
            .require(&["blockedPagesPct", "errorCount"])
            .rule(Predicate::Always, Priority::Medium);
        let rec = record(TopicId::TechnicalIssues).with_field("errorCount", 10i64);
        match table.evaluate(&rec).unwrap_err() {
            InsightError::MissingMetric { topic, field } => {
                assert_eq!(topic, TopicId::TechnicalIssues);
                assert_eq!(field, "blockedPagesPct");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn predicate_display_and_fields() {
        let predicate = Predicate::All(vec![
            Predicate::gt(Operand::field("organicPct"), 50.0),
            Predicate::Any(vec![
                Predicate::absent("yoyChangePct"),
                Predicate::gt(Operand::field("yoyChangePct"), 0.0),
            ]),
        ]);
        assert_eq!(
            predicate.to_string(),
            "(organicPct > 50 and (yoyChangePct absent or yoyChangePct > 0))"
        );
        assert_eq!(
            predicate.referenced_fields(),
            vec!["organicPct".to_string(), "yoyChangePct".to_string()]
        );
    }
}
