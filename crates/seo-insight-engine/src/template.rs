// ABOUTME: Closed template grammar for finding messages: "<problem>, <transition> <consequence>."
// ABOUTME: Slots are filled from metric fields and the rendered sentence is validated, never truncated
use crate::rules::Operand;
use lazy_static::lazy_static;
use regex::Regex;
use seo_insight_core::{InsightError, MessageFormatViolation, MetricRecord, Result, TopicId};
use std::fmt;
use thiserror::Error;

pub const MAX_MESSAGE_WORDS: usize = 30;
pub const MAX_ISSUE_WORDS: usize = 15;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?](\s|$)").expect("valid sentence regex");
    static ref TRANSITION: Regex =
        Regex::new(r"(?i)\b(but|which|leaving|causing|indicating)\b").expect("valid transition regex");
    static ref SLOT_NAME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid slot regex");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed slot in template: {0}")]
    UnclosedSlot(String),

    #[error("invalid slot '{slot}': {reason}")]
    InvalidSlot { slot: String, reason: String },

    #[error("unknown slot format '{0}'")]
    UnknownFormat(String),

    #[error("template has no ', <transition> ' joint: {0}")]
    MissingTransition(String),

    #[error("template clause is empty: {0}")]
    EmptyClause(String),
}

impl TemplateError {
    pub fn for_topic(self, topic: TopicId) -> InsightError {
        InsightError::Template {
            topic,
            reason: self.to_string(),
        }
    }
}

/// Fixed connective vocabulary of the message contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionWord {
    But,
    Which,
    Leaving,
    Causing,
    Indicating,
}

impl TransitionWord {
    pub const ALL: [TransitionWord; 5] = [
        TransitionWord::But,
        TransitionWord::Which,
        TransitionWord::Leaving,
        TransitionWord::Causing,
        TransitionWord::Indicating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionWord::But => "but",
            TransitionWord::Which => "which",
            TransitionWord::Leaving => "leaving",
            TransitionWord::Causing => "causing",
            TransitionWord::Indicating => "indicating",
        }
    }
}

impl fmt::Display for TransitionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFormat {
    /// `25.0%`
    Percent,
    /// `1,500`
    Count,
    /// `4.2`
    Number,
    /// `55`
    Integer,
    /// `+4.2%`
    SignedPercent,
    /// `4.2%` from `-4.2`
    AbsPercent,
    /// `4.2` from `-4.2`
    Absolute,
}

impl SlotFormat {
    fn parse(name: &str) -> std::result::Result<Self, TemplateError> {
        match name {
            "pct" => Ok(SlotFormat::Percent),
            "count" => Ok(SlotFormat::Count),
            "num" => Ok(SlotFormat::Number),
            "int" => Ok(SlotFormat::Integer),
            "signed_pct" => Ok(SlotFormat::SignedPercent),
            "abs_pct" => Ok(SlotFormat::AbsPercent),
            "abs" => Ok(SlotFormat::Absolute),
            other => Err(TemplateError::UnknownFormat(other.to_string())),
        }
    }

    /// Format `value`. `None` when an integral format cannot hold it.
    pub fn apply(&self, value: f64) -> Option<String> {
        let text = match self {
            SlotFormat::Percent => format!("{:.1}%", value),
            SlotFormat::Count => format_thousands(to_integer(value)?),
            SlotFormat::Number => format!("{:.1}", value),
            SlotFormat::Integer => format!("{}", to_integer(value)?),
            SlotFormat::SignedPercent => format!("{:+.1}%", value),
            SlotFormat::AbsPercent => format!("{:.1}%", value.abs()),
            SlotFormat::Absolute => format!("{:.1}", value.abs()),
        };
        Some(text)
    }
}

/// Rounded value as `i64`, `None` outside its range instead of saturating.
fn to_integer(value: f64) -> Option<i64> {
    let rounded = value.round();
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// `1234567` -> `1,234,567`
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    operand: Operand,
    format: SlotFormat,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Slot(Slot),
}

/// Literal text with `{operand[:format]}` slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> std::result::Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| TemplateError::UnclosedSlot(source.to_string()))?;
            segments.push(Segment::Slot(parse_slot(&after[..close])?));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fields(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Slot(slot) => Some(slot.operand.fields()),
                Segment::Text(_) => None,
            })
            .flatten()
            .collect()
    }

    /// Render, failing with `MissingMetric` when a slot field is absent.
    pub fn render(&self, record: &MetricRecord) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    let value = slot.operand.evaluate(record)?.ok_or_else(|| {
                        let field = slot
                            .operand
                            .fields()
                            .into_iter()
                            .find(|name| record.field(name).is_none())
                            .unwrap_or_default();
                        InsightError::MissingMetric {
                            topic: record.topic,
                            field: field.to_string(),
                        }
                    })?;
                    let text = slot.format.apply(value).ok_or_else(|| {
                        let reason =
                            format!("value {} is out of range for {:?}", value, slot.format);
                        InsightError::InvalidMetric {
                            topic: record.topic,
                            field: slot.operand.to_string(),
                            reason,
                        }
                    })?;
                    out.push_str(&text);
                }
            }
        }
        Ok(out)
    }

    /// Render only when every slot field is present.
    pub fn try_render(&self, record: &MetricRecord) -> Result<Option<String>> {
        if self.fields().iter().any(|name| record.field(name).is_none()) {
            return Ok(None);
        }
        self.render(record).map(Some)
    }
}

fn parse_slot(body: &str) -> std::result::Result<Slot, TemplateError> {
    let invalid = |reason: &str| TemplateError::InvalidSlot {
        slot: body.to_string(),
        reason: reason.to_string(),
    };

    let (expr, format) = match body.split_once(':') {
        Some((expr, name)) => (expr.trim(), SlotFormat::parse(name.trim())?),
        None => (body.trim(), SlotFormat::Number),
    };
    if expr.is_empty() {
        return Err(invalid("empty operand"));
    }

    let operand = if let Some((a, b)) = expr.split_once('-') {
        Operand::difference(a.trim(), b.trim())
    } else if let Some((a, b)) = expr.split_once('/') {
        Operand::ratio(a.trim(), b.trim())
    } else {
        Operand::field(expr)
    };

    if let Some(bad) = operand.fields().into_iter().find(|name| !SLOT_NAME.is_match(name)) {
        return Err(invalid(&format!("'{}' is not a field name", bad)));
    }

    Ok(Slot { operand, format })
}

/// A finding message split into its problem and consequence clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplate {
    problem: Template,
    transition: TransitionWord,
    consequence: Template,
}

impl MessageTemplate {
    /// Parse `"<problem>, <transition> <consequence>."`, splitting at the first joint.
    pub fn parse(source: &str) -> std::result::Result<Self, TemplateError> {
        let body = source.trim();
        let body = body.strip_suffix('.').unwrap_or(body);

        let joint = TransitionWord::ALL
            .iter()
            .filter_map(|word| {
                let needle = format!(", {} ", word.as_str());
                body.find(&needle).map(|at| (at, *word, needle.len()))
            })
            .min_by_key(|(at, _, _)| *at);

        let (at, transition, joint_len) =
            joint.ok_or_else(|| TemplateError::MissingTransition(source.to_string()))?;

        let problem = body[..at].trim();
        let consequence = body[at + joint_len..].trim();
        if problem.is_empty() || consequence.is_empty() {
            return Err(TemplateError::EmptyClause(source.to_string()));
        }

        Ok(Self {
            problem: Template::parse(problem)?,
            transition,
            consequence: Template::parse(consequence)?,
        })
    }

    pub fn transition(&self) -> TransitionWord {
        self.transition
    }

    pub fn fields(&self) -> Vec<&str> {
        let mut fields = self.problem.fields();
        fields.extend(self.consequence.fields());
        fields
    }

    pub fn render(&self, record: &MetricRecord) -> Result<RenderedMessage> {
        let problem = capitalize_first(self.problem.render(record)?.trim());
        let consequence = self.consequence.render(record)?.trim().to_string();
        let text = format!("{}, {} {}.", problem, self.transition, consequence);
        Ok(RenderedMessage {
            text,
            problem,
            transition: self.transition,
            consequence,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub text: String,
    pub problem: String,
    pub transition: TransitionWord,
    pub consequence: String,
}

impl RenderedMessage {
    /// Enforce the message contract on the rendered text.
    pub fn validate(&self, topic: TopicId) -> Result<()> {
        let fail = |violation| InsightError::MessageFormat {
            topic,
            message: self.text.clone(),
            violation,
        };

        let terminators = SENTENCE_END.find_iter(&self.text).count();
        let ends_terminated = self.text.trim_end().ends_with(['.', '!', '?']);
        if terminators != 1 || !ends_terminated {
            return Err(fail(MessageFormatViolation::NotSingleSentence { terminators }));
        }

        if !TRANSITION.is_match(&self.text) {
            return Err(fail(MessageFormatViolation::MissingTransitionWord));
        }

        let words = word_count(&self.text);
        if words > MAX_MESSAGE_WORDS {
            return Err(fail(MessageFormatViolation::TooManyWords {
                max: MAX_MESSAGE_WORDS,
                actual: words,
            }));
        }

        let problem_words = word_count(&self.problem);
        if problem_words > MAX_ISSUE_WORDS {
            return Err(fail(MessageFormatViolation::ProblemClauseTooLong {
                max: MAX_ISSUE_WORDS,
                actual: problem_words,
            }));
        }

        if self.consequence.trim().is_empty() {
            return Err(fail(MessageFormatViolation::MissingConsequence));
        }

        Ok(())
    }
}
