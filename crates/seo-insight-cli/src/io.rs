use colored::{ColoredString, Colorize};
use seo_insight_core::{
    InsightReport, MetricRecord, MetricSource, PillarId, Priority, ReportSink, Result, TopicId,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Reads a topic -> record map from a JSON file.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetricSource for JsonFileSource {
    fn load(&self) -> Result<BTreeMap<TopicId, MetricRecord>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Writes the document as pretty JSON to a file.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonFileSink {
    fn publish(&mut self, report: &InsightReport) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(report)?)?;
        Ok(())
    }
}

/// Prints the document to stdout, either as JSON or as a colored digest.
pub struct StdoutSink {
    json: bool,
}

impl StdoutSink {
    pub fn json() -> Self {
        Self { json: true }
    }

    pub fn pretty() -> Self {
        Self { json: false }
    }
}

impl ReportSink for StdoutSink {
    fn publish(&mut self, report: &InsightReport) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            print_digest(report);
        }
        Ok(())
    }
}

fn badge(priority: Priority) -> ColoredString {
    let text = format!("[{}]", priority.badge());
    match priority {
        Priority::Critical => text.red().bold(),
        Priority::High => text.yellow().bold(),
        Priority::Medium => text.blue(),
        Priority::Low => text.green(),
    }
}

fn print_digest(report: &InsightReport) {
    println!(
        "{} {}",
        "Website type:".cyan().bold(),
        report.website_type.as_str().green()
    );
    if let Some(brand_name) = &report.metadata.brand_name {
        println!("{} {}", "Brand:".cyan().bold(), brand_name.green());
    }
    let period = report.metadata.audit_period;
    println!(
        "{} {} to {}",
        "Audit period:".cyan().bold(),
        period.start,
        period.end
    );
    println!(
        "{} {}",
        "Dominant theme:".cyan().bold(),
        report.dominant_theme.title().yellow()
    );

    for pillar in PillarId::ALL {
        let Some(section) = report.section_summaries.get(&pillar) else {
            continue;
        };
        println!(
            "\n{} {} {}",
            badge(section.priority),
            pillar.title().cyan().bold(),
            section.key_highlight.bold()
        );
        println!("  {}", report.executive_summary.get(pillar));
        for ((issue, impact), action) in section
            .issues
            .iter()
            .zip(&section.impacts)
            .zip(&section.actions)
        {
            println!("  {} {}", "Issue:".bold(), issue);
            println!("    {} {}", "Impact:".dimmed(), impact);
            println!("    {} {}", "Action:".dimmed(), action.green());
        }
    }

    println!(
        "\n{} {}",
        "Key message:".cyan().bold(),
        report.findings_summary.key_message
    );

    if report.conflicts.is_empty() {
        return;
    }
    println!("\n{}", "Conflicts:".yellow().bold());
    for conflict in &report.conflicts {
        let (a, b) = &conflict.conflicting_pair;
        println!(
            "  {} ({}) vs {} ({}): {}",
            a.topic, a.polarity, b.topic, b.polarity, conflict.rationale
        );
        match &conflict.resolution {
            Some(resolved) => println!(
                "    {} {} by {:?}: {}",
                "prefer".green(),
                resolved.preferred.topic,
                resolved.basis,
                resolved.harmonized_phrasing
            ),
            None => println!("    {}", "unresolved, needs review".red()),
        }
    }
}
