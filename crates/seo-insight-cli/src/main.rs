mod io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use io::{JsonFileSink, JsonFileSource, StdoutSink};
use seo_insight_core::{
    ConfigManager, InsightConfig, InsightReport, LoggingConfig, ReportSink, TopicId, WebsiteType,
};
use seo_insight_engine::{rule_table, InsightPipeline, ThresholdProfile};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "seo-insight")]
#[command(
    about = "SEO insight engine - prioritized findings and executive narrative from audit metrics",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(long, global = true, default_value = "pretty")]
    output_format: OutputFormat,

    /// Explicit configuration file
    #[arg(short, long, global = true, env = "SEO_INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over a JSON metric bundle
    Run {
        /// Input file mapping topic id to metric record
        #[arg(short, long)]
        input: PathBuf,

        /// Website type, overrides configuration
        #[arg(short = 't', long, value_enum)]
        website_type: Option<WebsiteTypeArg>,

        /// Client brand recorded in the report metadata
        #[arg(short, long)]
        brand_name: Option<String>,

        /// Write the output document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List topics with their pillar and metric fields
    Topics {
        #[arg(short = 't', long, value_enum, default_value = "ecommerce")]
        website_type: WebsiteTypeArg,
    },

    /// Print the JSON Schema of the output document
    Schema,

    /// Write a default configuration file
    InitConfig {
        #[arg(default_value = ".seo-insight.toml")]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WebsiteTypeArg {
    Ecommerce,
    Saas,
    Content,
    Local,
    Marketplace,
}

impl From<WebsiteTypeArg> for WebsiteType {
    fn from(arg: WebsiteTypeArg) -> Self {
        match arg {
            WebsiteTypeArg::Ecommerce => WebsiteType::Ecommerce,
            WebsiteTypeArg::Saas => WebsiteType::Saas,
            WebsiteTypeArg::Content => WebsiteType::Content,
            WebsiteTypeArg::Local => WebsiteType::Local,
            WebsiteTypeArg::Marketplace => WebsiteType::Marketplace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    if let Err(e) = execute_command(&cli, config) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<InsightConfig> {
    let manager = match path {
        Some(path) => ConfigManager::from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigManager::load().context("Failed to load configuration")?,
    };
    Ok(manager.into_config())
}

/// Logs go to stderr so stdout carries only the document.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&logging.level)
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "compact" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .pretty(),
            )
            .init();
    }
}

fn execute_command(cli: &Cli, mut config: InsightConfig) -> Result<()> {
    match &cli.command {
        Commands::Run {
            input,
            website_type,
            brand_name,
            output,
        } => {
            if let Some(website_type) = website_type {
                config.website_type = (*website_type).into();
            }
            let report = execute_run(input, config, brand_name.as_deref())?;
            match output {
                Some(path) => {
                    JsonFileSink::new(path)
                        .publish(&report)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!(
                        "{} {}",
                        "Report written to".green(),
                        path.display().to_string().bold()
                    );
                }
                None => {
                    let mut sink = match cli.output_format {
                        OutputFormat::Json => StdoutSink::json(),
                        OutputFormat::Pretty => StdoutSink::pretty(),
                    };
                    sink.publish(&report).context("Failed to print report")?;
                }
            }
            Ok(())
        }
        Commands::Topics { website_type } => {
            let value = topic_catalog((*website_type).into());
            print_output(cli.output_format, &value)
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(InsightReport);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Commands::InitConfig { path } => {
            ConfigManager::create_default_config(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} {}",
                "Default configuration written to".green(),
                path.display().to_string().bold()
            );
            Ok(())
        }
    }
}

fn execute_run(
    input: &Path,
    config: InsightConfig,
    brand_name: Option<&str>,
) -> Result<InsightReport> {
    let mut pipeline =
        InsightPipeline::new(config).context("Failed to build insight pipeline")?;
    if let Some(brand_name) = brand_name {
        pipeline = pipeline.with_brand_name(brand_name);
    }
    let source = JsonFileSource::new(input);

    let report = pipeline
        .run_source(&source)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    info!(
        conflicts = report.conflicts.len(),
        dominant_theme = %report.dominant_theme,
        "report ready"
    );
    Ok(report)
}

fn topic_catalog(website_type: WebsiteType) -> serde_json::Value {
    let profile = ThresholdProfile::for_website(website_type);
    let topics: Vec<serde_json::Value> = TopicId::ALL
        .into_iter()
        .map(|topic| {
            let table = rule_table(topic, &profile);
            serde_json::json!({
                "topic": topic.as_str(),
                "pillar": topic.pillar().as_str(),
                "required": table.required,
                "optional": table.optional,
                "rules": table.rules.len(),
            })
        })
        .collect();
    serde_json::json!({
        "website_type": website_type.as_str(),
        "topics": topics,
    })
}

fn print_output(format: OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}: {}", key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}: {}", key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Array(items) if items.iter().all(|i| i.is_string()) => {
                        let joined: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                        println!("{}: {}", key_colored, joined.join(", "));
                    }
                    serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                        println!("{}:", key_colored);
                        print_pretty(val)?;
                    }
                    _ => {
                        println!("{}: {}", key_colored, val);
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}:", "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item)?;
            }
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
