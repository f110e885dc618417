// ABOUTME: Per-run configuration for the insight engine
// ABOUTME: Website type selection, engine limits and logging, loaded from TOML and env
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

const LOCAL_CONFIG_FILE: &str = ".seo-insight.toml";
const USER_CONFIG_DIR: &str = ".seo-insight";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Kind of site being audited. Selects the active threshold profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteType {
    #[default]
    Ecommerce,
    Saas,
    Content,
    Local,
    Marketplace,
}

impl WebsiteType {
    pub const ALL: [WebsiteType; 5] = [
        WebsiteType::Ecommerce,
        WebsiteType::Saas,
        WebsiteType::Content,
        WebsiteType::Local,
        WebsiteType::Marketplace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebsiteType::Ecommerce => "ecommerce",
            WebsiteType::Saas => "saas",
            WebsiteType::Content => "content",
            WebsiteType::Local => "local",
            WebsiteType::Marketplace => "marketplace",
        }
    }
}

impl fmt::Display for WebsiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebsiteType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        WebsiteType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Invalid website type: {}. Must be one of: ecommerce, saas, content, local, marketplace",
                    s
                ))
            })
    }
}

/// Limits and execution switches for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    /// Number of findings surfaced per section (1..=3)
    #[serde(default = "EngineConfig::default_max_section_items")]
    pub max_section_items: usize,

    /// Classify and synthesize independent topics in parallel
    #[serde(default = "EngineConfig::default_parallel_topics")]
    pub parallel_topics: bool,

    /// Retry a non-conformant message with the topic's fallback template
    #[serde(default = "EngineConfig::default_allow_fallback_templates")]
    pub allow_fallback_templates: bool,
}

impl EngineConfig {
    pub const MAX_SECTION_ITEMS: usize = 3;

    fn default_max_section_items() -> usize {
        Self::MAX_SECTION_ITEMS
    }

    fn default_parallel_topics() -> bool {
        true
    }

    fn default_allow_fallback_templates() -> bool {
        true
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_section_items: Self::default_max_section_items(),
            parallel_topics: Self::default_parallel_topics(),
            allow_fallback_templates: Self::default_allow_fallback_templates(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Log format: "pretty" or "compact"
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_format() -> String {
        "pretty".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct InsightConfig {
    #[serde(default)]
    pub website_type: WebsiteType,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl InsightConfig {
    pub fn for_website(website_type: WebsiteType) -> Self {
        Self {
            website_type,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let items = self.engine.max_section_items;
        if items == 0 || items > EngineConfig::MAX_SECTION_ITEMS {
            return Err(ConfigError::Validation(format!(
                "max_section_items must be between 1 and {}, got {}",
                EngineConfig::MAX_SECTION_ITEMS,
                items
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Invalid log format: {}. Must be one of: pretty, compact",
                    other
                )))
            }
        }

        Ok(())
    }
}

/// Loads [`InsightConfig`] with env > file > defaults precedence.
pub struct ConfigManager {
    config: InsightConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (./.seo-insight.toml, then ~/.seo-insight/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = Self::discover_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load an explicit config file, still applying environment overrides.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    fn finish(config: InsightConfig, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config)?;
        config.validate()?;

        match config_path {
            Some(ref path) => info!(path = %path.display(), "configuration file loaded"),
            None => info!("no configuration file found, using defaults"),
        }
        info!(
            website_type = %config.website_type,
            max_section_items = config.engine.max_section_items,
            parallel_topics = config.engine.parallel_topics,
            "configuration ready"
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
        }
    }

    fn discover_config_file() -> Result<(InsightConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(USER_CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((InsightConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<InsightConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(mut config: InsightConfig) -> Result<InsightConfig, ConfigError> {
        if let Ok(kind) = std::env::var("SEO_INSIGHT_WEBSITE_TYPE") {
            config.website_type = kind.parse()?;
        }
        if let Ok(items) = std::env::var("SEO_INSIGHT_MAX_SECTION_ITEMS") {
            config.engine.max_section_items = items.parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "SEO_INSIGHT_MAX_SECTION_ITEMS is not a number: {}",
                    items
                ))
            })?;
        }
        if let Ok(parallel) = std::env::var("SEO_INSIGHT_PARALLEL") {
            config.engine.parallel_topics = parallel.to_lowercase() == "true" || parallel == "1";
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            // Only plain levels are mirrored; directive strings stay with the subscriber.
            if matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
                config.logging.level = level;
            }
        }

        Ok(config)
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn into_config(self) -> InsightConfig {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write a default config file, creating parent directories.
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(&InsightConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::Read(e.to_string()))?;
            }
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::Read(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InsightConfig::default();
        assert_eq!(config.website_type, WebsiteType::Ecommerce);
        assert_eq!(config.engine.max_section_items, 3);
        assert!(config.engine.parallel_topics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = InsightConfig::default();
        config.engine.max_section_items = 0;
        assert!(config.validate().is_err());

        config.engine.max_section_items = 4;
        assert!(config.validate().is_err());

        config.engine.max_section_items = 2;
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());

        config.logging.level = "debug".into();
        config.logging.format = "json".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_website_type_parsing() {
        assert_eq!("SaaS".parse::<WebsiteType>().unwrap(), WebsiteType::Saas);
        assert_eq!(" local ".parse::<WebsiteType>().unwrap(), WebsiteType::Local);
        assert!("blog".parse::<WebsiteType>().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: InsightConfig = toml::from_str(
            r#"
            website_type = "content"

            [engine]
            parallel_topics = false
            "#,
        )
        .unwrap();
        assert_eq!(config.website_type, WebsiteType::Content);
        assert!(!config.engine.parallel_topics);
        assert_eq!(config.engine.max_section_items, 3);
        assert_eq!(config.logging.level, "info");
    }
}
