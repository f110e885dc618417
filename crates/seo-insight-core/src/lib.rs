pub mod config;
pub mod error;
pub mod summary;
pub mod traits;
pub mod types;

pub use config::{
    ConfigError, ConfigManager, EngineConfig, InsightConfig, LoggingConfig, WebsiteType,
};
pub use error::*;
pub use summary::*;
pub use traits::*;
pub use types::*;
