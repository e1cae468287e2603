//! Vancian: a spell compendium harvester
//!
//! This crate crawls a paginated catalog of spell entries, filters them by a
//! source-book allow-list, fetches and parses each matching entry's detail
//! page, and produces a single aggregated JSON array.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod render;

use thiserror::Error;

/// Main error type for Vancian operations
#[derive(Debug, Error)]
pub enum VancianError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] render::RenderError),

    #[error(transparent)]
    Run(#[from] crawler::RunError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Vancian operations
pub type Result<T> = std::result::Result<T, VancianError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{ItemRef, LevelAssociation, SourceCitation, SpellRecord};
pub use render::{Engine, PageHandle};
