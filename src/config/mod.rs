//! Configuration loading and types for mub.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

pub use load::{CONFIG_FILE_NAME, resolve_config_path};
pub use types::{
    BuildConfig, Config, ContentConfig, MarkdownConfig, ReservedEntryConfig, SiteConfig,
    TemplatesConfig,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("{}", format_deserialize_error(.0))]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}

/// Format a deserialization error with a hint for the common mistakes.
fn format_deserialize_error(e: &config::ConfigError) -> String {
    let msg = e.to_string();

    if msg.contains("missing field `site`") {
        return "invalid config: 'site' section is required\n\nExample:\n  site:\n    name: My Site"
            .to_string();
    }
    if msg.contains("missing field `name`") {
        return "invalid config: missing required 'site.name' field".to_string();
    }
    if msg.contains("missing field `match`") || msg.contains("missing field `template`") {
        return "invalid config: each 'reserved' entry needs both 'match' and 'template'\n\nExample:\n  reserved:\n    - match: is-root-index\n      template: _index.html".to_string();
    }

    format!("invalid config: {msg}")
}

impl Config {
    /// A minimal configuration for a new site, used by `mub init`.
    pub fn scaffold(name: &str) -> Self {
        Self {
            site: SiteConfig {
                name: name.to_string(),
                url: None,
                output: "_site".into(),
                params: Default::default(),
            },
            content: ContentConfig::default(),
            templates: TemplatesConfig::default(),
            reserved: vec![ReservedEntryConfig {
                rule: "is-root-index".to_string(),
                template: "_index.html".to_string(),
            }],
            markdown: MarkdownConfig::default(),
            build: BuildConfig::default(),
        }
    }

    /// Check values that deserialize fine but can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "invalid config: 'site.name' must not be empty".to_string(),
            ));
        }
        if self.build.jobs == Some(0) {
            return Err(ConfigError::Validation(
                "invalid config: 'build.jobs' must be at least 1".to_string(),
            ));
        }
        if self.build.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "invalid config: 'build.timeout_secs' must be at least 1".to_string(),
            ));
        }
        if self.templates.pages.is_absolute() {
            return Err(ConfigError::Validation(
                "invalid config: 'templates.pages' must be relative to 'templates.dir'".to_string(),
            ));
        }
        Ok(())
    }
}
