//! Configuration type definitions.
//!
//! These types mirror `mub.yaml` one to one. They are pure data: paths are
//! kept as written and resolved against the config file's directory by the
//! builder, and reserved-name rules stay as strings until the build parses
//! them into a `ReservedNameSet`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// The full site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    /// Ordered reserved-name table, evaluated before path conventions
    #[serde(default)]
    pub reserved: Vec<ReservedEntryConfig>,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Arbitrary values passed to templates as `site.params.*`
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

// =============================================================================
// Content and templates
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding the markdown documents
    #[serde(default = "default_content_dir")]
    pub dir: PathBuf,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory loaded into the template engine (layouts, partials, pages)
    #[serde(default = "default_templates_dir")]
    pub dir: PathBuf,
    /// Subdirectory of `dir` whose templates pages resolve to
    #[serde(default = "default_pages_dir")]
    pub pages: PathBuf,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("pages")
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
            pages: default_pages_dir(),
        }
    }
}

/// One reserved-name entry as written in the config file.
///
/// ```yaml
/// reserved:
///   - match: is-root-index
///     template: _index.html
///   - match: path==about.md
///     template: _about.html
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedEntryConfig {
    #[serde(rename = "match")]
    pub rule: String,
    pub template: String,
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Build configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Worker count; defaults to the available parallelism
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Upper bound on the time spent rendering a single page
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Render pages marked `draft: true`
    #[serde(default)]
    pub drafts: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            timeout_secs: default_timeout_secs(),
            drafts: false,
        }
    }
}
