//! Output sinks.
//!
//! Writes the final HTML output to the filesystem, or drops it in check mode.

use std::path::PathBuf;

use crate::build::paths::url_to_output_path;
use crate::build::render::RenderResult;

#[derive(thiserror::Error, Debug)]
#[error("failed to write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Where rendered pages go.
pub trait OutputSink: Send + Sync {
    /// Emit one page, returning the file it was written to (if any).
    fn emit(&self, result: &RenderResult) -> Result<Option<PathBuf>, WriteError>;
}

/// Writes each page to `<output>/<url>/index.html`, creating any necessary
/// parent directories.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    output_dir: PathBuf,
}

impl DirectoryWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl OutputSink for DirectoryWriter {
    fn emit(&self, result: &RenderResult) -> Result<Option<PathBuf>, WriteError> {
        let output_path = url_to_output_path(&result.url, &self.output_dir);
        let write_error = |source| WriteError {
            path: output_path.clone(),
            source,
        };

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&output_path, &result.bytes).map_err(write_error)?;

        Ok(Some(output_path))
    }
}

/// Accepts every page and writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl OutputSink for DiscardSink {
    fn emit(&self, _result: &RenderResult) -> Result<Option<PathBuf>, WriteError> {
        Ok(None)
    }
}
