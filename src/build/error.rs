//! Located errors.
//!
//! Every per-page failure leaves the pipeline as a `LocatedError`: the
//! underlying error plus the document path it came from and, when known, the
//! line and column inside that document. `Display` gives the one-line form
//! (`blog/post1.md:3: field `kind` ...`); `report` adds the category and a
//! snippet of the surrounding source.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::frontmatter::FrontmatterError;
use super::render::RenderError;
use super::resolve::ResolveError;

/// Placeholder used if an error is ever built without a path.
const UNKNOWN_PATH: &str = "<unknown>";

/// Lines of context shown before the offending line.
const SNIPPET_BEFORE: usize = 2;
/// Lines of context shown after the offending line.
const SNIPPET_AFTER: usize = 1;

#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to read document: {0}")]
    Read(std::io::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("rendering did not finish within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("render worker failed: {0}")]
    Worker(String),

    #[error("output URL `{url}` is also produced by {}", display_paths(.others))]
    UrlCollision { url: String, others: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ErrorKind {
    /// Short category name shown in reports.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::Frontmatter(FrontmatterError::Type { .. }) => "frontmatter-type",
            ErrorKind::Frontmatter(_) => "frontmatter",
            ErrorKind::Resolve(ResolveError::TemplateNotFound { .. }) => "template-not-found",
            ErrorKind::Resolve(ResolveError::AmbiguousTemplate { .. }) => "ambiguous-template",
            ErrorKind::Render(_) => "render",
            ErrorKind::Read(_) | ErrorKind::Write { .. } => "io",
            ErrorKind::Timeout(_) => "timeout",
            ErrorKind::Worker(_) => "worker",
            ErrorKind::UrlCollision { .. } => "url-collision",
        }
    }
}

/// A position inside a document (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: Option<usize>,
}

/// Source lines around the error location.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snippet {
    /// (line number, text) pairs
    lines: Vec<(usize, String)>,
}

#[derive(Debug)]
pub struct LocatedError {
    path: PathBuf,
    location: Option<Location>,
    kind: ErrorKind,
    snippet: Option<Snippet>,
}

impl LocatedError {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<ErrorKind>) -> Self {
        let path = path.into();
        let path = if path.as_os_str().is_empty() {
            PathBuf::from(UNKNOWN_PATH)
        } else {
            path
        };
        Self {
            path,
            location: None,
            kind: kind.into(),
            snippet: None,
        }
    }

    /// Attach a line (and optional column) inside the document.
    pub fn at(mut self, line: usize, column: Option<usize>) -> Self {
        self.location = Some(Location { line, column });
        self
    }

    /// Capture the source lines around the location for the report.
    pub fn with_source(mut self, source: &str) -> Self {
        let Some(location) = self.location else {
            return self;
        };
        let first = location.line.saturating_sub(SNIPPET_BEFORE).max(1);
        let last = location.line + SNIPPET_AFTER;
        let lines: Vec<(usize, String)> = source
            .lines()
            .enumerate()
            .map(|(index, text)| (index + 1, text.to_string()))
            .filter(|(number, _)| (first..=last).contains(number))
            .collect();
        if !lines.is_empty() {
            self.snippet = Some(Snippet { lines });
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Multi-line report: category, one-line summary and source snippet.
    ///
    /// ```text
    /// error[frontmatter-type]: blog/post1.md:3: field `kind` unknown page kind ...
    ///   |
    /// 2 | title: Post One
    /// 3 | kind: unknown-kind
    ///   | ^
    /// ```
    pub fn report(&self) -> String {
        let mut out = format!("error[{}]: {}\n", self.kind.category(), self);

        let (Some(snippet), Some(location)) = (&self.snippet, self.location) else {
            return out;
        };

        let width = snippet
            .lines
            .iter()
            .map(|(number, _)| number.to_string().len())
            .max()
            .unwrap_or(1);
        let gutter = " ".repeat(width);

        out.push_str(&format!("{gutter} |\n"));
        for (number, text) in &snippet.lines {
            out.push_str(&format!("{number:>width$} | {text}\n"));
            if *number == location.line {
                let column = location.column.unwrap_or(1).max(1);
                let pad = " ".repeat(column - 1);
                out.push_str(&format!("{gutter} | {pad}^\n"));
            }
        }
        out
    }
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(location) = self.location {
            write!(f, ":{}", location.line)?;
            if let Some(column) = location.column {
                write!(f, ":{column}")?;
            }
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for LocatedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
