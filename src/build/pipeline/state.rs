//! Per-document pipeline states.

use std::path::{Path, PathBuf};

use crate::build::document::Document;
use crate::build::error::LocatedError;
use crate::build::frontmatter::Frontmatter;
use crate::build::render::RenderResult;
use crate::build::resolve::{Resolution, ResolvedVia};

/// A document whose frontmatter parsed and validated.
#[derive(Debug)]
pub struct ParsedPage {
    pub document: Document,
    pub frontmatter: Frontmatter,
    /// The file as read, for error snippets
    pub source: String,
}

/// A parsed page with the template it resolved to.
#[derive(Debug)]
pub struct ResolvedPage {
    pub page: ParsedPage,
    pub resolution: Resolution,
}

/// A rendered page waiting to be emitted.
#[derive(Debug)]
pub struct RenderedPage {
    pub via: ResolvedVia,
    pub result: RenderResult,
}

/// Outcome of a page that made it all the way through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedPage {
    pub path: PathBuf,
    pub url: String,
    pub template: String,
    pub via: ResolvedVia,
    /// Where the page was written, `None` when output is discarded
    pub output: Option<PathBuf>,
}

/// Where a document is in `Parsed -> Resolved -> Rendered -> Emitted`.
///
/// `Failed` and `Skipped` are terminal and can be entered from any
/// non-terminal state. A state is never entered twice.
#[derive(Debug)]
pub enum PageState {
    Parsed(ParsedPage),
    Resolved(ResolvedPage),
    Rendered(RenderedPage),
    Emitted(EmittedPage),
    Failed(LocatedError),
    /// Draft left out of the build
    Skipped(PathBuf),
}

impl PageState {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::Parsed(_) => "parsed",
            PageState::Resolved(_) => "resolved",
            PageState::Rendered(_) => "rendered",
            PageState::Emitted(_) => "emitted",
            PageState::Failed(_) => "failed",
            PageState::Skipped(_) => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PageState::Emitted(_) | PageState::Failed(_) | PageState::Skipped(_)
        )
    }

    /// Path of the document this state belongs to.
    pub fn path(&self) -> &Path {
        match self {
            PageState::Parsed(page) => &page.document.path,
            PageState::Resolved(resolved) => &resolved.page.document.path,
            PageState::Rendered(rendered) => &rendered.result.path,
            PageState::Emitted(emitted) => &emitted.path,
            PageState::Failed(error) => error.path(),
            PageState::Skipped(path) => path,
        }
    }
}
