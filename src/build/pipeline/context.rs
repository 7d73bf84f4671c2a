//! Pipeline context for sharing state across stages.

use crate::build::render::Renderer;
use crate::build::resolve::Resolver;

use super::sink::OutputSink;

/// Shared, read-only resources used by every stage.
///
/// Built once per build before any document is processed; workers only ever
/// borrow it.
pub struct PipelineContext {
    /// Template set plus reserved-name table
    pub resolver: Resolver,

    /// Parsed templates and markdown settings
    pub renderer: Renderer,

    /// Destination for rendered pages
    pub sink: Box<dyn OutputSink>,

    /// Render `draft: true` pages instead of skipping them
    pub include_drafts: bool,
}

impl PipelineContext {
    pub fn new(resolver: Resolver, renderer: Renderer, sink: Box<dyn OutputSink>) -> Self {
        Self {
            resolver,
            renderer,
            sink,
            include_drafts: false,
        }
    }

    pub fn include_drafts(mut self, include: bool) -> Self {
        self.include_drafts = include;
        self
    }
}
