//! Page rendering stage.
//!
//! Renders the document body from markdown and wraps it in the resolved
//! template.

use crate::build::error::LocatedError;
use crate::build::pipeline::{PageState, PipelineContext, RenderedPage, Stage};

/// Stage that renders a resolved page to bytes.
pub struct RenderStage;

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn process(&self, state: PageState, ctx: &PipelineContext) -> PageState {
        let resolved = match state {
            PageState::Resolved(resolved) => resolved,
            other => return other,
        };

        let page = &resolved.page;
        match ctx
            .renderer
            .render(&resolved.resolution.template, &page.document, &page.frontmatter)
        {
            Ok(result) => PageState::Rendered(RenderedPage {
                via: resolved.resolution.via,
                result,
            }),
            Err(e) => PageState::Failed(LocatedError::new(&page.document.path, e)),
        }
    }
}
