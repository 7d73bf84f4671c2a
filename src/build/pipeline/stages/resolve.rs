//! Template resolution stage.

use crate::build::error::LocatedError;
use crate::build::frontmatter::key_line;
use crate::build::pipeline::{PageState, PipelineContext, ResolvedPage, Stage};

/// Stage that picks the page template for a parsed document.
///
/// A failed frontmatter override is reported at the `template:` line.
pub struct ResolveStage;

impl Stage for ResolveStage {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn process(&self, state: PageState, ctx: &PipelineContext) -> PageState {
        let page = match state {
            PageState::Parsed(page) => page,
            other => return other,
        };

        match ctx.resolver.resolve(&page.document.path, &page.frontmatter) {
            Ok(resolution) => {
                tracing::debug!(
                    path = %page.document.path.display(),
                    template = %resolution.template.name,
                    via = %resolution.via,
                    "resolved template"
                );
                PageState::Resolved(ResolvedPage { page, resolution })
            }
            Err(e) => {
                let error = LocatedError::new(&page.document.path, e);
                let template_line = page
                    .frontmatter
                    .template
                    .as_ref()
                    .and(page.document.raw_frontmatter.as_deref())
                    .and_then(|raw| key_line(raw, "template"));

                PageState::Failed(match template_line {
                    Some(line) => error
                        .at(page.document.frontmatter_file_line(line), None)
                        .with_source(&page.source),
                    None => error,
                })
            }
        }
    }
}
