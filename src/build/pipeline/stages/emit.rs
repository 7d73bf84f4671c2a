//! Output stage.

use crate::build::error::{ErrorKind, LocatedError};
use crate::build::pipeline::{EmittedPage, PageState, PipelineContext, Stage};

/// Stage that hands rendered pages to the output sink.
pub struct EmitStage;

impl Stage for EmitStage {
    fn name(&self) -> &'static str {
        "emit"
    }

    fn process(&self, state: PageState, ctx: &PipelineContext) -> PageState {
        let rendered = match state {
            PageState::Rendered(rendered) => rendered,
            other => return other,
        };

        let result = rendered.result;
        match ctx.sink.emit(&result) {
            Ok(output) => PageState::Emitted(EmittedPage {
                path: result.path,
                url: result.url,
                template: result.template,
                via: rendered.via,
                output,
            }),
            Err(e) => PageState::Failed(LocatedError::new(
                &result.path,
                ErrorKind::Write {
                    path: e.path,
                    source: e.source,
                },
            )),
        }
    }
}
