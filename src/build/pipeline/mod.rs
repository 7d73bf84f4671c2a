//! Build pipeline for document processing.
//!
//! Each document is moved through a series of stages, one at a time:
//! 1. Load (read the file, split and validate frontmatter)
//! 2. Resolve (pick the page template)
//! 3. Render (markdown body, then the page template)
//! 4. Emit (write to the output directory)
//!
//! A stage only acts on the state it expects and passes every other state
//! through, so a failure at any point travels untouched to the end.

mod context;
mod sink;
mod stages;
mod state;

pub use context::PipelineContext;
pub use sink::{DirectoryWriter, DiscardSink, OutputSink};
pub use state::{EmittedPage, PageState, ParsedPage, RenderedPage, ResolvedPage};

use stages::{EmitStage, RenderStage, ResolveStage};

use super::source::SourceFile;

/// A stage in the document processing pipeline.
pub trait Stage: Send + Sync {
    /// Unique name for this stage.
    fn name(&self) -> &'static str;

    /// Move a page one step forward.
    fn process(&self, state: PageState, ctx: &PipelineContext) -> PageState;
}

/// The document processing pipeline.
///
/// Owns the shared context; `run` takes `&self` so one pipeline can serve
/// many workers at once.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    ctx: PipelineContext,
}

impl Pipeline {
    /// Create the default pipeline: resolve → render → emit.
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            stages: vec![
                Box::new(ResolveStage),
                Box::new(RenderStage),
                Box::new(EmitStage),
            ],
            ctx,
        }
    }

    /// Process one document to a terminal state.
    pub fn run(&self, source: &SourceFile) -> PageState {
        let mut state = stages::load(source, &self.ctx);
        for stage in &self.stages {
            if state.is_terminal() {
                break;
            }
            state = stage.process(state, &self.ctx);
            tracing::trace!(
                path = %source.path.display(),
                stage = stage.name(),
                state = state.name(),
                "stage finished"
            );
        }
        state
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pulldown_cmark::Options;

    use super::*;
    use crate::build::render::{Renderer, SiteContext};
    use crate::build::reserved::ReservedNameSet;
    use crate::build::resolve::{ResolvedVia, Resolver};
    use crate::build::templates::{TemplateFile, TemplateSet};
    use crate::config::ReservedEntryConfig;

    fn pipeline(output: &Path) -> Pipeline {
        let files: Vec<TemplateFile> = [
            ("pages/_index.html", "home:{{ page.title }}"),
            ("pages/blog-post.html", "post:{{ page.title }}:{{ content | safe }}"),
            ("pages/broken.html", "{{ page.nope }}"),
        ]
        .iter()
        .map(|(name, source)| TemplateFile {
            name: name.to_string(),
            path: PathBuf::from(name),
            source: source.to_string(),
        })
        .collect();

        let reserved = ReservedNameSet::from_config(&[ReservedEntryConfig {
            rule: "is-root-index".to_string(),
            template: "_index.html".to_string(),
        }])
        .unwrap();
        let site = SiteContext {
            name: "Site".to_string(),
            url: None,
            params: Default::default(),
        };

        Pipeline::new(PipelineContext::new(
            Resolver::new(TemplateSet::from_files(&files, "pages"), reserved),
            Renderer::new(&files, Options::empty(), site).unwrap(),
            Box::new(DirectoryWriter::new(output)),
        ))
    }

    fn source(root: &Path, relative: &str, text: &str) -> SourceFile {
        let full_path = root.join(relative);
        std::fs::create_dir_all(full_path.parent().unwrap()).unwrap();
        std::fs::write(&full_path, text).unwrap();
        SourceFile {
            path: PathBuf::from(relative),
            full_path,
        }
    }

    #[test]
    fn test_stage_order() {
        let out = tempfile::tempdir().unwrap();
        assert_eq!(pipeline(out.path()).stage_names(), vec!["resolve", "render", "emit"]);
    }

    #[test]
    fn test_run_emits_page() {
        let content = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pipeline = pipeline(out.path());

        let state = pipeline.run(&source(content.path(), "blog/post1.md", "---\ntitle: One\n---\nHi\n"));
        let page = match state {
            PageState::Emitted(page) => page,
            other => panic!("unexpected state: {other:?}"),
        };
        assert_eq!(page.template, "blog-post.html");
        assert_eq!(page.via, ResolvedVia::Convention);
        assert_eq!(page.url, "/blog/post1");

        let written = std::fs::read_to_string(out.path().join("blog/post1/index.html")).unwrap();
        assert_eq!(written, "post:One:<p>Hi</p>\n");
    }

    #[test]
    fn test_run_root_index() {
        let content = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pipeline = pipeline(out.path());

        let state = pipeline.run(&source(content.path(), "index.md", "Welcome"));
        assert!(matches!(state, PageState::Emitted(_)));
        assert_eq!(
            std::fs::read_to_string(out.path().join("index.html")).unwrap(),
            "home:Index"
        );
    }

    #[test]
    fn test_override_failure_located_at_template_line() {
        let content = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pipeline = pipeline(out.path());

        let state = pipeline.run(&source(
            content.path(),
            "about.md",
            "---\ntitle: About\ntemplate: missing\n---\n",
        ));
        let error = match state {
            PageState::Failed(error) => error,
            other => panic!("unexpected state: {other:?}"),
        };
        assert_eq!(error.kind().category(), "template-not-found");
        assert_eq!(error.location().map(|l| l.line), Some(3));
    }

    #[test]
    fn test_render_failure_names_document() {
        let content = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pipeline = pipeline(out.path());

        let state = pipeline.run(&source(content.path(), "x.md", "---\ntemplate: broken\n---\n"));
        let error = match state {
            PageState::Failed(error) => error,
            other => panic!("unexpected state: {other:?}"),
        };
        assert_eq!(error.path(), Path::new("x.md"));
        assert_eq!(error.kind().category(), "render");
        assert!(!out.path().join("x/index.html").exists());
    }
}
