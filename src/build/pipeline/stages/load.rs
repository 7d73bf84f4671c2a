//! Reading and parsing a document.

use crate::build::document::Document;
use crate::build::error::{ErrorKind, LocatedError};
use crate::build::frontmatter::FrontmatterError;
use crate::build::pipeline::{PageState, ParsedPage, PipelineContext};
use crate::build::source::SourceFile;

/// Read a source file and validate its frontmatter.
///
/// Produces `Parsed`, `Skipped` for drafts left out of the build, or `Failed`.
pub fn load(source: &SourceFile, ctx: &PipelineContext) -> PageState {
    let text = match source.read() {
        Ok(text) => text,
        Err(e) => return PageState::Failed(LocatedError::new(&source.path, ErrorKind::Read(e))),
    };

    let document = match Document::parse(&source.path, &text) {
        Ok(document) => document,
        // Only an unclosed block fails here; point at the opening delimiter
        Err(e) => {
            return PageState::Failed(
                LocatedError::new(&source.path, e)
                    .at(1, None)
                    .with_source(&text),
            );
        }
    };

    let frontmatter = match document.frontmatter() {
        Ok(frontmatter) => frontmatter,
        Err(e) => return PageState::Failed(locate_frontmatter_error(&document, e, &text)),
    };

    if frontmatter.draft && !ctx.include_drafts {
        tracing::debug!(path = %source.path.display(), "skipping draft");
        return PageState::Skipped(source.path.clone());
    }

    PageState::Parsed(ParsedPage {
        document,
        frontmatter,
        source: text,
    })
}

/// Translate a position inside the frontmatter block to one in the file.
fn locate_frontmatter_error(document: &Document, error: FrontmatterError, text: &str) -> LocatedError {
    let position = error.position();
    tracing::debug!(
        path = %document.path.display(),
        field = ?error.field(),
        "invalid frontmatter"
    );
    let located = LocatedError::new(&document.path, error);
    match position {
        Some((line, column)) => located
            .at(document.frontmatter_file_line(line), column)
            .with_source(text),
        None => located.at(1, None).with_source(text),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use pulldown_cmark::Options;

    use super::*;
    use crate::build::error::Location;
    use crate::build::pipeline::DiscardSink;
    use crate::build::render::{Renderer, SiteContext};
    use crate::build::reserved::ReservedNameSet;
    use crate::build::resolve::Resolver;
    use crate::build::templates::TemplateSet;

    fn context(include_drafts: bool) -> PipelineContext {
        let renderer = Renderer::new(
            &[],
            Options::empty(),
            SiteContext {
                name: "Site".to_string(),
                url: None,
                params: Default::default(),
            },
        )
        .unwrap();
        PipelineContext::new(
            Resolver::new(TemplateSet::default(), ReservedNameSet::default()),
            renderer,
            Box::new(DiscardSink),
        )
        .include_drafts(include_drafts)
    }

    fn source_file(root: &Path, relative: &str, text: &str) -> SourceFile {
        let full_path = root.join(relative);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, text).unwrap();
        SourceFile {
            path: PathBuf::from(relative),
            full_path,
        }
    }

    #[test]
    fn test_load_parses_document() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), "about.md", "---\ntitle: About\n---\nHello\n");

        match load(&source, &context(false)) {
            PageState::Parsed(page) => {
                assert_eq!(page.frontmatter.title.as_deref(), Some("About"));
                assert_eq!(page.document.body, "Hello\n");
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_located_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(
            dir.path(),
            "blog/post1.md",
            "---\ntitle: Post One\nkind: unknown-kind\n---\nBody\n",
        );

        let PageState::Failed(error) = load(&source, &context(false)) else {
            panic!("expected failure");
        };
        assert_eq!(error.path(), Path::new("blog/post1.md"));
        assert_eq!(
            error.location(),
            Some(Location {
                line: 3,
                column: None
            })
        );
        assert!(matches!(
            error.kind(),
            ErrorKind::Frontmatter(FrontmatterError::Type { field, .. }) if field == "kind"
        ));
        assert!(error.report().contains("3 | kind: unknown-kind"));
    }

    #[test]
    fn test_unterminated_frontmatter_points_at_opening() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), "a.md", "---\ntitle: A\n");

        let PageState::Failed(error) = load(&source, &context(false)) else {
            panic!("expected failure");
        };
        assert_eq!(error.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn test_drafts_skipped_unless_included() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(dir.path(), "wip.md", "---\ndraft: true\n---\n");

        assert!(matches!(load(&source, &context(false)), PageState::Skipped(_)));
        assert!(matches!(load(&source, &context(true)), PageState::Parsed(_)));
    }

    #[test]
    fn test_unreadable_file() {
        let source = SourceFile {
            path: PathBuf::from("gone.md"),
            full_path: PathBuf::from("/nonexistent/mub/gone.md"),
        };

        let PageState::Failed(error) = load(&source, &context(false)) else {
            panic!("expected failure");
        };
        assert_eq!(error.kind().category(), "io");
        assert_eq!(error.path(), Path::new("gone.md"));
    }
}
