//! Template resolution.
//!
//! A document is matched to exactly one page template, trying in order:
//!
//! 1. the `template` named in its frontmatter (never falls through),
//! 2. the reserved-name table,
//! 3. templates derived from its path and kind,
//!
//! and failing with the full list of candidates when nothing exists.

use std::fmt;
use std::path::Path;

use super::frontmatter::{Frontmatter, PageKind};
use super::paths::normalize_path;
use super::reserved::ReservedNameSet;
use super::templates::{TemplateRef, TemplateSet};

/// Extension appended to override names written without one.
const TEMPLATE_EXTENSION: &str = "html";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no template found (tried: {})", .candidates.join(", "))]
    TemplateNotFound { candidates: Vec<String> },

    #[error("ambiguous template: {} reserved entries match ({})", .matches.len(), describe_matches(.matches))]
    AmbiguousTemplate {
        /// (rule, template) of every matching entry
        matches: Vec<(String, String)>,
    },
}

fn describe_matches(matches: &[(String, String)]) -> String {
    matches
        .iter()
        .map(|(rule, template)| format!("`{rule}` -> {template}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which step of the precedence order picked the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVia {
    Override,
    Reserved { rule: String },
    Convention,
}

impl fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedVia::Override => f.write_str("frontmatter override"),
            ResolvedVia::Reserved { rule } => write!(f, "reserved `{rule}`"),
            ResolvedVia::Convention => f.write_str("path convention"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub template: TemplateRef,
    pub via: ResolvedVia,
}

/// Resolves documents against a fixed template set and reserved-name table.
#[derive(Debug, Clone)]
pub struct Resolver {
    templates: TemplateSet,
    reserved: ReservedNameSet,
}

impl Resolver {
    pub fn new(templates: TemplateSet, reserved: ReservedNameSet) -> Self {
        Self {
            templates,
            reserved,
        }
    }

    /// Pick the template for a document at `path` (relative to the content
    /// root) with the given frontmatter.
    pub fn resolve(&self, path: &Path, frontmatter: &Frontmatter) -> Result<Resolution, ResolveError> {
        if let Some(name) = &frontmatter.template {
            return self.first_existing(override_candidates(name), ResolvedVia::Override);
        }

        let matches = self.reserved.matching(path, frontmatter);
        match matches.as_slice() {
            [] => {}
            [entry] => {
                return self.first_existing(
                    vec![entry.template.clone()],
                    ResolvedVia::Reserved {
                        rule: entry.rule.to_string(),
                    },
                );
            }
            _ => {
                return Err(ResolveError::AmbiguousTemplate {
                    matches: matches
                        .iter()
                        .map(|entry| (entry.rule.to_string(), entry.template.clone()))
                        .collect(),
                });
            }
        }

        let kind = frontmatter.effective_kind(path);
        self.first_existing(convention_candidates(path, kind), ResolvedVia::Convention)
    }

    fn first_existing(
        &self,
        candidates: Vec<String>,
        via: ResolvedVia,
    ) -> Result<Resolution, ResolveError> {
        match candidates.iter().find_map(|name| self.templates.get(name)) {
            Some(template) => Ok(Resolution {
                template: template.clone(),
                via,
            }),
            None => Err(ResolveError::TemplateNotFound { candidates }),
        }
    }
}

/// Names tried for a frontmatter `template` value.
fn override_candidates(name: &str) -> Vec<String> {
    let name = normalize_path(Path::new(name.trim()));
    let mut candidates = vec![name.clone()];
    if Path::new(&name).extension().is_none() {
        candidates.push(format!("{name}.{TEMPLATE_EXTENSION}"));
    }
    candidates
}

/// Names derived from a document's location, most specific first.
///
/// For `guides/rust/intro.md` of kind `post`:
///
/// ```text
/// guides/rust/intro.html
/// guides-rust-post.html
/// guides-post.html
/// post.html
/// ```
pub fn convention_candidates(path: &Path, kind: PageKind) -> Vec<String> {
    let mirror = normalize_path(&path.with_extension(TEMPLATE_EXTENSION));
    let mut candidates = vec![mirror];

    let sections: Vec<String> = path
        .parent()
        .map(|parent| {
            normalize_path(parent)
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    for depth in (1..=sections.len()).rev() {
        candidates.push(format!(
            "{}-{kind}.{TEMPLATE_EXTENSION}",
            sections[..depth].join("-")
        ));
    }
    candidates.push(format!("{kind}.{TEMPLATE_EXTENSION}"));

    candidates
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::build::templates::TemplateFile;
    use crate::config::ReservedEntryConfig;

    fn template_set(names: &[&str]) -> TemplateSet {
        let files: Vec<TemplateFile> = names
            .iter()
            .map(|name| TemplateFile {
                name: format!("pages/{name}"),
                path: PathBuf::from("/templates/pages").join(name),
                source: String::new(),
            })
            .collect();
        TemplateSet::from_files(&files, "pages")
    }

    fn reserved(entries: &[(&str, &str)]) -> ReservedNameSet {
        let entries: Vec<ReservedEntryConfig> = entries
            .iter()
            .map(|(rule, template)| ReservedEntryConfig {
                rule: rule.to_string(),
                template: template.to_string(),
            })
            .collect();
        ReservedNameSet::from_config(&entries).unwrap()
    }

    fn frontmatter(raw: &str) -> Frontmatter {
        Frontmatter::parse(Some(raw)).unwrap()
    }

    #[test]
    fn test_root_index_uses_reserved_template() {
        let resolver = Resolver::new(
            template_set(&["_index.html", "index.html", "page.html"]),
            reserved(&[("is-root-index", "_index.html")]),
        );

        let resolution = resolver
            .resolve(Path::new("index.md"), &Frontmatter::default())
            .unwrap();
        assert_eq!(resolution.template.name, "_index.html");
        assert_eq!(
            resolution.via,
            ResolvedVia::Reserved {
                rule: "is-root-index".to_string()
            }
        );
    }

    #[test]
    fn test_reserved_path_beats_convention() {
        let resolver = Resolver::new(
            template_set(&["_about.html", "about.html", "page.html"]),
            reserved(&[
                ("is-root-index", "_index.html"),
                ("path==about.md", "_about.html"),
            ]),
        );

        let resolution = resolver
            .resolve(Path::new("about.md"), &Frontmatter::default())
            .unwrap();
        assert_eq!(resolution.template.name, "_about.html");
    }

    #[test]
    fn test_path_convention_section_template() {
        let resolver = Resolver::new(
            template_set(&["blog-post.html", "page.html"]),
            reserved(&[("is-root-index", "_index.html")]),
        );

        let resolution = resolver
            .resolve(Path::new("blog/post1.md"), &Frontmatter::default())
            .unwrap();
        assert_eq!(resolution.template.name, "blog-post.html");
        assert_eq!(resolution.template.engine_name, "pages/blog-post.html");
        assert_eq!(resolution.via, ResolvedVia::Convention);
    }

    #[test]
    fn test_path_convention_prefers_mirror() {
        let resolver = Resolver::new(
            template_set(&["blog/post1.html", "blog-post.html"]),
            ReservedNameSet::default(),
        );

        let resolution = resolver
            .resolve(Path::new("blog/post1.md"), &Frontmatter::default())
            .unwrap();
        assert_eq!(resolution.template.name, "blog/post1.html");
    }

    #[test]
    fn test_override_missing_never_falls_through() {
        let resolver = Resolver::new(
            template_set(&["_about.html", "about.html", "page.html"]),
            reserved(&[("path==about.md", "_about.html")]),
        );

        let err = resolver
            .resolve(Path::new("about.md"), &frontmatter("template: fancy"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::TemplateNotFound {
                candidates: vec!["fancy".to_string(), "fancy.html".to_string()]
            }
        );
    }

    #[test]
    fn test_override_beats_reserved() {
        let resolver = Resolver::new(
            template_set(&["_index.html", "landing.html"]),
            reserved(&[("is-root-index", "_index.html")]),
        );

        let resolution = resolver
            .resolve(Path::new("index.md"), &frontmatter("template: landing"))
            .unwrap();
        assert_eq!(resolution.template.name, "landing.html");
        assert_eq!(resolution.via, ResolvedVia::Override);
    }

    #[test]
    fn test_two_reserved_matches_are_ambiguous() {
        let resolver = Resolver::new(
            template_set(&["_index.html", "_home.html"]),
            reserved(&[
                ("is-root-index", "_index.html"),
                ("path==index.md", "_home.html"),
            ]),
        );

        let err = resolver
            .resolve(Path::new("index.md"), &Frontmatter::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::AmbiguousTemplate { ref matches } if matches.len() == 2
        ));
    }

    #[test]
    fn test_kind_reserved_entry() {
        let resolver = Resolver::new(
            template_set(&["_post.html", "page.html"]),
            reserved(&[("kind==post", "_post.html")]),
        );

        let resolution = resolver
            .resolve(Path::new("notes.md"), &frontmatter("kind: post"))
            .unwrap();
        assert_eq!(resolution.template.name, "_post.html");
    }

    #[test]
    fn test_no_match_lists_candidates() {
        let resolver = Resolver::new(template_set(&["other.html"]), ReservedNameSet::default());

        let err = resolver
            .resolve(Path::new("blog/post1.md"), &Frontmatter::default())
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::TemplateNotFound {
                candidates: vec![
                    "blog/post1.html".to_string(),
                    "blog-post.html".to_string(),
                    "post.html".to_string(),
                ]
            }
        );
        assert!(err.to_string().contains("blog-post.html"));
    }

    #[test]
    fn test_convention_candidates_nested() {
        assert_eq!(
            convention_candidates(Path::new("guides/rust/intro.md"), PageKind::Post),
            vec![
                "guides/rust/intro.html",
                "guides-rust-post.html",
                "guides-post.html",
                "post.html",
            ]
        );
    }

    #[test]
    fn test_convention_candidates_root() {
        assert_eq!(
            convention_candidates(Path::new("contact.md"), PageKind::Page),
            vec!["contact.html", "page.html"]
        );
    }

    #[test]
    fn test_resolution_is_pure() {
        let resolver = Resolver::new(
            template_set(&["blog-post.html"]),
            ReservedNameSet::default(),
        );
        let fm = Frontmatter::default();
        let first = resolver.resolve(Path::new("blog/a.md"), &fm).unwrap();
        let second = resolver.resolve(Path::new("blog/a.md"), &fm).unwrap();
        assert_eq!(first, second);
    }
}
