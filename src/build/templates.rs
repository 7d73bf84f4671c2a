//! Template discovery.
//!
//! The whole templates directory is read once at startup. Every file becomes
//! a template in the engine (so layouts and partials can be extended and
//! included), while only the files under the pages root form the
//! `TemplateSet` that documents resolve against.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::paths::normalize_path;

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read template {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse templates: {0}")]
    Parse(String),
}

/// A template file as loaded from disk.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    /// Name relative to the templates directory (e.g. "pages/blog-post.html")
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Recursively load every template under `dir`, sorted by name.
pub fn load_template_files(dir: &Path) -> Result<Vec<TemplateFile>, TemplateError> {
    let mut files = Vec::new();
    walk_directory(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

fn walk_directory(
    root: &Path,
    dir: &Path,
    files: &mut Vec<TemplateFile>,
) -> Result<(), TemplateError> {
    let entries = std::fs::read_dir(dir).map_err(|e| TemplateError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| TemplateError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        // Skip hidden files and directories
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        if path.is_dir() {
            walk_directory(root, &path, files)?;
        } else if path.is_file() {
            let source =
                std::fs::read_to_string(&path).map_err(|e| TemplateError::ReadFile {
                    path: path.clone(),
                    source: e,
                })?;
            let relative = path.strip_prefix(root).unwrap_or(&path);
            files.push(TemplateFile {
                name: normalize_path(relative),
                path,
                source,
            });
        }
    }

    Ok(())
}

/// A template a document can be rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    /// Name relative to the pages root (e.g. "blog-post.html")
    pub name: String,
    /// Name the template engine knows it by (e.g. "pages/blog-post.html")
    pub engine_name: String,
    pub path: PathBuf,
}

/// Immutable snapshot of the templates under the pages root.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    pages: BTreeMap<String, TemplateRef>,
}

impl TemplateSet {
    /// Select the templates under `pages_prefix` (relative to the templates
    /// directory) from the loaded files. An empty prefix selects every file.
    pub fn from_files(files: &[TemplateFile], pages_prefix: &str) -> Self {
        let prefix = match pages_prefix.trim_matches('/') {
            "" => String::new(),
            trimmed => format!("{trimmed}/"),
        };
        let pages = files
            .iter()
            .filter_map(|file| {
                let name = file.name.strip_prefix(prefix.as_str())?;
                Some((
                    name.to_string(),
                    TemplateRef {
                        name: name.to_string(),
                        engine_name: file.name.clone(),
                        path: file.path.clone(),
                    },
                ))
            })
            .collect();
        Self { pages }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateRef> {
        self.pages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

// =============================================================================
// Include graph
// =============================================================================

/// Which templates each template pulls in through `include` or `extends`.
///
/// The engine does not guard against a template including itself (directly
/// or through others), which would recurse until the stack overflows, so
/// cycles are looked up here before rendering.
#[derive(Debug, Clone, Default)]
pub struct IncludeGraph {
    edges: HashMap<String, Vec<String>>,
}

impl IncludeGraph {
    pub fn from_files(files: &[TemplateFile]) -> Self {
        let edges = files
            .iter()
            .map(|file| (file.name.clone(), referenced_templates(&file.source)))
            .collect();
        Self { edges }
    }

    /// Return a chain of template names that leads from `start` back into a
    /// template already on the chain, if there is one.
    pub fn find_cycle(&self, start: &str) -> Option<Vec<String>> {
        let mut chain = vec![start.to_string()];
        let mut finished = HashSet::new();
        self.visit(start, &mut chain, &mut finished)
    }

    /// Depth-first walk. `finished` holds templates whose whole subtree was
    /// already walked without reaching the chain, so shared partials are
    /// visited once.
    fn visit<'a>(
        &'a self,
        name: &str,
        chain: &mut Vec<String>,
        finished: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        for next in self.edges.get(name).into_iter().flatten() {
            if chain.contains(next) {
                let mut cycle = chain.clone();
                cycle.push(next.clone());
                return Some(cycle);
            }
            if finished.contains(next.as_str()) || !self.edges.contains_key(next) {
                continue;
            }
            chain.push(next.clone());
            if let Some(cycle) = self.visit(next, chain, finished) {
                return Some(cycle);
            }
            chain.pop();
            finished.insert(next.as_str());
        }
        None
    }
}

/// Extract the template names referenced by `{% include %}` and
/// `{% extends %}` tags. Comments and `{% raw %}` blocks are skipped.
fn referenced_templates(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = source;
    let mut in_raw = false;

    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let close = match after.chars().next() {
            Some('#') if !in_raw => "#}",
            Some('%') => "%}",
            _ => {
                rest = after;
                continue;
            }
        };
        let after = &after[1..];
        let Some(end) = after.find(close) else {
            break;
        };
        let body = &after[..end];
        rest = &after[end + 2..];
        if close == "#}" {
            continue;
        }

        let tag = body.trim_matches('-').trim();
        if in_raw {
            in_raw = tag != "endraw";
            continue;
        }
        if tag == "raw" {
            in_raw = true;
            continue;
        }

        let arguments = tag
            .strip_prefix("include")
            .or_else(|| tag.strip_prefix("extends"));
        if let Some(arguments) = arguments {
            names.extend(quoted_strings(arguments));
        }
    }

    names
}

/// Every single- or double-quoted string literal in a tag's arguments.
fn quoted_strings(arguments: &str) -> Vec<String> {
    let mut strings = Vec::new();
    let mut chars = arguments.char_indices();

    while let Some((start, c)) = chars.next() {
        if c != '"' && c != '\'' {
            continue;
        }
        let quote = c;
        if let Some((end, _)) = chars.by_ref().find(|(_, c)| *c == quote) {
            strings.push(arguments[start + 1..end].to_string());
        }
    }

    strings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, source: &str) -> TemplateFile {
        TemplateFile {
            name: name.to_string(),
            path: PathBuf::from("/templates").join(name),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_referenced_templates() {
        let source = r#"{% extends "base.html" %}
{% block content %}{%- include 'partials/nav.html' -%}
{% include ["a.html", "b.html"] ignore missing %}{% endblock %}"#;
        assert_eq!(
            referenced_templates(source),
            vec!["base.html", "partials/nav.html", "a.html", "b.html"]
        );
    }

    #[test]
    fn test_referenced_templates_ignores_other_tags() {
        let source = r#"{% if page.title == "include" %}{% set x = "extends" %}{% endif %}"#;
        assert!(referenced_templates(source).is_empty());
    }

    #[test]
    fn test_referenced_templates_skips_comments_and_raw() {
        let source = r#"{# {% include "self.html" %} #}
{% raw %}{% include "self.html" %}{% endraw %}
{%- raw -%}{% extends "self.html" %}{%- endraw -%}
{% include "nav.html" %}"#;
        assert_eq!(referenced_templates(source), vec!["nav.html"]);
    }

    #[test]
    fn test_template_set_from_files() {
        let files = vec![
            file("base.html", ""),
            file("pages/_index.html", ""),
            file("pages/blog/post1.html", ""),
            file("pagesx/other.html", ""),
        ];
        let set = TemplateSet::from_files(&files, "pages");

        assert_eq!(set.len(), 2);
        assert!(set.contains("_index.html"));
        assert!(!set.contains("base.html"));
        assert!(!set.contains("other.html"));

        let post = set.get("blog/post1.html").unwrap();
        assert_eq!(post.engine_name, "pages/blog/post1.html");
    }

    #[test]
    fn test_find_cycle_self_include() {
        let graph = IncludeGraph::from_files(&[file("pages/a.html", r#"{% include "pages/a.html" %}"#)]);
        assert_eq!(
            graph.find_cycle("pages/a.html"),
            Some(vec!["pages/a.html".to_string(), "pages/a.html".to_string()])
        );
    }

    #[test]
    fn test_find_cycle_indirect() {
        let graph = IncludeGraph::from_files(&[
            file("pages/a.html", r#"{% include "b.html" %}"#),
            file("b.html", r#"{% include "c.html" %}"#),
            file("c.html", r#"{% include "b.html" %}"#),
        ]);
        let cycle = graph.find_cycle("pages/a.html").unwrap();
        assert_eq!(cycle, vec!["pages/a.html", "b.html", "c.html", "b.html"]);
    }

    #[test]
    fn test_find_cycle_none_for_shared_partials() {
        let graph = IncludeGraph::from_files(&[
            file("pages/a.html", r#"{% include "nav.html" %}{% include "nav.html" %}"#),
            file("nav.html", "<nav></nav>"),
        ]);
        assert!(graph.find_cycle("pages/a.html").is_none());
    }

    #[test]
    fn test_find_cycle_wide_diamonds() {
        // Each layer includes both templates of the next layer.
        let layers = 40;
        let mut files = Vec::new();
        for layer in 0..layers {
            for side in ["a", "b"] {
                let source = if layer + 1 < layers {
                    format!(
                        r#"{{% include "l{next}a.html" %}}{{% include "l{next}b.html" %}}"#,
                        next = layer + 1
                    )
                } else {
                    String::new()
                };
                files.push(file(&format!("l{layer}{side}.html"), &source));
            }
        }
        let graph = IncludeGraph::from_files(&files);
        assert!(graph.find_cycle("l0a.html").is_none());
    }

    #[test]
    fn test_load_template_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pages/blog")).unwrap();
        std::fs::write(dir.path().join("base.html"), "base").unwrap();
        std::fs::write(dir.path().join("pages/blog/post.html"), "post").unwrap();
        std::fs::write(dir.path().join(".hidden.html"), "hidden").unwrap();

        let files = load_template_files(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["base.html", "pages/blog/post.html"]);
    }
}
