//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Document paths (relative paths within the content root)
//! - URL paths (the URL at which a page will be served)
//! - Output file paths (where pages are written in the output directory)

use std::path::{Component, Path, PathBuf};

/// Render a relative path with `/` separators, dropping `.` components.
///
/// Used as the stable key for matching documents and naming templates, so
/// `blog\post1.md` and `./blog/post1.md` compare equal to `blog/post1.md`.
pub fn normalize_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert a document path to a URL path.
///
/// # Examples
/// ```ignore
/// document_url("about.md") => "/about"
/// document_url("blog/post1.md") => "/blog/post1"
/// document_url("blog/index.md") => "/blog"
/// document_url("index.md") => "/"
/// ```
pub fn document_url(path: &Path) -> String {
    let path_str = normalize_path(&path.with_extension(""));

    // Index files become the directory URL
    let path_str = if path_str == "index" {
        ""
    } else {
        path_str.strip_suffix("/index").unwrap_or(&path_str)
    };

    format!("/{path_str}")
}

/// Convert a URL path to an output file path.
///
/// # Examples
/// ```ignore
/// url_to_output_path("/blog/post1", output_dir) => output_dir/blog/post1/index.html
/// url_to_output_path("/", output_dir) => output_dir/index.html
/// ```
pub fn url_to_output_path(url_path: &str, output_dir: &Path) -> PathBuf {
    let url_path = url_path.trim_matches('/');

    if url_path.is_empty() {
        output_dir.join("index.html")
    } else {
        output_dir.join(url_path).join("index.html")
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve a configured path against the config file's directory.
pub fn resolve_against(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("blog/post1.md")), "blog/post1.md");
        assert_eq!(normalize_path(Path::new("./about.md")), "about.md");
        assert_eq!(normalize_path(Path::new("/about.md")), "about.md");
    }

    #[test]
    fn test_document_url_simple() {
        assert_eq!(document_url(Path::new("about.md")), "/about");
    }

    #[test]
    fn test_document_url_nested() {
        assert_eq!(document_url(Path::new("blog/post1.md")), "/blog/post1");
    }

    #[test]
    fn test_document_url_index() {
        assert_eq!(document_url(Path::new("index.md")), "/");
        assert_eq!(document_url(Path::new("blog/index.md")), "/blog");
    }

    #[test]
    fn test_document_url_index_suffix_is_not_index() {
        assert_eq!(document_url(Path::new("reindex.md")), "/reindex");
    }

    #[test]
    fn test_url_to_output_path_document() {
        let output = Path::new("/site");
        assert_eq!(
            url_to_output_path("/blog/post1", output),
            PathBuf::from("/site/blog/post1/index.html")
        );
    }

    #[test]
    fn test_url_to_output_path_root() {
        let output = Path::new("/site");
        assert_eq!(
            url_to_output_path("/", output),
            PathBuf::from("/site/index.html")
        );
    }

    #[test]
    fn test_base_path_from_config() {
        assert_eq!(
            base_path_from_config(Path::new("/project/mub.yaml")),
            PathBuf::from("/project")
        );
        assert_eq!(
            base_path_from_config(Path::new("mub.yaml")),
            PathBuf::from("")
        );
    }

    #[test]
    fn test_resolve_against() {
        let base = Path::new("/project");
        assert_eq!(
            resolve_against(base, Path::new("content")),
            PathBuf::from("/project/content")
        );
        assert_eq!(
            resolve_against(base, Path::new("/elsewhere")),
            PathBuf::from("/elsewhere")
        );
    }
}
