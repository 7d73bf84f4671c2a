use std::path::{Path, PathBuf};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("content directory does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Discovered documents
// =============================================================================

/// A document file found under the content root, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the content root (e.g. "blog/post1.md")
    pub path: PathBuf,
    /// Path on disk
    pub full_path: PathBuf,
}

impl SourceFile {
    pub fn read(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.full_path)
    }
}

/// Check that the content root is a usable directory.
pub fn ensure_content_root(root: &Path) -> Result<(), SourceError> {
    if !root.exists() {
        return Err(SourceError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(SourceError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Find every markdown document under `root`, sorted by relative path.
pub fn discover_documents(root: &Path) -> Result<Vec<SourceFile>, SourceError> {
    ensure_content_root(root)?;

    let mut files = Vec::new();
    walk_directory(root, Path::new(""), &mut files)?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Recursively walk a directory and collect documents.
fn walk_directory(
    dir: &Path,
    relative_path: &Path,
    files: &mut Vec<SourceFile>,
) -> Result<(), SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SourceError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| SourceError::ReadEntry {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        let file_name = entry.file_name();

        // Skip hidden files and directories
        if file_name.to_string_lossy().starts_with('.') {
            continue;
        }

        let item_relative_path = relative_path.join(&file_name);

        if path.is_dir() {
            walk_directory(&path, &item_relative_path, files)?;
        } else if path.is_file() && is_document(&item_relative_path) {
            files.push(SourceFile {
                path: item_relative_path,
                full_path: path,
            });
        } else {
            tracing::trace!(path = %item_relative_path.display(), "skipping non-document file");
        }
    }

    Ok(())
}

fn is_document(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    matches!(extension.as_deref(), Some("md" | "markdown"))
}
