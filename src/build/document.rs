use std::path::{Path, PathBuf};

use super::frontmatter::{Frontmatter, FrontmatterError};

/// A content document read from the content root.
///
/// Holds the frontmatter block as authored (still untyped) and the body. The
/// block's starting line lets frontmatter errors point into the source file.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the content root (e.g. "blog/post1.md"); never empty
    pub path: PathBuf,
    /// The YAML between the `---` delimiters, if the document has any
    pub raw_frontmatter: Option<String>,
    /// Line of the first YAML line
    pub frontmatter_line: usize,
    /// The markdown content without the frontmatter block
    pub body: String,
}

impl Document {
    /// Split a source file into its frontmatter block and body.
    ///
    /// Frontmatter is a YAML block delimited by `---` lines at the start of
    /// the file (the closing delimiter may also be `...`):
    ///
    /// ```markdown
    /// ---
    /// title: My Page
    /// kind: post
    /// ---
    ///
    /// # Content starts here
    /// ```
    ///
    /// An opening delimiter without a closing one is an error rather than a
    /// body, so a forgotten `---` never renders YAML as page text.
    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Self, FrontmatterError> {
        let path = path.into();
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let mut lines = source.split_inclusive('\n');
        let opens = lines
            .next()
            .is_some_and(|first| first.trim_end() == "---");

        if !opens {
            return Ok(Self {
                path,
                raw_frontmatter: None,
                frontmatter_line: 1,
                body: source.to_string(),
            });
        }

        let mut offset = source
            .split_inclusive('\n')
            .next()
            .map(str::len)
            .unwrap_or(0);
        let yaml_start = offset;

        for line in lines {
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                let yaml = &source[yaml_start..offset];
                let body_start = offset + line.len();
                return Ok(Self {
                    path,
                    raw_frontmatter: Some(yaml.to_string()),
                    // Opening delimiter is line 1
                    frontmatter_line: 2,
                    body: source[body_start..].to_string(),
                });
            }
            offset += line.len();
        }

        Err(FrontmatterError::Unterminated)
    }

    /// Parse the raw block into typed frontmatter.
    pub fn frontmatter(&self) -> Result<Frontmatter, FrontmatterError> {
        Frontmatter::parse(self.raw_frontmatter.as_deref())
    }

    /// Map a 1-based line inside the frontmatter block to a line in the file.
    pub fn frontmatter_file_line(&self, block_line: usize) -> usize {
        self.frontmatter_line + block_line.saturating_sub(1)
    }

    /// Get the page title, falling back to the file name.
    pub fn title(&self, frontmatter: &Frontmatter) -> String {
        frontmatter.title.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(title_case)
                .unwrap_or_else(|| "Untitled".to_string())
        })
    }

    /// Whether this is an `index.*` document.
    pub fn is_index(path: &Path) -> bool {
        path.file_stem().is_some_and(|stem| stem == "index")
    }
}

/// Convert a filename slug to title case.
/// "getting-started" -> "Getting Started"
fn title_case(s: &str) -> String {
    s.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
