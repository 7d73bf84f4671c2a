//! Reserved-name table.
//!
//! Reserved names generalize the "index page" special case: each entry pairs
//! a match rule with the template a matching document must use. The table is
//! built once from configuration and never changes during a build.
//!
//! Rule syntax:
//!
//! | Rule                | Matches                                          |
//! |---------------------|--------------------------------------------------|
//! | `is-root-index`     | `index.*` at the content root                    |
//! | `is-section-index`  | `index.*` inside any directory                   |
//! | `path==about.md`    | exactly that document path                       |
//! | `kind==post`        | documents whose frontmatter declares that kind   |

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::ReservedEntryConfig;

use super::document::Document;
use super::frontmatter::{Frontmatter, PageKind};
use super::paths::normalize_path;

#[derive(thiserror::Error, Debug)]
pub enum ReservedError {
    #[error("invalid match rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("match rule `{rule}` has an empty template name")]
    EmptyTemplate { rule: String },

    #[error("match rule `{0}` is listed more than once")]
    DuplicateRule(String),

    #[error("match rule `{rule}` names template `{template}`, which is not in the pages directory")]
    UnknownTemplate { rule: String, template: String },
}

/// A condition under which a document gets a reserved template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchRule {
    RootIndex,
    SectionIndex,
    /// Normalized document path, relative to the content root
    Path(String),
    Kind(PageKind),
}

impl MatchRule {
    pub fn matches(&self, path: &Path, frontmatter: &Frontmatter) -> bool {
        match self {
            MatchRule::RootIndex => Document::is_index(path) && !has_parent(path),
            MatchRule::SectionIndex => Document::is_index(path) && has_parent(path),
            MatchRule::Path(expected) => normalize_path(path) == *expected,
            MatchRule::Kind(kind) => frontmatter.kind == Some(*kind),
        }
    }
}

fn has_parent(path: &Path) -> bool {
    path.parent()
        .is_some_and(|parent| !normalize_path(parent).is_empty())
}

impl FromStr for MatchRule {
    type Err = ReservedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ReservedError::InvalidRule {
            rule: s.to_string(),
            reason: reason.to_string(),
        };

        let rule = s.trim();
        match rule {
            "is-root-index" => return Ok(MatchRule::RootIndex),
            "is-section-index" => return Ok(MatchRule::SectionIndex),
            _ => {}
        }

        let Some((subject, value)) = rule.split_once("==") else {
            return Err(invalid(
                "expected `is-root-index`, `is-section-index`, `path==<path>` or `kind==<kind>`",
            ));
        };
        let value = value.trim();

        match subject.trim() {
            "path" => {
                let path = normalize_path(Path::new(value));
                if path.is_empty() {
                    return Err(invalid("path is empty"));
                }
                Ok(MatchRule::Path(path))
            }
            "kind" => value
                .parse()
                .map(MatchRule::Kind)
                .map_err(|reason: String| invalid(&reason)),
            other => Err(invalid(&format!(
                "unknown subject `{other}`, expected `path` or `kind`"
            ))),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::RootIndex => f.write_str("is-root-index"),
            MatchRule::SectionIndex => f.write_str("is-section-index"),
            MatchRule::Path(path) => write!(f, "path=={path}"),
            MatchRule::Kind(kind) => write!(f, "kind=={kind}"),
        }
    }
}

/// One entry of the reserved-name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedEntry {
    pub rule: MatchRule,
    pub template: String,
}

/// The ordered, read-only reserved-name table.
#[derive(Debug, Clone, Default)]
pub struct ReservedNameSet {
    entries: Vec<ReservedEntry>,
}

impl ReservedNameSet {
    /// Parse the configured entries, rejecting malformed or repeated rules.
    pub fn from_config(entries: &[ReservedEntryConfig]) -> Result<Self, ReservedError> {
        let mut seen = HashSet::new();
        let mut parsed = Vec::with_capacity(entries.len());

        for entry in entries {
            let rule: MatchRule = entry.rule.parse()?;
            let template = entry.template.trim();
            if template.is_empty() {
                return Err(ReservedError::EmptyTemplate {
                    rule: rule.to_string(),
                });
            }
            if !seen.insert(rule.clone()) {
                return Err(ReservedError::DuplicateRule(rule.to_string()));
            }
            parsed.push(ReservedEntry {
                rule,
                template: template.to_string(),
            });
        }

        Ok(Self { entries: parsed })
    }

    /// Check that every entry names a template that exists.
    pub fn ensure_templates_exist(
        &self,
        exists: impl Fn(&str) -> bool,
    ) -> Result<(), ReservedError> {
        match self.entries.iter().find(|entry| !exists(&entry.template)) {
            Some(entry) => Err(ReservedError::UnknownTemplate {
                rule: entry.rule.to_string(),
                template: entry.template.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Every entry whose rule matches the document, in table order.
    pub fn matching(&self, path: &Path, frontmatter: &Frontmatter) -> Vec<&ReservedEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.rule.matches(path, frontmatter))
            .collect()
    }

    pub fn entries(&self) -> &[ReservedEntry] {
        &self.entries
    }
}
