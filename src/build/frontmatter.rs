//! Typed frontmatter.
//!
//! The raw YAML block is checked field by field: every recognized key must
//! have the expected shape, and every other key is carried through untouched
//! in `extra`. A block either parses completely or produces a
//! `FrontmatterError` naming the field (and line) at fault.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Date format accepted in the `date` field.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// What kind of page a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Post,
    Page,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Post => "post",
            PageKind::Page => "page",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(PageKind::Post),
            "page" => Ok(PageKind::Page),
            other => Err(format!(
                "unknown page kind `{other}`, expected `post` or `page`"
            )),
        }
    }
}

/// Frontmatter metadata parsed from a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frontmatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Template name override, relative to the pages root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PageKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
    /// Keys this version does not recognize, kept as authored
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum FrontmatterError {
    #[error("frontmatter is not valid YAML: {message}")]
    Malformed {
        message: String,
        /// 1-based (line, column) within the block
        position: Option<(usize, usize)>,
    },

    #[error("frontmatter opened with `---` but never closed")]
    Unterminated,

    #[error("frontmatter must be a mapping of keys to values, found {found}")]
    NotAMapping { found: &'static str },

    #[error("frontmatter key `{key}` is not a string")]
    NonStringKey { key: String },

    #[error("field `{field}` {message}")]
    Type {
        field: String,
        message: String,
        /// 1-based line within the block
        line: Option<usize>,
    },
}

impl FrontmatterError {
    /// Position within the frontmatter block, when known.
    pub fn position(&self) -> Option<(usize, Option<usize>)> {
        match self {
            FrontmatterError::Malformed { position, .. } => {
                position.map(|(line, column)| (line, Some(column)))
            }
            FrontmatterError::Type { line, .. } => line.map(|line| (line, None)),
            _ => None,
        }
    }

    /// The recognized field at fault, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            FrontmatterError::Type { field, .. } => Some(field),
            _ => None,
        }
    }

    fn from_yaml(e: serde_yaml::Error) -> Self {
        let position = e.location().map(|loc| (loc.line(), loc.column()));
        FrontmatterError::Malformed {
            message: e.to_string(),
            position,
        }
    }
}

impl Frontmatter {
    /// Parse a raw frontmatter block (the text between the delimiters).
    ///
    /// `None` and blank blocks produce an empty frontmatter.
    pub fn parse(raw: Option<&str>) -> Result<Self, FrontmatterError> {
        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(Self::default());
        };

        let value: Value = serde_yaml::from_str(raw).map_err(FrontmatterError::from_yaml)?;
        let mapping = match value {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(FrontmatterError::NotAMapping {
                    found: value_kind(&other),
                });
            }
        };

        let mut fm = Self::default();
        for (key, value) in mapping {
            let key = match key {
                Value::String(key) => key,
                other => {
                    return Err(FrontmatterError::NonStringKey {
                        key: scalar_display(&other),
                    });
                }
            };

            match key.as_str() {
                "title" => fm.title = Some(typed_field(raw, "title", value)?),
                "description" => fm.description = Some(typed_field(raw, "description", value)?),
                "template" => {
                    let name: String = typed_field(raw, "template", value)?;
                    if name.trim().is_empty() {
                        return Err(type_error(raw, "template", "must not be empty"));
                    }
                    if Path::new(name.trim())
                        .components()
                        .any(|part| matches!(part, Component::ParentDir))
                    {
                        return Err(type_error(raw, "template", "must not contain `..`"));
                    }
                    fm.template = Some(name);
                }
                "kind" => {
                    let kind: String = typed_field(raw, "kind", value)?;
                    fm.kind = Some(
                        kind.parse()
                            .map_err(|message: String| type_error(raw, "kind", &message))?,
                    );
                }
                "date" => {
                    let date: String = typed_field(raw, "date", value)?;
                    fm.date = Some(NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(
                        |_| {
                            type_error(
                                raw,
                                "date",
                                &format!("`{date}` is not a date in YYYY-MM-DD format"),
                            )
                        },
                    )?);
                }
                "draft" => fm.draft = typed_field(raw, "draft", value)?,
                _ => {
                    fm.extra.insert(key, value);
                }
            }
        }

        Ok(fm)
    }

    /// Serialize back to a YAML block (without delimiters).
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// The declared kind, or the kind implied by the document's location:
    /// documents inside a directory are posts, top-level documents are pages.
    pub fn effective_kind(&self, path: &Path) -> PageKind {
        self.kind.unwrap_or_else(|| {
            let in_directory = path
                .parent()
                .is_some_and(|parent| !parent.as_os_str().is_empty());
            if in_directory {
                PageKind::Post
            } else {
                PageKind::Page
            }
        })
    }
}

/// Deserialize one recognized field, attributing failures to it.
fn typed_field<T: DeserializeOwned>(
    raw: &str,
    field: &str,
    value: Value,
) -> Result<T, FrontmatterError> {
    serde_yaml::from_value(value).map_err(|e| type_error(raw, field, &e.to_string()))
}

fn type_error(raw: &str, field: &str, message: &str) -> FrontmatterError {
    FrontmatterError::Type {
        field: field.to_string(),
        message: message.to_string(),
        line: key_line(raw, field),
    }
}

/// Find the 1-based line of a top-level key in the raw block.
pub(crate) fn key_line(raw: &str, key: &str) -> Option<usize> {
    raw.lines().position(|line| {
        line.strip_prefix(key)
            .is_some_and(|rest| rest.trim_start().starts_with(':'))
    })
    .map(|index| index + 1)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn scalar_display(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| value_kind(value).to_string())
}
