//! Markdown rendering with heading ids and TOC extraction.

use std::collections::HashSet;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use serde::Serialize;

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// A table of contents entry for the current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    /// The heading text
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
    /// The heading level (1-6)
    pub level: u8,
}

/// Result of rendering markdown, containing both HTML and table of contents.
#[derive(Debug)]
pub struct MarkdownOutput {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Parser options for the configured extension names.
///
/// Checked once when the build starts; an unknown name is a configuration
/// error, not a per-page one.
pub fn parser_options(config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// A heading being collected until its end tag.
struct HeadingState {
    level: HeadingLevel,
    /// Id given in the source with `{#id}`
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    text: String,
}

impl HeadingState {
    fn to_html(&self, id: &str) -> String {
        let level = self.level as u8;
        let id = escape_html(id);
        let class_attr = if self.classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape_html(&self.classes.join(" ")))
        };
        let extra_attrs: String = self
            .attrs
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!(" {key}=\"{}\"", escape_html(value)),
                None => format!(" {key}"),
            })
            .collect();

        format!(
            "<h{level} id=\"{id}\"{class_attr}{extra_attrs}>{}</h{level}>\n",
            escape_html(&self.text)
        )
    }
}

/// Render markdown to HTML, giving every heading a unique id.
pub fn render_markdown(markdown: &str, options: Options) -> MarkdownOutput {
    let parser = Parser::new_ext(markdown, options);

    let mut used_ids: HashSet<String> = HashSet::new();
    let mut toc: Vec<TocEntry> = Vec::new();
    let mut heading: Option<HeadingState> = None;

    let events: Vec<Event> = parser
        .flat_map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let id = id.map(|id| id.to_string());
                if let Some(id) = &id {
                    used_ids.insert(id.clone());
                }
                heading = Some(HeadingState {
                    level,
                    id,
                    classes: classes.iter().map(|class| class.to_string()).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(key, value)| (key.to_string(), value.as_ref().map(|v| v.to_string())))
                        .collect(),
                    text: String::new(),
                });
                vec![]
            }
            Event::Text(ref text) | Event::Code(ref text) if heading.is_some() => {
                if let Some(state) = heading.as_mut() {
                    state.text.push_str(text);
                }
                vec![]
            }
            Event::SoftBreak | Event::HardBreak if heading.is_some() => {
                if let Some(state) = heading.as_mut() {
                    state.text.push(' ');
                }
                vec![]
            }
            Event::End(TagEnd::Heading(_)) if heading.is_some() => {
                let Some(state) = heading.take() else {
                    return vec![];
                };

                let id = match &state.id {
                    Some(id) => id.clone(),
                    None => unique_id(&state.text, &mut used_ids),
                };
                toc.push(TocEntry {
                    text: state.text.clone(),
                    id: id.clone(),
                    level: state.level as u8,
                });

                vec![Event::Html(state.to_html(&id).into())]
            }
            // Inline markup inside a heading is flattened to its text
            _ if heading.is_some() => vec![],
            _ => vec![event],
        })
        .collect();

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    MarkdownOutput {
        html: html_output,
        toc,
    }
}

/// Slug of `text` not yet in `used_ids`, recorded as used.
fn unique_id(text: &str, used_ids: &mut HashSet<String>) -> String {
    let base_id = match slugify(text) {
        slug if slug.is_empty() => "section".to_string(),
        slug => slug,
    };
    let mut id = base_id.clone();
    let mut suffix = 1;
    while used_ids.contains(&id) {
        id = format!("{base_id}-{suffix}");
        suffix += 1;
    }
    used_ids.insert(id.clone());
    id
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> MarkdownOutput {
        let options = parser_options(&MarkdownConfig::default()).unwrap();
        render_markdown(markdown, options)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
    }

    #[test]
    fn test_render_basic_markdown() {
        let output = render("# Hello\n\nWorld");

        assert!(output.html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(output.html.contains("<p>World</p>"));
        assert_eq!(
            output.toc,
            vec![TocEntry {
                text: "Hello".to_string(),
                id: "hello".to_string(),
                level: 1,
            }]
        );
    }

    #[test]
    fn test_duplicate_headings_get_unique_ids() {
        let output = render("## Setup\n\n## Setup\n");
        let ids: Vec<_> = output.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1"]);
    }

    #[test]
    fn test_heading_text_is_escaped() {
        let output = render("## Fish & \"Chips\"\n");
        assert!(output.html.contains("Fish &amp; &quot;Chips&quot;"));
        assert_eq!(output.toc[0].text, "Fish & \"Chips\"");
    }

    #[test]
    fn test_heading_attributes_are_kept() {
        let config = MarkdownConfig {
            extensions: vec!["heading_attributes".to_string()],
        };
        let options = parser_options(&config).unwrap();
        let output = render_markdown("## Setup {.wide data-x=1}\n\n## Usage {#how-to}\n", options);

        assert!(
            output
                .html
                .contains("<h2 id=\"setup\" class=\"wide\" data-x=\"1\">Setup</h2>"),
            "{}",
            output.html
        );
        assert!(output.html.contains("<h2 id=\"how-to\">Usage</h2>"));
        let ids: Vec<_> = output.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "how-to"]);
    }

    #[test]
    fn test_setext_heading_keeps_line_break_as_space() {
        let output = render("Foo\nbar\n===\n");
        assert_eq!(output.toc[0].text, "Foo bar");
        assert!(output.html.contains("<h1 id=\"foo-bar\">Foo bar</h1>"));
    }

    #[test]
    fn test_invalid_extension() {
        let config = MarkdownConfig {
            extensions: vec!["not_a_real_extension".to_string()],
        };
        assert!(matches!(
            parser_options(&config),
            Err(MarkdownError::InvalidExtension(_))
        ));
    }
}
