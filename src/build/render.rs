use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::NaiveDate;
use pulldown_cmark::Options;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;

use super::document::Document;
use super::frontmatter::{Frontmatter, PageKind};
use super::markdown::{TocEntry, render_markdown};
use super::paths::{document_url, normalize_path};
use super::templates::{IncludeGraph, TemplateError, TemplateFile, TemplateRef};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("template `{template}` failed: {message}")]
    Execution { template: String, message: String },

    #[error("template `{template}` includes itself ({})", .chain.join(" -> "))]
    RecursiveInclude { template: String, chain: Vec<String> },
}

/// The template renderer, wrapping Tera.
///
/// Holds every template under the templates directory, parsed once. Rendering
/// only reads from it, so one renderer is shared by all workers.
pub struct Renderer {
    tera: Tera,
    /// Include chain for every template that reaches itself
    cycles: HashMap<String, Vec<String>>,
    markdown: Options,
    site: SiteContext,
}

impl Renderer {
    /// Parse all template files up front.
    pub fn new(
        files: &[TemplateFile],
        markdown: Options,
        site: SiteContext,
    ) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(
            files
                .iter()
                .map(|file| (file.name.as_str(), file.source.as_str())),
        )
        .map_err(|e| TemplateError::Parse(error_chain(&e)))?;

        let includes = IncludeGraph::from_files(files);
        let cycles = files
            .iter()
            .filter_map(|file| {
                let chain = includes.find_cycle(&file.name)?;
                Some((file.name.clone(), chain))
            })
            .collect();

        Ok(Self {
            tera,
            cycles,
            markdown,
            site,
        })
    }

    /// Render a document with the template it resolved to.
    pub fn render(
        &self,
        template: &TemplateRef,
        document: &Document,
        frontmatter: &Frontmatter,
    ) -> Result<RenderResult, RenderError> {
        if let Some(chain) = self.cycles.get(&template.engine_name) {
            return Err(RenderError::RecursiveInclude {
                template: template.name.clone(),
                chain: chain.clone(),
            });
        }

        let markdown = render_markdown(&document.body, self.markdown);
        let url = document_url(&document.path);

        let page_context = PageContext {
            site: &self.site,
            page: PageInfo {
                title: document.title(frontmatter),
                description: frontmatter.description.as_deref(),
                kind: frontmatter.effective_kind(&document.path),
                date: frontmatter.date,
                draft: frontmatter.draft,
                template: &template.name,
                url: &url,
                path: normalize_path(&document.path),
                extra: &frontmatter.extra,
            },
            content: &markdown.html,
            raw_content: &document.body,
            toc: &markdown.toc,
        };

        let execution_error = |e: tera::Error| RenderError::Execution {
            template: template.name.clone(),
            message: error_chain(&e),
        };
        let context = Context::from_serialize(&page_context).map_err(execution_error)?;
        let html = self
            .tera
            .render(&template.engine_name, &context)
            .map_err(execution_error)?;

        Ok(RenderResult {
            path: document.path.clone(),
            url,
            template: template.name.clone(),
            bytes: html.into_bytes(),
        })
    }
}

/// Join an error and its sources into one line.
///
/// Tera's top-level message only names the template; the cause (missing
/// variable, unknown filter, ...) is further down the chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages.join(": ")
}

/// A rendered page, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    /// Document path relative to the content root
    pub path: PathBuf,
    pub url: String,
    /// Template name relative to the pages root
    pub template: String,
    pub bytes: Vec<u8>,
}

/// Context passed to page templates.
#[derive(Debug, Serialize)]
struct PageContext<'a> {
    site: &'a SiteContext,
    page: PageInfo<'a>,
    /// Body rendered to HTML; templates print it with `{{ content | safe }}`
    content: &'a str,
    /// Body as authored
    raw_content: &'a str,
    toc: &'a [TocEntry],
}

/// Site-level information.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext {
    pub name: String,
    pub url: Option<String>,
    /// Free-form values from `site.params`, accessible as `site.params.*`
    pub params: BTreeMap<String, serde_json::Value>,
}

impl SiteContext {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            params: config.params.clone(),
        }
    }
}

/// Information about the current page.
#[derive(Debug, Serialize)]
struct PageInfo<'a> {
    title: String,
    description: Option<&'a str>,
    kind: PageKind,
    date: Option<NaiveDate>,
    draft: bool,
    template: &'a str,
    url: &'a str,
    path: String,
    /// Custom front matter fields (flattened to top level, e.g., `page.author`)
    #[serde(flatten)]
    extra: &'a BTreeMap<String, serde_yaml::Value>,
}
