use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;

use super::error::{ErrorKind, LocatedError};
use super::executor::{CancelSignal, Executor};
use super::markdown::{MarkdownError, parser_options};
use super::paths::{document_url, normalize_path, resolve_against};
use super::pipeline::{
    DirectoryWriter, DiscardSink, OutputSink, PageState, Pipeline, PipelineContext,
};
use super::render::{Renderer, SiteContext};
use super::report::BuildReport;
use super::reserved::{ReservedError, ReservedNameSet};
use super::resolve::Resolver;
use super::source::{SourceError, SourceFile, discover_documents};
use super::templates::{TemplateError, TemplateSet, load_template_files};

/// Problems that stop a build before any document is processed.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("templates directory not found: {0}")]
    TemplateRootMissing(PathBuf),

    #[error("pages directory not found: {0}")]
    PagesRootMissing(PathBuf),

    #[error(transparent)]
    Content(#[from] SourceError),

    #[error(transparent)]
    Templates(#[from] TemplateError),

    #[error("invalid reserved names: {0}")]
    Reserved(#[from] ReservedError),

    #[error(transparent)]
    Markdown(#[from] MarkdownError),

    #[error("output directory {path} is not usable: {reason}")]
    Output { path: PathBuf, reason: String },
}

/// Everything loaded once, up front, and shared by all documents.
pub struct Prepared {
    pub resolver: Resolver,
    pub renderer: Renderer,
    /// Documents with an output URL of their own
    pub sources: Vec<SourceFile>,
    /// Documents that share an output URL with another document
    pub collisions: Vec<LocatedError>,
}

pub struct Builder {
    config: Config,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    include_drafts: bool,
    jobs: Option<usize>,
}

impl Builder {
    pub fn new(config: Config, base_path: PathBuf) -> Self {
        let include_drafts = config.build.drafts;
        Self {
            config,
            base_path,
            include_drafts,
            jobs: None,
        }
    }

    /// Render `draft: true` pages too.
    pub fn include_drafts(mut self, include: bool) -> Self {
        self.include_drafts = self.include_drafts || include;
        self
    }

    /// Override the configured worker count.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        if jobs.is_some() {
            self.jobs = jobs;
        }
        self
    }

    pub fn content_dir(&self) -> PathBuf {
        resolve_against(&self.base_path, &self.config.content.dir)
    }

    pub fn templates_dir(&self) -> PathBuf {
        resolve_against(&self.base_path, &self.config.templates.dir)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.templates_dir().join(&self.config.templates.pages)
    }

    pub fn output_dir(&self) -> PathBuf {
        resolve_against(&self.base_path, &self.config.site.output)
    }

    fn executor(&self) -> Executor {
        let jobs = self
            .jobs
            .or(self.config.build.jobs)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            });
        Executor::new(jobs, Duration::from_secs(self.config.build.timeout_secs))
    }

    /// Load templates, the reserved-name table and the document list,
    /// failing on anything that would make every document fail.
    pub fn prepare(&self) -> Result<Prepared, ConfigurationError> {
        let templates_dir = self.templates_dir();
        if !templates_dir.is_dir() {
            return Err(ConfigurationError::TemplateRootMissing(templates_dir));
        }
        let pages_dir = self.pages_dir();
        if !pages_dir.is_dir() {
            return Err(ConfigurationError::PagesRootMissing(pages_dir));
        }

        let (sources, collisions) = split_url_collisions(discover_documents(&self.content_dir())?);

        let files = load_template_files(&templates_dir)?;
        let templates = TemplateSet::from_files(&files, &normalize_path(&self.config.templates.pages));
        if templates.is_empty() {
            tracing::warn!(dir = %pages_dir.display(), "pages directory has no templates");
        }

        let reserved = ReservedNameSet::from_config(&self.config.reserved)?;
        reserved.ensure_templates_exist(|name| templates.contains(name))?;

        let markdown = parser_options(&self.config.markdown)?;
        let renderer = Renderer::new(&files, markdown, SiteContext::from_config(&self.config.site))?;

        tracing::debug!(
            templates = templates.len(),
            reserved = reserved.entries().len(),
            documents = sources.len(),
            collisions = collisions.len(),
            "loaded site"
        );

        Ok(Prepared {
            resolver: Resolver::new(templates, reserved),
            renderer,
            sources,
            collisions,
        })
    }

    /// Render every document and write it to the output directory.
    pub async fn build(&self, cancel: CancelSignal) -> Result<BuildReport, ConfigurationError> {
        let prepared = self.prepare()?;
        let output_dir = self.checked_output_dir()?;
        std::fs::create_dir_all(&output_dir).map_err(|e| ConfigurationError::Output {
            path: output_dir.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            documents = prepared.sources.len(),
            output = %output_dir.display(),
            "building site"
        );
        Ok(self
            .execute(prepared, Box::new(DirectoryWriter::new(output_dir)), cancel)
            .await)
    }

    /// Render every document without writing anything.
    pub async fn check(&self, cancel: CancelSignal) -> Result<BuildReport, ConfigurationError> {
        let prepared = self.prepare()?;
        tracing::info!(documents = prepared.sources.len(), "checking site");
        Ok(self.execute(prepared, Box::new(DiscardSink), cancel).await)
    }

    async fn execute(
        &self,
        prepared: Prepared,
        sink: Box<dyn OutputSink>,
        cancel: CancelSignal,
    ) -> BuildReport {
        let start = Instant::now();
        let executor = self.executor();
        tracing::debug!(jobs = executor.jobs(), "starting workers");

        let ctx = PipelineContext::new(prepared.resolver, prepared.renderer, sink)
            .include_drafts(self.include_drafts);
        let pipeline = Pipeline::new(ctx);
        tracing::debug!(stages = ?pipeline.stage_names(), "pipeline ready");
        let work = Arc::new(move |source: &SourceFile| pipeline.run(source));

        let mut execution = executor.run(prepared.sources, work, cancel).await;
        execution
            .states
            .extend(prepared.collisions.into_iter().map(PageState::Failed));
        execution.states.sort_by(|a, b| a.path().cmp(b.path()));
        BuildReport::from_execution(execution, start.elapsed())
    }

    /// The output directory, if it is safe to write into and to delete.
    ///
    /// Rejects a path that is not a directory, and any directory that is or
    /// contains the content directory, the templates directory or the
    /// directory holding the config file.
    pub fn checked_output_dir(&self) -> Result<PathBuf, ConfigurationError> {
        let output_dir = self.output_dir();
        let unusable = |reason: String| ConfigurationError::Output {
            path: output_dir.clone(),
            reason,
        };

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(unusable("it exists and is not a directory".to_string()));
        }

        let output = canonical(&output_dir);
        let protected = [
            ("content directory", self.content_dir()),
            ("templates directory", self.templates_dir()),
            ("project directory", self.base_path.clone()),
        ];
        for (name, dir) in protected {
            if canonical(&dir).starts_with(&output) {
                return Err(unusable(format!("it is or contains the {name}")));
            }
        }

        Ok(output_dir)
    }
}

/// Resolve symlinks and `..` through the longest existing prefix of `path`.
fn canonical(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        if let Ok(resolved) = std::fs::canonicalize(ancestor) {
            let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
            return resolved.join(rest);
        }
    }
    path.to_path_buf()
}

/// Separate documents that map to the same output URL from the rest.
///
/// Every document in a colliding group fails, naming the others, so no page
/// silently overwrites another.
fn split_url_collisions(sources: Vec<SourceFile>) -> (Vec<SourceFile>, Vec<LocatedError>) {
    let mut by_url: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    for source in sources {
        by_url.entry(document_url(&source.path)).or_default().push(source);
    }

    let mut unique = Vec::new();
    let mut collisions = Vec::new();
    for (url, group) in by_url {
        if group.len() == 1 {
            unique.extend(group);
            continue;
        }
        tracing::warn!(url = %url, documents = group.len(), "documents share an output URL");
        for source in &group {
            let others = group
                .iter()
                .filter(|other| other.path != source.path)
                .map(|other| other.path.clone())
                .collect();
            collisions.push(LocatedError::new(
                &source.path,
                ErrorKind::UrlCollision {
                    url: url.clone(),
                    others,
                },
            ));
        }
    }

    unique.sort_by(|a, b| a.path.cmp(&b.path));
    (unique, collisions)
}
