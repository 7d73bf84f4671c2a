//! End-of-build summary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use super::error::LocatedError;
use super::executor::Execution;
use super::pipeline::{EmittedPage, PageState};

/// Per-document outcomes of one build, sorted by document path.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub emitted: Vec<EmittedPage>,
    pub failures: Vec<LocatedError>,
    /// Drafts left out of the build
    pub skipped: Vec<PathBuf>,
    /// Documents never started because the build was cancelled
    pub not_dispatched: usize,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn from_execution(execution: Execution, elapsed: Duration) -> Self {
        let mut report = Self {
            not_dispatched: execution.not_dispatched,
            elapsed,
            ..Default::default()
        };

        for state in execution.states {
            match state {
                PageState::Emitted(page) => report.emitted.push(page),
                PageState::Failed(error) => {
                    tracing::debug!(
                        path = %error.path().display(),
                        category = error.kind().category(),
                        line = ?error.location().map(|location| location.line),
                        "page failed"
                    );
                    report.failures.push(error);
                }
                PageState::Skipped(path) => report.skipped.push(path),
                // Stages always run to a terminal state
                other => {
                    tracing::warn!(path = %other.path().display(), state = other.name(), "document stopped before a terminal state");
                }
            }
        }

        report
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.not_dispatched > 0
    }

    /// Total documents found, whatever happened to them.
    pub fn total(&self) -> usize {
        self.emitted.len() + self.failures.len() + self.skipped.len() + self.not_dispatched
    }

    /// Print every failure's report followed by the counts line.
    pub fn write_summary(&self, out: &mut impl Write) -> io::Result<()> {
        for failure in &self.failures {
            writeln!(out, "{}", failure.report())?;
        }

        let mut line = format!(
            "{} of {} page(s) rendered, {} failed",
            self.emitted.len(),
            self.total(),
            self.failures.len()
        );
        if !self.skipped.is_empty() {
            line.push_str(&format!(", {} draft(s) skipped", self.skipped.len()));
        }
        if self.was_cancelled() {
            line.push_str(&format!(
                ", {} not started (cancelled)",
                self.not_dispatched
            ));
        }
        writeln!(out, "{line} in {:.2}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::build::error::ErrorKind;
    use crate::build::resolve::ResolvedVia;

    fn emitted(path: &str) -> PageState {
        PageState::Emitted(EmittedPage {
            path: PathBuf::from(path),
            url: "/".to_string(),
            template: "page.html".to_string(),
            via: ResolvedVia::Convention,
            output: None,
        })
    }

    #[test]
    fn test_report_collects_outcomes() {
        let execution = Execution {
            states: vec![
                emitted("a.md"),
                PageState::Failed(LocatedError::new("b.md", ErrorKind::Worker("boom".to_string()))),
                PageState::Skipped(PathBuf::from("c.md")),
            ],
            not_dispatched: 2,
        };
        let report = BuildReport::from_execution(execution, Duration::from_millis(1500));

        assert_eq!(report.emitted.len(), 1);
        assert_eq!(report.failures[0].path(), Path::new("b.md"));
        assert_eq!(report.total(), 5);
        assert!(report.has_failures());
        assert!(report.was_cancelled());

        let mut out = Vec::new();
        report.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("error[worker]: b.md: render worker failed: boom\n"));
        assert!(text.ends_with(
            "1 of 5 page(s) rendered, 1 failed, 1 draft(s) skipped, 2 not started (cancelled) in 1.50s\n"
        ));
    }

    #[test]
    fn test_clean_report() {
        let report = BuildReport::from_execution(
            Execution {
                states: vec![emitted("a.md")],
                not_dispatched: 0,
            },
            Duration::ZERO,
        );

        let mut out = Vec::new();
        report.write_summary(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1 of 1 page(s) rendered, 0 failed in 0.00s\n"
        );
        assert!(!report.has_failures());
    }
}
