//! Bounded, cancellable document execution.
//!
//! Documents are rendered on tokio's blocking pool with at most `jobs` in
//! flight. Each one gets its own deadline; a document that misses it fails
//! with a timeout while the rest of the build carries on. Cancellation stops
//! new documents from being dispatched and leaves running ones alone.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;

use super::error::{ErrorKind, LocatedError};
use super::pipeline::PageState;
use super::source::SourceFile;

/// Requests cancellation of a running build.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Observes cancellation requests.
#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// Never resolves if the handle was dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.0.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn cancel_channel() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

/// What happened to the documents handed to the executor.
#[derive(Debug, Default)]
pub struct Execution {
    /// Terminal state of every dispatched document
    pub states: Vec<PageState>,
    /// Documents never started because the build was cancelled
    pub not_dispatched: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Executor {
    jobs: usize,
    timeout: Duration,
}

impl Executor {
    pub fn new(jobs: usize, timeout: Duration) -> Self {
        Self {
            jobs: jobs.max(1),
            timeout,
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run `work` for every source, bounded and with a per-document deadline.
    pub async fn run<F>(
        &self,
        sources: Vec<SourceFile>,
        work: Arc<F>,
        mut cancel: CancelSignal,
    ) -> Execution
    where
        F: Fn(&SourceFile) -> PageState + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut tasks = JoinSet::new();
        let mut not_dispatched = 0;
        let mut pending = sources.into_iter();

        while let Some(source) = pending.next() {
            if cancel.is_cancelled() {
                not_dispatched = 1 + pending.len();
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    not_dispatched = 1 + pending.len();
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        not_dispatched = 1 + pending.len();
                        break;
                    }
                },
            };

            let work = Arc::clone(&work);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let path = source.path.clone();
                // The permit lives as long as the render itself, even past
                // its deadline, so `jobs` bounds the threads actually busy.
                let render = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    (*work)(&source)
                });

                match tokio::time::timeout(timeout, render).await {
                    Ok(Ok(state)) => state,
                    Ok(Err(e)) => worker_failure(&path, &e),
                    Err(_) => {
                        tracing::warn!(path = %path.display(), timeout_secs = timeout.as_secs(), "render timed out");
                        PageState::Failed(LocatedError::new(path, ErrorKind::Timeout(timeout)))
                    }
                }
            });
        }

        if not_dispatched > 0 {
            tracing::info!(not_dispatched, "build cancelled, waiting for running documents");
        }

        let mut states = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(state) => states.push(state),
                Err(e) => states.push(worker_failure(Path::new(""), &e)),
            }
        }
        states.sort_by(|a, b| a.path().cmp(b.path()));

        Execution {
            states,
            not_dispatched,
        }
    }
}

fn worker_failure(path: &Path, error: &tokio::task::JoinError) -> PageState {
    let message = if error.is_panic() {
        "worker panicked".to_string()
    } else {
        error.to_string()
    };
    tracing::error!(path = %path.display(), error = %message, "render worker failed");
    PageState::Failed(LocatedError::new(path, ErrorKind::Worker(message)))
}
