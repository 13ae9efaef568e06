//! Worker pool over the input list
//!
//! Resumes after the ledger's most recently written name, then runs the
//! remaining names through [`ResolutionPipeline`] with at most
//! `concurrency` in flight. Each unit of work owns its own fetcher.
//!
//! Names that ended `Failed` or `Cancelled` are kept in the ledger's pending
//! set. The next run dispatches those that sit before the resume point ahead
//! of the resume slice, and clears them once they reach `Saved` or `Skipped`.

use super::{NameOutcome, ResolutionPipeline};
use crate::db::Ledger;
use crate::error::{PipelineError, PipelineResult};
use crate::services::page_fetcher::{FetcherFactory, PageFetcher};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Names still to process given the last persisted name
///
/// A `last` that is absent from `names` restarts from the beginning.
pub fn resume_slice<'a>(names: &'a [String], last: Option<&str>) -> &'a [String] {
    match last.and_then(|last| names.iter().position(|n| n == last)) {
        Some(index) => &names[index + 1..],
        None => names,
    }
}

/// Pending names the resume slice would not reach, in input order
pub fn retry_names(names: &[String], remaining: &[String], pending: &HashSet<String>) -> Vec<String> {
    let before_cursor = &names[..names.len() - remaining.len()];
    before_cursor
        .iter()
        .filter(|name| pending.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Totals for one scheduler run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Outcomes in completion order
    pub outcomes: Vec<NameOutcome>,
    pub elapsed: Duration,
    /// Names before the resume point
    pub skipped_by_resume: usize,
    /// Pending names from earlier runs dispatched again
    pub retried: usize,
    /// Names handed to workers
    pub dispatched: usize,
}

impl RunSummary {
    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, NameOutcome::Saved { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, NameOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, NameOutcome::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, NameOutcome::Cancelled { .. }))
    }

    fn count(&self, pred: impl Fn(&NameOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Bounded worker pool driving the resolution pipeline
pub struct Scheduler<F: FetcherFactory> {
    factory: Arc<F>,
    pipeline: Arc<ResolutionPipeline>,
    ledger: Arc<dyn Ledger>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl<F: FetcherFactory> Scheduler<F> {
    pub fn new(
        factory: Arc<F>,
        pipeline: Arc<ResolutionPipeline>,
        ledger: Arc<dyn Ledger>,
        concurrency: usize,
    ) -> Self {
        Self {
            factory,
            pipeline,
            ledger,
            concurrency: concurrency.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally controlled cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Process `names`, reporting each outcome to `on_outcome` as it lands
    ///
    /// Returns `Err` only for a ledger failure. The run is then cancelled and
    /// in-flight units are drained, so every fetcher is closed before return.
    pub async fn run<C>(&self, names: &[String], mut on_outcome: C) -> PipelineResult<RunSummary>
    where
        C: FnMut(&NameOutcome),
    {
        let start = Instant::now();

        let last = self.ledger.last_processed_name().await?;
        let remaining = resume_slice(names, last.as_deref());
        let skipped_by_resume = names.len() - remaining.len();

        let mut pending: HashSet<String> =
            self.ledger.list_pending().await?.into_iter().collect();
        let retries = retry_names(names, remaining, &pending);

        if let Some(last) = &last {
            tracing::info!(
                last = %last,
                skipped = skipped_by_resume,
                remaining = remaining.len(),
                "Resuming after last processed name"
            );
        }
        if !retries.is_empty() {
            tracing::info!(count = retries.len(), "Retrying names left pending by earlier runs");
        }

        let work: Vec<String> = retries
            .iter()
            .cloned()
            .chain(remaining.iter().cloned())
            .collect();
        tracing::info!(
            names = work.len(),
            workers = self.concurrency,
            "Starting resolution run"
        );

        let mut results = stream::iter(work.iter().cloned())
            .map(|name| {
                let factory = Arc::clone(&self.factory);
                let pipeline = Arc::clone(&self.pipeline);
                let cancel = self.cancel.clone();
                async move { process_one(factory.as_ref(), &pipeline, name, &cancel).await }
            })
            .buffer_unordered(self.concurrency);

        let mut outcomes = Vec::with_capacity(work.len());
        let mut fatal: Option<PipelineError> = None;

        while let Some(result) = results.next().await {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    if fatal.is_none() {
                        tracing::error!(error = %e, "Aborting run");
                        self.cancel.cancel();
                        fatal = Some(e);
                    } else {
                        tracing::debug!(error = %e, "Further ledger error while draining");
                    }
                    continue;
                }
            };

            if fatal.is_none() {
                if let Err(e) = self.record_retry_state(&outcome, &mut pending).await {
                    tracing::error!(error = %e, "Aborting run");
                    self.cancel.cancel();
                    fatal = Some(e);
                }
            }

            on_outcome(&outcome);
            outcomes.push(outcome);
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        let elapsed = start.elapsed();
        tracing::info!(
            elapsed_secs = elapsed.as_secs_f64(),
            processed = outcomes.len(),
            "Resolution run complete"
        );

        Ok(RunSummary {
            outcomes,
            elapsed,
            skipped_by_resume,
            retried: retries.len(),
            dispatched: work.len(),
        })
    }

    /// Keep non-terminal names pending; clear them once terminal
    async fn record_retry_state(
        &self,
        outcome: &NameOutcome,
        pending: &mut HashSet<String>,
    ) -> PipelineResult<()> {
        match outcome {
            NameOutcome::Failed { name, error } => {
                self.ledger.mark_pending(name, error).await?;
                pending.insert(name.clone());
            }
            NameOutcome::Cancelled { name } => {
                self.ledger.mark_pending(name, "cancelled").await?;
                pending.insert(name.clone());
            }
            NameOutcome::Saved { name, .. } | NameOutcome::Skipped { name, .. } => {
                if pending.remove(name) {
                    self.ledger.clear_pending(name).await?;
                }
            }
        }
        Ok(())
    }
}

/// One unit of work: fresh fetcher, one name, fetcher always closed
async fn process_one<F: FetcherFactory>(
    factory: &F,
    pipeline: &ResolutionPipeline,
    name: String,
    cancel: &CancellationToken,
) -> PipelineResult<NameOutcome> {
    if cancel.is_cancelled() {
        return Ok(NameOutcome::Cancelled { name });
    }

    let mut fetcher = match factory.create() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::warn!(name = %name, error = %e, "Could not create fetcher");
            return Ok(NameOutcome::Failed {
                name,
                error: e.to_string(),
            });
        }
    };

    let result = pipeline.resolve(&mut fetcher, &name, cancel).await;
    fetcher.close().await;

    match result {
        Ok(outcome) => Ok(outcome),
        Err(PipelineError::Fetch(e)) => {
            tracing::warn!(name = %name, error = %e, "Fetch failed; name left pending for the next run");
            Ok(NameOutcome::Failed {
                name,
                error: e.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}
