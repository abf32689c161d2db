//! Bulk dispatch engine.
//!
//! Sends a batch strictly in order, one message at a time, waiting the
//! effective delay *between* sends (never before the first or after the last).
//! A failed send becomes a `Failed` outcome and the batch moves on; only
//! cancellation and persistence are surfaced as batch-level results.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    domain::{BatchReport, DispatchOutcome, MessageRequest, ReportLocation},
    errors::Error,
    ports::{PlatformClient, ResultStore},
    report::ResultReporter,
    Result,
};

/// How a `run` ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Every request was attempted.
    Finished,
    /// A stop signal arrived; `skipped` requests were never attempted.
    Cancelled { skipped: usize },
}

#[derive(Clone, Debug)]
pub struct BatchRun {
    pub report: BatchReport,
    pub completion: Completion,
}

impl BatchRun {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.completion, Completion::Cancelled { .. })
    }
}

/// A run plus the result of handing its report to the store.
///
/// `location` failing never invalidates `run.report`.
#[derive(Debug)]
pub struct PersistedRun {
    pub run: BatchRun,
    pub location: Result<ReportLocation>,
}

#[derive(Clone)]
pub struct DispatchEngine {
    client: Arc<dyn PlatformClient>,
    store: Option<Arc<dyn ResultStore>>,
    cancel: CancellationToken,
}

impl DispatchEngine {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
            store: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an externally owned stop signal (Ctrl-C handler, caller timeout).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Dispatch `requests` in order and return the report of what was attempted.
    ///
    /// Cancellation is observed before each send and during each pacing wait.
    pub async fn run(&self, requests: Vec<MessageRequest>, default_delay: Duration) -> BatchRun {
        let total = requests.len();
        let mut reporter = ResultReporter::with_capacity(total);
        let mut completion = Completion::Finished;

        info!(
            total,
            default_delay_ms = default_delay.as_millis() as u64,
            "dispatch started"
        );

        let started = Instant::now();
        for (idx, req) in requests.iter().enumerate() {
            if self.cancel.is_cancelled() {
                completion = Completion::Cancelled {
                    skipped: total - idx,
                };
                break;
            }

            let outcome = self.dispatch_one(idx, total, req).await;
            reporter.record(outcome);

            if idx + 1 == total {
                break;
            }

            let delay = req.effective_delay(default_delay);
            if !self.pace(delay).await {
                completion = Completion::Cancelled {
                    skipped: total - idx - 1,
                };
                break;
            }
        }
        let elapsed = started.elapsed();

        let report = reporter.finish(elapsed);
        match completion {
            Completion::Finished => info!(
                sent = report.sent_count,
                failed = report.failed_count,
                duration_s = report.duration_seconds,
                "dispatch finished"
            ),
            Completion::Cancelled { skipped } => warn!(
                sent = report.sent_count,
                failed = report.failed_count,
                skipped,
                duration_s = report.duration_seconds,
                "dispatch cancelled"
            ),
        }

        BatchRun { report, completion }
    }

    /// Hand a finished report to the configured store.
    pub async fn persist(&self, report: &BatchReport) -> Result<ReportLocation> {
        let Some(store) = &self.store else {
            return Err(Error::Persistence("no result store configured".to_string()));
        };

        match store.persist(report).await {
            Ok(location) => {
                info!(location = %location, "report persisted");
                Ok(location)
            }
            Err(Error::Persistence(msg)) => {
                warn!(error = %msg, "report persistence failed");
                Err(Error::Persistence(msg))
            }
            Err(other) => {
                warn!(error = %other, "report persistence failed");
                Err(Error::Persistence(other.to_string()))
            }
        }
    }

    pub async fn run_and_persist(
        &self,
        requests: Vec<MessageRequest>,
        default_delay: Duration,
    ) -> PersistedRun {
        let run = self.run(requests, default_delay).await;
        let location = self.persist(&run.report).await;
        PersistedRun { run, location }
    }

    async fn dispatch_one(&self, idx: usize, total: usize, req: &MessageRequest) -> DispatchOutcome {
        let at = Utc::now();
        debug!(
            index = idx + 1,
            total,
            group = req.group(),
            attachment = ?req.attachment(),
            "sending"
        );

        match self
            .client
            .send(req.group(), req.body(), req.attachment())
            .await
        {
            Ok(receipt) => {
                info!(
                    index = idx + 1,
                    total,
                    group = req.group(),
                    message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "sent"
                );
                DispatchOutcome::sent(req.group(), receipt, at)
            }
            Err(failure) => {
                let outcome = DispatchOutcome::failed(req.group(), failure, at);
                warn!(
                    index = idx + 1,
                    total,
                    group = req.group(),
                    kind = outcome.failure.map(|k| k.as_str()).unwrap_or("-"),
                    reason = outcome.reason.as_deref().unwrap_or("-"),
                    "send failed"
                );
                outcome
            }
        }
    }

    /// Wait `delay` unless cancelled first. Returns `false` on cancellation.
    async fn pace(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return true;
        }
        debug!(delay_ms = delay.as_millis() as u64, "pacing");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }
}
