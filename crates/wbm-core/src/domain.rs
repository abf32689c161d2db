use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// One outbound message of a batch.
///
/// Fields are private: a request is immutable once built and is consumed
/// exactly once by the dispatch engine.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageRequest {
    group: String,
    body: String,
    attachment: Option<PathBuf>,
    delay: Option<Duration>,
}

impl MessageRequest {
    /// Build a text request. Group and body must be non-blank.
    pub fn new(group: impl Into<String>, body: impl Into<String>) -> Result<Self> {
        let group = group.into();
        let body = body.into();
        if group.trim().is_empty() {
            return Err(Error::InvalidRequest("group must not be empty".to_string()));
        }
        if body.trim().is_empty() {
            return Err(Error::InvalidRequest(format!(
                "message body for group '{group}' must not be empty"
            )));
        }
        Ok(Self {
            group,
            body,
            attachment: None,
            delay: None,
        })
    }

    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }

    /// Per-message pacing override (the wait *after* this message).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Same as [`MessageRequest::with_delay`] but from raw seconds.
    ///
    /// Negative, NaN and infinite values clamp to zero (no wait).
    pub fn with_delay_secs(self, secs: f64) -> Self {
        self.with_delay(delay_from_secs(secs))
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn attachment(&self) -> Option<&Path> {
        self.attachment.as_deref()
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// The wait applied after this message when it is not the last one.
    pub fn effective_delay(&self, default_delay: Duration) -> Duration {
        self.delay.unwrap_or(default_delay)
    }
}

/// Seconds to a pacing delay; negative, NaN and infinite values clamp to zero.
pub fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Why a single send failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The group name does not map to a known recipient group.
    DestinationUnresolved,
    /// The attachment path does not exist or cannot be read.
    AttachmentUnavailable,
    /// Any other collaborator-reported failure.
    Transport,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::DestinationUnresolved => "destination_unresolved",
            FailureKind::AttachmentUnavailable => "attachment_unavailable",
            FailureKind::Transport => "transport",
        }
    }

    /// Reason used when a collaborator reports a failure without any text.
    pub fn default_reason(self) -> &'static str {
        match self {
            FailureKind::DestinationUnresolved => "group not found",
            FailureKind::AttachmentUnavailable => "attachment file missing or unreadable",
            FailureKind::Transport => "send failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful send as reported by a platform client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Failed send as reported by a platform client.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {reason}")]
pub struct SendFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl SendFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn destination_unresolved(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::DestinationUnresolved, reason)
    }

    pub fn attachment_unavailable(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::AttachmentUnavailable, reason)
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, reason)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Sent,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Sent => "sent",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Result of one dispatch attempt. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub group: String,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchOutcome {
    pub fn sent(group: impl Into<String>, receipt: SendReceipt, at: DateTime<Utc>) -> Self {
        Self {
            group: group.into(),
            status: OutcomeStatus::Sent,
            failure: None,
            reason: None,
            message_id: receipt.message_id,
            timestamp: at,
        }
    }

    /// A failed outcome. Blank reasons are replaced so every failure carries text.
    pub fn failed(group: impl Into<String>, failure: SendFailure, at: DateTime<Utc>) -> Self {
        let reason = if failure.reason.trim().is_empty() {
            failure.kind.default_reason().to_string()
        } else {
            failure.reason
        };
        Self {
            group: group.into(),
            status: OutcomeStatus::Failed,
            failure: Some(failure.kind),
            reason: Some(reason),
            message_id: None,
            timestamp: at,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == OutcomeStatus::Sent
    }
}

/// Aggregate of one batch.
///
/// Invariant: `total == sent_count + failed_count == outcomes.len()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub duration_seconds: f64,
    pub outcomes: Vec<DispatchOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_sent())
    }

    pub fn all_sent(&self) -> bool {
        self.failed_count == 0
    }

    /// One-line human summary, e.g. `3 total, 2 sent, 1 failed in 12.0s`.
    pub fn summary(&self) -> String {
        format!(
            "{} total, {} sent, {} failed in {:.1}s",
            self.total, self.sent_count, self.failed_count, self.duration_seconds
        )
    }
}

/// Where a report was persisted (file path, URL, row id, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportLocation(pub String);

impl fmt::Display for ReportLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
