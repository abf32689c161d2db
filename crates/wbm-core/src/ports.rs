use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{BatchReport, ReportLocation, SendFailure, SendReceipt},
    Result,
};

/// Hexagonal port for the messaging platform.
///
/// One call is one logical send: resolve the group, attach the file (if any),
/// transmit. Implementations must tell "group not found" apart from
/// "attachment unavailable" and transport failures via [`SendFailure::kind`].
/// Lower-level retries are the implementation's business.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn send(
        &self,
        group: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> std::result::Result<SendReceipt, SendFailure>;
}

/// Port for durable report storage (file, database, object store).
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn persist(&self, report: &BatchReport) -> Result<ReportLocation>;
}
