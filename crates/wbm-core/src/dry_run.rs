use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::{
    domain::{SendFailure, SendReceipt},
    ports::PlatformClient,
};

/// Platform client that logs instead of sending.
///
/// Attachments are still checked so a dry run flags missing media.
#[derive(Clone, Debug, Default)]
pub struct DryRunClient;

#[async_trait]
impl PlatformClient for DryRunClient {
    async fn send(
        &self,
        group: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> std::result::Result<SendReceipt, SendFailure> {
        if let Some(path) = attachment {
            match tokio::fs::metadata(path).await {
                Ok(md) if md.is_file() => {}
                Ok(_) => {
                    return Err(SendFailure::attachment_unavailable(format!(
                        "attachment {} is not a file",
                        path.display()
                    )))
                }
                Err(e) => {
                    return Err(SendFailure::attachment_unavailable(format!(
                        "attachment {} unavailable: {e}",
                        path.display()
                    )))
                }
            }
        }

        info!(
            group,
            chars = body.chars().count(),
            attachment = ?attachment,
            "dry run: message not sent"
        );
        Ok(SendReceipt::default())
    }
}
