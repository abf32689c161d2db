//! Batch file loading.
//!
//! A batch file is either a JSON array of entries:
//!
//! ```json
//! [
//!   { "group": "Sales Team", "message": "Q4 targets updated.", "delay": 5 },
//!   { "group": "HR Team", "message": "Handbook attached.", "media_file": "/srv/handbook.pdf" }
//! ]
//! ```
//!
//! or an object that also names subgroups, i.e. fixed lists of group ids a
//! single entry fans out to:
//!
//! ```json
//! {
//!   "subgroups": { "Regional Leads": ["120363025246125486@g.us", "120363025246125999@g.us"] },
//!   "messages": [
//!     { "subgroup": "Regional Leads", "message": "Forecast due Monday.", "delay": 4 }
//!   ]
//! }
//! ```
//!
//! `body` / `attachment` are accepted as aliases of `message` / `media_file`.
//! `delay` is in seconds; negative values clamp to zero.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::Value;

use crate::{domain::MessageRequest, errors::Error, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchDocument {
    #[serde(default)]
    subgroups: BTreeMap<String, Vec<String>>,
    messages: Vec<BatchEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchEntry {
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    subgroup: Option<String>,
    #[serde(alias = "body")]
    message: String,
    #[serde(default, alias = "attachment")]
    media_file: Option<PathBuf>,
    #[serde(default)]
    delay: Option<f64>,
}

impl BatchEntry {
    /// Expand into one request per target group, in subgroup member order.
    fn into_requests(
        self,
        subgroups: &BTreeMap<String, Vec<String>>,
    ) -> Result<Vec<MessageRequest>> {
        let targets: Vec<String> = match (self.group, self.subgroup) {
            (Some(group), None) => vec![group],
            (None, Some(name)) => {
                let members = subgroups.get(name.trim()).ok_or_else(|| {
                    Error::InvalidRequest(format!("unknown subgroup '{name}'"))
                })?;
                if members.is_empty() {
                    return Err(Error::InvalidRequest(format!(
                        "subgroup '{name}' has no groups"
                    )));
                }
                members.clone()
            }
            (Some(_), Some(_)) => {
                return Err(Error::InvalidRequest(
                    "set either group or subgroup, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidRequest("group must not be empty".to_string()))
            }
        };

        let attachment = self.media_file.filter(|p| !p.as_os_str().is_empty());
        targets
            .into_iter()
            .map(|group| {
                let mut req = MessageRequest::new(group, self.message.as_str())?;
                if let Some(path) = &attachment {
                    req = req.with_attachment(path.clone());
                }
                if let Some(secs) = self.delay {
                    req = req.with_delay_secs(secs);
                }
                Ok(req)
            })
            .collect()
    }
}

/// Parse a batch from JSON text. Every entry is validated before anything is
/// returned, so a bad entry rejects the whole batch up front.
pub fn parse_batch(json: &str) -> Result<Vec<MessageRequest>> {
    let doc = match serde_json::from_str::<Value>(json)? {
        entries @ Value::Array(_) => BatchDocument {
            subgroups: BTreeMap::new(),
            messages: serde_json::from_value(entries)?,
        },
        other => serde_json::from_value(other)?,
    };

    let mut requests = Vec::with_capacity(doc.messages.len());
    for (idx, entry) in doc.messages.into_iter().enumerate() {
        let expanded = entry.into_requests(&doc.subgroups).map_err(|e| match e {
            Error::InvalidRequest(msg) => Error::InvalidRequest(format!("entry {idx}: {msg}")),
            other => other,
        })?;
        requests.extend(expanded);
    }
    Ok(requests)
}

pub async fn load_batch(path: &Path) -> Result<Vec<MessageRequest>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::BatchFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    parse_batch(&text).map_err(|e| match e {
        Error::Json(err) => Error::BatchFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        other => other,
    })
}
