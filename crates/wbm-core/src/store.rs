//! File-backed result stores.
//!
//! Reports land in `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.<ext>`. Writes go through a
//! temp file + rename so the returned location never points at a partial file.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Local;

use crate::{
    domain::{BatchReport, ReportLocation},
    errors::Error,
    ports::ResultStore,
    Result,
};

pub const DEFAULT_PREFIX: &str = "bulk_results";

/// Serialized form of a stored report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Build the store for `format` rooted at `dir`.
pub fn file_store(format: ReportFormat, dir: PathBuf, prefix: &str) -> Arc<dyn ResultStore> {
    match format {
        ReportFormat::Json => Arc::new(JsonFileStore::new(dir).with_prefix(prefix)),
        ReportFormat::Csv => Arc::new(CsvFileStore::new(dir).with_prefix(prefix)),
    }
}

#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    prefix: String,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn persist(&self, report: &BatchReport) -> Result<ReportLocation> {
        let contents = serde_json::to_string_pretty(report)
            .map_err(|e| Error::Persistence(format!("serialize report: {e}")))?;
        write_report(&self.dir, &self.prefix, ReportFormat::Json, contents).await
    }
}

#[derive(Clone, Debug)]
pub struct CsvFileStore {
    dir: PathBuf,
    prefix: String,
}

impl CsvFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[async_trait]
impl ResultStore for CsvFileStore {
    async fn persist(&self, report: &BatchReport) -> Result<ReportLocation> {
        write_report(&self.dir, &self.prefix, ReportFormat::Csv, render_csv(report)).await
    }
}

const CSV_HEADER: &str = "index,group,status,failure,reason,message_id,timestamp";

pub fn render_csv(report: &BatchReport) -> String {
    let mut out = String::with_capacity(64 * (report.outcomes.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for (idx, o) in report.outcomes.iter().enumerate() {
        let row = [
            (idx + 1).to_string(),
            escape_csv(&o.group),
            o.status.as_str().to_string(),
            o.failure.map(|k| k.as_str()).unwrap_or("").to_string(),
            escape_csv(o.reason.as_deref().unwrap_or("")),
            escape_csv(o.message_id.as_deref().unwrap_or("")),
            o.timestamp.to_rfc3339(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

async fn write_report(
    dir: &Path,
    prefix: &str,
    format: ReportFormat,
    contents: String,
) -> Result<ReportLocation> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::Persistence(format!("create {}: {e}", dir.display())))?;

    let path = unique_report_path(dir, prefix, format).await;
    let tmp = path.with_extension(format!("{}.tmp", format.extension()));

    if let Err(e) = tokio::fs::write(&tmp, contents).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::Persistence(format!("write {}: {e}", tmp.display())));
    }
    if let Err(e) = tokio::fs::rename(&tmp, &path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::Persistence(format!("rename to {}: {e}", path.display())));
    }

    Ok(ReportLocation(path.display().to_string()))
}

async fn unique_report_path(dir: &Path, prefix: &str, format: ReportFormat) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let ext = format.extension();
    let base = dir.join(format!("{prefix}_{stamp}.{ext}"));
    if !path_exists(&base).await {
        return base;
    }
    // Two runs within the same second.
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{prefix}_{stamp}_{n}.{ext}"));
        if !path_exists(&candidate).await {
            return candidate;
        }
        n += 1;
    }
}

async fn path_exists(p: &Path) -> bool {
    tokio::fs::metadata(p).await.is_ok()
}
