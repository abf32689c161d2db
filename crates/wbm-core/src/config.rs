use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::{errors::Error, store::ReportFormat, Result};

pub const DEFAULT_WHAPI_BASE_URL: &str = "https://gate.whapi.cloud";

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    // Gateway
    pub whapi_token: Option<String>,
    pub whapi_base_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub group_page_size: u32,
    pub health_check: bool,

    // Pacing
    pub default_delay: Duration,

    // Reports
    pub results_dir: PathBuf,
    pub results_prefix: String,
    pub report_format: ReportFormat,
}

impl Config {
    /// Process env first, then `.env` in the working directory.
    pub fn load() -> Result<Self> {
        let dotenv = read_dotenv(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let whapi_token = get("WHAPI_TOKEN");
        let whapi_base_url = get("WHAPI_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_WHAPI_BASE_URL.to_string());

        let request_timeout =
            Duration::from_millis(parse_int::<u64>(&get, "WHAPI_TIMEOUT_MS")?.unwrap_or(10_000));
        let max_retries = parse_int::<u32>(&get, "WHAPI_MAX_RETRIES")?.unwrap_or(2);
        let retry_base_delay =
            Duration::from_millis(parse_int::<u64>(&get, "WHAPI_RETRY_BASE_MS")?.unwrap_or(1_000));
        let group_page_size = parse_int::<u32>(&get, "WHAPI_GROUP_PAGE_SIZE")?
            .unwrap_or(100)
            .clamp(1, 500);
        let health_check = get("HEALTH_CHECK").map(|s| parse_bool(&s)).unwrap_or(true);

        let default_delay = match get("DEFAULT_DELAY_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<f64>().map_err(|_| {
                    Error::Config(format!("DEFAULT_DELAY_SECS is not a number: {raw}"))
                })?;
                crate::domain::delay_from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        let results_dir = get("RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let results_prefix = get("RESULTS_PREFIX")
            .unwrap_or_else(|| crate::store::DEFAULT_PREFIX.to_string());
        let report_format = match get("REPORT_FORMAT") {
            Some(raw) => ReportFormat::parse(&raw).ok_or_else(|| {
                Error::Config(format!("REPORT_FORMAT must be json or csv, got {raw}"))
            })?,
            None => ReportFormat::Json,
        };

        Ok(Self {
            whapi_token,
            whapi_base_url,
            request_timeout,
            max_retries,
            retry_base_delay,
            group_page_size,
            health_check,
            default_delay,
            results_dir,
            results_prefix,
            report_format,
        })
    }

    pub fn require_whapi_token(&self) -> Result<&str> {
        self.whapi_token.as_deref().ok_or_else(|| {
            Error::Config("WHAPI_TOKEN environment variable is required".to_string())
        })
    }
}

/// `KEY=value` pairs from a dotenv file; a missing file yields nothing.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    fs::read_to_string(path)
        .map(|contents| parse_dotenv(&contents))
        .unwrap_or_default()
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (k, v) = line.split_once('=')?;
            let key = k.trim();
            (!key.is_empty()).then(|| (key.to_string(), strip_quotes(v.trim()).to_string()))
        })
        .collect()
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_int<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match get(key) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Error::Config(format!(
                "{key} must be a non-negative integer in range, got {raw}"
            ))
        }),
        None => Ok(None),
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
