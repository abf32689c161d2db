//! Whapi.Cloud adapter (WhatsApp gateway).
//!
//! Implements the `wbm-core` PlatformClient over the Whapi REST API: group
//! lookup by name, text and media sends, and transport-level retries with
//! exponential backoff.

use std::{collections::HashMap, future::Future, path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};
use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, info, warn};

use wbm_core::{
    config::Config,
    domain::{SendFailure, SendReceipt},
    errors::Error,
    ports::PlatformClient,
    Result,
};

type SendResult<T> = std::result::Result<T, SendFailure>;

const MAX_GROUP_PAGES: u32 = 20;
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Clone, Debug)]
pub struct WhapiSettings {
    pub token: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub group_page_size: u32,
}

impl WhapiSettings {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            token: cfg.require_whapi_token()?.to_string(),
            base_url: cfg.whapi_base_url.clone(),
            timeout: cfg.request_timeout,
            max_retries: cfg.max_retries,
            retry_base_delay: cfg.retry_base_delay,
            group_page_size: cfg.group_page_size,
        })
    }
}

pub struct WhapiClient {
    settings: WhapiSettings,
    http: reqwest::Client,
    /// Lower-cased group name -> group id, loaded on first lookup by name.
    groups: Mutex<Option<HashMap<String, String>>>,
}

impl WhapiClient {
    pub fn new(settings: WhapiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::External(format!("whapi http client build failed: {e}")))?;
        Ok(Self {
            settings,
            http,
            groups: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url)
    }

    /// Gateway health check (also wakes a sleeping channel).
    pub async fn health(&self) -> bool {
        let resp = self
            .http
            .get(self.url("/health"))
            .query(&[("wakeup", "true"), ("channel_type", "web")])
            .bearer_auth(&self.settings.token)
            .header("accept", "application/json")
            .send()
            .await;

        match resp {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                warn!(status = %r.status(), "whapi health check failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "whapi health check failed");
                false
            }
        }
    }

    async fn resolve_group(&self, group: &str) -> SendResult<String> {
        let group = group.trim();
        if looks_like_id(group) {
            return Ok(format_recipient(group));
        }

        let mut cache = self.groups.lock().await;
        if cache.is_none() {
            let groups = self.list_groups().await?;
            info!(count = groups.len(), "loaded whapi groups");
            *cache = Some(groups);
        }

        cache
            .as_ref()
            .and_then(|m| m.get(&group.to_lowercase()))
            .map(|id| format_recipient(id))
            .ok_or_else(|| SendFailure::destination_unresolved(format!("group '{group}' not found")))
    }

    async fn list_groups(&self) -> SendResult<HashMap<String, String>> {
        let count = self.settings.group_page_size;
        let mut out = HashMap::new();

        for page in 0..MAX_GROUP_PAGES {
            let offset = page * count;
            let v = self
                .with_retry("list groups", || {
                    self.http
                        .get(self.url("/groups"))
                        .query(&[("count", count), ("offset", offset)])
                        .bearer_auth(&self.settings.token)
                        .header("accept", "application/json")
                        .send()
                })
                .await
                .map_err(|f| SendFailure::transport(format!("failed to list groups: {}", f.reason)))?;

            let (batch, total) = parse_groups(&v);
            let fetched = batch.len() as u32;
            out.extend(batch);
            let reached_total = total.is_some_and(|t| u64::from(offset + fetched) >= t);
            if fetched < count || reached_total {
                break;
            }
        }

        Ok(out)
    }

    async fn send_text(&self, to: &str, body: &str) -> SendResult<Value> {
        let payload = json!({ "to": to, "body": body });
        self.with_retry("send text", || {
            self.http
                .post(self.url("/messages/text"))
                .bearer_auth(&self.settings.token)
                .header("accept", "application/json")
                .json(&payload)
                .send()
        })
        .await
    }

    async fn send_media(&self, to: &str, caption: &str, path: &Path, bytes: Vec<u8>) -> SendResult<Value> {
        let kind = MediaKind::for_path(path);
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("attachment")
            .to_string();
        let mime = mime_for_path(path);

        self.with_retry("send media", || {
            // multipart::Form is single-use; rebuild it per attempt.
            let part = multipart::Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str(mime)
                .unwrap_or_else(|_| multipart::Part::bytes(bytes.clone()).file_name(file_name.clone()));
            let form = multipart::Form::new()
                .text("to", to.to_string())
                .text("caption", caption.to_string())
                .part("media", part);
            self.http
                .post(self.url(kind.endpoint()))
                .bearer_auth(&self.settings.token)
                .header("accept", "application/json")
                .multipart(form)
                .send()
        })
        .await
    }

    /// Run `op`, retrying network errors, 429 and 5xx with exponential backoff.
    async fn with_retry<Fut>(&self, what: &str, mut op: impl FnMut() -> Fut) -> SendResult<Value>
    where
        Fut: Future<Output = reqwest::Result<reqwest::Response>>,
    {
        let mut attempt = 0u32;
        loop {
            let reason = match op().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(resp.json::<Value>().await.unwrap_or(Value::Null));
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    let reason = format!("{what} failed: {status} {}", truncate(&body, ERROR_BODY_LIMIT));
                    if !is_retryable(status) {
                        return Err(SendFailure::transport(reason));
                    }
                    reason
                }
                Err(e) => format!("{what} request error: {e}"),
            };

            if attempt >= self.settings.max_retries {
                return Err(SendFailure::transport(reason));
            }
            let wait = backoff(self.settings.retry_base_delay, attempt);
            attempt += 1;
            warn!(attempt, wait_ms = wait.as_millis() as u64, %reason, "whapi call failed; retrying");
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl PlatformClient for WhapiClient {
    async fn send(&self, group: &str, body: &str, attachment: Option<&Path>) -> SendResult<SendReceipt> {
        let to = self.resolve_group(group).await?;

        let data = match attachment {
            Some(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    SendFailure::attachment_unavailable(format!(
                        "attachment {} unavailable: {e}",
                        path.display()
                    ))
                })?;
                debug!(to = %to, bytes = bytes.len(), "sending media");
                self.send_media(&to, body, path, bytes).await?
            }
            None => {
                debug!(to = %to, "sending text");
                self.send_text(&to, body).await?
            }
        };

        Ok(SendReceipt {
            message_id: extract_message_id(&data),
        })
    }
}

/// `base * 2^attempt`, saturating instead of overflowing.
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt))
        .unwrap_or(Duration::MAX)
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Turn a bare id into a WhatsApp JID.
///
/// Ids with `@` pass through; long ids are groups (`@g.us`); short ones are
/// phone numbers (`@s.whatsapp.net`).
pub fn format_recipient(id: &str) -> String {
    if id.contains('@') {
        id.to_string()
    } else if id.len() > 15 {
        format!("{id}@g.us")
    } else {
        format!("{id}@s.whatsapp.net")
    }
}

/// Whether `target` is already an id rather than a group name.
pub fn looks_like_id(target: &str) -> bool {
    target.contains('@')
        || (target.len() > 15 && target.chars().all(|c| c.is_ascii_digit() || c == '-'))
}

/// Groups page -> (lower-cased name -> id, total if reported).
fn parse_groups(v: &Value) -> (HashMap<String, String>, Option<u64>) {
    let items = v
        .get("groups")
        .and_then(Value::as_array)
        .or_else(|| v.as_array());
    let total = v.get("total").and_then(Value::as_u64);

    let mut out = HashMap::new();
    for g in items.into_iter().flatten() {
        let Some(id) = g.get("id").and_then(Value::as_str) else {
            continue;
        };
        let name = g
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| g.get("subject").and_then(Value::as_str));
        if let Some(name) = name {
            out.insert(name.trim().to_lowercase(), id.to_string());
        }
    }
    (out, total)
}

fn extract_message_id(v: &Value) -> Option<String> {
    v.pointer("/message/id")
        .or_else(|| v.get("id"))
        .or_else(|| v.get("messageId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    fn for_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("jpg" | "jpeg" | "png" | "webp" | "gif") => Self::Image,
            Some("mp4" | "3gp" | "mov") => Self::Video,
            _ => Self::Document,
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            Self::Image => "/messages/image",
            Self::Video => "/messages/video",
            Self::Document => "/messages/document",
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

fn mime_for_path(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("3gp") => "video/3gpp",
        Some("mov") => "video/quicktime",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };
    use wbm_core::domain::FailureKind;

    fn client_at(base_url: &str, max_retries: u32, group_page_size: u32) -> WhapiClient {
        WhapiClient::new(WhapiSettings {
            token: "test".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(2),
            max_retries,
            retry_base_delay: Duration::from_millis(1),
            group_page_size,
        })
        .unwrap()
    }

    fn offline_client() -> WhapiClient {
        // Nothing listens on port 1; every request fails fast.
        client_at("http://127.0.0.1:1", 1, 50)
    }

    #[derive(Clone, Debug)]
    struct Recorded {
        /// Method and path with query, e.g. `GET /groups?count=2&offset=0`.
        target: String,
        raw: String,
    }

    /// HTTP/1.1 stand-in for the gateway. Answers the scripted responses in
    /// order, one per connection, and records every request it reads.
    struct StubGateway {
        base_url: String,
        requests: Arc<StdMutex<Vec<Recorded>>>,
    }

    impl StubGateway {
        async fn start(responses: Vec<(u16, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let requests = Arc::new(StdMutex::new(Vec::new()));
            let log = requests.clone();

            tokio::spawn(async move {
                for (status, body) in responses {
                    let Ok((mut sock, _)) = listener.accept().await else {
                        return;
                    };
                    let raw = read_request(&mut sock).await;
                    let target = raw
                        .lines()
                        .next()
                        .unwrap_or_default()
                        .split_whitespace()
                        .take(2)
                        .collect::<Vec<_>>()
                        .join(" ");
                    log.lock().unwrap().push(Recorded { target, raw });

                    let resp = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = sock.write_all(resp.as_bytes()).await;
                    let _ = sock.shutdown().await;
                }
            });

            Self { base_url, requests }
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        fn targets(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.target).collect()
        }
    }

    async fn read_request(sock: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                let body = &buf[end + 4..];
                let done = match len {
                    Some(n) => body.len() >= n,
                    None if head.contains("transfer-encoding: chunked") => {
                        body.ends_with(b"0\r\n\r\n")
                    }
                    None => true,
                };
                if done {
                    break;
                }
            }
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
        hay.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn formats_recipients() {
        assert_eq!(format_recipient("123@g.us"), "123@g.us");
        assert_eq!(
            format_recipient("120363025246125486"),
            "120363025246125486@g.us"
        );
        assert_eq!(
            format_recipient("919876543210"),
            "919876543210@s.whatsapp.net"
        );
    }

    #[test]
    fn distinguishes_ids_from_names() {
        assert!(looks_like_id("120363025246125486@g.us"));
        assert!(looks_like_id("120363025246125486"));
        assert!(!looks_like_id("Sales Team"));
        assert!(!looks_like_id("919876543210"));
    }

    #[test]
    fn parses_group_listing() {
        let v = json!({
            "groups": [
                {"id": "111@g.us", "name": " Sales Team "},
                {"id": "222@g.us", "subject": "HR"},
                {"id": "333@g.us", "name": "", "subject": "Ops"},
                {"name": "No Id"}
            ],
            "total": 3
        });
        let (groups, total) = parse_groups(&v);
        assert_eq!(total, Some(3));
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.get("sales team").map(String::as_str), Some("111@g.us"));
        assert_eq!(groups.get("hr").map(String::as_str), Some("222@g.us"));
        assert_eq!(groups.get("ops").map(String::as_str), Some("333@g.us"));

        let (bare, total) = parse_groups(&json!([{"id": "9@g.us", "name": "X"}]));
        assert_eq!(total, None);
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn extracts_message_id_from_known_shapes() {
        assert_eq!(
            extract_message_id(&json!({"sent": true, "message": {"id": "a1"}})),
            Some("a1".to_string())
        );
        assert_eq!(extract_message_id(&json!({"id": "b2"})), Some("b2".to_string()));
        assert_eq!(
            extract_message_id(&json!({"messageId": "c3"})),
            Some("c3".to_string())
        );
        assert_eq!(extract_message_id(&Value::Null), None);
    }

    #[test]
    fn picks_media_endpoint_by_extension() {
        assert_eq!(MediaKind::for_path(Path::new("a/b.JPG")), MediaKind::Image);
        assert_eq!(MediaKind::for_path(Path::new("clip.mp4")), MediaKind::Video);
        assert_eq!(MediaKind::for_path(Path::new("doc.pdf")), MediaKind::Document);
        assert_eq!(MediaKind::for_path(Path::new("noext")), MediaKind::Document);
        assert_eq!(mime_for_path(Path::new("doc.pdf")), "application/pdf");
        assert_eq!(mime_for_path(Path::new("x.bin")), "application/octet-stream");
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff(base, 0), Duration::from_millis(100));
        assert_eq!(backoff(base, 3), Duration::from_millis(800));
        assert_eq!(backoff(base, 40), Duration::MAX);
        assert_eq!(backoff(Duration::MAX, 1), Duration::MAX);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let gw = StubGateway::start(vec![
            (503, r#"{"error":"busy"}"#),
            (503, r#"{"error":"busy"}"#),
            (200, r#"{"sent":true,"message":{"id":"m1"}}"#),
        ])
        .await;
        let client = client_at(&gw.base_url, 2, 100);

        let receipt = client
            .send("120363025246125486@g.us", "hello", None)
            .await
            .unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("m1"));
        assert_eq!(gw.targets(), vec!["POST /messages/text"; 3]);
        assert!(gw.requests()[0]
            .raw
            .contains(r#""to":"120363025246125486@g.us""#));
    }

    #[tokio::test]
    async fn retries_stop_at_max_retries() {
        let gw = StubGateway::start(vec![
            (429, r#"{"error":"slow down"}"#),
            (429, r#"{"error":"slow down"}"#),
            (200, r#"{"message":{"id":"late"}}"#),
        ])
        .await;
        let client = client_at(&gw.base_url, 1, 100);

        let err = client
            .send("120363025246125486@g.us", "hello", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Transport);
        assert!(err.reason.contains("429"));
        assert!(err.reason.contains("slow down"));
        assert_eq!(gw.targets().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let gw = StubGateway::start(vec![
            (400, r#"{"error":"invalid recipient"}"#),
            (200, r#"{"message":{"id":"never"}}"#),
        ])
        .await;
        let client = client_at(&gw.base_url, 2, 100);

        let err = client
            .send("120363025246125486@g.us", "hello", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Transport);
        assert!(err.reason.contains("400"));
        assert!(err.reason.contains("invalid recipient"));
        assert_eq!(gw.targets().len(), 1);
    }

    #[tokio::test]
    async fn group_listing_pages_until_short_page_and_is_cached() {
        let gw = StubGateway::start(vec![
            (
                200,
                r#"{"groups":[{"id":"120363000000000001@g.us","name":"All Staff"},{"id":"120363000000000002@g.us","name":"HR"}]}"#,
            ),
            (
                200,
                r#"{"groups":[{"id":"120363000000000003@g.us","name":"Finance"},{"id":"120363000000000004@g.us","name":"Ops"}]}"#,
            ),
            (
                200,
                r#"{"groups":[{"id":"120363000000000005@g.us","name":"Sales Team"}]}"#,
            ),
            (200, r#"{"message":{"id":"t1"}}"#),
            (200, r#"{"message":{"id":"t2"}}"#),
        ])
        .await;
        let client = client_at(&gw.base_url, 0, 2);

        let first = client.send("sales team", "targets", None).await.unwrap();
        assert_eq!(first.message_id.as_deref(), Some("t1"));
        let second = client.send("HR", "handbook", None).await.unwrap();
        assert_eq!(second.message_id.as_deref(), Some("t2"));

        assert_eq!(
            gw.targets(),
            vec![
                "GET /groups?count=2&offset=0",
                "GET /groups?count=2&offset=2",
                "GET /groups?count=2&offset=4",
                "POST /messages/text",
                "POST /messages/text",
            ]
        );
        let requests = gw.requests();
        assert!(requests[3].raw.contains(r#""to":"120363000000000005@g.us""#));
        assert!(requests[4].raw.contains(r#""to":"120363000000000002@g.us""#));
        assert!(requests[0]
            .raw
            .to_lowercase()
            .contains("authorization: bearer test"));
    }

    #[tokio::test]
    async fn pdf_attachment_goes_to_document_endpoint_as_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handbook.pdf");
        std::fs::write(&path, b"%PDF-1.4 handbook body").unwrap();

        let gw = StubGateway::start(vec![(200, r#"{"sent":true,"message":{"id":"d1"}}"#)]).await;
        let client = client_at(&gw.base_url, 0, 100);

        let receipt = client
            .send("120363025246125486@g.us", "Handbook v2", Some(path.as_path()))
            .await
            .unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("d1"));

        let requests = gw.requests();
        assert_eq!(gw.targets(), vec!["POST /messages/document"]);
        let raw = &requests[0].raw;
        assert!(raw.to_lowercase().contains("multipart/form-data; boundary="));
        assert!(raw.contains(r#"name="to""#));
        assert!(raw.contains("120363025246125486@g.us"));
        assert!(raw.contains(r#"name="caption""#));
        assert!(raw.contains("Handbook v2"));
        assert!(raw.contains(r#"filename="handbook.pdf""#));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("%PDF-1.4 handbook body"));
    }

    #[tokio::test]
    async fn missing_attachment_is_classified_before_any_request() {
        let client = offline_client();
        let err = client
            .send(
                "120363025246125486@g.us",
                "handbook",
                Some(Path::new("/nonexistent/file.pdf")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::AttachmentUnavailable);
        assert!(err.reason.contains("/nonexistent/file.pdf"));
    }

    #[tokio::test]
    async fn unknown_group_name_is_unresolved() {
        let client = offline_client();
        let mut known = HashMap::new();
        known.insert("sales team".to_string(), "111@g.us".to_string());
        *client.groups.lock().await = Some(known);

        let err = client.send("Nonexistent Group", "hi", None).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::DestinationUnresolved);
        assert!(err.reason.contains("not found"));
    }

    #[tokio::test]
    async fn known_group_name_resolves_case_insensitively() {
        let client = offline_client();
        let mut known = HashMap::new();
        known.insert("sales team".to_string(), "120363025246125486".to_string());
        *client.groups.lock().await = Some(known);

        let to = client.resolve_group("  SALES Team ").await.unwrap();
        assert_eq!(to, "120363025246125486@g.us");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_failure() {
        let client = offline_client();

        let err = client
            .send("120363025246125486@g.us", "hi", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Transport);
        assert!(err.reason.contains("send text request error"));

        // Listing groups fails the same way; it must not look like "not found".
        let err = client.send("Sales Team", "hi", None).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Transport);
        assert!(err.reason.contains("failed to list groups"));
        assert!(client.groups.lock().await.is_none());
    }
}
