//! Combined-format access log for album requests.
//!
//! ```text
//! 203.0.113.7 - u [15/Oct/2026:09:12:01 +0200] "GET /b/cats/a.jpg HTTP/1.1" 200 5123 "-" "curl/8.5"
//! ```
//!
//! Lines are appended under a mutex so concurrent requests never interleave.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// One request/response pair as it appears in the log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub remote: Option<SocketAddr>,
    pub user: Option<String>,
    pub time: DateTime<Local>,
    /// `METHOD URI VERSION`
    pub request_line: String,
    pub status: u16,
    pub size: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl LogEntry {
    pub fn to_line(&self) -> String {
        let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "{host} - {user} [{time}] \"{request}\" {status} {size} \"{referer}\" \"{agent}\"\n",
            host = self
                .remote
                .map(|a| a.ip().to_string())
                .unwrap_or_else(|| "-".to_string()),
            user = dash(&self.user),
            time = self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            request = self.request_line,
            status = self.status,
            size = self
                .size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            referer = dash(&self.referer),
            agent = dash(&self.user_agent),
        )
    }
}

#[derive(Debug)]
pub struct AccessLog {
    file: Mutex<File>,
}

impl AccessLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn record(&self, entry: &LogEntry) {
        let line = entry.to_line();
        if let Err(e) = self.file.lock().write_all(line.as_bytes()) {
            warn!(error = %e, "failed to write access log");
        }
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Middleware recording every request passing through it.
pub async fn log_requests(State(log): State<Arc<AccessLog>>, req: Request, next: Next) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = req.headers();
    let user = headers
        .typed_get::<Authorization<Basic>>()
        .map(|auth| auth.username().to_string())
        .filter(|u| !u.is_empty());
    let referer = header_string(headers, header::REFERER);
    let user_agent = header_string(headers, header::USER_AGENT);
    let request_line = format!("{} {} {:?}", req.method(), req.uri(), req.version());
    let time = Local::now();

    let response = next.run(req).await;

    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    log.record(&LogEntry {
        remote,
        user,
        time,
        request_line,
        status: response.status().as_u16(),
        size,
        referer,
        user_agent,
    });
    response
}
