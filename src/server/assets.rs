//! Front-end assets served under `/a/`.
//!
//! By default the stylesheet and viewer script from `static/` are compiled into
//! the binary. With `assets-dir` configured they are served from disk instead,
//! which is handy while working on the front end.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

const GALLERY_CSS: &[u8] = include_bytes!("../../static/gallery.css");
const GALLERY_JS: &[u8] = include_bytes!("../../static/gallery.js");

const EMBEDDED: &[(&str, &[u8])] = &[("gallery.css", GALLERY_CSS), ("gallery.js", GALLERY_JS)];

/// Content type by file extension.
pub fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "css" => "text/css; charset=utf-8",
        Some(ext) if ext == "js" => "application/javascript; charset=utf-8",
        Some(ext) if ext == "html" => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub enum Assets {
    Embedded,
    Directory(PathBuf),
}

impl Assets {
    pub fn from_config(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => Assets::Directory(dir),
            None => Assets::Embedded,
        }
    }

    /// Look up an embedded asset by name.
    pub fn embedded(name: &str) -> Option<&'static [u8]> {
        EMBEDDED.iter().find(|(n, _)| *n == name).map(|(_, bytes)| *bytes)
    }

    /// Serve asset `name`; `req` is the original request.
    pub async fn serve(&self, name: &str, mut req: Request) -> Response {
        match self {
            Assets::Embedded => match Self::embedded(name) {
                Some(bytes) => (
                    [(header::CONTENT_TYPE, HeaderValue::from_static(content_type(name)))],
                    Body::from(bytes),
                )
                    .into_response(),
                None => {
                    debug!(asset = name, "asset not available");
                    super::not_found()
                }
            },
            Assets::Directory(dir) => {
                let Ok(uri) = format!("/{name}").parse::<Uri>() else {
                    return super::not_found();
                };
                *req.uri_mut() = uri;
                match ServeDir::new(dir).oneshot(req).await {
                    Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                        warn!(asset = name, dir = %dir.display(), "asset not found on disk");
                        super::not_found()
                    }
                    Ok(response) => response.map(Body::new),
                    Err(never) => match never {},
                }
            }
        }
    }
}
