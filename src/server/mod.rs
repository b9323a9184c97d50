//! HTTP serving layer.
//!
//! ```text
//! {prefix}/a/<asset>          → embedded or on-disk front-end assets
//! {prefix}/b/<album>/<path>   → AlbumRegistry lookup → AuthGateway → file server
//! anything else               → 404
//! ```
//!
//! The album segment is looked up percent-decoded in the current registry
//! snapshot; the request URI is then rewritten to the remainder (`/` when there
//! is none) and handed to the album's file server, which serves `index.html` for
//! the album root.

pub mod access_log;
pub mod album;
pub mod assets;
pub mod auth;
pub mod registry;
pub mod sessions;

use access_log::AccessLog;
use assets::Assets;
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use percent_encoding::percent_decode_str;
use registry::AlbumRegistry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared state for the route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<AlbumRegistry>,
    pub assets: Arc<Assets>,
    /// Normalized URL prefix (`""` or `/x`).
    pub url_prefix: String,
}

pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from("404 page not found\n"),
    )
        .into_response()
}

/// Build the application router.
pub fn router(state: AppState, access_log: Option<Arc<AccessLog>>) -> Router {
    let prefix = state.url_prefix.clone();

    let mut albums = Router::new().route(&format!("{prefix}/b/{{*rest}}"), get(serve_album));
    if let Some(log) = access_log {
        albums = albums.layer(middleware::from_fn_with_state(log, access_log::log_requests));
    }

    Router::new()
        .route(&format!("{prefix}/a/{{*asset}}"), get(serve_asset))
        .merge(albums)
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback() -> Response {
    not_found()
}

async fn serve_asset(State(state): State<AppState>, Path(asset): Path<String>, req: Request) -> Response {
    state.assets.serve(&asset, req).await
}

async fn serve_album(State(state): State<AppState>, mut req: Request) -> Response {
    let Some((album, remainder)) = split_album_path(req.uri().path(), &state.url_prefix) else {
        return not_found();
    };
    let Some(handler) = state.registry.lookup(&album) else {
        debug!(album = %album, "unknown album");
        return not_found();
    };

    let path_and_query = match req.uri().query() {
        Some(query) => format!("{remainder}?{query}"),
        None => remainder,
    };
    let Ok(uri) = path_and_query.parse::<Uri>() else {
        return not_found();
    };
    *req.uri_mut() = uri;
    handler.serve(req).await
}

/// Split `{prefix}/b/<album>/<rest>` into the decoded album name and `/<rest>`.
///
/// The remainder stays percent-encoded for the file server to decode.
pub fn split_album_path(path: &str, url_prefix: &str) -> Option<(String, String)> {
    let rest = path.strip_prefix(url_prefix)?.strip_prefix("/b/")?;
    let (segment, remainder) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    if segment.is_empty() {
        return None;
    }
    let album = percent_decode_str(segment).decode_utf8().ok()?;
    Some((album.into_owned(), remainder.to_string()))
}
