//! Handler for one published album: Auth Gateway in front of a file server
//! rooted at the album directory.

use super::auth::{self, Admission, Gateway};
use super::sessions::SessionSet;
use crate::handoff::PublishedAlbum;
use crate::naming::PATH_SEGMENT;
use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};
use percent_encoding::utf8_percent_encode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

#[derive(Debug)]
pub struct AlbumHandler {
    name: String,
    dir: PathBuf,
    gateway: Gateway,
    /// Kept for as long as the album name stays published, whatever its credentials.
    sessions: Arc<SessionSet>,
    cookie_name: String,
    cookie_path: String,
    files: ServeDir,
}

impl AlbumHandler {
    pub fn new(root: &Path, url_prefix: &str, album: &PublishedAlbum, sessions: Arc<SessionSet>) -> Self {
        let dir = root.join(&album.name);
        let encoded = utf8_percent_encode(&album.name, PATH_SEGMENT);
        Self {
            name: album.name.clone(),
            gateway: Gateway::for_album(album),
            sessions,
            cookie_name: auth::cookie_name(&album.name),
            cookie_path: format!("{url_prefix}/b/{encoded}"),
            files: ServeDir::new(&dir),
            dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn sessions(&self) -> &Arc<SessionSet> {
        &self.sessions
    }

    /// Serve `req`, whose URI has already been rewritten relative to the album.
    pub async fn serve(&self, req: Request) -> Response {
        let jar = CookieJar::from_headers(req.headers());
        let credentials = req.headers().typed_get::<Authorization<Basic>>();

        let sid = match self
            .gateway
            .admit(&self.sessions, &self.cookie_name, &jar, credentials.as_ref())
        {
            Admission::Granted => None,
            Admission::Established(sid) => {
                debug!(album = %self.name, "established session");
                Some(sid)
            }
            Admission::Denied => return auth::unauthorized(),
        };

        let response = match self.files.clone().oneshot(req).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        };

        match sid {
            Some(sid) => {
                let cookie = auth::session_cookie(&self.cookie_name, &sid, &self.cookie_path);
                (CookieJar::new().add(cookie), response).into_response()
            }
            None => response,
        }
    }
}
