//! Per-album Auth Gateway.
//!
//! An album with neither a username nor a password is [`Gateway::Open`]. Any
//! other album is guarded by HTTP Basic Auth:
//!
//! ```text
//!   Anonymous ──(Basic credentials match)──▶ Authenticated (session cookie set)
//!       │                                          │
//!       └──(missing or wrong)──▶ 401 challenge     └──(cookie in session set)──▶ serve
//! ```
//!
//! The cookie is named `session-a2bb9-<album>` and carries no `Max-Age`, so it
//! lasts for the browser session. Sessions are held in memory only; a restart
//! forces every client through Basic Auth again.
//!
//! The gateway itself holds no sessions: the album handler owns its
//! [`SessionSet`] so it outlives credential changes.

use super::sessions::SessionSet;
use crate::handoff::PublishedAlbum;
use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Basic;

pub const COOKIE_BASE_NAME: &str = "session-a2bb9-";
pub const CHALLENGE: &str = r#"Basic realm="Authorization Required""#;

/// Outcome of checking a request against a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Pass through without changes.
    Granted,
    /// Credentials accepted; the response must set this session id.
    Established(String),
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gateway {
    Open,
    Basic { user: String, pass: String },
}

impl Gateway {
    pub fn for_album(album: &PublishedAlbum) -> Self {
        if album.has_auth() {
            Gateway::Basic {
                user: album.user.clone(),
                pass: album.pass.clone(),
            }
        } else {
            Gateway::Open
        }
    }

    /// Check a request carrying `jar` and optional Basic `credentials`.
    ///
    /// A new session is recorded in `sessions` when the credentials match.
    pub fn admit(
        &self,
        sessions: &SessionSet,
        cookie_name: &str,
        jar: &CookieJar,
        credentials: Option<&Authorization<Basic>>,
    ) -> Admission {
        let Gateway::Basic { user, pass } = self else {
            return Admission::Granted;
        };

        if jar
            .get(cookie_name)
            .is_some_and(|cookie| sessions.contains(cookie.value()))
        {
            return Admission::Granted;
        }
        match credentials {
            Some(auth) if auth.username() == user && auth.password() == pass => {
                Admission::Established(sessions.create())
            }
            _ => Admission::Denied,
        }
    }
}

/// Cookie name for `album`: the fixed prefix plus the album name, with any
/// character not allowed in a cookie name replaced by `_`.
pub fn cookie_name(album: &str) -> String {
    let mut name = String::from(COOKIE_BASE_NAME);
    name.extend(album.chars().map(|c| if is_token_char(c) { c } else { '_' }));
    name
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Browser-session cookie for a freshly established session.
pub fn session_cookie(name: &str, sid: &str, path: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), sid.to_string()))
        .path(path.to_string())
        .http_only(true)
        .build()
}

/// 401 with the Basic challenge.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [
            (header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE)),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
        ],
        Body::from("Not Authorized\n"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn guarded() -> Gateway {
        Gateway::for_album(&PublishedAlbum::new("secret").with_credentials("u", "p"))
    }

    fn jar_with(name: &str, value: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {name}={value}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn open_gateway_grants_everything() {
        let gateway = Gateway::for_album(&PublishedAlbum::new("open"));
        assert_eq!(gateway, Gateway::Open);
        let sessions = SessionSet::new();
        assert_eq!(
            gateway.admit(&sessions, "x", &CookieJar::new(), None),
            Admission::Granted
        );
        assert!(sessions.is_empty());
    }

    #[test]
    fn missing_or_wrong_credentials_are_denied() {
        let gateway = guarded();
        let sessions = SessionSet::new();
        let name = cookie_name("secret");
        assert_eq!(
            gateway.admit(&sessions, &name, &CookieJar::new(), None),
            Admission::Denied
        );

        let wrong = Authorization::basic("u", "wrong");
        assert_eq!(
            gateway.admit(&sessions, &name, &CookieJar::new(), Some(&wrong)),
            Admission::Denied
        );
    }

    #[test]
    fn matching_credentials_establish_a_session() {
        let gateway = guarded();
        let sessions = SessionSet::new();
        let name = cookie_name("secret");
        let login = Authorization::basic("u", "p");

        let Admission::Established(sid) =
            gateway.admit(&sessions, &name, &CookieJar::new(), Some(&login))
        else {
            panic!("expected a new session");
        };
        assert!(sessions.contains(&sid));

        let jar = jar_with(&name, &sid);
        assert_eq!(gateway.admit(&sessions, &name, &jar, None), Admission::Granted);
    }

    #[test]
    fn unknown_session_cookie_falls_back_to_basic_auth() {
        let gateway = guarded();
        let name = cookie_name("secret");
        let jar = jar_with(&name, "forged");
        assert_eq!(
            gateway.admit(&SessionSet::new(), &name, &jar, None),
            Admission::Denied
        );
    }

    #[test]
    fn username_only_album_is_guarded() {
        let gateway = Gateway::for_album(&PublishedAlbum::new("a").with_credentials("u", ""));
        let login = Authorization::basic("u", "");
        assert!(matches!(
            gateway.admit(&SessionSet::new(), "c", &CookieJar::new(), Some(&login)),
            Admission::Established(_)
        ));
    }

    #[test]
    fn cookie_names_are_deterministic_and_valid() {
        assert_eq!(cookie_name("cats"), "session-a2bb9-cats");
        assert_eq!(cookie_name("summer 2024"), "session-a2bb9-summer_2024");
        assert_eq!(cookie_name("Ünïcode"), "session-a2bb9-_n_code");
    }

    #[test]
    fn session_cookie_is_scoped_and_has_no_max_age() {
        let cookie = session_cookie("session-a2bb9-cats", "abc", "/b/cats");
        assert_eq!(cookie.name(), "session-a2bb9-cats");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/b/cats"));
        assert_eq!(cookie.http_only(), Some(true));
        assert!(cookie.max_age().is_none());
        assert!(cookie.expires().is_none());
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = unauthorized();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], CHALLENGE);
    }
}
