//! Single-slot hand-off from the watcher to the serving layer.
//!
//! After each pass the watcher publishes the albums it found as an owned,
//! read-only `Vec<PublishedAlbum>`. The channel holds at most one pending
//! publication: if the server has not taken the previous one yet, `publish`
//! blocks until it does. The watcher runs on its own OS thread, so blocking is
//! fine there; the server side awaits publications on the tokio runtime.

use thiserror::Error;
use tokio::sync::mpsc;

/// An album as announced to the serving layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAlbum {
    pub name: String,
    pub user: String,
    pub pass: String,
}

impl PublishedAlbum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: String::new(),
            pass: String::new(),
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = user.into();
        self.pass = pass.into();
        self
    }

    /// Albums with either a username or a password configured require auth.
    pub fn has_auth(&self) -> bool {
        !self.user.is_empty() || !self.pass.is_empty()
    }
}

#[derive(Error, Debug)]
#[error("album subscriber is gone")]
pub struct HandoffClosed;

/// Watcher end of the hand-off.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: mpsc::Sender<Vec<PublishedAlbum>>,
}

/// Serving-layer end of the hand-off.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Vec<PublishedAlbum>>,
}

pub fn channel() -> (Publisher, Subscription) {
    let (tx, rx) = mpsc::channel(1);
    (Publisher { tx }, Subscription { rx })
}

impl Publisher {
    /// Publish from a non-async thread, waiting while a publication is pending.
    ///
    /// Must not be called from within a tokio runtime.
    pub fn publish(&self, albums: Vec<PublishedAlbum>) -> Result<(), HandoffClosed> {
        self.tx.blocking_send(albums).map_err(|_| HandoffClosed)
    }
}

impl Subscription {
    /// Next publication, or `None` once the watcher is gone.
    pub async fn next(&mut self) -> Option<Vec<PublishedAlbum>> {
        self.rx.recv().await
    }

    /// Pending publication, if any, without waiting.
    pub fn try_next(&mut self) -> Option<Vec<PublishedAlbum>> {
        self.rx.try_recv().ok()
    }
}
