//! Album Registry: the live name → handler snapshot.
//!
//! Readers clone the current `Arc` under a read lock and work on that snapshot
//! without holding any lock. A publication builds a complete new table outside
//! the lock and swaps it in, so a request sees either the old table or the new
//! one, never a mix. Writers are serialized by a separate mutex.
//!
//! Session sets follow the album name across rebuilds: an album that stays
//! published keeps its sessions, even through passes where it has no
//! credentials; one that disappears loses them.

use super::album::AlbumHandler;
use super::sessions::SessionSet;
use crate::handoff::{PublishedAlbum, Subscription};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub type AlbumTable = HashMap<String, Arc<AlbumHandler>>;

#[derive(Debug)]
pub struct AlbumRegistry {
    root: PathBuf,
    url_prefix: String,
    current: RwLock<Arc<AlbumTable>>,
    update: Mutex<()>,
}

impl AlbumRegistry {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
            current: RwLock::new(Arc::new(AlbumTable::new())),
            update: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<AlbumTable> {
        self.current.read().clone()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<AlbumHandler>> {
        self.current.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the snapshot with handlers for `albums`.
    pub fn apply(&self, albums: &[PublishedAlbum]) {
        let _writer = self.update.lock();
        let previous = self.snapshot();

        let table: AlbumTable = albums
            .iter()
            .map(|album| {
                let sessions = previous
                    .get(&album.name)
                    .map(|h| h.sessions().clone())
                    .unwrap_or_else(|| Arc::new(SessionSet::new()));
                let handler = AlbumHandler::new(&self.root, &self.url_prefix, album, sessions);
                (album.name.clone(), Arc::new(handler))
            })
            .collect();

        let added = table.keys().filter(|k| !previous.contains_key(*k)).count();
        let removed = previous.keys().filter(|k| !table.contains_key(*k)).count();
        let total = table.len();

        *self.current.write() = Arc::new(table);

        if added > 0 || removed > 0 {
            info!(albums = total, added, removed, "album registry updated");
        } else {
            debug!(albums = total, "album registry refreshed");
        }
    }

    /// Apply publications until the watcher goes away.
    pub async fn listen_for_updates(self: Arc<Self>, mut updates: Subscription) {
        while let Some(albums) = updates.next().await {
            self.apply(&albums);
        }
        info!("album publisher closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::auth::Gateway;

    fn registry() -> AlbumRegistry {
        AlbumRegistry::new("/srv/bilder", "")
    }

    #[test]
    fn lookup_follows_latest_publication() {
        let registry = registry();
        assert!(registry.is_empty());

        registry.apply(&[PublishedAlbum::new("cats"), PublishedAlbum::new("dogs")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.lookup("cats").unwrap().dir(),
            std::path::Path::new("/srv/bilder/cats")
        );

        registry.apply(&[PublishedAlbum::new("dogs")]);
        assert!(registry.lookup("cats").is_none());
        assert!(registry.lookup("dogs").is_some());
    }

    fn login(registry: &AlbumRegistry, name: &str) -> String {
        registry.lookup(name).unwrap().sessions().create()
    }

    #[test]
    fn sessions_survive_republication() {
        let registry = registry();
        let secret = PublishedAlbum::new("secret").with_credentials("u", "p");
        registry.apply(&[secret.clone()]);
        let sid = login(&registry, "secret");

        registry.apply(&[secret.clone(), PublishedAlbum::new("other")]);
        assert!(registry.lookup("secret").unwrap().sessions().contains(&sid));
    }

    #[test]
    fn sessions_are_dropped_with_the_album() {
        let registry = registry();
        let secret = PublishedAlbum::new("secret").with_credentials("u", "p");
        registry.apply(&[secret.clone()]);
        let sid = login(&registry, "secret");

        registry.apply(&[]);
        registry.apply(&[secret]);
        assert!(!registry.lookup("secret").unwrap().sessions().contains(&sid));
    }

    #[test]
    fn credentials_can_be_removed() {
        let registry = registry();
        registry.apply(&[PublishedAlbum::new("a").with_credentials("u", "p")]);
        registry.apply(&[PublishedAlbum::new("a")]);
        assert!(matches!(registry.lookup("a").unwrap().gateway(), Gateway::Open));
    }

    #[test]
    fn sessions_survive_a_pass_without_credentials() {
        let registry = registry();
        let guarded = PublishedAlbum::new("a").with_credentials("u", "p");
        registry.apply(&[guarded.clone()]);
        let sid = login(&registry, "a");

        registry.apply(&[PublishedAlbum::new("a")]);
        assert_eq!(*registry.lookup("a").unwrap().gateway(), Gateway::Open);

        registry.apply(&[guarded]);
        let handler = registry.lookup("a").unwrap();
        assert!(matches!(handler.gateway(), Gateway::Basic { .. }));
        assert!(handler.sessions().contains(&sid));
    }

    #[test]
    fn readers_never_see_a_partial_table() {
        let registry = Arc::new(registry());
        let full: Vec<PublishedAlbum> = (0..50).map(|i| PublishedAlbum::new(format!("a{i}"))).collect();

        let writer = {
            let registry = registry.clone();
            let full = full.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    registry.apply(&full);
                    registry.apply(&[]);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        let len = registry.snapshot().len();
                        assert!(len == 0 || len == 50, "saw partial table of {len}");
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[tokio::test]
    async fn listener_applies_publications() {
        let registry = Arc::new(registry());
        let (publisher, subscription) = crate::handoff::channel();
        let listener = tokio::spawn(registry.clone().listen_for_updates(subscription));

        std::thread::spawn(move || {
            publisher.publish(vec![PublishedAlbum::new("cats")]).unwrap();
        })
        .join()
        .unwrap();

        listener.await.unwrap();
        assert!(registry.lookup("cats").is_some());
    }
}
