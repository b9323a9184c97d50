//! Reconciliation watcher.
//!
//! Runs forever on its own thread. Every pass:
//!
//! ```text
//! 1. scan      root/        →  albums, images, existing thumbnails, sidecars
//! 2. thumbnail missing ones →  <base>_thumb.<ext> next to the source
//! 3. generate  index pages  →  <album>/index.html (only when changed)
//! 4. publish   albums with images → serving layer (blocks while one is pending)
//! 5. sleep     interval
//! ```
//!
//! The filesystem is the source of truth: the scan result is rebuilt from
//! scratch each pass and dropped afterwards. The only thing carried between
//! passes is the last good sidecar per album, used when a sidecar exists but
//! cannot be read in a given pass.
//!
//! A pass whose root scan fails publishes nothing, so the serving layer keeps
//! its current albums and sessions until a later pass succeeds.
//!
//! An existing thumbnail file is never regenerated, even when it is still inside
//! its settle window and therefore not yet attributed to its image; the next
//! pass picks it up. Thumbnails are generated in parallel with rayon.

use crate::generate;
use crate::handoff::{HandoffClosed, PublishedAlbum, Publisher};
use crate::imaging::{self, ImageBackend, ThumbnailConfig};
use crate::naming;
use crate::scan::{self, ConfigMemory, Scan, ScanError, ScanOptions, SettlePolicy, Thumbnail};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

/// Settings for the watcher loop.
#[derive(Debug, Clone)]
pub struct WatcherSettings {
    /// Normalized URL prefix (`""` or `/x`).
    pub url_prefix: String,
    pub interval: Duration,
    pub settle: SettlePolicy,
    pub thumbnails: ThumbnailConfig,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            url_prefix: String::new(),
            interval: Duration::from_secs(10),
            settle: SettlePolicy::default(),
            thumbnails: ThumbnailConfig::default(),
        }
    }
}

/// Counters for one pass, logged at the end of it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub albums: usize,
    pub images: usize,
    pub thumbnails_generated: usize,
    pub thumbnails_failed: usize,
    pub indexes_written: usize,
}

pub struct Watcher<B: ImageBackend> {
    root: PathBuf,
    settings: WatcherSettings,
    backend: B,
    configs: ConfigMemory,
}

impl<B: ImageBackend> Watcher<B> {
    pub fn new(root: impl Into<PathBuf>, settings: WatcherSettings, backend: B) -> Self {
        Self {
            root: root.into(),
            settings,
            backend,
            configs: ConfigMemory::new(),
        }
    }

    /// Run passes forever, publishing after each one.
    ///
    /// Returns only when the subscriber has gone away.
    pub fn run(mut self, publisher: Publisher) -> HandoffClosed {
        info!(root = %self.root.display(), interval = ?self.settings.interval, "watcher started");
        loop {
            if let Err(closed) = self.pass_at(SystemTime::now(), &publisher) {
                error!("album subscriber closed, stopping watcher");
                return closed;
            }
            std::thread::sleep(self.settings.interval);
        }
    }

    /// Reconcile once and publish the result, unless the root could not be scanned.
    pub fn pass_at(&mut self, now: SystemTime, publisher: &Publisher) -> Result<(), HandoffClosed> {
        match self.reconcile_at(now) {
            Ok((albums, _)) => publisher.publish(albums),
            Err(e) => {
                warn!(error = %e, "reconciliation pass skipped, keeping last publication");
                Ok(())
            }
        }
    }

    /// One full pass at the current time.
    pub fn reconcile(&mut self) -> Result<(Vec<PublishedAlbum>, PassSummary), ScanError> {
        self.reconcile_at(SystemTime::now())
    }

    /// One full pass using `now` for settle-window checks.
    pub fn reconcile_at(
        &mut self,
        now: SystemTime,
    ) -> Result<(Vec<PublishedAlbum>, PassSummary), ScanError> {
        let options = ScanOptions {
            url_prefix: self.settings.url_prefix.clone(),
            settle: self.settings.settle,
            now,
        };
        let mut scan = scan::scan(&self.root, &options, &self.backend, &mut self.configs)?;

        let mut summary = PassSummary {
            albums: scan.albums.len(),
            images: scan.albums.values().map(|a| a.images.len()).sum(),
            ..PassSummary::default()
        };
        self.ensure_thumbnails(&mut scan, &mut summary);
        self.write_indexes(&scan, &mut summary);
        let published = publishable(&scan);

        info!(
            albums = summary.albums,
            published = published.len(),
            images = summary.images,
            thumbnails = summary.thumbnails_generated,
            failed = summary.thumbnails_failed,
            indexes = summary.indexes_written,
            "reconciliation pass complete"
        );
        Ok((published, summary))
    }

    fn ensure_thumbnails(&self, scan: &mut Scan, summary: &mut PassSummary) {
        let mut missing = Vec::new();
        for album in scan.albums.values() {
            for image in album.images.values().filter(|i| i.thumbnail.is_none()) {
                let source = album.dir.join(&image.file_name);
                match imaging::thumbnail_path(&source) {
                    Ok(target) if target.exists() => {
                        debug!(album = %album.name, file = %image.file_name, "thumbnail exists but is not settled yet");
                    }
                    Ok(_) => missing.push((album.name.clone(), image.file_name.clone(), source)),
                    Err(e) => warn!(album = %album.name, file = %image.file_name, error = %e, "cannot derive thumbnail name"),
                }
            }
        }

        let config = self.settings.thumbnails;
        let results: Vec<_> = missing
            .into_par_iter()
            .map(|(album, file, source)| {
                let result = imaging::create_thumbnail(&self.backend, &source, &config);
                (album, file, result)
            })
            .collect();

        for (album_name, file, result) in results {
            match result {
                Ok(thumb_name) => {
                    info!(album = %album_name, file = %file, thumbnail = %thumb_name, "generated thumbnail");
                    let path = naming::serving_path(&self.settings.url_prefix, &album_name, &thumb_name);
                    if let Some(image) = scan
                        .albums
                        .get_mut(&album_name)
                        .and_then(|a| a.images.get_mut(&file))
                    {
                        image.thumbnail = Some(Thumbnail {
                            file_name: thumb_name,
                            path,
                        });
                    }
                    summary.thumbnails_generated += 1;
                }
                Err(e) => {
                    warn!(album = %album_name, file = %file, error = %e, "failed to generate thumbnail");
                    summary.thumbnails_failed += 1;
                }
            }
        }
    }

    fn write_indexes(&self, scan: &Scan, summary: &mut PassSummary) {
        for album in scan.albums.values() {
            match generate::write_album_index(album, &self.settings.url_prefix) {
                Ok(true) => {
                    debug!(album = %album.name, "wrote index page");
                    summary.indexes_written += 1;
                }
                Ok(false) => {}
                Err(e) => warn!(album = %album.name, error = %e, "failed to write index page"),
            }
        }
    }
}

/// Albums with at least one image, in name order.
fn publishable(scan: &Scan) -> Vec<PublishedAlbum> {
    scan.albums
        .values()
        .filter(|a| !a.images.is_empty())
        .map(|a| PublishedAlbum::new(&a.name).with_credentials(&a.config.user, &a.config.pass))
        .collect()
}
