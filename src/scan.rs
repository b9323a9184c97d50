//! One reconciliation scan of the album root.
//!
//! Reads the root directory and produces a [`Scan`]: every album with its
//! settled images, the thumbnails already present for them, and the effective
//! per-album configuration. Nothing is written here; thumbnail generation and
//! index pages are driven by the [`watcher`](crate::watcher) from the result.
//!
//! ## Directory Structure
//!
//! ```text
//! bilder/                      # Root
//! ├── cats/                    # Album (directory name = identity)
//! │   ├── bilder.json          # Sidecar: title, captions, credentials (optional)
//! │   ├── a.jpg                # Image
//! │   ├── a_thumb.jpg          # Generated thumbnail of a.jpg
//! │   └── index.html           # Generated index page
//! └── notes.txt                # Not a directory: ignored
//! ```
//!
//! ## Ordering
//!
//! Album contents are listed sorted by file name. Because `.` sorts before `_`,
//! `x.jpg` is always seen before `x_thumb.jpg`, so a thumbnail is only ever
//! matched against images already registered in the same scan. A thumbnail
//! without its source image is reported and dropped.
//!
//! ## Settle Windows
//!
//! Files that are empty or were modified too recently are skipped for this scan
//! so that uploads still in progress are never decoded: 10 seconds for images
//! and thumbnails, 200 milliseconds for the sidecar. They are picked up by a
//! later scan once they are old enough.
//!
//! ## Failure Isolation
//!
//! Errors reading an album directory or a single file are logged and only skip
//! that unit. The only error returned is failure to list the root itself.

use crate::album_config::{self, DirConfig};
use crate::imaging::{self, ImageBackend};
use crate::naming::{self, EntryKind};
use std::collections::{BTreeMap, HashMap};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read root {0}: {1}")]
    Root(PathBuf, walkdir::Error),
}

/// Minimum file ages before a file takes part in a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub image: Duration,
    pub sidecar: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            image: Duration::from_secs(10),
            sidecar: Duration::from_millis(200),
        }
    }
}

/// Options for a single scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Normalized URL prefix (`""` or `/x`), used to build serving paths.
    pub url_prefix: String,
    pub settle: SettlePolicy,
    /// Reference time for settle-window checks.
    pub now: SystemTime,
}

/// A generated thumbnail attached to an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub file_name: String,
    /// URL path the thumbnail is served under.
    pub path: String,
}

/// Image metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub file_name: String,
    /// Pixel dimensions; `0 × 0` when the header could not be decoded.
    pub width: u32,
    pub height: u32,
    pub caption: String,
    /// URL path the image is served under.
    pub path: String,
    pub thumbnail: Option<Thumbnail>,
}

impl Image {
    /// Whether the header was decoded successfully.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Album with its images
#[derive(Debug, Clone)]
pub struct Album {
    pub name: String,
    pub dir: PathBuf,
    pub config: DirConfig,
    /// Images by file name.
    pub images: BTreeMap<String, Image>,
}

impl Album {
    pub fn title(&self) -> &str {
        self.config.title_or(&self.name)
    }
}

/// Result of a scan: albums by directory name.
#[derive(Debug, Default)]
pub struct Scan {
    pub albums: BTreeMap<String, Album>,
}

/// Last successfully parsed sidecar per album.
///
/// Used only when a sidecar exists but cannot be used in this scan (unsettled,
/// unreadable or malformed). An album without a sidecar always gets defaults.
pub type ConfigMemory = HashMap<String, DirConfig>;

/// A settled-or-not directory entry.
struct Entry {
    name: String,
    path: PathBuf,
    metadata: Metadata,
}

impl Entry {
    /// Non-directory, non-empty, and last modified at least `window` before `now`.
    fn is_settled(&self, window: Duration, now: SystemTime) -> bool {
        if self.metadata.is_dir() || self.metadata.len() == 0 {
            return false;
        }
        let Ok(modified) = self.metadata.modified() else {
            return false;
        };
        now.duration_since(modified).is_ok_and(|age| age >= window)
    }
}

/// List the immediate children of `dir`, sorted by file name.
///
/// Failing to open `dir` itself is an error; an unreadable child (e.g. a
/// dangling symlink) is logged and left out.
fn list_sorted(dir: &Path) -> Result<Vec<Entry>, walkdir::Error> {
    let mut entries = Vec::new();
    let walk = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        match entry.metadata() {
            Ok(metadata) => entries.push(Entry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.into_path(),
                metadata,
            }),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping unreadable entry"),
        }
    }
    Ok(entries)
}

pub fn scan(
    root: &Path,
    options: &ScanOptions,
    backend: &impl ImageBackend,
    configs: &mut ConfigMemory,
) -> Result<Scan, ScanError> {
    let entries = list_sorted(root).map_err(|e| ScanError::Root(root.to_path_buf(), e))?;

    let mut albums = BTreeMap::new();
    for entry in entries.into_iter().filter(|e| e.metadata.is_dir()) {
        match list_sorted(&entry.path) {
            Ok(files) => {
                let album = scan_album(&entry.name, &entry.path, &files, options, backend, configs);
                albums.insert(entry.name, album);
            }
            Err(e) => {
                warn!(album = %entry.name, error = %e, "failed to read album directory");
            }
        }
    }

    configs.retain(|name, _| albums.contains_key(name));
    Ok(Scan { albums })
}

fn scan_album(
    name: &str,
    dir: &Path,
    files: &[Entry],
    options: &ScanOptions,
    backend: &impl ImageBackend,
    configs: &mut ConfigMemory,
) -> Album {
    let config = resolve_config(name, files, options, configs);
    let images = collect_images(name, files, &config, options, backend);
    Album {
        name: name.to_string(),
        dir: dir.to_path_buf(),
        config,
        images,
    }
}

/// First sub-pass: find and parse the sidecar.
fn resolve_config(
    album: &str,
    files: &[Entry],
    options: &ScanOptions,
    configs: &mut ConfigMemory,
) -> DirConfig {
    let Some(sidecar) = files
        .iter()
        .find(|f| naming::classify(&f.name) == EntryKind::Sidecar)
    else {
        configs.remove(album);
        return DirConfig::default();
    };

    if !sidecar.is_settled(options.settle.sidecar, options.now) {
        debug!(album, file = %sidecar.name, "sidecar not settled, keeping previous config");
        return configs.get(album).cloned().unwrap_or_default();
    }

    match album_config::load(&sidecar.path) {
        Ok(config) => {
            configs.insert(album.to_string(), config.clone());
            config
        }
        Err(e) => {
            warn!(album, file = %sidecar.name, error = %e, "failed to load album config");
            configs.get(album).cloned().unwrap_or_default()
        }
    }
}

/// Second sub-pass: classify settled files into images and thumbnails.
fn collect_images(
    album: &str,
    files: &[Entry],
    config: &DirConfig,
    options: &ScanOptions,
    backend: &impl ImageBackend,
) -> BTreeMap<String, Image> {
    let mut images: BTreeMap<String, Image> = BTreeMap::new();

    for file in files {
        let kind = naming::classify(&file.name);
        if !matches!(kind, EntryKind::Image | EntryKind::Thumbnail { .. }) {
            continue;
        }
        if !file.is_settled(options.settle.image, options.now) {
            debug!(album, file = %file.name, "skipping unsettled file");
            continue;
        }

        match kind {
            EntryKind::Thumbnail { source } => match images.get_mut(&source) {
                Some(image) => {
                    image.thumbnail = Some(Thumbnail {
                        file_name: file.name.clone(),
                        path: naming::serving_path(&options.url_prefix, album, &file.name),
                    });
                }
                None => warn!(album, file = %file.name, "unexpected thumbnail without source image"),
            },
            EntryKind::Image => {
                let (width, height) = match imaging::get_dimensions(backend, &file.path) {
                    Ok(dims) => dims,
                    Err(e) => {
                        warn!(album, file = %file.name, error = %e, "failed to read image dimensions");
                        (0, 0)
                    }
                };
                images.insert(
                    file.name.clone(),
                    Image {
                        file_name: file.name.clone(),
                        width,
                        height,
                        caption: config.caption(&file.name).to_string(),
                        path: naming::serving_path(&options.url_prefix, album, &file.name),
                        thumbnail: None,
                    },
                );
            }
            EntryKind::Sidecar | EntryKind::Other => {}
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{album_dir, later, write_jpeg};
    use std::fs;
    use tempfile::TempDir;

    fn options(now: SystemTime) -> ScanOptions {
        ScanOptions {
            url_prefix: String::new(),
            settle: SettlePolicy::default(),
            now,
        }
    }

    fn scan_later(root: &Path) -> Scan {
        scan(root, &options(later()), &RustBackend::new(), &mut ConfigMemory::new()).unwrap()
    }

    #[test]
    fn finds_albums_and_images() {
        let tmp = TempDir::new().unwrap();
        let cats = album_dir(tmp.path(), "cats");
        write_jpeg(&cats.join("a.jpg"), 300, 200);
        write_jpeg(&cats.join("b.JPEG"), 20, 40);
        fs::write(tmp.path().join("loose.jpg"), b"not an album").unwrap();

        let result = scan_later(tmp.path());

        assert_eq!(result.albums.len(), 1);
        let album = &result.albums["cats"];
        assert_eq!(album.title(), "cats");
        let a = &album.images["a.jpg"];
        assert_eq!((a.width, a.height), (300, 200));
        assert_eq!(a.path, "/b/cats/a.jpg");
        assert!(a.thumbnail.is_none());
        assert!(album.images.contains_key("b.JPEG"));
    }

    #[test]
    fn matches_existing_thumbnail_preserving_case() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "trip");
        write_jpeg(&dir.join("photo.JPG"), 50, 50);
        write_jpeg(&dir.join("photo_thumb.JPG"), 20, 20);

        let result = scan_later(tmp.path());

        let album = &result.albums["trip"];
        assert_eq!(album.images.len(), 1);
        let thumb = album.images["photo.JPG"].thumbnail.as_ref().unwrap();
        assert_eq!(thumb.file_name, "photo_thumb.JPG");
        assert_eq!(thumb.path, "/b/trip/photo_thumb.JPG");
    }

    #[test]
    fn orphan_thumbnail_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "haunted");
        write_jpeg(&dir.join("ghost_thumb.jpg"), 20, 20);
        write_jpeg(&dir.join("real.jpg"), 20, 20);

        let result = scan_later(tmp.path());

        let album = &result.albums["haunted"];
        assert_eq!(album.images.keys().collect::<Vec<_>>(), ["real.jpg"]);
        assert!(album.images["real.jpg"].thumbnail.is_none());
    }

    #[test]
    fn unsettled_files_are_skipped_until_old_enough() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "fresh");
        write_jpeg(&dir.join("new.jpg"), 20, 20);

        let now = SystemTime::now();
        let backend = RustBackend::new();
        let mut memory = ConfigMemory::new();
        let early_opts = options(now + Duration::from_secs(2));
        let early = scan(tmp.path(), &early_opts, &backend, &mut memory).unwrap();
        assert!(early.albums["fresh"].images.is_empty());

        let settled_opts = options(now + Duration::from_secs(11));
        let settled = scan(tmp.path(), &settled_opts, &backend, &mut memory).unwrap();
        assert!(settled.albums["fresh"].images.contains_key("new.jpg"));
    }

    #[test]
    fn empty_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "empty");
        fs::write(dir.join("zero.jpg"), b"").unwrap();

        let result = scan_later(tmp.path());
        assert!(result.albums["empty"].images.is_empty());
    }

    #[test]
    fn undecodable_image_recorded_with_zero_dimensions() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "broken");
        fs::write(dir.join("bad.jpg"), b"garbage bytes").unwrap();

        let result = scan_later(tmp.path());
        let bad = &result.albums["broken"].images["bad.jpg"];
        assert_eq!((bad.width, bad.height), (0, 0));
        assert!(!bad.has_dimensions());
    }

    #[test]
    fn sidecar_supplies_title_captions_and_credentials() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        write_jpeg(&dir.join("a.jpg"), 30, 20);
        fs::write(
            dir.join("Bilder.json"),
            r#"{"Title":"Cats!","Captions":{"a.jpg":"hi"},"User":"u","Pass":"p"}"#,
        )
        .unwrap();

        let result = scan_later(tmp.path());
        let album = &result.albums["cats"];
        assert_eq!(album.title(), "Cats!");
        assert_eq!(album.config.user, "u");
        assert_eq!(album.images["a.jpg"].caption, "hi");
    }

    #[test]
    fn malformed_sidecar_keeps_previous_config() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        write_jpeg(&dir.join("a.jpg"), 30, 20);
        fs::write(dir.join("bilder.json"), r#"{"Title":"Good"}"#).unwrap();

        let mut memory = ConfigMemory::new();
        let backend = RustBackend::new();
        let first = scan(tmp.path(), &options(later()), &backend, &mut memory).unwrap();
        assert_eq!(first.albums["cats"].title(), "Good");

        fs::write(dir.join("bilder.json"), r#"{"Title":"#).unwrap();
        let second = scan(tmp.path(), &options(later()), &backend, &mut memory).unwrap();
        assert_eq!(second.albums["cats"].title(), "Good");
    }

    #[test]
    fn rewritten_sidecar_waits_for_its_settle_window() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        write_jpeg(&dir.join("a.jpg"), 30, 20);
        let sidecar = dir.join("bilder.json");
        fs::write(&sidecar, r#"{"Title":"Good"}"#).unwrap();

        let mut memory = ConfigMemory::new();
        let backend = RustBackend::new();
        scan(tmp.path(), &options(later()), &backend, &mut memory).unwrap();

        fs::write(&sidecar, r#"{"Title":"New"}"#).unwrap();
        let written = fs::metadata(&sidecar).unwrap().modified().unwrap();

        let early = options(written + Duration::from_millis(50));
        let result = scan(tmp.path(), &early, &backend, &mut memory).unwrap();
        assert_eq!(result.albums["cats"].title(), "Good");

        let settled = options(written + Duration::from_millis(300));
        let result = scan(tmp.path(), &settled, &backend, &mut memory).unwrap();
        assert_eq!(result.albums["cats"].title(), "New");
    }

    #[test]
    fn malformed_sidecar_without_history_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        write_jpeg(&dir.join("a.jpg"), 30, 20);
        fs::write(dir.join("bilder.json"), "not json").unwrap();

        let result = scan_later(tmp.path());
        assert_eq!(result.albums["cats"].title(), "cats");
        assert_eq!(result.albums["cats"].images.len(), 1);
    }

    #[test]
    fn removed_sidecar_resets_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        write_jpeg(&dir.join("a.jpg"), 30, 20);
        fs::write(dir.join("bilder.json"), r#"{"Title":"Old"}"#).unwrap();

        let mut memory = ConfigMemory::new();
        let backend = RustBackend::new();
        scan(tmp.path(), &options(later()), &backend, &mut memory).unwrap();

        fs::remove_file(dir.join("bilder.json")).unwrap();
        let result = scan(tmp.path(), &options(later()), &backend, &mut memory).unwrap();
        assert_eq!(result.albums["cats"].title(), "cats");
        assert!(memory.is_empty());
    }

    #[test]
    fn serving_paths_include_prefix() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        write_jpeg(&dir.join("a.jpg"), 30, 20);

        let mut opts = options(later());
        opts.url_prefix = "/pics".into();
        let result = scan(tmp.path(), &opts, &RustBackend::new(), &mut ConfigMemory::new()).unwrap();
        assert_eq!(result.albums["cats"].images["a.jpg"].path, "/pics/b/cats/a.jpg");
    }

    #[test]
    fn identify_runs_only_for_settled_images() {
        let tmp = TempDir::new().unwrap();
        let dir = album_dir(tmp.path(), "cats");
        fs::write(dir.join("a.jpg"), b"x").unwrap();
        fs::write(dir.join("a_thumb.jpg"), b"x").unwrap();
        fs::write(dir.join("index.html"), b"<html>").unwrap();
        let backend = MockBackend::with_dimensions(&[("a.jpg", 10, 10)]);

        scan(tmp.path(), &options(later()), &backend, &mut ConfigMemory::new()).unwrap();
        assert_eq!(backend.get_operations().len(), 1);

        let fresh = MockBackend::with_dimensions(&[("a.jpg", 10, 10)]);
        scan(tmp.path(), &options(SystemTime::now()), &fresh, &mut ConfigMemory::new()).unwrap();
        assert!(fresh.get_operations().is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            scan(&missing, &options(later()), &RustBackend::new(), &mut ConfigMemory::new()),
            Err(ScanError::Root(..))
        ));
    }
}
