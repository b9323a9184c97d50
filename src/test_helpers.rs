//! Shared test utilities for the bilder test suite.
//!
//! Fixtures are built on the fly inside a `TempDir`: album directories, real
//! JPEGs encoded by the `image` crate, and a clock far enough in the future that
//! every freshly written file counts as settled.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let cats = album_dir(tmp.path(), "cats");
//! write_jpeg(&cats.join("a.jpg"), 300, 200);
//! // scan with `now: later()` sees a.jpg as settled
//! ```

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Create (if needed) and return `root/<name>`.
pub fn album_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Encode a `width × height` gradient as JPEG at `path`.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap_or_else(|e| panic!("failed to write fixture {}: {e}", path.display()));
}

/// A reference time past every settle window for files written just now.
pub fn later() -> SystemTime {
    SystemTime::now() + Duration::from_secs(60)
}
