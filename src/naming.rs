//! File classification for album directories.
//!
//! Every entry in an album directory falls into exactly one of these kinds:
//!
//! - **Thumbnail**: `<base>_thumb.<ext>` where `<ext>` is `jpg` or `jpeg` in any case.
//!   `photo_thumb.JPG` is the thumbnail of `photo.JPG`.
//! - **Image**: any other `<base>.<ext>` with a JPEG extension.
//! - **Sidecar**: the per-album `bilder.json` (case-insensitive).
//! - **Other**: everything else (including the generated `index.html`).
//!
//! The thumbnail pattern is tested first, so `x_thumb.jpg` is never an image.
//! Extensions keep their original case when a thumbnail name is derived, which
//! makes the convention reversible: [`thumbnail_name`] and [`classify`] agree.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped in a URL path segment.
pub const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Name of the per-album configuration sidecar.
pub const SIDECAR_NAME: &str = "bilder.json";

/// Name of the generated per-album index page.
pub const INDEX_NAME: &str = "index.html";

const THUMB_SUFFIX: &str = "_thumb";

/// Kind of an album directory entry, see the [module docs](self).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A thumbnail; carries the file name of the image it belongs to.
    Thumbnail { source: String },
    Image,
    Sidecar,
    Other,
}

/// Split `name` into `(base, ext)` when it carries a JPEG extension.
///
/// The base must be non-empty: `.jpg` alone is not an image.
fn split_jpeg(name: &str) -> Option<(&str, &str)> {
    let (base, ext) = name.rsplit_once('.')?;
    if base.is_empty() {
        return None;
    }
    if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
        Some((base, ext))
    } else {
        None
    }
}

/// Strip a case-insensitive `_thumb` suffix from `base`.
fn strip_thumb_suffix(base: &str) -> Option<&str> {
    let split = base.len().checked_sub(THUMB_SUFFIX.len())?;
    if !base.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = base.split_at(split);
    (!stem.is_empty() && suffix.eq_ignore_ascii_case(THUMB_SUFFIX)).then_some(stem)
}

/// Classify a file name found in an album directory.
pub fn classify(name: &str) -> EntryKind {
    if name.eq_ignore_ascii_case(SIDECAR_NAME) {
        return EntryKind::Sidecar;
    }
    match split_jpeg(name) {
        Some((base, ext)) => match strip_thumb_suffix(base) {
            Some(stem) => EntryKind::Thumbnail {
                source: format!("{stem}.{ext}"),
            },
            None => EntryKind::Image,
        },
        None => EntryKind::Other,
    }
}

/// Derive the thumbnail file name for an image, preserving extension case.
///
/// Returns `None` when `image` is not a JPEG file name.
///
/// - `"photo.JPG"` → `"photo_thumb.JPG"`
/// - `"a.b.jpeg"` → `"a.b_thumb.jpeg"`
pub fn thumbnail_name(image: &str) -> Option<String> {
    let (base, ext) = split_jpeg(image)?;
    Some(format!("{base}{THUMB_SUFFIX}.{ext}"))
}

/// Absolute URL path under which an album file is served.
///
/// `prefix` is either empty or a normalized `/segment` path without trailing
/// slash. Album and file names are percent-encoded.
pub fn serving_path(prefix: &str, album: &str, file: &str) -> String {
    format!(
        "{prefix}/b/{}/{}",
        utf8_percent_encode(album, PATH_SEGMENT),
        utf8_percent_encode(file, PATH_SEGMENT)
    )
}
