//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG) | `image` crate JPEG decoder |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Square crop | `image::DynamicImage::crop_imm` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Thumbnails are encoded into memory first, written to a hidden temporary file
//! next to the target and renamed into place, so a failed or interrupted write
//! never leaves a truncated `_thumb` file behind.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{bounded_dimensions, center_crop_origin, fill_dimensions};
use super::params::{ThumbnailFit, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode a JPEG from disk.
fn load_jpeg(path: &Path) -> Result<DynamicImage, BackendError> {
    let file = fs::File::open(path)?;
    ImageReader::with_format(BufReader::new(file), ImageFormat::Jpeg)
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn resize(img: &DynamicImage, edge: u32, fit: ThumbnailFit) -> DynamicImage {
    let source = (img.width(), img.height());
    match fit {
        ThumbnailFit::Bounded => {
            let (w, h) = bounded_dimensions(source, edge);
            if (w, h) == source {
                img.clone()
            } else {
                img.resize_exact(w, h, FilterType::Lanczos3)
            }
        }
        ThumbnailFit::Square => {
            let (w, h) = fill_dimensions(source, edge);
            let filled = img.resize_exact(w, h, FilterType::Lanczos3);
            let (x, y) = center_crop_origin((w, h), edge);
            filled.crop_imm(x, y, edge, edge)
        }
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100) as u8);
    // JPEG has no alpha channel; normalize whatever the decoder produced.
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

fn temp_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.tmp"))
}

/// Write `bytes` to `output` via a temporary sibling and an atomic rename.
fn write_atomically(output: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let tmp = temp_path(output);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, output)) {
        let _ = fs::remove_file(&tmp);
        return Err(BackendError::Io(e));
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_jpeg(&params.source)?;
        let thumb = resize(&img, params.edge, params.fit);
        let bytes = encode_jpeg(&thumb, params.quality.value())?;
        write_atomically(&params.output, &bytes)
    }
}
