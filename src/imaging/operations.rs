//! High-level image operations.
//!
//! These functions combine the naming convention with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, ThumbnailFit, ThumbnailParams};
use crate::naming;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub edge: u32,
    pub fit: ThumbnailFit,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            edge: 200,
            fit: ThumbnailFit::Bounded,
            quality: Quality::default(),
        }
    }
}

impl From<&crate::config::ThumbnailsConfig> for ThumbnailConfig {
    fn from(config: &crate::config::ThumbnailsConfig) -> Self {
        Self {
            edge: config.size,
            fit: if config.square {
                ThumbnailFit::Square
            } else {
                ThumbnailFit::Bounded
            },
            quality: Quality::new(config.quality),
        }
    }
}

/// Path of the thumbnail that belongs to `source`, next to it on disk.
pub fn thumbnail_path(source: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(naming::thumbnail_name)
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Not a JPEG file name: {}", source.display()))
        })?;
    Ok(source.with_file_name(name))
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(source: &Path, config: &ThumbnailConfig) -> Result<ThumbnailParams> {
    Ok(ThumbnailParams {
        source: source.to_path_buf(),
        output: thumbnail_path(source)?,
        edge: config.edge,
        fit: config.fit,
        quality: config.quality,
    })
}

/// Create the thumbnail for `source` and return its file name.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    config: &ThumbnailConfig,
) -> Result<String> {
    let params = plan_thumbnail(source, config)?;
    backend.thumbnail(&params)?;
    Ok(params
        .output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default())
}
