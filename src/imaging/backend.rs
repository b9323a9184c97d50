//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations reconciliation needs:
//! identify (header-only dimensions) and thumbnail (decode, resize, encode, write).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` in this module's test submodule.

use super::params::ThumbnailParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by rayon workers during a pass.
pub trait ImageBackend: Sync {
    /// Get image dimensions from the file header, without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, resize it, and write the result to `params.output`.
    ///
    /// Implementations must not touch `params.output` unless encoding succeeded.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
