//! Image processing: the thumbnailer.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Thumbnail** | Lanczos3 resize (bounded or fill + center crop) → JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining naming + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{bounded_dimensions, center_crop_origin, fill_dimensions};
pub use operations::{ThumbnailConfig, create_thumbnail, get_dimensions, thumbnail_path};
pub use params::{Quality, ThumbnailFit, ThumbnailParams};
pub use rust_backend::RustBackend;
