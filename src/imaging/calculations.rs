//! Pure calculation functions for thumbnail dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `source` so its longer edge is at most `edge`, keeping the aspect ratio.
///
/// Images already inside the box are returned unchanged. The shorter edge never
/// rounds down to zero.
///
/// ```
/// # use bilder::imaging::bounded_dimensions;
/// assert_eq!(bounded_dimensions((300, 200), 200), (200, 133));
/// assert_eq!(bounded_dimensions((150, 100), 200), (150, 100));
/// ```
pub fn bounded_dimensions(source: (u32, u32), edge: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= edge && h <= edge {
        return (w, h);
    }
    if w >= h {
        let scaled = (h as f64 * edge as f64 / w as f64).round() as u32;
        (edge, scaled.max(1))
    } else {
        let scaled = (w as f64 * edge as f64 / h as f64).round() as u32;
        (scaled.max(1), edge)
    }
}

/// Dimensions that cover an `edge × edge` square while keeping the aspect ratio.
///
/// The shorter source edge becomes `edge`; the longer one exceeds it and is
/// cropped away afterwards by [`center_crop_origin`]. Wider images are sized by
/// height, taller ones by width.
pub fn fill_dimensions(source: (u32, u32), edge: u32) -> (u32, u32) {
    let (w, h) = source;
    if w > h {
        let scaled = (w as f64 * edge as f64 / h as f64).round() as u32;
        (scaled.max(edge), edge)
    } else {
        let scaled = (h as f64 * edge as f64 / w as f64).round() as u32;
        (edge, scaled.max(edge))
    }
}

/// Top-left corner of a centered `edge × edge` crop within `size`.
pub fn center_crop_origin(size: (u32, u32), edge: u32) -> (u32, u32) {
    let (w, h) = size;
    (w.saturating_sub(edge) / 2, h.saturating_sub(edge) / 2)
}
