//! Album index page generation.
//!
//! Every album gets a static `index.html` next to its images, served as the
//! album's directory index (`/b/<album>/`). The page lists each image as a
//! thumbnail linking to the full-size file, in serving-path order:
//!
//! ```text
//! <figure>
//!   <a href="/b/cats/a.jpg" data-size="300x200">
//!     <img src="/b/cats/a_thumb.jpg" width="200">
//!   </a>
//!   <figcaption>hi&nbsp;</figcaption>
//! </figure>
//! ```
//!
//! The `data-size` attribute feeds the gallery viewer script served from `/a/`.
//! Images whose header could not be decoded are left out until a later pass
//! reads them successfully; images still waiting for a thumbnail link their
//! full-size file in its place.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating with
//! automatic escaping of titles and captions.
//!
//! Pages are only rewritten when their bytes change, so an unchanged album keeps
//! a byte-identical file with a stable modification time.

use crate::naming::INDEX_NAME;
use crate::scan::{Album, Image};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::io;
use std::path::Path;

/// Render the index page for `album`.
///
/// `url_prefix` is the normalized prefix (`""` or `/x`) the asset routes live under.
pub fn render_album_page(album: &Album, url_prefix: &str) -> Markup {
    let mut images: Vec<&Image> = album
        .images
        .values()
        .filter(|img| img.has_dimensions())
        .collect();
    images.sort_by(|a, b| a.path.cmp(&b.path));

    let title = album.title();
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="stylesheet" href={ (url_prefix) "/a/gallery.css" };
                script src={ (url_prefix) "/a/gallery.js" } defer {}
            }
            body {
                h1 { (title) }
                div #gallery-overview .gallery-overview {
                    @for image in &images {
                        (render_figure(image))
                    }
                }
            }
        }
    }
}

fn render_figure(image: &Image) -> Markup {
    let thumb_src = image
        .thumbnail
        .as_ref()
        .map(|t| t.path.as_str())
        .unwrap_or(&image.path);
    html! {
        figure {
            a href=(image.path) data-size={ (image.width) "x" (image.height) } {
                img src=(thumb_src) width="200" alt=(image.caption);
            }
            figcaption { (image.caption) (PreEscaped("&nbsp;")) }
        }
    }
}

/// Write `content` to `path` unless the file already holds exactly these bytes.
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, content: &str) -> io::Result<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => Ok(false),
        _ => {
            fs::write(path, content)?;
            Ok(true)
        }
    }
}

/// Render and write `album`'s `index.html`. Returns whether the file changed.
pub fn write_album_index(album: &Album, url_prefix: &str) -> io::Result<bool> {
    let page = render_album_page(album, url_prefix);
    write_if_changed(&album.dir.join(INDEX_NAME), &page.into_string())
}
