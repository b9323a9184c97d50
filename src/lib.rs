//! # Bilder
//!
//! A small photo album server. Your filesystem is the data source: every
//! directory under the root is an album, every JPEG in it is an image, and an
//! optional `bilder.json` gives the album a title, captions and credentials.
//!
//! # Architecture: Watcher and Server
//!
//! Two halves run side by side and share nothing but a single-slot hand-off:
//!
//! ```text
//!  watcher thread (blocking)                 tokio runtime
//!  ─────────────────────────                 ─────────────
//!  scan root/ ──▶ thumbnails ──▶ index.html
//!        │                                   AlbumRegistry ◀── listen_for_updates
//!        └──▶ publish Vec<PublishedAlbum> ══════════▶│
//!             (blocks while one is pending)          ▼
//!                                            /b/<album>/… ──▶ AuthGateway ──▶ files
//! ```
//!
//! The watcher reconciles the generated artifacts with the images on disk every
//! few seconds. It never keeps a model of the albums between passes: each pass
//! derives everything from the directory tree again, which makes adding,
//! removing or editing albums a plain file operation with no restart.
//!
//! The server owns the [`server::registry::AlbumRegistry`], an atomically
//! swapped name → handler table rebuilt on every publication. Sessions created
//! by the Basic-Auth gateway are carried over to the new table for albums that
//! are still published.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Server configuration: JSON file, CLI overrides, validation |
//! | [`album_config`] | Per-album `bilder.json` sidecar (title, captions, credentials) |
//! | [`naming`] | File classification and the `<base>_thumb.<ext>` convention |
//! | [`imaging`] | Thumbnailer: backend trait, dimension math, `image`-crate backend |
//! | [`scan`] | One pass over the root: albums, settled images, existing thumbnails |
//! | [`generate`] | Index page rendering with Maud, written only when changed |
//! | [`handoff`] | Single-slot publication channel from watcher to server |
//! | [`watcher`] | The reconciliation loop tying scan, thumbnails and pages together |
//! | [`server`] | Router, album registry, auth gateway, assets and access log |
//!
//! # Design Decisions
//!
//! ## Settle Windows Instead of File Events
//!
//! Photos usually arrive over rsync, scp or a file share, which write in chunks.
//! Rather than watching for change events, each pass skips files modified in the
//! last 10 seconds (200 ms for sidecars). A half-uploaded JPEG is never decoded,
//! and nothing needs to know how the files got there.
//!
//! ## Artifacts Next to the Sources
//!
//! Thumbnails and index pages live in the album directory itself and the album
//! directory is served as-is. Pages link images, thumbnails and assets with
//! absolute `{prefix}/b/<album>/...` and `{prefix}/a/...` paths, so a copy of the
//! tree works behind any static file server that mounts it under the same
//! prefix.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): malformed markup is
//! a build error and captions typed by users are escaped by default.

pub mod album_config;
pub mod config;
pub mod generate;
pub mod handoff;
pub mod imaging;
pub mod naming;
pub mod scan;
pub mod server;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_helpers;
