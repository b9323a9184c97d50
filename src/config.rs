//! Server configuration.
//!
//! Loaded from an optional JSON file (`--config FILE`). Every key is optional and
//! defaults are shown below; unknown keys are rejected to catch typos early.
//!
//! ```json
//! {
//!   "bilder-dir": "bilder",
//!   "url-path-prefix": "",
//!   "access-log": null,
//!   "addr": ":8173",
//!   "reload-delay-seconds": 10,
//!   "assets-dir": null,
//!   "thumbnails": { "size": 200, "square": false, "quality": 90 },
//!   "processing": { "max-processes": null }
//! }
//! ```
//!
//! `addr` accepts the `:port` shorthand for "all interfaces". A
//! `reload-delay-seconds` of `0` means the default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

const DEFAULT_RELOAD_DELAY_SECONDS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Root directory; every subdirectory is an album.
    pub bilder_dir: PathBuf,
    /// Path prefix all routes are mounted below (e.g. `/photos`).
    pub url_path_prefix: String,
    /// Combined-format access log for album requests.
    pub access_log: Option<PathBuf>,
    pub addr: String,
    pub reload_delay_seconds: u64,
    /// Serve `/a/` from this directory instead of the embedded assets.
    pub assets_dir: Option<PathBuf>,
    pub thumbnails: ThumbnailsConfig,
    pub processing: ProcessingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bilder_dir: PathBuf::from("bilder"),
            url_path_prefix: String::new(),
            access_log: None,
            addr: ":8173".to_string(),
            reload_delay_seconds: DEFAULT_RELOAD_DELAY_SECONDS,
            assets_dir: None,
            thumbnails: ThumbnailsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Long edge (bounded mode) or side length (square mode) in pixels.
    pub size: u32,
    /// Center-crop thumbnails to an exact square.
    pub square: bool,
    /// JPEG quality (1-100).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            size: 200,
            square: false,
            quality: 90,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProcessingConfig {
    /// Maximum parallel thumbnail workers. `None` = number of CPU cores.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count: the configured cap, never above the core count.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.size < 16 {
            return Err(ConfigError::Validation(
                "thumbnails.size must be at least 16".into(),
            ));
        }
        if self.bilder_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("bilder-dir must not be empty".into()));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Interval between reconciliation passes.
    pub fn reload_delay(&self) -> Duration {
        match self.reload_delay_seconds {
            0 => Duration::from_secs(DEFAULT_RELOAD_DELAY_SECONDS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Parse `addr`, expanding the `:port` shorthand to all interfaces.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        };
        addr.parse()
            .map_err(|e| ConfigError::Validation(format!("invalid addr {:?}: {e}", self.addr)))
    }

    /// URL prefix normalized to `""` or `/a/b` (leading slash, no trailing slash).
    pub fn url_prefix(&self) -> String {
        normalize_prefix(&self.url_path_prefix)
    }
}

pub fn normalize_prefix(raw: &str) -> String {
    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        String::new()
    } else {
        format!("/{}", segments.join("/"))
    }
}

pub fn parse_config(json: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
