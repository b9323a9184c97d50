use bilder::config::{self, ServerConfig};
use bilder::handoff;
use bilder::imaging::{RustBackend, ThumbnailConfig};
use bilder::scan::SettlePolicy;
use bilder::server::access_log::AccessLog;
use bilder::server::assets::Assets;
use bilder::server::registry::AlbumRegistry;
use bilder::server::{self, AppState};
use bilder::watcher::{Watcher, WatcherSettings};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bilder")]
#[command(version)]
#[command(about = "Serve a directory of photo albums with thumbnails and per-album basic auth")]
#[command(long_about = "\
Serve a directory of photo albums with thumbnails and per-album basic auth

Every subdirectory of the root is an album. Albums are re-scanned every few
seconds: thumbnails and an index.html are generated next to the images, and
new albums appear without a restart.

Album structure:

  bilder/
  └── cats/
      ├── bilder.json      # optional: {\"Title\": ..., \"Captions\": {...}, \"User\": ..., \"Pass\": ...}
      ├── a.jpg            # image
      ├── a_thumb.jpg      # generated
      └── index.html       # generated

Albums are served at /b/<album>/, assets at /a/.")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Album root directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Listen address, e.g. :8173 or 127.0.0.1:8080
    #[arg(long)]
    addr: Option<String>,

    /// Seconds between reconciliation passes
    #[arg(long)]
    interval: Option<u64>,

    /// Append a combined-format access log to this file
    #[arg(long)]
    access_log: Option<PathBuf>,

    /// Mount all routes below this path prefix
    #[arg(long)]
    url_path_prefix: Option<String>,

    /// Serve /a/ assets from this directory instead of the embedded ones
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolve_config(&self) -> Result<ServerConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ServerConfig::default(),
        };
        if let Some(root) = &self.root {
            config.bilder_dir = root.clone();
        }
        if let Some(addr) = &self.addr {
            config.addr = addr.clone();
        }
        if let Some(interval) = self.interval {
            config.reload_delay_seconds = interval;
        }
        if let Some(log) = &self.access_log {
            config.access_log = Some(log.clone());
        }
        if let Some(prefix) = &self.url_path_prefix {
            config.url_path_prefix = prefix.clone();
        }
        if let Some(dir) = &self.assets_dir {
            config.assets_dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.resolve_config()?;
    let root = config.bilder_dir.clone();
    if let Err(e) = std::fs::read_dir(&root) {
        return Err(format!("cannot read album root {}: {e}", root.display()).into());
    }
    init_thread_pool(&config.processing);

    let url_prefix = config.url_prefix();
    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (publisher, subscription) = handoff::channel();
    let settings = WatcherSettings {
        url_prefix: url_prefix.clone(),
        interval: config.reload_delay(),
        settle: SettlePolicy::default(),
        thumbnails: ThumbnailConfig::from(&config.thumbnails),
    };
    let watcher = Watcher::new(&root, settings, RustBackend::new());
    std::thread::Builder::new()
        .name("watcher".into())
        .spawn(move || watcher.run(publisher))?;

    let registry = Arc::new(AlbumRegistry::new(&root, url_prefix.clone()));
    tokio::spawn(registry.clone().listen_for_updates(subscription));

    let access_log = config.access_log.as_deref().and_then(|path| match AccessLog::open(path) {
        Ok(log) => Some(Arc::new(log)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot open access log, continuing without");
            None
        }
    });

    match &config.assets_dir {
        Some(dir) => tracing::info!(dir = %dir.display(), "serving assets from directory"),
        None => tracing::info!("serving embedded assets"),
    }
    let state = AppState {
        registry,
        assets: Arc::new(Assets::from_config(config.assets_dir.clone())),
        url_prefix,
    };
    let app = server::router(state, access_log);

    tracing::info!(root = %root.display(), "serving on http://{}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bilder={level},tower_http=info").into()),
        )
        .init();
}

/// Initialize the rayon thread pool used for thumbnail generation.
///
/// Caps at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
