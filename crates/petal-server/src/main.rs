//! Petal CMS Server
//!
//! A small content management system: pages, themes, and settings live in
//! an embedded SQLite database, public pages render through the active
//! theme's template, and a single dashboard manages all of it.

mod handlers;
mod services;
mod storage;
mod view;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use services::{PageResolver, ThemeImporter, ThemeManager};
use storage::SqliteStore;
use view::Renderer;

/// Largest theme archive accepted by the upload endpoint.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub resolver: Arc<PageResolver>,
    pub importer: Arc<ThemeImporter>,
    pub themes: Arc<ThemeManager>,
    pub renderer: Arc<Renderer>,
}

/// Filesystem layout for theme content, namespaced by theme name.
#[derive(Debug, Clone)]
pub struct ThemeRoots {
    /// Scratch area for uploaded archives and their extraction trees.
    pub uploads: PathBuf,
    /// Per-theme templates: `<templates>/<name>/base.html`.
    pub templates: PathBuf,
    /// Per-theme stylesheets, served under `/static/themes`.
    pub assets: PathBuf,
}

impl ThemeRoots {
    fn under(data_dir: &Path) -> Self {
        Self {
            uploads: data_dir.join("uploads"),
            templates: data_dir.join("templates").join("themes"),
            assets: data_dir.join("static").join("themes"),
        }
    }

    pub fn template_dir(&self, theme: &str) -> PathBuf {
        self.templates.join(theme)
    }

    pub fn asset_dir(&self, theme: &str) -> PathBuf {
        self.assets.join(theme)
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Petal CMS Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let config = load_config()
        .await
        .context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}",
        config.bind_address, config.database_path
    );

    // Initialize SQLite database
    info!("Initializing SQLite database...");
    let store = Arc::new(
        SqliteStore::open(&config.database_path)
            .await
            .context("Failed to initialize database")?,
    );
    info!("SQLite database initialized at: {}", config.database_path);

    if config.seed_demo {
        info!("Seeding demo content (SEED_DEMO=1)...");
        store
            .seed_defaults()
            .await
            .context("Failed to seed default settings")?;
        store
            .seed_demo_content()
            .await
            .context("Failed to seed demo content")?;
    }

    // Theme directories
    let roots = ThemeRoots::under(&config.data_dir);
    for dir in [&roots.uploads, &roots.templates, &roots.assets] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    info!("Theme directories ready under {}", config.data_dir.display());

    // Initialize services
    info!("Initializing services...");
    let resolver = Arc::new(PageResolver::new(store.clone()));
    let importer = Arc::new(ThemeImporter::new(store.clone(), roots.clone()));
    let themes = Arc::new(ThemeManager::new(store.clone(), roots.clone()));
    let renderer = Arc::new(Renderer::new(roots.templates.clone()));
    info!("Services initialized");

    // Create app state
    let state = AppState {
        store,
        resolver,
        importer,
        themes,
        renderer,
    };

    // Build router
    info!("Building HTTP router...");

    let app = Router::new()
        // Management dashboard
        .route(
            "/dashboard",
            get(handlers::dashboard::show).post(handlers::dashboard::dispatch),
        )
        .route("/delete-page/:id", post(handlers::dashboard::delete_page))
        .route("/init-db", get(handlers::dashboard::init_db))
        // Theme management
        .route("/upload-theme", post(handlers::themes::upload))
        .route("/activate-theme/:name", post(handlers::themes::activate))
        .route("/delete-theme/:name", post(handlers::themes::delete))
        // Theme stylesheets
        .nest_service("/static/themes", ServeDir::new(&roots.assets))
        // Everything else resolves as a CMS page
        .fallback(handlers::pages::serve)
        // Layers
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    database_path: String,
    data_dir: PathBuf,
    seed_demo: bool,
}

async fn load_config() -> Result<Config> {
    info!("Loading configuration from environment...");

    // Get data directory
    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));
    info!("Data directory: {}", data_dir.display());

    // Ensure data directory exists
    if let Err(e) = tokio::fs::create_dir_all(&data_dir).await {
        return Err(anyhow::anyhow!(
            "Failed to create data directory {}: {}",
            data_dir.display(),
            e
        ));
    }

    // Verify data directory is accessible
    match tokio::fs::metadata(&data_dir).await {
        Ok(meta) => {
            #[cfg(unix)]
            info!(
                "Data directory exists, permissions: {:o}",
                meta.permissions().mode()
            );
            #[cfg(not(unix))]
            info!("Data directory exists, readonly: {}", meta.permissions().readonly());
        }
        Err(e) => {
            warn!("Cannot stat data directory: {}", e);
        }
    }

    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
        let path = data_dir.join("cms.db");
        path.to_string_lossy().to_string()
    });

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let seed_demo = std::env::var("SEED_DEMO").map(|v| v == "1").unwrap_or(false);

    Ok(Config {
        bind_address,
        database_path,
        data_dir,
        seed_demo,
    })
}
