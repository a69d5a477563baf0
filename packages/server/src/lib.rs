#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the BESS fire incident dashboard.
//!
//! The incident table is loaded and validated once at startup; a bad file
//! or schema stops the server before it binds. Every client then works in
//! its own [`Session`], created through the API, which shares the ingested
//! dataset read-only. Sessions idle for longer than the session TTL are
//! dropped. Source link previews come from the persisted preview cache and
//! are never fetched while serving.

mod handlers;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use bess_map_dashboard::{ConfigError, DashboardConfig, Session};
use bess_map_incident::{Dataset, IngestError};
use bess_map_preview::cache::PreviewCache;
use bess_map_source::SourceError;
use uuid::Uuid;

/// Environment variable naming the incident table.
pub const DATA_ENV: &str = "BESS_MAP_DATA";

/// Incident table used when neither a flag nor [`DATA_ENV`] names one.
pub const DEFAULT_DATA_PATH: &str = "data/incidents.csv";

/// Environment variable overriding [`DEFAULT_SESSION_TTL`], in seconds.
pub const SESSION_TTL_ENV: &str = "BESS_MAP_SESSION_TTL_SECS";

/// How long a session may sit unused before it is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data source error: {0}")]
    Source(#[from] SourceError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the server reads its inputs from.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Incident table. Falls back to [`DATA_ENV`], then
    /// [`DEFAULT_DATA_PATH`].
    pub data: Option<PathBuf>,
    /// Configuration file. Falls back to `BESS_MAP_CONFIG`, then the
    /// embedded default.
    pub config: Option<PathBuf>,
    /// Preview cache file. Falls back to the configured cache path.
    pub previews: Option<PathBuf>,
    /// Idle session lifetime. Falls back to [`SESSION_TTL_ENV`], then
    /// [`DEFAULT_SESSION_TTL`].
    pub session_ttl: Option<Duration>,
}

impl ServerOptions {
    /// Resolves the incident table path.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.data
            .clone()
            .or_else(|| std::env::var_os(DATA_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }

    /// Resolves the idle session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
            .or_else(|| {
                std::env::var(SESSION_TTL_ENV)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
            })
            .unwrap_or(DEFAULT_SESSION_TTL)
    }
}

/// An open session and when a request last touched it.
pub(crate) struct SessionEntry {
    pub session: Session,
    pub last_access: Instant,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_access: Instant::now(),
        }
    }
}

/// Drops sessions idle for `ttl` or longer as of `now`. Returns how many
/// were dropped.
pub(crate) fn sweep_expired(
    sessions: &mut BTreeMap<Uuid, SessionEntry>,
    ttl: Duration,
    now: Instant,
) -> usize {
    let before = sessions.len();
    sessions.retain(|id, entry| {
        let live = now.saturating_duration_since(entry.last_access) < ttl;
        if !live {
            log::info!("Expired idle session {id}");
        }
        live
    });
    before - sessions.len()
}

/// Shared application state.
pub struct AppState {
    /// The ingested incident table, shared by every session.
    pub dataset: Arc<Dataset>,
    pub config: Arc<DashboardConfig>,
    /// Previously fetched source link previews.
    pub previews: Arc<PreviewCache>,
    /// Open sessions by id.
    pub(crate) sessions: Mutex<BTreeMap<Uuid, SessionEntry>>,
    /// Sessions idle this long are dropped on the next request.
    pub session_ttl: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(dataset: Dataset, config: DashboardConfig, previews: PreviewCache) -> Self {
        Self {
            dataset: Arc::new(dataset),
            config: Arc::new(config),
            previews: Arc::new(previews),
            sessions: Mutex::new(BTreeMap::new()),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

/// Loads the configuration, the incident table, and the preview cache.
///
/// # Errors
///
/// Returns [`ServerError`] if the configuration is invalid or the table
/// cannot be read or lacks required columns. An unreadable preview cache
/// is logged and replaced with an empty one.
pub fn load_state(options: &ServerOptions) -> Result<AppState, ServerError> {
    let config = DashboardConfig::load(options.config.as_deref())?;

    let data_path = options.data_path();
    let source = bess_map_source::for_path(&data_path);
    log::info!("Loading incidents from {}", source.describe());
    let table = source.load()?;
    let dataset = Dataset::ingest(config.schema.clone(), table)?;

    let preview_path = options
        .previews
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.preview.cache_path));
    let previews = PreviewCache::load_or_empty(Path::new(&preview_path));

    Ok(AppState::new(dataset, config, previews).with_session_ttl(options.session_ttl()))
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/columns", web::get().to(handlers::columns))
            .route("/sessions", web::post().to(handlers::create_session))
            .route("/sessions/{id}", web::get().to(handlers::get_session))
            .route("/sessions/{id}", web::delete().to(handlers::delete_session))
            .route("/sessions/{id}/reset", web::post().to(handlers::reset_session))
            .route("/sessions/{id}/filter", web::post().to(handlers::apply_filter))
            .route(
                "/sessions/{id}/filter/reset",
                web::post().to(handlers::reset_filter),
            )
            .route("/sessions/{id}/select", web::post().to(handlers::select))
            .route("/sessions/{id}/chart", web::get().to(handlers::chart)),
    );
}

/// Starts the dashboard API server.
///
/// Loads all inputs via [`load_state`] and then serves until shut down.
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns [`ServerError`] if startup loading fails, or if the HTTP server
/// fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(options: ServerOptions) -> Result<(), ServerError> {
    let state = web::Data::new(load_state(&options)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
