//! Application wiring.
//!
//! # Responsibility
//! - Build namespace, registry, service, handlers and routes once and pass
//!   each dependency down explicitly.
//! - Bootstrap logging and storage from `AppConfig`.
//!
//! # Invariants
//! - One `App` owns exactly one registry; every handler shares it.

use crate::config::AppConfig;
use crate::db::{open_db, open_db_in_memory, share, DbError};
use crate::handler::routes::TripRoutes;
use crate::handler::trips_handler::TripsHandler;
use crate::handler::{ErrorResponder, HttpRequest, HttpResponse};
use crate::logging::{init_logging, init_stderr_logging};
use crate::registry::model_registry::ModelRegistry;
use crate::registry::namespace::SqliteNamespace;
use crate::service::trip_service::TripService;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum AppInitError {
    Logging(String),
    Db(DbError),
}

impl Display for AppInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "database open failed: {err}"),
        }
    }
}

impl Error for AppInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for AppInitError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Fully wired trips backend.
pub struct App {
    registry: ModelRegistry,
    routes: TripRoutes,
}

impl App {
    /// Initializes logging, opens storage and wires routes.
    ///
    /// Logs roll under `log_dir` when one is configured and go to stderr
    /// otherwise.
    pub fn open(config: &AppConfig) -> Result<Self, AppInitError> {
        match &config.log_dir {
            Some(log_dir) => init_logging(&config.log_level, log_dir),
            None => init_stderr_logging(&config.log_level),
        }
        .map_err(AppInitError::Logging)?;

        let conn = match &config.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Ok(Self::with_connection(conn, config))
    }

    /// Wires the application over an already migrated connection.
    pub fn with_connection(conn: Connection, config: &AppConfig) -> Self {
        let namespace = Arc::new(SqliteNamespace::new(share(conn)));
        let registry = ModelRegistry::new(namespace);
        let service = Arc::new(TripService::new(registry.clone()));
        let trips = TripsHandler::new(service, config.list_limit);
        let routes = TripRoutes::new(trips, ErrorResponder);

        info!(
            "event=app_wired module=core status=ok list_limit={}",
            config.list_limit
        );
        Self { registry, routes }
    }

    pub fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        self.routes.dispatch(request)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}
