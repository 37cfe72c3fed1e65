//! Core of the tripdesk CRUD backend.
//! This crate owns the model registry, the error taxonomy and the trip
//! service/handler layers built on them.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;

pub use app::{App, AppInitError};
pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use handler::routes::TripRoutes;
pub use handler::trips_handler::{TripAction, TripsHandler};
pub use handler::{ErrorResponder, HandlerOutcome, HttpRequest, HttpResponse};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::entity::EntityName;
pub use model::schema::{FieldKind, FieldSpec, SchemaDescriptor, SchemaError, SchemaViolation};
pub use model::trip::{trip_schema, Trip, TripId, PROTECTED_FIELDS, TRIP_MODEL_NAME};
pub use registry::model_registry::{ModelRegistry, RegistryError, RegistryResult};
pub use registry::namespace::{ModelNamespace, NamespaceError, SqliteNamespace};
pub use repo::model_handle::{Document, DocumentId, ModelHandle, RepoError, RepoResult};
pub use service::trip_service::{TripService, TripServiceError, TripServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
