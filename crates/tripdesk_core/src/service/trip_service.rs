//! Trip use-case service.
//!
//! # Responsibility
//! - Provide list/read/create/patch/delete entry points for trips.
//! - Obtain the trip model through the registry once and keep it.
//!
//! # Invariants
//! - Protected fields never reach persistence through `patch_by_id`.
//! - Absence (`read_by_id`, `patch_by_id`) is `Ok(None)`, never an error.
//! - Deleting an unknown id is a no-op.

use crate::error::AppError;
use crate::model::trip::{protected_fields_in, trip_schema, Trip, TripId, TRIP_MODEL_NAME};
use crate::registry::model_registry::ModelRegistry;
use crate::repo::model_handle::{Document, ModelHandle, RepoError};
use log::info;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error name for protected-field writes rejected inside the service.
pub const PROTECTED_FIELD_ERROR_NAME: &str = "ProtectedFieldError";

pub type TripServiceResult<T> = Result<T, TripServiceError>;

/// Service error for trip use-cases.
#[derive(Debug)]
pub enum TripServiceError {
    /// Business-rule rejection (schema violation, protected field).
    Rejected(AppError),
    /// Model could not be resolved or created.
    Registry(AppError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Stored document does not decode into a trip.
    InvalidData(String),
}

impl TripServiceError {
    /// Returns the taxonomy record when this error belongs to the taxonomy.
    pub fn as_app_error(&self) -> Option<&AppError> {
        match self {
            Self::Rejected(err) | Self::Registry(err) => Some(err),
            Self::Repo(_) | Self::InvalidData(_) => None,
        }
    }
}

impl Display for TripServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) | Self::Registry(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid trip data: {message}"),
        }
    }
}

impl Error for TripServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) | Self::Registry(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<RepoError> for TripServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(violation) => {
                Self::Rejected(AppError::validation(violation.to_string()))
            }
            other => Self::Repo(other),
        }
    }
}

/// Trip service over the shared model registry.
pub struct TripService {
    registry: ModelRegistry,
    model: OnceCell<ModelHandle>,
}

impl TripService {
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            registry,
            model: OnceCell::new(),
        }
    }

    /// Lists up to `limit` trips starting at `offset`, in creation order.
    pub fn list(&self, limit: u32, offset: u32) -> TripServiceResult<Vec<Trip>> {
        self.model()?
            .list(limit, offset)?
            .into_iter()
            .map(decode_trip)
            .collect()
    }

    pub fn read_by_id(&self, id: &str) -> TripServiceResult<Option<Trip>> {
        self.model()?.get(id)?.map(decode_trip).transpose()
    }

    /// Validates and stores a new trip.
    ///
    /// # Contract
    /// - `payload` must be a JSON object matching the trip schema.
    /// - Unknown fields are dropped; missing derived fields start at 0.
    /// - Returns the generated trip id.
    pub fn create(&self, payload: &Value) -> TripServiceResult<TripId> {
        let id = self.model()?.insert(payload)?;
        info!("event=trip_create module=service status=ok trip_id={id}");
        Ok(id)
    }

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` when no trip has this id. Payloads naming a
    /// protected field are rejected before the store is touched.
    pub fn patch_by_id(&self, id: &str, payload: &Value) -> TripServiceResult<Option<Trip>> {
        let protected = protected_fields_in(payload);
        if !protected.is_empty() {
            return Err(TripServiceError::Rejected(AppError::bad_request(
                true,
                PROTECTED_FIELD_ERROR_NAME,
                format!("protected fields cannot be updated: {}", protected.join(", ")),
            )));
        }

        let updated = self.model()?.patch(id, payload)?;
        if updated.is_some() {
            info!("event=trip_patch module=service status=ok trip_id={id}");
        }
        updated.map(decode_trip).transpose()
    }

    /// Removes a trip; unknown ids are ignored.
    pub fn delete_by_id(&self, id: &str) -> TripServiceResult<()> {
        let removed = self.model()?.delete(id)?;
        info!("event=trip_delete module=service status=ok trip_id={id} removed={removed}");
        Ok(())
    }

    fn model(&self) -> TripServiceResult<&ModelHandle> {
        self.model
            .get_or_try_init(|| {
                self.registry
                    .get_or_create_model(TRIP_MODEL_NAME, Some(&trip_schema()))
            })
            .map_err(|err| TripServiceError::Registry(err.into()))
    }
}

fn decode_trip(document: Document) -> TripServiceResult<Trip> {
    let id = document.id.clone();
    serde_json::from_value(document.into_json())
        .map_err(|err| TripServiceError::InvalidData(format!("trip `{id}`: {err}")))
}
