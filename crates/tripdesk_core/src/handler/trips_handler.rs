//! Trip route handlers.
//!
//! # Responsibility
//! - Call `TripService` for one request and map the result to a status.
//! - Classify failures: taxonomy errors are re-wrapped with the action name
//!   and forwarded, anything else collapses to a generic 500.
//!
//! # Invariants
//! - Patch payloads naming a protected field are rejected before the
//!   service is called.
//! - Absent trips on get/patch forward a non-operational 404.

use crate::error::AppError;
use crate::handler::{HandlerOutcome, HttpResponse};
use crate::model::trip::protected_fields_in;
use crate::service::trip_service::{TripService, TripServiceError};
use http::StatusCode;
use log::error;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const TRIP_NOT_FOUND_MESSAGE: &str = "Trip not found";
const TRIP_UPDATED_MESSAGE: &str = "Trip updated successfully";

/// Route-level action; names the error records a route emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripAction {
    ListTrips,
    GetTripById,
    CreateTrip,
    PatchTripById,
    DeleteTripById,
}

impl TripAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListTrips => "listTrips",
            Self::GetTripById => "getTripById",
            Self::CreateTrip => "createTrip",
            Self::PatchTripById => "patchTripById",
            Self::DeleteTripById => "deleteTripById",
        }
    }

    /// `<action>_Error`.
    pub fn error_name(self) -> String {
        format!("{}_Error", self.as_str())
    }
}

/// Handlers for the `/trips` routes.
pub struct TripsHandler {
    service: Arc<TripService>,
    list_limit: u32,
}

impl TripsHandler {
    pub fn new(service: Arc<TripService>, list_limit: u32) -> Self {
        Self {
            service,
            list_limit,
        }
    }

    /// `GET /trips`: first `list_limit` trips.
    pub fn list_trips(&self) -> HandlerOutcome {
        let action = TripAction::ListTrips;
        match self.service.list(self.list_limit, 0) {
            Ok(trips) => respond_json(action, StatusCode::OK, &trips),
            Err(err) => service_failure(action, err),
        }
    }

    /// `GET /trips/:id`.
    pub fn get_trip_by_id(&self, id: &str) -> HandlerOutcome {
        let action = TripAction::GetTripById;
        match self.service.read_by_id(id) {
            Ok(Some(trip)) => respond_json(action, StatusCode::OK, &trip),
            Ok(None) => not_found(action),
            Err(err) => service_failure(action, err),
        }
    }

    /// `POST /trips`: 201 with `{ id }`.
    pub fn create_trip(&self, body: &Value) -> HandlerOutcome {
        let action = TripAction::CreateTrip;
        match self.service.create(body) {
            Ok(id) => HandlerOutcome::Respond(HttpResponse::json(
                StatusCode::CREATED,
                json!({ "id": id }),
            )),
            Err(err) => service_failure(action, err),
        }
    }

    /// `PATCH /trips/:id`.
    pub fn patch_trip_by_id(&self, id: &str, body: &Value) -> HandlerOutcome {
        let action = TripAction::PatchTripById;
        let protected = protected_fields_in(body);
        if !protected.is_empty() {
            return HandlerOutcome::Forward(AppError::bad_request(
                true,
                action.error_name(),
                format!(
                    "you're not allowed to change the following fields: {}",
                    protected.join(", ")
                ),
            ));
        }

        match self.service.patch_by_id(id, body) {
            Ok(Some(_)) => HandlerOutcome::Respond(HttpResponse::json(
                StatusCode::OK,
                json!({ "msg": TRIP_UPDATED_MESSAGE }),
            )),
            Ok(None) => not_found(action),
            Err(err) => service_failure(action, err),
        }
    }

    /// `DELETE /trips/:id`: 204 whether or not the trip existed.
    pub fn delete_trip_by_id(&self, id: &str) -> HandlerOutcome {
        let action = TripAction::DeleteTripById;
        match self.service.delete_by_id(id) {
            Ok(()) => HandlerOutcome::Respond(HttpResponse::empty(StatusCode::NO_CONTENT)),
            Err(err) => service_failure(action, err),
        }
    }
}

fn not_found(action: TripAction) -> HandlerOutcome {
    HandlerOutcome::Forward(AppError::not_found(
        action.error_name(),
        TRIP_NOT_FOUND_MESSAGE,
    ))
}

fn respond_json(action: TripAction, status: StatusCode, value: &impl Serialize) -> HandlerOutcome {
    match serde_json::to_value(value) {
        Ok(body) => HandlerOutcome::Respond(HttpResponse::json(status, body)),
        Err(err) => {
            error!(
                "event=trip_request module=handler status=error action={} error_code=encode_failed error={err}",
                action.as_str()
            );
            HandlerOutcome::Respond(HttpResponse::internal_error())
        }
    }
}

fn service_failure(action: TripAction, err: TripServiceError) -> HandlerOutcome {
    match err.as_app_error() {
        Some(inner) => HandlerOutcome::Forward(AppError::bad_request(
            false,
            action.error_name(),
            inner.message(),
        )),
        None => {
            error!(
                "event=trip_request module=handler status=error action={} error_code=unexpected error={err}",
                action.as_str()
            );
            HandlerOutcome::Respond(HttpResponse::internal_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{service_failure, TripAction};
    use crate::db::DbError;
    use crate::error::AppError;
    use crate::handler::{HandlerOutcome, HttpResponse};
    use crate::model::entity::EntityName;
    use crate::registry::model_registry::RegistryError;
    use crate::repo::model_handle::RepoError;
    use crate::service::trip_service::TripServiceError;
    use http::StatusCode;

    #[test]
    fn action_error_names_follow_route_names() {
        assert_eq!(TripAction::ListTrips.error_name(), "listTrips_Error");
        assert_eq!(TripAction::PatchTripById.error_name(), "patchTripById_Error");
        assert_eq!(TripAction::DeleteTripById.error_name(), "deleteTripById_Error");
    }

    #[test]
    fn taxonomy_failures_are_rewrapped_as_bad_request() {
        let outcome = service_failure(
            TripAction::CreateTrip,
            TripServiceError::Rejected(AppError::validation("field `price` is required")),
        );
        let HandlerOutcome::Forward(err) = outcome else {
            panic!("taxonomy failure must be forwarded");
        };
        assert_eq!(err.name(), "createTrip_Error");
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "field `price` is required");
        assert!(!err.is_operational());
    }

    #[test]
    fn registry_failures_are_rewrapped_with_the_route_name() {
        let registry_err = AppError::from(RegistryError::MissingSchema(
            EntityName::parse("Trip").unwrap(),
        ));
        assert_eq!(registry_err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);

        let outcome = service_failure(
            TripAction::GetTripById,
            TripServiceError::Registry(registry_err),
        );
        let HandlerOutcome::Forward(err) = outcome else {
            panic!("registry failure must be forwarded");
        };
        assert_eq!(err.name(), "getTripById_Error");
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("no schema was supplied"));
        assert!(!err.is_operational());
    }

    #[test]
    fn unexpected_failures_respond_500_without_detail() {
        let outcome = service_failure(
            TripAction::ListTrips,
            TripServiceError::Repo(RepoError::Db(DbError::UnsupportedSchemaVersion {
                db_version: 9,
                latest_supported: 1,
            })),
        );
        assert_eq!(outcome, HandlerOutcome::Respond(HttpResponse::internal_error()));
    }
}
