//! Route table for the trips surface.

use crate::error::AppError;
use crate::handler::trips_handler::TripsHandler;
use crate::handler::{ErrorResponder, HandlerOutcome, HttpRequest, HttpResponse};
use http::{Method, StatusCode};
use log::info;
use std::time::Instant;

const TRIPS_SEGMENT: &str = "trips";

/// Dispatches requests to the trip handlers and renders the outcome.
pub struct TripRoutes {
    trips: TripsHandler,
    responder: ErrorResponder,
}

impl TripRoutes {
    pub fn new(trips: TripsHandler, responder: ErrorResponder) -> Self {
        Self { trips, responder }
    }

    /// Runs one request to completion.
    pub fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        let started_at = Instant::now();
        let response = self.responder.finish(self.route(request));
        info!(
            "event=http_request module=handler method={} path={} status={} duration_ms={}",
            request.method,
            request.path,
            response.status.as_u16(),
            started_at.elapsed().as_millis()
        );
        response
    }

    fn route(&self, request: &HttpRequest) -> HandlerOutcome {
        let path = request.path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [TRIPS_SEGMENT] => match request.method {
                Method::GET => self.trips.list_trips(),
                Method::POST => self.trips.create_trip(&request.body),
                _ => method_not_allowed(&request.method, path),
            },
            [TRIPS_SEGMENT, id] => match request.method {
                Method::GET => self.trips.get_trip_by_id(id),
                Method::PATCH => self.trips.patch_trip_by_id(id, &request.body),
                Method::DELETE => self.trips.delete_trip_by_id(id),
                _ => method_not_allowed(&request.method, path),
            },
            _ => HandlerOutcome::Forward(AppError::new(
                true,
                "RouteNotFound_Error",
                StatusCode::NOT_FOUND,
                format!("no route for {path}"),
            )),
        }
    }
}

fn method_not_allowed(method: &Method, path: &str) -> HandlerOutcome {
    HandlerOutcome::Forward(AppError::new(
        true,
        "MethodNotAllowed_Error",
        StatusCode::METHOD_NOT_ALLOWED,
        format!("{method} is not allowed on {path}"),
    ))
}
