//! Request handling: transport types, route handlers and the central
//! error responder.
//!
//! # Responsibility
//! - Model the request / response / forward-to-responder contract the
//!   transport framework provides.
//! - Render every forwarded `AppError` in one place.
//!
//! # Invariants
//! - A handler yields exactly one `HandlerOutcome`: a terminal response or
//!   one forwarded error record, never both.
//! - Unexpected failures never reach the client beyond a generic 500.

use crate::error::AppError;
use http::{Method, StatusCode};
use log::{error, warn};
use serde_json::Value;

pub mod routes;
pub mod trips_handler;

/// Body of every 500 response.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Parsed inbound request as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    /// Parsed JSON body; `Value::Null` when the request had none.
    pub body: Value,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Value::Null,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

/// Terminal response written back to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// `None` renders an empty body.
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// Generic 500 that carries no error detail.
    pub fn internal_error() -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            Value::String(INTERNAL_SERVER_ERROR_MESSAGE.to_string()),
        )
    }
}

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// The handler wrote the response itself.
    Respond(HttpResponse),
    /// The handler hands one error record to the central responder.
    Forward(AppError),
}

/// Central responder behind the next-handler channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponder;

impl ErrorResponder {
    /// Renders `{ name, message }` with the record's status.
    pub fn render(&self, err: &AppError) -> HttpResponse {
        if err.http_status().is_server_error() {
            error!(
                "event=error_response module=handler status={} name={} operational={}",
                err.http_status().as_u16(),
                err.name(),
                err.is_operational()
            );
        } else {
            warn!(
                "event=error_response module=handler status={} name={} operational={}",
                err.http_status().as_u16(),
                err.name(),
                err.is_operational()
            );
        }
        HttpResponse::json(err.http_status(), err.body())
    }

    /// Resolves an outcome into the response the client receives.
    pub fn finish(&self, outcome: HandlerOutcome) -> HttpResponse {
        match outcome {
            HandlerOutcome::Respond(response) => response,
            HandlerOutcome::Forward(err) => self.render(&err),
        }
    }
}
