//! Client-facing error taxonomy.
//!
//! # Responsibility
//! - Carry the `{ operational, name, http_status, message }` record that
//!   every layer hands to the central error responder.
//! - Render the `{ name, message }` client payload.
//!
//! # Invariants
//! - `operational == true` marks an expected business-rule failure whose
//!   message is safe to show to clients.
//! - Construction never validates; the record is a typed carrier only.

use http::StatusCode;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name used for schema violations raised below the handler layer.
pub const VALIDATION_ERROR_NAME: &str = "ValidationError";

/// Typed error record shared by services, handlers and the responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    operational: bool,
    name: String,
    http_status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(
        operational: bool,
        name: impl Into<String>,
        http_status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operational,
            name: name.into(),
            http_status,
            message: message.into(),
        }
    }

    /// Operational 400 for payloads that break the model schema.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(true, VALIDATION_ERROR_NAME, StatusCode::BAD_REQUEST, message)
    }

    /// Non-operational 404 for lookups that found nothing.
    pub fn not_found(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(false, name, StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(
        operational: bool,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(operational, name, StatusCode::BAD_REQUEST, message)
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn http_status(&self) -> StatusCode {
        self.http_status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Client payload. `operational` and the status stay server-side.
    pub fn body(&self) -> Value {
        json!({
            "name": self.name,
            "message": self.message,
        })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.name,
            self.http_status.as_u16(),
            self.message
        )
    }
}

impl Error for AppError {}
