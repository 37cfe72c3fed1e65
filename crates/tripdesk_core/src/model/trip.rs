//! Trip domain model.
//!
//! # Responsibility
//! - Define the trip read model returned to clients.
//! - Own the trip schema descriptor and the protected-field list.
//!
//! # Invariants
//! - `duration`, `ratings` and `bookedSeats` are server-derived.
//! - Wire names are camelCase and `id` carries the document id.

use crate::model::schema::{FieldKind, FieldSpec, SchemaDescriptor};
use crate::repo::model_handle::DocumentId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Registry key of the trip model.
pub const TRIP_MODEL_NAME: &str = "Trip";

/// Fields clients may never change through updates, in reporting order.
pub const PROTECTED_FIELDS: [&str; 3] = ["duration", "ratings", "bookedSeats"];

/// Stable identifier assigned to a trip on create.
pub type TripId = DocumentId;

/// Trip as stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub destination: String,
    /// Price per seat, never negative.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_seats: Option<i64>,
    /// Length in days.
    #[serde(default)]
    pub duration: i64,
    /// Average rating.
    #[serde(default)]
    pub ratings: f64,
    #[serde(default)]
    pub booked_seats: i64,
}

/// Schema descriptor the trip model is created from.
pub fn trip_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(vec![
        FieldSpec::new("name", FieldKind::String).required(),
        FieldSpec::new("destination", FieldKind::String).required(),
        FieldSpec::new("price", FieldKind::Number)
            .required()
            .with_min(0.0),
        FieldSpec::new("startDate", FieldKind::String),
        FieldSpec::new("endDate", FieldKind::String),
        FieldSpec::new("maxSeats", FieldKind::Integer).with_min(1.0),
        FieldSpec::new("duration", FieldKind::Integer)
            .with_default(json!(0))
            .with_min(0.0),
        FieldSpec::new("ratings", FieldKind::Number)
            .with_default(json!(0))
            .with_min(0.0),
        FieldSpec::new("bookedSeats", FieldKind::Integer)
            .with_default(json!(0))
            .with_min(0.0),
    ])
}

/// Returns the protected fields present as keys in `payload`.
///
/// Presence alone counts, whatever the value (`0` and `null` included).
pub fn protected_fields_in(payload: &Value) -> Vec<&'static str> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };
    PROTECTED_FIELDS
        .iter()
        .copied()
        .filter(|field| object.contains_key(*field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{protected_fields_in, trip_schema, Trip};
    use serde_json::json;

    #[test]
    fn trip_schema_is_well_formed() {
        assert!(trip_schema().check().is_ok());
    }

    #[test]
    fn protected_fields_in_reports_present_keys_in_order() {
        assert_eq!(
            protected_fields_in(&json!({ "bookedSeats": 1, "name": "x", "duration": 0 })),
            vec!["duration", "bookedSeats"]
        );
        assert_eq!(
            protected_fields_in(&json!({ "ratings": null })),
            vec!["ratings"]
        );
        assert!(protected_fields_in(&json!({ "name": "x" })).is_empty());
        assert!(protected_fields_in(&json!("duration")).is_empty());
    }

    #[test]
    fn trip_uses_camel_case_wire_names() {
        let trip: Trip = serde_json::from_value(json!({
            "id": "abc",
            "name": "Dolomites",
            "destination": "Italy",
            "price": 950.5,
            "maxSeats": 12,
            "bookedSeats": 3
        }))
        .unwrap();
        assert_eq!(trip.max_seats, Some(12));
        assert_eq!(trip.booked_seats, 3);
        assert_eq!(trip.duration, 0);

        let wire = serde_json::to_value(&trip).unwrap();
        assert_eq!(wire["bookedSeats"], 3);
        assert!(wire.get("startDate").is_none());
    }
}
