use serde_json::{json, Value};
use std::sync::Arc;
use tripdesk_core::db::{open_db_in_memory, share};
use tripdesk_core::{
    ModelRegistry, SqliteNamespace, TripService, TripServiceError, TRIP_MODEL_NAME,
};

fn service() -> (TripService, ModelRegistry) {
    let namespace = SqliteNamespace::new(share(open_db_in_memory().unwrap()));
    let registry = ModelRegistry::new(Arc::new(namespace));
    (TripService::new(registry.clone()), registry)
}

fn trip_payload(name: &str) -> Value {
    json!({
        "name": name,
        "destination": "Norway",
        "price": 1200,
        "startDate": "2026-06-01",
        "maxSeats": 14
    })
}

#[test]
fn create_and_read_roundtrip_applies_derived_defaults() {
    let (service, _) = service();
    let id = service.create(&trip_payload("Fjords")).unwrap();

    let trip = service.read_by_id(&id).unwrap().unwrap();
    assert_eq!(trip.id, id);
    assert_eq!(trip.name, "Fjords");
    assert_eq!(trip.price, 1200.0);
    assert_eq!(trip.start_date.as_deref(), Some("2026-06-01"));
    assert_eq!(trip.max_seats, Some(14));
    assert_eq!(trip.duration, 0);
    assert_eq!(trip.booked_seats, 0);
}

#[test]
fn service_shares_the_registry_model() {
    let (service, registry) = service();
    let id = service.create(&trip_payload("Fjords")).unwrap();

    let model = registry.get_or_create_model(TRIP_MODEL_NAME, None).unwrap();
    assert!(model.get(&id).unwrap().is_some());
}

#[test]
fn read_unknown_id_is_none() {
    let (service, _) = service();
    assert!(service.read_by_id("missing").unwrap().is_none());
}

#[test]
fn list_keeps_insertion_order_and_honours_limit_offset() {
    let (service, _) = service();
    assert!(service.list(100, 0).unwrap().is_empty());

    for name in ["a", "b", "c", "d"] {
        service.create(&trip_payload(name)).unwrap();
    }

    let names = |trips: Vec<tripdesk_core::Trip>| -> Vec<String> {
        trips.into_iter().map(|trip| trip.name).collect()
    };
    assert_eq!(names(service.list(100, 0).unwrap()), ["a", "b", "c", "d"]);
    assert_eq!(names(service.list(2, 1).unwrap()), ["b", "c"]);
    assert!(service.list(10, 4).unwrap().is_empty());
}

#[test]
fn create_rejects_schema_violations_as_taxonomy_errors() {
    let (service, _) = service();
    let err = service
        .create(&json!({ "name": "Fjords", "destination": "Norway" }))
        .unwrap_err();
    let record = err.as_app_error().unwrap();
    assert!(record.is_operational());
    assert!(record.message().contains("price"));

    let err = service
        .create(&json!({ "name": "Fjords", "destination": "Norway", "price": -1 }))
        .unwrap_err();
    assert!(matches!(err, TripServiceError::Rejected(_)));
}

#[test]
fn patch_updates_known_fields_and_ignores_unknown_ones() {
    let (service, _) = service();
    let id = service.create(&trip_payload("Fjords")).unwrap();

    let updated = service
        .patch_by_id(&id, &json!({ "price": 999.5, "unknown": "dropped" }))
        .unwrap()
        .unwrap();
    assert_eq!(updated.price, 999.5);
    assert_eq!(updated.name, "Fjords");

    let reread = service.read_by_id(&id).unwrap().unwrap();
    assert_eq!(reread, updated);
}

#[test]
fn patch_unknown_id_is_none() {
    let (service, _) = service();
    assert!(service
        .patch_by_id("missing", &json!({ "price": 10 }))
        .unwrap()
        .is_none());
}

#[test]
fn patch_rejects_protected_fields_without_writing() {
    let (service, _) = service();
    let id = service.create(&trip_payload("Fjords")).unwrap();

    let err = service
        .patch_by_id(&id, &json!({ "name": "Renamed", "ratings": 5 }))
        .unwrap_err();
    let record = err.as_app_error().unwrap();
    assert!(record.message().contains("ratings"));
    assert!(!record.message().contains("duration"));

    let trip = service.read_by_id(&id).unwrap().unwrap();
    assert_eq!(trip.name, "Fjords");
    assert_eq!(trip.ratings, 0.0);
}

#[test]
fn delete_is_idempotent() {
    let (service, _) = service();
    let id = service.create(&trip_payload("Fjords")).unwrap();

    service.delete_by_id(&id).unwrap();
    service.delete_by_id(&id).unwrap();
    service.delete_by_id("never-existed").unwrap();
    assert!(service.read_by_id(&id).unwrap().is_none());
}
