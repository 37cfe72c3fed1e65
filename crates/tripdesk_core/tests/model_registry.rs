use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use tripdesk_core::db::{open_db, open_db_in_memory, share};
use tripdesk_core::{
    FieldKind, FieldSpec, ModelHandle, ModelRegistry, NamespaceError, RegistryError,
    SchemaDescriptor, SqliteNamespace,
};

fn registry() -> ModelRegistry {
    let namespace = SqliteNamespace::new(share(open_db_in_memory().unwrap()));
    ModelRegistry::new(Arc::new(namespace))
}

fn city_schema() -> SchemaDescriptor {
    SchemaDescriptor::new(vec![
        FieldSpec::new("city", FieldKind::String).required(),
        FieldSpec::new("visits", FieldKind::Integer).with_default(json!(0)),
    ])
}

#[test]
fn same_name_yields_the_same_store() {
    let registry = registry();
    let first = registry
        .get_or_create_model("Place", Some(&city_schema()))
        .unwrap();
    let second = registry.get_or_create_model("Place", None).unwrap();

    assert!(first.ptr_eq(&second));
    let id = first.insert(&json!({ "city": "Lyon" })).unwrap();
    let seen = second.get(&id).unwrap().unwrap();
    assert_eq!(seen.fields.get("city"), Some(&json!("Lyon")));
}

#[test]
fn different_names_get_separate_stores() {
    let registry = registry();
    let places = registry
        .get_or_create_model("Place", Some(&city_schema()))
        .unwrap();
    let cities = registry
        .get_or_create_model("City", Some(&city_schema()))
        .unwrap();

    assert!(!places.ptr_eq(&cities));
    places.insert(&json!({ "city": "Lyon" })).unwrap();
    assert_eq!(places.count().unwrap(), 1);
    assert_eq!(cities.count().unwrap(), 0);
}

#[test]
fn concurrent_first_access_creates_one_model() {
    const WORKERS: usize = 16;
    let registry = registry();
    let schema = city_schema();
    let barrier = Barrier::new(WORKERS);

    let handles: Vec<ModelHandle> = thread::scope(|scope| {
        let workers: Vec<_> = (0..WORKERS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.get_or_create_model("Place", Some(&schema)).unwrap()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .collect()
    });

    let canonical = &handles[0];
    assert!(handles.iter().all(|handle| handle.ptr_eq(canonical)));

    handles[WORKERS - 1]
        .insert(&json!({ "city": "Oslo" }))
        .unwrap();
    assert_eq!(canonical.count().unwrap(), 1);
}

#[test]
fn first_schema_wins() {
    let registry = registry();
    let first = registry
        .get_or_create_model("Place", Some(&city_schema()))
        .unwrap();

    let other = SchemaDescriptor::new(vec![FieldSpec::new("code", FieldKind::Integer).required()]);
    let second = registry.get_or_create_model("Place", Some(&other)).unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(second.schema(), &city_schema());
}

#[test]
fn malformed_schema_is_reported_and_nothing_is_registered() {
    let registry = registry();
    let broken = SchemaDescriptor::new(vec![
        FieldSpec::new("city", FieldKind::String),
        FieldSpec::new("city", FieldKind::String),
    ]);

    let err = registry
        .get_or_create_model("Place", Some(&broken))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Namespace(NamespaceError::InvalidSchema { .. })
    ));
    assert!(matches!(
        registry.get_or_create_model("Place", None),
        Err(RegistryError::MissingSchema(_))
    ));
}

#[test]
fn invalid_names_are_rejected() {
    let registry = registry();
    for name in ["", "   ", "9lives", "a-b"] {
        let err = registry
            .get_or_create_model(name, Some(&city_schema()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName(_)), "{name:?}");
    }
}

#[test]
fn models_survive_reopening_a_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");

    let id = {
        let namespace = SqliteNamespace::new(share(open_db(&path).unwrap()));
        let registry = ModelRegistry::new(Arc::new(namespace));
        let places = registry
            .get_or_create_model("Place", Some(&city_schema()))
            .unwrap();
        places.insert(&json!({ "city": "Porto" })).unwrap()
    };

    let namespace = SqliteNamespace::new(share(open_db(&path).unwrap()));
    let registry = ModelRegistry::new(Arc::new(namespace));
    let places = registry.get_or_create_model("Place", None).unwrap();
    let doc = places.get(&id).unwrap().unwrap();
    assert_eq!(doc.fields.get("city"), Some(&json!("Porto")));
    assert_eq!(places.schema(), &city_schema());
}
