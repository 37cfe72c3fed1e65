//! Persistence namespace: the "resolve or create a named model" boundary.
//!
//! # Responsibility
//! - Define the collaborator contract the registry consumes
//!   (`ModelNamespace`).
//! - Provide the SQLite-backed namespace with a persisted `models` catalog.
//!
//! # Invariants
//! - A namespace issues at most one `ModelHandle` per name; `create` for a
//!   name that already exists fails with `AlreadyExists` atomically.
//! - Lock order is handle map first, connection second.

use crate::db::{DbError, SharedConnection};
use crate::model::entity::EntityName;
use crate::model::schema::{SchemaDescriptor, SchemaError};
use crate::repo::model_handle::ModelHandle;
use log::info;
use rusqlite::{params, ErrorCode, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Failures reported by a namespace.
#[derive(Debug)]
pub enum NamespaceError {
    /// No model is registered under this name.
    Missing(EntityName),
    /// Another caller created the model first.
    AlreadyExists(EntityName),
    InvalidSchema {
        name: EntityName,
        source: SchemaError,
    },
    /// The catalog holds a schema this binary cannot read.
    CorruptCatalog(String),
    Db(DbError),
    Poisoned,
}

impl Display for NamespaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "model not registered: {name}"),
            Self::AlreadyExists(name) => write!(f, "model already exists: {name}"),
            Self::InvalidSchema { name, source } => {
                write!(f, "invalid schema for model {name}: {source}")
            }
            Self::CorruptCatalog(message) => write!(f, "corrupt model catalog: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "model map lock poisoned"),
        }
    }
}

impl Error for NamespaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSchema { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for NamespaceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Live data-model namespace consumed by the registry.
pub trait ModelNamespace: Send + Sync {
    /// Returns the canonical handle for `name`, or `Missing`.
    fn resolve(&self, name: &EntityName) -> Result<ModelHandle, NamespaceError>;

    /// Creates the model, or fails with `AlreadyExists` when it is known.
    fn create(
        &self,
        name: &EntityName,
        schema: &SchemaDescriptor,
    ) -> Result<ModelHandle, NamespaceError>;
}

/// SQLite-backed namespace.
///
/// Handles live in memory for the process lifetime; the `models` catalog
/// lets a reopened database resolve models created by earlier runs.
pub struct SqliteNamespace {
    conn: SharedConnection,
    models: Mutex<BTreeMap<EntityName, ModelHandle>>,
}

impl SqliteNamespace {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            models: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns catalog model names sorted by name.
    pub fn model_names(&self) -> Result<Vec<String>, NamespaceError> {
        let conn = self.conn.lock().map_err(|_| NamespaceError::Poisoned)?;
        let mut stmt = conn.prepare("SELECT name FROM models ORDER BY name ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn lock_models(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<EntityName, ModelHandle>>, NamespaceError> {
        self.models.lock().map_err(|_| NamespaceError::Poisoned)
    }

    fn load_catalog_schema(
        &self,
        name: &EntityName,
    ) -> Result<Option<SchemaDescriptor>, NamespaceError> {
        let conn = self.conn.lock().map_err(|_| NamespaceError::Poisoned)?;
        let schema_json = conn
            .query_row(
                "SELECT schema_json FROM models WHERE name = ?1;",
                [name.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        schema_json
            .map(|text| {
                serde_json::from_str::<SchemaDescriptor>(&text).map_err(|err| {
                    NamespaceError::CorruptCatalog(format!("model {name}: {err}"))
                })
            })
            .transpose()
    }

    fn insert_catalog_row(
        &self,
        name: &EntityName,
        schema: &SchemaDescriptor,
    ) -> Result<(), NamespaceError> {
        let schema_json = serde_json::to_string(schema)
            .map_err(|err| NamespaceError::CorruptCatalog(format!("model {name}: {err}")))?;
        let conn = self.conn.lock().map_err(|_| NamespaceError::Poisoned)?;

        match conn.execute(
            "INSERT INTO models (name, schema_json) VALUES (?1, ?2);",
            params![name.as_str(), schema_json],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(NamespaceError::AlreadyExists(name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl ModelNamespace for SqliteNamespace {
    fn resolve(&self, name: &EntityName) -> Result<ModelHandle, NamespaceError> {
        let mut models = self.lock_models()?;
        if let Some(handle) = models.get(name) {
            return Ok(handle.clone());
        }

        let Some(schema) = self.load_catalog_schema(name)? else {
            return Err(NamespaceError::Missing(name.clone()));
        };
        let handle = ModelHandle::new(name.clone(), schema, self.conn.clone());
        models.insert(name.clone(), handle.clone());
        info!("event=model_revive module=registry status=ok model={name}");
        Ok(handle)
    }

    fn create(
        &self,
        name: &EntityName,
        schema: &SchemaDescriptor,
    ) -> Result<ModelHandle, NamespaceError> {
        schema
            .check()
            .map_err(|source| NamespaceError::InvalidSchema {
                name: name.clone(),
                source,
            })?;

        let mut models = self.lock_models()?;
        if models.contains_key(name) {
            return Err(NamespaceError::AlreadyExists(name.clone()));
        }

        self.insert_catalog_row(name, schema)?;
        let handle = ModelHandle::new(name.clone(), schema.clone(), self.conn.clone());
        models.insert(name.clone(), handle.clone());
        info!(
            "event=model_create module=registry status=ok model={name} fields={}",
            schema.fields().len()
        );
        Ok(handle)
    }
}
