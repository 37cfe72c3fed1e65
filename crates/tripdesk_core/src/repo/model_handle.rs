//! Model handle: schema-bound CRUD over the shared `documents` table.
//!
//! # Responsibility
//! - Provide list/get/insert/patch/delete for one named model.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate against the model schema before SQL mutations.
//! - Read paths reject invalid persisted JSON instead of masking it.
//! - Clones share one inner allocation; `ptr_eq` identifies the model.

use crate::db::{DbError, SharedConnection};
use crate::model::entity::EntityName;
use crate::model::schema::{SchemaDescriptor, SchemaViolation};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, MutexGuard};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT id, body_json FROM documents";

pub type RepoResult<T> = Result<T, RepoError>;

/// Identifier assigned to a document on insert.
pub type DocumentId = String;

/// Repository error for document persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(SchemaViolation),
    Db(DbError),
    InvalidData(String),
    /// A thread panicked while holding the connection lock.
    Poisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document: {message}"),
            Self::Poisoned => write!(f, "connection lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Poisoned => None,
        }
    }
}

impl From<SchemaViolation> for RepoError {
    fn from(value: SchemaViolation) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Flattens into one JSON object with the id under `id`.
    pub fn into_json(self) -> Value {
        let mut object = self.fields;
        object.insert("id".to_string(), Value::String(self.id));
        Value::Object(object)
    }
}

struct ModelInner {
    name: EntityName,
    schema: SchemaDescriptor,
    conn: SharedConnection,
}

/// Shared handle bound to one named model.
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<ModelInner>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    /// Binds a handle to `name`. Only namespaces should call this.
    pub(crate) fn new(name: EntityName, schema: SchemaDescriptor, conn: SharedConnection) -> Self {
        Self {
            inner: Arc::new(ModelInner { name, schema, conn }),
        }
    }

    pub fn name(&self) -> &EntityName {
        &self.inner.name
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.inner.schema
    }

    /// Returns whether both handles are the same canonical model instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Lists up to `limit` documents from `offset`, in insertion order.
    pub fn list(&self, limit: u32, offset: u32) -> RepoResult<Vec<Document>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE model = ?1
             ORDER BY seq ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;

        let mut rows = stmt.query(params![
            self.inner.name.as_str(),
            i64::from(limit),
            i64::from(offset)
        ])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    /// Gets one document by id. A missing id is `Ok(None)`.
    pub fn get(&self, id: &str) -> RepoResult<Option<Document>> {
        let conn = self.lock()?;
        self.get_with(&conn, id)
    }

    /// Validates `payload` and inserts it under a fresh id.
    pub fn insert(&self, payload: &Value) -> RepoResult<DocumentId> {
        let fields = self.inner.schema.build_document(payload)?;
        let id = Uuid::new_v4().to_string();
        let body = encode_body(&fields)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (model, id, body_json) VALUES (?1, ?2, ?3);",
            params![self.inner.name.as_str(), id.as_str(), body],
        )?;

        Ok(id)
    }

    /// Merges `payload` into the stored document and returns the result.
    ///
    /// Returns `Ok(None)` when no document has this id.
    pub fn patch(&self, id: &str, payload: &Value) -> RepoResult<Option<Document>> {
        let conn = self.lock()?;
        let Some(current) = self.get_with(&conn, id)? else {
            return Ok(None);
        };

        let fields = self.inner.schema.merge_patch(&current.fields, payload)?;
        let body = encode_body(&fields)?;
        conn.execute(
            "UPDATE documents
             SET
                body_json = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE model = ?2 AND id = ?3;",
            params![body, self.inner.name.as_str(), id],
        )?;

        Ok(Some(Document {
            id: current.id,
            fields,
        }))
    }

    /// Deletes one document. Returns whether a row was removed.
    pub fn delete(&self, id: &str) -> RepoResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE model = ?1 AND id = ?2;",
            params![self.inner.name.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    /// Counts stored documents of this model.
    pub fn count(&self) -> RepoResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE model = ?1;",
            [self.inner.name.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
    }

    fn get_with(&self, conn: &Connection, id: &str) -> RepoResult<Option<Document>> {
        let mut stmt = conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE model = ?1 AND id = ?2;"
        ))?;
        let row = stmt
            .query_row(params![self.inner.name.as_str(), id], |row| {
                Ok((row.get::<_, String>("id")?, row.get::<_, String>("body_json")?))
            })
            .optional()?;

        row.map(|(id, body)| decode_document(id, &body)).transpose()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.inner.conn.lock().map_err(|_| RepoError::Poisoned)
    }
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id: String = row.get("id")?;
    let body: String = row.get("body_json")?;
    decode_document(id, &body)
}

fn decode_document(id: String, body: &str) -> RepoResult<Document> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(Document { id, fields }),
        Ok(other) => Err(RepoError::InvalidData(format!(
            "document `{id}` body is not an object: {}",
            json_kind(&other)
        ))),
        Err(err) => Err(RepoError::InvalidData(format!(
            "document `{id}` body is not valid JSON: {err}"
        ))),
    }
}

fn encode_body(fields: &Map<String, Value>) -> RepoResult<String> {
    serde_json::to_string(fields)
        .map_err(|err| RepoError::InvalidData(format!("document body encode failed: {err}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
