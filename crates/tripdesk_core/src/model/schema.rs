//! Schema descriptors and payload validation.
//!
//! # Responsibility
//! - Describe the field shape of one model (`SchemaDescriptor`).
//! - Reject malformed descriptors before a model is created.
//! - Turn client payloads into stored documents (create and patch paths).
//!
//! # Invariants
//! - Stored documents only ever contain fields the schema declares.
//! - Unknown payload fields are dropped, never rejected.
//! - Defaults are applied on create only; patch keeps stored values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"));

/// JSON value kind accepted by one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    /// Any JSON number.
    Number,
    /// JSON number without fractional part that fits in an `i64`.
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(label)
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Inclusive lower bound, numeric kinds only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            min: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    fn check_value(&self, value: &Value) -> Result<(), SchemaViolation> {
        if !self.kind.accepts(value) {
            return Err(SchemaViolation::WrongType {
                field: self.name.clone(),
                expected: self.kind,
            });
        }
        if let (Some(min), Some(number)) = (self.min, value.as_f64()) {
            if number < min {
                return Err(SchemaViolation::BelowMinimum {
                    field: self.name.clone(),
                    min,
                });
            }
        }
        Ok(())
    }
}

/// Structural definition of one model's documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    fields: Vec<FieldSpec>,
}

impl SchemaDescriptor {
    /// Builds a descriptor without checking it; see [`SchemaDescriptor::check`].
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Rejects descriptors that cannot back a model.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields);
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !FIELD_NAME_RE.is_match(&field.name) {
                return Err(SchemaError::InvalidFieldName(field.name.clone()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            if field.min.is_some() && !field.kind.is_numeric() {
                return Err(SchemaError::MinOnNonNumeric(field.name.clone()));
            }
            if let Some(default) = &field.default {
                if field.check_value(default).is_err() {
                    return Err(SchemaError::InvalidDefault(field.name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Builds a new document from a create payload.
    ///
    /// # Contract
    /// - `payload` must be a JSON object.
    /// - `null` counts as absent.
    /// - Missing fields take their default; missing required fields fail.
    pub fn build_document(&self, payload: &Value) -> Result<Map<String, Value>, SchemaViolation> {
        let input = payload.as_object().ok_or(SchemaViolation::NotAnObject)?;
        let mut document = Map::new();

        for field in &self.fields {
            match input.get(&field.name).filter(|value| !value.is_null()) {
                Some(value) => {
                    field.check_value(value)?;
                    document.insert(field.name.clone(), value.clone());
                }
                None => {
                    if let Some(default) = &field.default {
                        document.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        return Err(SchemaViolation::MissingField(field.name.clone()));
                    }
                }
            }
        }

        Ok(document)
    }

    /// Applies a patch payload on top of a stored document.
    ///
    /// # Contract
    /// - Known fields overwrite stored values; `null` clears optional fields.
    /// - Unknown fields are ignored.
    /// - The merged document is re-validated as a whole.
    pub fn merge_patch(
        &self,
        current: &Map<String, Value>,
        patch: &Value,
    ) -> Result<Map<String, Value>, SchemaViolation> {
        let input = patch.as_object().ok_or(SchemaViolation::NotAnObject)?;
        let mut merged = current.clone();

        for field in &self.fields {
            match input.get(&field.name) {
                Some(Value::Null) => {
                    if field.required {
                        return Err(SchemaViolation::MissingField(field.name.clone()));
                    }
                    merged.remove(&field.name);
                }
                Some(value) => {
                    field.check_value(value)?;
                    merged.insert(field.name.clone(), value.clone());
                }
                None => {}
            }
        }

        for field in &self.fields {
            match merged.get(&field.name) {
                Some(value) => field.check_value(value)?,
                None if field.required => {
                    return Err(SchemaViolation::MissingField(field.name.clone()));
                }
                None => {}
            }
        }
        merged.retain(|key, _| self.field(key).is_some());

        Ok(merged)
    }
}

/// Descriptor shape errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    NoFields,
    InvalidFieldName(String),
    DuplicateField(String),
    MinOnNonNumeric(String),
    InvalidDefault(String),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFields => write!(f, "schema declares no fields"),
            Self::InvalidFieldName(name) => write!(f, "invalid field name `{name}`"),
            Self::DuplicateField(name) => write!(f, "field `{name}` is declared twice"),
            Self::MinOnNonNumeric(name) => {
                write!(f, "field `{name}` has a minimum but is not numeric")
            }
            Self::InvalidDefault(name) => {
                write!(f, "default of field `{name}` does not match its kind")
            }
        }
    }
}

impl Error for SchemaError {}

/// Payload errors raised while building or patching a document.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    NotAnObject,
    MissingField(String),
    WrongType { field: String, expected: FieldKind },
    BelowMinimum { field: String, min: f64 },
}

impl Display for SchemaViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "payload must be a JSON object"),
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::WrongType { field, expected } => {
                write!(f, "field `{field}` must be of type {expected}")
            }
            Self::BelowMinimum { field, min } => {
                write!(f, "field `{field}` must be at least {min}")
            }
        }
    }
}

impl Error for SchemaViolation {}
