//! Domain model: entity names, schema descriptors and the trip entity.
//!
//! # Responsibility
//! - Define the registry key (`EntityName`) and the schema shape models
//!   are created from.
//! - Define the representative `Trip` entity and its protected fields.
//!
//! # Invariants
//! - A `SchemaDescriptor` that fails `check()` never backs a model.
//! - Protected trip fields are server-derived and never client-writable
//!   through updates.

pub mod entity;
pub mod schema;
pub mod trip;
