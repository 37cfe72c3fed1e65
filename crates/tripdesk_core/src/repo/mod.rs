//! Repository layer: per-model document persistence.
//!
//! # Responsibility
//! - Expose schema-bound CRUD through `ModelHandle`.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate against the model schema before persistence.
//! - Absence is reported as `Ok(None)` / `Ok(false)`, not as an error.

pub mod model_handle;
