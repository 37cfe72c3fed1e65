//! Model registry and the persistence namespace it resolves against.
//!
//! # Responsibility
//! - Hand out one canonical `ModelHandle` per entity name.
//! - Define the namespace contract the persistence engine fulfils.

pub mod model_registry;
pub mod namespace;
