//! Entity use-case services.
//!
//! # Responsibility
//! - Orchestrate model-handle calls into use-case level APIs.
//! - Keep handlers decoupled from storage and registry details.

pub mod trip_service;
