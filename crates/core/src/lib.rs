//! Pure domain logic for the vStack admin resource service.
//!
//! Everything in this crate is free of I/O: resource metadata, the typed
//! registry, field rendering, list query composition, validation rules and
//! CSV import parsing. Persistence and delivery live in `vstack-db`,
//! `vstack-events` and `vstack-api`.

pub mod actor;
pub mod error;
pub mod import;
pub mod manifest;
pub mod notification;
pub mod query;
pub mod registry;
pub mod render;
pub mod resource;
pub mod search;
pub mod types;
pub mod validation;
