//! vStack API server library.
//!
//! Exposes config, state, error handling, the resource engine and routes so
//! integration tests and the binary entrypoint share one router.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
