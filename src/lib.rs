//! Library crate for sharq-gharb-back, exposing modules for binaries and integration tests.

/// Environment-driven application configuration.
pub mod config;
/// Adapters for the external collaborators: identity, images and questions.
pub mod dao;
/// Request and response bodies exposed over HTTP.
pub mod dto;
/// Service-level error type and its HTTP mapping.
pub mod error;
/// Axum routers grouped by concern.
pub mod routes;
/// Business operations invoked by the routes.
pub mod services;
/// Shared session state, reducer and domain types.
pub mod state;
