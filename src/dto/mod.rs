/// Login and signup payloads.
pub mod auth;
/// Health check payload.
pub mod health;
/// Match code payloads.
pub mod online;
/// Round, question and results projections.
pub mod round;
/// Session snapshot and setup payloads.
pub mod session;
/// Server-sent event payloads.
pub mod sse;
/// Custom validators shared by the payloads.
pub mod validation;
