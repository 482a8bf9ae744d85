/// Login, signup and logout against the identity store.
pub mod auth_service;
/// Per-question countdown task.
pub mod countdown;
/// OpenAPI documentation generation.
pub mod documentation;
/// Built-in questions served when the provider is unavailable.
pub mod fallback;
/// Health check service.
pub mod health_service;
/// Friendly and tournament match code encoding.
pub mod match_code;
/// Question acquisition pipeline: provider, fallback, dedup and image warm-up.
pub mod question_service;
/// Round Controller operations: answers, attribution, lifelines and results.
pub mod round_service;
/// Menu navigation, team setup and round acquisition.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
