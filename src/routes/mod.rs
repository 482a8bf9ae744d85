use axum::Router;

use crate::state::SharedState;

/// Login, signup and logout endpoints.
pub mod auth;
/// Swagger UI and OpenAPI document serving.
pub mod docs;
/// Health check endpoint.
pub mod health;
/// Match code creation and joining.
pub mod online;
/// In-round answering, lifelines and results.
pub mod round;
/// Menus, team setup and round settings.
pub mod session;
/// Server-sent events stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(auth::router())
        .merge(session::router())
        .merge(online::router())
        .merge(round::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
