use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse",
    tag = "sse",
    responses((
        status = 200,
        description = "Session event stream",
        content_type = "text/event-stream",
        body = String
    ))
)]
/// Stream session events: a handshake, then every transition, tick and score change.
pub async fn session_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, handshake) = sse_service::subscribe(&state).await;
    info!("New SSE connection");
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(session_stream))
}
