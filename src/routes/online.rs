use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::{
        online::{FriendlyCodeRequest, JoinMatchRequest, MatchCodeResponse, TournamentCodeRequest},
        session::SessionSnapshot,
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Match-code endpoints of the online hub.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/online/friendly", post(create_friendly_code))
        .route("/online/tournament", post(create_tournament_code))
        .route("/online/join", post(join_match))
}

/// Create a friendly match code.
#[utoipa::path(
    post,
    path = "/online/friendly",
    tag = "online",
    request_body = FriendlyCodeRequest,
    responses((status = 200, description = "Generated code", body = MatchCodeResponse))
)]
pub async fn create_friendly_code(
    State(state): State<SharedState>,
    Json(payload): Json<FriendlyCodeRequest>,
) -> Result<Json<MatchCodeResponse>, AppError> {
    Ok(Json(
        session_service::create_friendly_code(&state, payload.categories, payload.difficulty)
            .await?,
    ))
}

/// Create a tournament code with three drawn categories.
#[utoipa::path(
    post,
    path = "/online/tournament",
    tag = "online",
    request_body = TournamentCodeRequest,
    responses((status = 200, description = "Generated code", body = MatchCodeResponse))
)]
pub async fn create_tournament_code(
    State(state): State<SharedState>,
    Json(payload): Json<TournamentCodeRequest>,
) -> Result<Json<MatchCodeResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::create_tournament_code(&state, &payload.name, payload.difficulty)
            .await?,
    ))
}

/// Join the match a code describes and start its round.
#[utoipa::path(
    post,
    path = "/online/join",
    tag = "online",
    request_body = JoinMatchRequest,
    responses(
        (status = 200, description = "The started round", body = SessionSnapshot),
        (status = 422, description = "invalid code")
    )
)]
pub async fn join_match(
    State(state): State<SharedState>,
    Json(payload): Json<JoinMatchRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(session_service::join_match(&state, &payload.code).await?))
}
