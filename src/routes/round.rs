use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::round::{
        AnswerRequest, AnswerResponse, AttributeRequest, LifelineRequest, ProgressResponse,
        ResultsResponse, RoundView,
    },
    error::AppError,
    services::round_service,
    state::SharedState,
};

/// Round Controller endpoints and the final results.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/round/answer", post(answer))
        .route("/round/attribute", post(attribute))
        .route("/round/next", post(next))
        .route("/round/lifeline", post(lifeline))
        .route("/results", get(results))
}

/// Select an option on the current question.
#[utoipa::path(
    post,
    path = "/round/answer",
    tag = "round",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Adjudicated selection", body = AnswerResponse),
        (status = 400, description = "Option not selectable"),
        (status = 409, description = "Question already answered")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    payload.validate()?;
    Ok(Json(round_service::answer(&state, &payload.option).await?))
}

/// Attribute a correct answer to a player, or to nobody.
#[utoipa::path(
    post,
    path = "/round/attribute",
    tag = "round",
    request_body = AttributeRequest,
    responses(
        (
            status = 200,
            description = "Score applied and question advanced",
            body = ProgressResponse
        ),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn attribute(
    State(state): State<SharedState>,
    Json(payload): Json<AttributeRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    Ok(Json(
        round_service::attribute(&state, payload.player_id).await?,
    ))
}

/// Leave a question answered incorrectly.
#[utoipa::path(
    post,
    path = "/round/next",
    tag = "round",
    responses((status = 200, description = "Question advanced", body = ProgressResponse))
)]
pub async fn next(State(state): State<SharedState>) -> Result<Json<ProgressResponse>, AppError> {
    Ok(Json(round_service::next(&state).await?))
}

/// Spend a lifeline on the current question.
#[utoipa::path(
    post,
    path = "/round/lifeline",
    tag = "round",
    request_body = LifelineRequest,
    responses(
        (status = 200, description = "Lifeline applied", body = RoundView),
        (status = 409, description = "Lifeline already used or question answered")
    )
)]
pub async fn lifeline(
    State(state): State<SharedState>,
    Json(payload): Json<LifelineRequest>,
) -> Result<Json<RoundView>, AppError> {
    Ok(Json(
        round_service::use_lifeline(&state, payload.team, payload.kind).await?,
    ))
}

/// Final results once the round is over.
#[utoipa::path(
    get,
    path = "/results",
    tag = "round",
    responses(
        (status = 200, description = "Match results", body = ResultsResponse),
        (status = 409, description = "The round is not over")
    )
)]
pub async fn results(State(state): State<SharedState>) -> Result<Json<ResultsResponse>, AppError> {
    Ok(Json(round_service::results(&state).await?))
}
