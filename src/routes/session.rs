use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session::{
        AddPlayerRequest, CategoryRequest, DifficultyRequest, LanguageRequest, ModeRequest,
        SessionSnapshot, UpdateTeamRequest,
    },
    error::AppError,
    services::session_service,
    state::{SharedState, game::CategorySet, roster::TeamSlot, state_machine::SessionEvent},
};

/// Menu navigation, team setup and settings capture.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/language", post(set_language))
        .route("/session/mode", post(select_mode))
        .route("/session/online", post(open_online_menu))
        .route("/session/back", post(back))
        .route("/session/restart", post(restart))
        .route("/session/teams/{slot}", put(update_team))
        .route("/session/teams/{slot}/players", post(add_player))
        .route("/session/teams/{slot}/players/{id}", delete(remove_player))
        .route("/session/setup/complete", post(complete_setup))
        .route("/session/difficulty", post(choose_difficulty))
        .route("/session/category", post(choose_category))
}

/// Current session snapshot.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Session snapshot", body = SessionSnapshot))
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionSnapshot> {
    Json(session_service::snapshot(&state).await)
}

/// Switch the display language. Refused while loading or playing.
#[utoipa::path(
    post,
    path = "/session/language",
    tag = "session",
    request_body = LanguageRequest,
    responses(
        (status = 200, description = "Language changed", body = SessionSnapshot),
        (status = 409, description = "Not allowed in the current phase")
    )
)]
pub async fn set_language(
    State(state): State<SharedState>,
    Json(payload): Json<LanguageRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::set_language(&state, payload.language).await?,
    ))
}

/// Pick a game mode from the main menu.
#[utoipa::path(
    post,
    path = "/session/mode",
    tag = "session",
    request_body = ModeRequest,
    responses((status = 200, description = "Mode selected", body = SessionSnapshot))
)]
pub async fn select_mode(
    State(state): State<SharedState>,
    Json(payload): Json<ModeRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::select_mode(&state, payload.mode).await?))
}

/// Enter the online hub.
#[utoipa::path(
    post,
    path = "/session/online",
    tag = "session",
    responses((status = 200, description = "Online menu opened", body = SessionSnapshot))
)]
pub async fn open_online_menu(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::apply(&state, SessionEvent::OpenOnlineMenu).await?,
    ))
}

/// Step back to the previous screen.
#[utoipa::path(
    post,
    path = "/session/back",
    tag = "session",
    responses((status = 200, description = "Moved back", body = SessionSnapshot))
)]
pub async fn back(State(state): State<SharedState>) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::apply(&state, SessionEvent::Back).await?))
}

/// Reset everything and return to the main menu.
#[utoipa::path(
    post,
    path = "/session/restart",
    tag = "session",
    responses((status = 200, description = "Session reset", body = SessionSnapshot))
)]
pub async fn restart(State(state): State<SharedState>) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::apply(&state, SessionEvent::Restart).await?,
    ))
}

/// Rename a team or change its avatar.
#[utoipa::path(
    put,
    path = "/session/teams/{slot}",
    tag = "session",
    params(("slot" = TeamSlot, Path, description = "Team slot, A or B")),
    request_body = UpdateTeamRequest,
    responses((status = 200, description = "Team updated", body = SessionSnapshot))
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Path(slot): Path<TeamSlot>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::update_team(&state, slot, payload).await?,
    ))
}

/// Register a player on a team.
#[utoipa::path(
    post,
    path = "/session/teams/{slot}/players",
    tag = "session",
    params(("slot" = TeamSlot, Path, description = "Team slot, A or B")),
    request_body = AddPlayerRequest,
    responses(
        (status = 200, description = "Player added", body = SessionSnapshot),
        (status = 409, description = "Name already registered")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Path(slot): Path<TeamSlot>,
    Json(payload): Json<AddPlayerRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.validate()?;
    session_service::add_player(&state, slot, &payload.name).await?;
    Ok(Json(session_service::snapshot(&state).await))
}

/// Remove a player from a team.
#[utoipa::path(
    delete,
    path = "/session/teams/{slot}/players/{id}",
    tag = "session",
    params(
        ("slot" = TeamSlot, Path, description = "Team slot, A or B"),
        ("id" = Uuid, Path, description = "Player identifier")
    ),
    responses(
        (status = 200, description = "Player removed", body = SessionSnapshot),
        (status = 404, description = "No such player on the team")
    )
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Path((slot, id)): Path<(TeamSlot, Uuid)>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::remove_player(&state, slot, id).await?,
    ))
}

/// Continue from team setup.
#[utoipa::path(
    post,
    path = "/session/setup/complete",
    tag = "session",
    responses(
        (status = 200, description = "Next step, or the started round", body = SessionSnapshot),
        (status = 503, description = "No questions could be produced")
    )
)]
pub async fn complete_setup(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(session_service::complete_setup(&state).await?))
}

/// Pick the difficulty tier; tournaments start loading right after.
#[utoipa::path(
    post,
    path = "/session/difficulty",
    tag = "session",
    request_body = DifficultyRequest,
    responses(
        (status = 200, description = "Next step, or the started round", body = SessionSnapshot),
        (status = 503, description = "No questions could be produced")
    )
)]
pub async fn choose_difficulty(
    State(state): State<SharedState>,
    Json(payload): Json<DifficultyRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(
        session_service::choose_difficulty(&state, payload.difficulty, payload.tournament_name)
            .await?,
    ))
}

/// Pick the round's category and start loading it.
#[utoipa::path(
    post,
    path = "/session/category",
    tag = "session",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "The started round", body = SessionSnapshot),
        (status = 400, description = "Category outside the mode's pool, or more than one"),
        (status = 503, description = "No questions could be produced")
    )
)]
pub async fn choose_category(
    State(state): State<SharedState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(
        session_service::choose_category(&state, CategorySet::single(payload.category))
            .await?,
    ))
}
