use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::auth::{LoginRequest, SignupRequest, SignupResponse, UserResponse},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Identity endpoints driving the login screen.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Sign in and leave the login screen.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;
    Ok(Json(auth_service::login(&state, payload).await?))
}

/// Register a new user without signing in.
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses((status = 200, description = "Signup outcome", body = SignupResponse))
)]
pub async fn signup(
    State(state): State<SharedState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    payload.validate()?;
    Ok(Json(auth_service::signup(&state, payload).await?))
}

/// Sign out and reset the session to the login screen.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses((status = 204, description = "Signed out"))
)]
pub async fn logout(State(state): State<SharedState>) -> Result<StatusCode, AppError> {
    auth_service::logout(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Currently signed-in user.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Signed-in user", body = UserResponse),
        (status = 401, description = "Nobody is signed in")
    )
)]
pub async fn me(State(state): State<SharedState>) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(auth_service::current_user(&state).await?))
}
