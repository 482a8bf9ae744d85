//! Login phase handling on top of the identity store.

use tracing::{info, warn};

use crate::{
    dto::auth::{LoginRequest, SignupRequest, SignupResponse, UserResponse},
    error::ServiceError,
    state::{
        SharedState,
        state_machine::{GamePhase, SessionEvent},
    },
};

/// Check credentials and leave the login screen on success.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<UserResponse, ServiceError> {
    let user = state
        .identity()
        .login(request.identifier.trim().to_owned(), request.secret)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".into()))?;
    enter_main_menu(state).await?;
    Ok(UserResponse::from(user))
}

/// Register a user. The session stays on the login screen.
pub async fn signup(
    state: &SharedState,
    request: SignupRequest,
) -> Result<SignupResponse, ServiceError> {
    let outcome = state
        .identity()
        .signup(
            request.identifier.trim().to_owned(),
            request.secret,
            request.display_name.unwrap_or_default(),
        )
        .await?;
    info!(outcome = ?outcome, "signup attempt");
    Ok(SignupResponse { outcome })
}

/// User of the persisted session.
pub async fn current_user(state: &SharedState) -> Result<UserResponse, ServiceError> {
    state
        .identity()
        .current_user()
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| ServiceError::Unauthorized("nobody is signed in".into()))
}

/// Forget the persisted session and reset the game to the login screen.
pub async fn logout(state: &SharedState) -> Result<(), ServiceError> {
    state.identity().logout().await?;
    state.dispatch(SessionEvent::LoggedOut).await?;
    Ok(())
}

/// Skip the login screen at start-up when a session user was persisted.
pub async fn restore_session(state: &SharedState) {
    match state.identity().current_user().await {
        Ok(Some(user)) => {
            info!(identifier = %user.identifier, "restoring persisted session");
            if let Err(err) = enter_main_menu(state).await {
                warn!(error = %err, "failed to restore persisted session");
            }
        }
        Ok(None) => info!("no persisted session; waiting for login"),
        Err(err) => warn!(error = %err, "identity store unavailable; waiting for login"),
    }
}

async fn enter_main_menu(state: &SharedState) -> Result<(), ServiceError> {
    let phase = state.read_session(|session| session.phase).await;
    if phase == GamePhase::Login {
        state.dispatch(SessionEvent::LoggedIn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::identity::SignupOutcome,
        services::question_service::tests::FakeProvider,
        state::tests::test_state,
    };

    fn signup_request(identifier: &str) -> SignupRequest {
        SignupRequest {
            identifier: identifier.into(),
            secret: "open sesame".into(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn signup_does_not_sign_in() {
        let state = test_state(FakeProvider::Unavailable, AppConfig::default());
        let response = signup(&state, signup_request("noor@example.com")).await.unwrap();
        assert_eq!(response.outcome, SignupOutcome::Success);
        assert!(matches!(
            current_user(&state).await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert_eq!(state.snapshot().await.phase, GamePhase::Login);
    }

    #[tokio::test]
    async fn login_moves_to_main_menu_and_logout_resets() {
        let state = test_state(FakeProvider::Unavailable, AppConfig::default());
        signup(&state, signup_request("noor@example.com")).await.unwrap();

        let bad = LoginRequest {
            identifier: "noor@example.com".into(),
            secret: "wrong".into(),
        };
        assert!(matches!(
            login(&state, bad).await,
            Err(ServiceError::Unauthorized(_))
        ));

        let good = LoginRequest {
            identifier: "noor@example.com".into(),
            secret: "open sesame".into(),
        };
        let user = login(&state, good).await.unwrap();
        assert_eq!(user.display_name, "noor");
        assert_eq!(state.snapshot().await.phase, GamePhase::MainMenu);

        logout(&state).await.unwrap();
        assert_eq!(state.snapshot().await.phase, GamePhase::Login);
        assert!(current_user(&state).await.is_err());
    }

    #[tokio::test]
    async fn persisted_user_skips_the_login_screen() {
        let state = test_state(FakeProvider::Unavailable, AppConfig::default());
        signup(&state, signup_request("sami@example.com")).await.unwrap();
        state
            .identity()
            .login("sami@example.com".into(), "open sesame".into())
            .await
            .unwrap();

        restore_session(&state).await;
        assert_eq!(state.snapshot().await.phase, GamePhase::MainMenu);
    }
}
