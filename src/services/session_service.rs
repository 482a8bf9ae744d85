//! Menu navigation, team setup, settings capture and round acquisition.

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    dao::provider::QuestionRequest,
    dto::{
        online::MatchCodeResponse,
        session::{SessionSnapshot, UpdateTeamRequest},
    },
    error::ServiceError,
    services::{
        match_code::{self, MatchKind},
        sse_events::broadcast_roster_changed,
    },
    state::{
        SharedState,
        game::{CategorySet, Difficulty, Language, MatchSettings, Mode, draw_tournament_categories},
        roster::TeamSlot,
        state_machine::{GamePhase, Session, SessionEvent},
    },
};

/// Current session as seen by clients.
pub async fn snapshot(state: &SharedState) -> SessionSnapshot {
    state.read_session(|session| SessionSnapshot::from(session)).await
}

/// Apply a navigation or settings event that never starts a round.
pub async fn apply(
    state: &SharedState,
    event: SessionEvent,
) -> Result<SessionSnapshot, ServiceError> {
    let session = state.dispatch(event).await?;
    Ok(SessionSnapshot::from(&session))
}

/// Switch the interface language.
pub async fn set_language(
    state: &SharedState,
    language: Language,
) -> Result<SessionSnapshot, ServiceError> {
    apply(state, SessionEvent::SetLanguage(language)).await
}

/// Enter the setup flow for `mode`.
pub async fn select_mode(state: &SharedState, mode: Mode) -> Result<SessionSnapshot, ServiceError> {
    apply(state, SessionEvent::SelectMode(mode)).await
}

/// Register a player on `slot`. Only allowed while setting up teams.
pub async fn add_player(
    state: &SharedState,
    slot: TeamSlot,
    name: &str,
) -> Result<Uuid, ServiceError> {
    state
        .with_session_mut(|session| {
            ensure_setup(session)?;
            let id = session.roster.add_player(slot, name)?;
            broadcast_roster_changed(state.sse(), &session.roster);
            Ok(id)
        })
        .await
}

/// Remove a player from a team during setup.
pub async fn remove_player(
    state: &SharedState,
    slot: TeamSlot,
    player_id: Uuid,
) -> Result<SessionSnapshot, ServiceError> {
    state
        .with_session_mut(|session| {
            ensure_setup(session)?;
            if !session.roster.remove_player(slot, player_id) {
                return Err(ServiceError::NotFound(format!(
                    "player {player_id} is not on team {slot:?}"
                )));
            }
            broadcast_roster_changed(state.sse(), &session.roster);
            Ok(SessionSnapshot::from(&*session))
        })
        .await
}

/// Rename a team and/or change its avatar. Both edits apply or neither does.
pub async fn update_team(
    state: &SharedState,
    slot: TeamSlot,
    update: UpdateTeamRequest,
) -> Result<SessionSnapshot, ServiceError> {
    state
        .with_session_mut(|session| {
            ensure_setup(session)?;
            let mut roster = session.roster.clone();
            if let Some(name) = update.name.as_deref() {
                roster.rename_team(slot, name)?;
            }
            if let Some(avatar) = update.avatar {
                roster.set_avatar(slot, avatar)?;
            }
            session.roster = roster;
            broadcast_roster_changed(state.sse(), &session.roster);
            Ok(SessionSnapshot::from(&*session))
        })
        .await
}

fn ensure_setup(session: &Session) -> Result<(), ServiceError> {
    if session.phase == GamePhase::Setup {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "teams can only be edited during setup (phase {:?})",
            session.phase
        )))
    }
}

/// Continue from setup; modes without further steps start loading right away.
pub async fn complete_setup(state: &SharedState) -> Result<SessionSnapshot, ServiceError> {
    advance_setup(state, SessionEvent::SetupComplete).await
}

/// Pick the round difficulty; tournaments also pass their label.
pub async fn choose_difficulty(
    state: &SharedState,
    difficulty: Difficulty,
    tournament_name: Option<String>,
) -> Result<SessionSnapshot, ServiceError> {
    advance_setup(
        state,
        SessionEvent::ChooseDifficulty {
            difficulty,
            tournament_name,
        },
    )
    .await
}

/// Pick the round category and start loading questions.
pub async fn choose_category(
    state: &SharedState,
    categories: CategorySet,
) -> Result<SessionSnapshot, ServiceError> {
    advance_setup(state, SessionEvent::ChooseCategory(categories)).await
}

/// Generate a friendly match code. Any category may be picked.
pub async fn create_friendly_code(
    state: &SharedState,
    categories: CategorySet,
    difficulty: Difficulty,
) -> Result<MatchCodeResponse, ServiceError> {
    ensure_online_menu(state).await?;
    let settings = MatchSettings {
        categories,
        difficulty,
        tournament_name: None,
    };
    let code = match_code::encode(MatchKind::Friendly, &settings);
    debug!(code = %code, "created friendly match code");
    Ok(MatchCodeResponse::new(code, MatchKind::Friendly, settings))
}

/// Generate a tournament code with three categories drawn from the tournament pool.
pub async fn create_tournament_code(
    state: &SharedState,
    name: &str,
    difficulty: Difficulty,
) -> Result<MatchCodeResponse, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a tournament needs a name".into(),
        ));
    }
    ensure_online_menu(state).await?;
    let settings = MatchSettings {
        categories: draw_tournament_categories(&mut rand::rng()),
        difficulty,
        tournament_name: Some(name.to_owned()),
    };
    let code = match_code::encode(MatchKind::Tournament, &settings);
    debug!(code = %code, "created tournament match code");
    Ok(MatchCodeResponse::new(code, MatchKind::Tournament, settings))
}

async fn ensure_online_menu(state: &SharedState) -> Result<(), ServiceError> {
    let phase = state.read_session(|session| session.phase).await;
    if phase == GamePhase::OnlineMenu {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "match codes are handled from the online menu (phase {phase:?})"
        )))
    }
}

/// Decode `code` and start a round with the settings it carries.
pub async fn join_match(state: &SharedState, code: &str) -> Result<SessionSnapshot, ServiceError> {
    let (kind, settings) = match_code::decode(code.trim())?;
    info!(kind = ?kind, difficulty = ?settings.difficulty, "joining match");
    advance_setup(state, SessionEvent::JoinMatch(settings)).await
}

async fn advance_setup(
    state: &SharedState,
    event: SessionEvent,
) -> Result<SessionSnapshot, ServiceError> {
    let session = state.dispatch(event).await?;
    if session.phase == GamePhase::Loading {
        acquire_round(state, &session).await
    } else {
        Ok(SessionSnapshot::from(&session))
    }
}

/// Acquire the round for the loading attempt `loading` describes.
///
/// The provider call and the first image warm-up run without the session
/// lock, so `Back` or `Restart` may supersede the attempt meanwhile; the
/// late result is then discarded and the current session returned.
pub async fn acquire_round(
    state: &SharedState,
    loading: &Session,
) -> Result<SessionSnapshot, ServiceError> {
    let Some(ticket) = loading.acquisition_ticket() else {
        return Ok(SessionSnapshot::from(loading));
    };

    let Some(request) = round_request(state, loading) else {
        error!(ticket, "loading without complete settings");
        return fail_acquisition(state, ticket, "settings are incomplete").await;
    };

    let questions = state.questions().fetch_batch(request).await;
    if questions.is_empty() {
        error!(ticket, "no questions could be produced for the round");
        return fail_acquisition(state, ticket, "no questions could be produced").await;
    }
    state.questions().warm_first(&questions).await;

    let count = questions.len();
    match state
        .dispatch(SessionEvent::RoundReady { ticket, questions })
        .await
    {
        Ok(session) => {
            info!(ticket, count, "round ready");
            if let Some(round) = &session.round {
                state.questions().prefetch(round.upcoming_question());
            }
            Ok(SessionSnapshot::from(&session))
        }
        Err(err) => superseded_or(state, ticket, err).await,
    }
}

fn round_request(state: &SharedState, session: &Session) -> Option<QuestionRequest> {
    let settings = &session.settings;
    Some(QuestionRequest::new(
        settings.categories.clone()?,
        settings.difficulty?,
        state.config().questions_per_round,
        session.mode,
        session.language,
    ))
}

async fn fail_acquisition(
    state: &SharedState,
    ticket: u64,
    reason: &str,
) -> Result<SessionSnapshot, ServiceError> {
    match state.dispatch(SessionEvent::AcquisitionFailed { ticket }).await {
        Ok(_) => Err(ServiceError::Acquisition(reason.to_owned())),
        Err(err) => superseded_or(state, ticket, err).await,
    }
}

/// When the loading attempt was superseded, report the session that replaced it.
async fn superseded_or(
    state: &SharedState,
    ticket: u64,
    err: ServiceError,
) -> Result<SessionSnapshot, ServiceError> {
    let session = state.snapshot().await;
    if session.acquisition_ticket() == Some(ticket) {
        return Err(err);
    }
    debug!(ticket, phase = ?session.phase, "loading attempt was superseded");
    Ok(SessionSnapshot::from(&session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::question_service::tests::FakeProvider,
        state::{
            game::Category,
            roster::Avatar,
            tests::test_state,
        },
    };

    async fn main_menu(provider: FakeProvider) -> SharedState {
        let state = test_state(provider, AppConfig::default());
        state.dispatch(SessionEvent::LoggedIn).await.unwrap();
        state
    }

    #[tokio::test]
    async fn classic_walk_reaches_play_with_fallback_questions() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::Classic).await.unwrap();
        add_player(&state, TeamSlot::A, "Sami").await.unwrap();
        add_player(&state, TeamSlot::B, "Noor").await.unwrap();
        complete_setup(&state).await.unwrap();
        choose_difficulty(&state, Difficulty::Hard, None).await.unwrap();

        let snapshot = choose_category(&state, CategorySet::single(Category::Science))
            .await
            .unwrap();
        assert_eq!(snapshot.phase, GamePhase::Playing);
        let round = snapshot.round.unwrap();
        assert_eq!(round.total, 10);
        assert_eq!(round.index, 0);
    }

    #[tokio::test]
    async fn kids_skip_difficulty_and_play_easy() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::Kids).await.unwrap();
        let snapshot = complete_setup(&state).await.unwrap();
        assert_eq!(snapshot.phase, GamePhase::Category);

        let snapshot = choose_category(&state, CategorySet::single(Category::Animals))
            .await
            .unwrap();
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.settings.difficulty, Some(Difficulty::Easy));
    }

    #[tokio::test]
    async fn classic_rejects_a_mixed_category_choice() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::Classic).await.unwrap();
        complete_setup(&state).await.unwrap();
        choose_difficulty(&state, Difficulty::Medium, None).await.unwrap();

        let mixed = CategorySet::new([Category::Math, Category::Cars]).unwrap();
        let err = choose_category(&state, mixed).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let snapshot = snapshot(&state).await;
        assert_eq!(snapshot.phase, GamePhase::Category);
        assert!(snapshot.settings.categories.is_empty());
    }

    #[tokio::test]
    async fn tournament_draws_three_categories_after_difficulty() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::LocalTournament).await.unwrap();
        complete_setup(&state).await.unwrap();
        let snapshot = choose_difficulty(&state, Difficulty::Medium, Some("  ".into()))
            .await
            .unwrap();

        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.settings.categories.len(), 3);
        assert_eq!(snapshot.settings.tournament_name.as_deref(), Some("بطولة محلية"));
    }

    #[tokio::test]
    async fn teams_are_only_editable_during_setup() {
        let state = main_menu(FakeProvider::Unavailable).await;
        assert!(matches!(
            add_player(&state, TeamSlot::A, "Sami").await,
            Err(ServiceError::InvalidState(_))
        ));

        select_mode(&state, Mode::Classic).await.unwrap();
        add_player(&state, TeamSlot::A, "Sami").await.unwrap();
        assert!(matches!(
            add_player(&state, TeamSlot::B, " Sami ").await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn rejected_team_updates_change_nothing() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::Classic).await.unwrap();

        let update = UpdateTeamRequest {
            name: Some("Falcons".into()),
            avatar: Some(Avatar::Token("🐧".into())),
        };
        assert!(update_team(&state, TeamSlot::A, update).await.is_err());
        assert_eq!(snapshot(&state).await.teams[0].name, "Team A");

        let update = UpdateTeamRequest {
            name: Some("Falcons".into()),
            avatar: Some(Avatar::Token("🐺".into())),
        };
        let snapshot = update_team(&state, TeamSlot::A, update).await.unwrap();
        assert_eq!(snapshot.teams[0].name, "Falcons");
        assert_eq!(snapshot.teams[0].avatar, Avatar::Token("🐺".into()));
    }

    #[tokio::test]
    async fn removing_an_unknown_player_is_not_found() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::Classic).await.unwrap();
        assert!(matches!(
            remove_player(&state, TeamSlot::A, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn codes_are_created_only_from_the_online_menu() {
        let state = main_menu(FakeProvider::Unavailable).await;
        let categories = CategorySet::single(Category::Flags);
        assert!(
            create_friendly_code(&state, categories.clone(), Difficulty::Easy)
                .await
                .is_err()
        );

        apply(&state, SessionEvent::OpenOnlineMenu).await.unwrap();
        let friendly = create_friendly_code(&state, categories, Difficulty::Easy)
            .await
            .unwrap();
        assert!(friendly.code.starts_with("SG-"));

        assert!(matches!(
            create_tournament_code(&state, "   ", Difficulty::Hard).await,
            Err(ServiceError::InvalidInput(_))
        ));
        let tournament = create_tournament_code(&state, " Ramadan Cup ", Difficulty::Hard)
            .await
            .unwrap();
        assert_eq!(tournament.categories.len(), 3);
        assert_eq!(tournament.tournament_name.as_deref(), Some("Ramadan Cup"));
    }

    #[tokio::test]
    async fn joining_with_a_code_plays_its_settings_as_classic() {
        let state = main_menu(FakeProvider::Unavailable).await;
        apply(&state, SessionEvent::OpenOnlineMenu).await.unwrap();
        let settings = MatchSettings {
            categories: CategorySet::new([Category::Math, Category::Cars]).unwrap(),
            difficulty: Difficulty::Impossible,
            tournament_name: None,
        };
        let code = match_code::encode(MatchKind::Friendly, &settings);

        let snapshot = join_match(&state, &code).await.unwrap();
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.mode, Mode::Classic);
        assert_eq!(snapshot.settings.categories, vec![Category::Math, Category::Cars]);
        assert_eq!(snapshot.settings.difficulty, Some(Difficulty::Impossible));
    }

    #[tokio::test]
    async fn malformed_codes_share_one_error() {
        let state = main_menu(FakeProvider::Unavailable).await;
        apply(&state, SessionEvent::OpenOnlineMenu).await.unwrap();
        assert!(matches!(
            join_match(&state, "XX-123").await,
            Err(ServiceError::InvalidMatchCode)
        ));
        assert!(matches!(
            join_match(&state, "SG-!!!").await,
            Err(ServiceError::InvalidMatchCode)
        ));
        assert_eq!(snapshot(&state).await.phase, GamePhase::OnlineMenu);
    }

    #[tokio::test]
    async fn back_during_loading_supersedes_the_fetch() {
        let state = main_menu(FakeProvider::Unavailable).await;
        select_mode(&state, Mode::Kids).await.unwrap();
        complete_setup(&state).await.unwrap();

        // Stop at loading by dispatching directly, then navigate away.
        let loading = state
            .dispatch(SessionEvent::ChooseCategory(CategorySet::single(Category::FruitsVeg)))
            .await
            .unwrap();
        assert_eq!(loading.phase, GamePhase::Loading);
        apply(&state, SessionEvent::Back).await.unwrap();

        let snapshot = acquire_round(&state, &loading).await.unwrap();
        assert_eq!(snapshot.phase, GamePhase::MainMenu);
        assert!(snapshot.round.is_none());
    }
}
