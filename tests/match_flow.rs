//! Full matches driven through the service layer, the way the HTTP handlers do.

use std::sync::Arc;

use futures::future::BoxFuture;
use sharq_gharb_back::{
    config::AppConfig,
    dao::{
        identity::FileIdentityStore,
        image::{ImageError, ImageWarmer},
        provider::{
            ProviderError, ProviderQuestion, ProviderResult, QuestionProvider, QuestionRequest,
        },
    },
    dto::auth::{LoginRequest, SignupRequest},
    services::{
        auth_service, health_service, question_service::QuestionPipeline, round_service,
        session_service,
    },
    state::{
        AppState, SharedState,
        game::{Category, CategorySet, Difficulty, Mode},
        roster::{MatchOutcome, TeamSlot},
        round::Adjudication,
        state_machine::GamePhase,
    },
};

/// Provider that either always answers with the same records or is offline.
struct ScriptedProvider {
    records: Option<Vec<ProviderQuestion>>,
}

impl QuestionProvider for ScriptedProvider {
    fn generate(
        &self,
        _request: QuestionRequest,
    ) -> BoxFuture<'static, ProviderResult<Vec<ProviderQuestion>>> {
        let outcome = match &self.records {
            Some(records) => Ok(records.clone()),
            None => Err(ProviderError::MissingCredentials { var: "API_KEY" }),
        };
        Box::pin(async move { outcome })
    }

    fn is_available(&self) -> bool {
        self.records.is_some()
    }
}

struct NoopWarmer;

impl ImageWarmer for NoopWarmer {
    fn warm(&self, _url: String) -> BoxFuture<'static, Result<(), ImageError>> {
        Box::pin(async { Ok(()) })
    }
}

fn capital_question(text: &str) -> ProviderQuestion {
    ProviderQuestion {
        text: text.into(),
        options: vec!["Muscat".into(), "Doha".into(), "Amman".into(), "Rabat".into()],
        correct_answer: "Muscat".into(),
        image_url: None,
        country_code: None,
        explanation: Some("Muscat is the capital of Oman.".into()),
    }
}

fn app(records: Option<Vec<ProviderQuestion>>, questions_per_round: usize) -> SharedState {
    let config = AppConfig {
        questions_per_round,
        ..AppConfig::default()
    };
    let pipeline = QuestionPipeline::new(
        Arc::new(ScriptedProvider { records }),
        Arc::new(NoopWarmer),
        &config,
    );
    let identity_path = std::env::temp_dir()
        .join(format!("sharq-gharb-flow-{}", uuid::Uuid::new_v4()))
        .join("identity.json");
    AppState::new(config, pipeline, Arc::new(FileIdentityStore::new(identity_path)))
}

async fn sign_in(state: &SharedState) {
    auth_service::signup(
        state,
        SignupRequest {
            identifier: "host@example.com".into(),
            secret: "sesame".into(),
            display_name: Some("Host".into()),
        },
    )
    .await
    .unwrap();
    auth_service::login(
        state,
        LoginRequest {
            identifier: "host@example.com".into(),
            secret: "sesame".into(),
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn evenly_split_match_ends_in_a_draw_without_mvp_panel() {
    let records = vec![capital_question("Capital of Oman?"), capital_question("Again?")];
    let state = app(Some(records), 2);
    sign_in(&state).await;
    assert_eq!(session_service::snapshot(&state).await.phase, GamePhase::MainMenu);

    session_service::select_mode(&state, Mode::Classic).await.unwrap();
    let sami = session_service::add_player(&state, TeamSlot::A, "Sami").await.unwrap();
    let noor = session_service::add_player(&state, TeamSlot::B, "Noor").await.unwrap();
    session_service::complete_setup(&state).await.unwrap();
    session_service::choose_difficulty(&state, Difficulty::Hard, None)
        .await
        .unwrap();
    let playing = session_service::choose_category(&state, CategorySet::single(Category::Geography))
        .await
        .unwrap();
    assert_eq!(playing.phase, GamePhase::Playing);
    assert_eq!(playing.round.as_ref().unwrap().total, 2);

    let first = round_service::answer(&state, "Muscat").await.unwrap();
    assert_eq!(first.adjudication, Adjudication::Correct);
    round_service::attribute(&state, Some(sami)).await.unwrap();

    round_service::answer(&state, "Muscat").await.unwrap();
    let last = round_service::attribute(&state, Some(noor)).await.unwrap();
    assert_eq!(last.session.phase, GamePhase::GameOver);

    let results = round_service::results(&state).await.unwrap();
    assert_eq!(results.outcome, MatchOutcome::Draw);
    assert!(results.teams.iter().all(|team| team.total_score == 10));
    assert!(!results.mvp.unwrap().show_panel);
}

#[tokio::test]
async fn provider_outage_still_serves_a_full_round() {
    let state = app(None, 10);
    assert_eq!(health_service::health_status(&state).await.status, "degraded");
    sign_in(&state).await;

    session_service::select_mode(&state, Mode::Kids).await.unwrap();
    session_service::complete_setup(&state).await.unwrap();
    let playing = session_service::choose_category(&state, CategorySet::single(Category::Animals))
        .await
        .unwrap();

    assert_eq!(playing.phase, GamePhase::Playing);
    assert_eq!(playing.settings.difficulty, Some(Difficulty::Easy));
    assert_eq!(playing.round.unwrap().total, 10);
}

#[tokio::test]
async fn tournament_codes_can_be_joined() {
    let state = app(None, 3);
    sign_in(&state).await;

    session_service::apply(
        &state,
        sharq_gharb_back::state::state_machine::SessionEvent::OpenOnlineMenu,
    )
    .await
    .unwrap();
    let code = session_service::create_tournament_code(&state, "  Ramadan Cup ", Difficulty::Medium)
        .await
        .unwrap();
    assert_eq!(code.categories.len(), 3);
    assert_eq!(code.tournament_name.as_deref(), Some("Ramadan Cup"));

    let joined = session_service::join_match(&state, &code.code).await.unwrap();
    assert_eq!(joined.phase, GamePhase::Playing);
    assert_eq!(joined.settings.categories, code.categories);
    assert_eq!(joined.settings.difficulty, Some(Difficulty::Medium));

    let rejected = session_service::join_match(&state, "not-a-code").await;
    assert!(rejected.is_err());
}
