use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Sharq > Gharb.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::session_stream,
        crate::routes::auth::login,
        crate::routes::auth::signup,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::session::get_session,
        crate::routes::session::set_language,
        crate::routes::session::select_mode,
        crate::routes::session::open_online_menu,
        crate::routes::session::back,
        crate::routes::session::restart,
        crate::routes::session::update_team,
        crate::routes::session::add_player,
        crate::routes::session::remove_player,
        crate::routes::session::complete_setup,
        crate::routes::session::choose_difficulty,
        crate::routes::session::choose_category,
        crate::routes::online::create_friendly_code,
        crate::routes::online::create_tournament_code,
        crate::routes::online::join_match,
        crate::routes::round::answer,
        crate::routes::round::attribute,
        crate::routes::round::next,
        crate::routes::round::lifeline,
        crate::routes::round::results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::CountdownEvent,
            crate::dto::sse::QuestionChangedEvent,
            crate::dto::sse::AnswerAdjudicatedEvent,
            crate::dto::sse::ScoreChangedEvent,
            crate::dto::sse::RosterChangedEvent,
            crate::dto::session::SessionSnapshot,
            crate::dto::round::RoundView,
            crate::dto::round::QuestionView,
            crate::dto::round::ResultsResponse,
            crate::state::state_machine::GamePhase,
            crate::state::game::Category,
            crate::state::game::Difficulty,
            crate::state::game::Mode,
            crate::state::game::Language,
            crate::state::roster::TeamSlot,
            crate::state::roster::Avatar,
            crate::state::roster::MatchOutcome,
            crate::state::lifeline::LifelineKind,
            crate::state::round::QuestionStatus,
            crate::state::round::Adjudication,
            crate::services::match_code::MatchKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "auth", description = "Login, signup and logout"),
        (name = "session", description = "Menus, team setup and round settings"),
        (name = "online", description = "Friendly and tournament match codes"),
        (name = "round", description = "Answering, lifelines and results"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse",
            "/auth/login",
            "/session",
            "/session/teams/{slot}/players/{id}",
            "/online/join",
            "/round/lifeline",
            "/results",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} is missing");
        }
    }
}
