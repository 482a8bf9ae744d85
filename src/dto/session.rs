use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{round::RoundView, validation::validate_label},
    state::{
        game::{Category, Difficulty, Language, Mode, Settings},
        roster::{Avatar, Player, Team, TeamSlot},
        state_machine::{GamePhase, Session},
    },
};

/// Full projection of the session pushed to clients after every transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    /// Current phase of the session.
    pub phase: GamePhase,
    /// Selected game mode.
    pub mode: Mode,
    /// Interface language.
    pub language: Language,
    /// Increments on every accepted session event.
    pub version: u64,
    /// Settings chosen so far.
    pub settings: SettingsSummary,
    /// Both teams in slot order.
    pub teams: Vec<TeamSummary>,
    /// Round in progress, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundView>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            phase: session.phase,
            mode: session.mode,
            language: session.language,
            version: session.version,
            settings: SettingsSummary::from(&session.settings),
            teams: session
                .roster
                .teams()
                .into_iter()
                .map(TeamSummary::from)
                .collect(),
            round: session.round.as_ref().map(RoundView::from),
        }
    }
}

/// Settings captured so far during setup.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingsSummary {
    /// Chosen difficulty, once picked.
    pub difficulty: Option<Difficulty>,
    /// Chosen categories; empty until picked.
    pub categories: Vec<Category>,
    /// Tournament label, if any.
    pub tournament_name: Option<String>,
}

impl From<&Settings> for SettingsSummary {
    fn from(settings: &Settings) -> Self {
        Self {
            difficulty: settings.difficulty,
            categories: settings
                .categories
                .as_ref()
                .map(|set| set.as_slice().to_vec())
                .unwrap_or_default(),
            tournament_name: settings.tournament_name.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Public projection of a team exposed to REST/SSE clients.
pub struct TeamSummary {
    /// Slot the team occupies.
    pub slot: TeamSlot,
    /// Display name.
    pub name: String,
    /// Avatar shown next to the name.
    pub avatar: Avatar,
    /// Sum of the players' scores.
    pub total_score: u32,
    /// Players in registration order.
    pub players: Vec<PlayerSummary>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            slot: team.slot,
            name: team.name.clone(),
            avatar: team.avatar.clone(),
            total_score: team.total_score,
            players: team.players.iter().map(PlayerSummary::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
/// Player as listed under its team.
pub struct PlayerSummary {
    /// Player identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Points earned so far.
    pub score: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            score: player.score,
        }
    }
}

/// Switch the display language.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LanguageRequest {
    /// Language to switch to.
    pub language: Language,
}

/// Pick a game mode from the main menu.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ModeRequest {
    /// Mode to enter.
    pub mode: Mode,
}

/// Add a player to a team during setup.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddPlayerRequest {
    /// Name of the new player.
    #[validate(custom(function = "validate_label"))]
    pub name: String,
}

/// Rename a team and/or change its avatar. Omitted fields are left untouched.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTeamRequest {
    /// New team name.
    #[serde(default)]
    #[validate(custom(function = "validate_label"))]
    pub name: Option<String>,
    /// New team avatar.
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// Difficulty choice; tournaments may name themselves at the same step.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DifficultyRequest {
    /// Difficulty of the round.
    pub difficulty: Difficulty,
    /// Blank or missing names fall back to the localized default.
    #[serde(default)]
    #[validate(length(max = 40))]
    pub tournament_name: Option<String>,
}

/// Category of the round; mixed rounds only come from tournaments and match codes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    /// Category picked from the mode's pool.
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::round::DEFAULT_COUNTDOWN;

    #[test]
    fn fresh_session_snapshot_lists_both_default_teams() {
        let session = Session::new(Language::Arabic, DEFAULT_COUNTDOWN);
        let snapshot = SessionSnapshot::from(&session);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["phase"], "LOGIN");
        assert_eq!(json["language"], "ar");
        assert_eq!(json["teams"][0]["name"], "Team A");
        assert_eq!(json["teams"][1]["slot"], "B");
        assert!(json.get("round").is_none());
    }

    #[test]
    fn category_request_names_one_category() {
        let body = r#"{"category": "COLORS_SHAPES"}"#;
        let request: CategoryRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.category, Category::ColorsShapes);

        let body = r#"{"category": ["MATH", "CARS"]}"#;
        assert!(serde_json::from_str::<CategoryRequest>(body).is_err());
    }

    #[test]
    fn blank_player_names_fail_validation() {
        let request = AddPlayerRequest { name: "  ".into() };
        assert!(request.validate().is_err());

        let request = UpdateTeamRequest {
            name: None,
            avatar: None,
        };
        assert!(request.validate().is_ok());
    }
}
