use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::{validate_code_token, validate_label},
    services::match_code::MatchKind,
    state::game::{Category, CategorySet, Difficulty, MatchSettings},
};

/// Create a friendly match code from hand-picked settings.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FriendlyCodeRequest {
    /// One to three categories for the match.
    #[schema(value_type = Vec<Category>)]
    pub categories: CategorySet,
    /// Difficulty of the match.
    pub difficulty: Difficulty,
}

/// Create a tournament code; categories are drawn at random.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TournamentCodeRequest {
    /// Tournament label shown during play.
    #[validate(custom(function = "validate_label"))]
    pub name: String,
    /// Difficulty of the match.
    pub difficulty: Difficulty,
}

/// Join a match described by a code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinMatchRequest {
    /// Code shared by the host, with its `SG-` prefix.
    #[validate(custom(function = "validate_code_token"))]
    pub code: String,
}

/// A freshly generated code and the settings it carries.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchCodeResponse {
    /// Code to share with the other side.
    pub code: String,
    /// Whether the code is for a friendly or a tournament.
    pub kind: MatchKind,
    /// Categories the match will draw from.
    pub categories: Vec<Category>,
    /// Difficulty of the match.
    pub difficulty: Difficulty,
    /// Tournament label, absent for friendlies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
}

impl MatchCodeResponse {
    /// Pair a generated code with the settings it encodes.
    pub fn new(code: String, kind: MatchKind, settings: MatchSettings) -> Self {
        Self {
            code,
            kind,
            categories: settings.categories.as_slice().to_vec(),
            difficulty: settings.difficulty,
            tournament_name: settings.tournament_name,
        }
    }
}
