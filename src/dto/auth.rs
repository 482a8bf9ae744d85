use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::identity::{SignupOutcome, User},
    dto::validation::validate_label,
};

/// Credentials for an existing account.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Account identifier, usually an email address.
    #[validate(length(min = 1))]
    pub identifier: String,
    /// Account password.
    #[validate(length(min = 1))]
    pub secret: String,
}

/// Registration details. The display name defaults to the identifier's local part.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignupRequest {
    /// Email address used to sign in.
    #[validate(email)]
    pub identifier: String,
    /// Password of at least six characters.
    #[validate(length(min = 6))]
    pub secret: String,
    /// Optional name shown in the interface.
    #[serde(default)]
    #[validate(custom(function = "validate_label"))]
    pub display_name: Option<String>,
}

/// Signed-in user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// Login identifier.
    pub identifier: String,
    /// Name shown in the interface.
    pub display_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            identifier: user.identifier,
            display_name: user.display_name,
        }
    }
}

/// Result of a registration attempt. Registering never signs the user in.
#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    /// Whether the account was created, or which field clashed.
    pub outcome: SignupOutcome,
}
