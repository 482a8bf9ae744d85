//! Identity Store boundary: opaque login/session persistence.

mod file;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use file::FileIdentityStore;

/// Result alias for identity store operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Signed-in user as exposed to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Login identifier.
    pub identifier: String,
    /// Name shown in the interface.
    pub display_name: String,
}

/// Outcome of a signup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignupOutcome {
    /// The account was created and signed in.
    Success,
    /// Another account already uses this identifier.
    IdentifierTaken,
    /// Another account already uses this display name.
    DisplayNameTaken,
}

/// Failures of the persistence medium itself.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The store file could not be read.
    #[error("failed to read identity store `{path}`")]
    Read {
        /// Location of the store file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The store file could not be written.
    #[error("failed to write identity store `{path}`")]
    Write {
        /// Location of the store file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The store file does not hold valid JSON.
    #[error("identity store `{path}` is corrupt")]
    Corrupt {
        /// Location of the store file.
        path: String,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Abstraction over the login/session persistence layer.
pub trait IdentityStore: Send + Sync {
    /// Check credentials; on success the user becomes the current session user.
    fn login(
        &self,
        identifier: String,
        secret: String,
    ) -> BoxFuture<'static, IdentityResult<Option<User>>>;
    /// Register a new user. Does not sign them in.
    fn signup(
        &self,
        identifier: String,
        secret: String,
        display_name: String,
    ) -> BoxFuture<'static, IdentityResult<SignupOutcome>>;
    /// User of the persisted session, if any.
    fn current_user(&self) -> BoxFuture<'static, IdentityResult<Option<User>>>;
    /// Forget the persisted session.
    fn logout(&self) -> BoxFuture<'static, IdentityResult<()>>;
}
