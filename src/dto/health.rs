use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" when no question provider is reachable and every
    /// round is served from the fallback set.
    pub status: String,
}

impl HealthResponse {
    /// Every collaborator is reachable.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Rounds are served from the fallback set.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
