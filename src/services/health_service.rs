use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether rounds can be generated or will come from the fallback set.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if state.questions().provider_available() {
        HealthResponse::ok()
    } else {
        warn!("question provider unavailable (degraded mode)");
        HealthResponse::degraded()
    }
}
