use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health payload and live registry size.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.active_match_count())
}
