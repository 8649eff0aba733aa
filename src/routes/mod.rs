use axum::Router;

use crate::state::SharedState;

pub mod checkout;
pub mod docs;
pub mod health;
pub mod matches;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(matches::router())
        .merge(checkout::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
