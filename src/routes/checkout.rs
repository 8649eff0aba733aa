use axum::{Json, Router, extract::Path, routing::get};

use crate::{dto::checkout::CheckoutAdvice, state::SharedState};

/// Routes exposing the rule validator's read-only checkout queries.
pub fn router() -> Router<SharedState> {
    Router::new().route("/checkout/{score}", get(checkout_advice))
}

/// Checkout advice for a remaining score.
#[utoipa::path(
    get,
    path = "/checkout/{score}",
    tag = "checkout",
    params(("score" = u16, Path, description = "Remaining score to check out")),
    responses(
        (status = 200, description = "Checkout advice", body = CheckoutAdvice)
    )
)]
pub async fn checkout_advice(Path(score): Path<u16>) -> Json<CheckoutAdvice> {
    Json(CheckoutAdvice::for_score(score))
}
