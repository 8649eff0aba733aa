use serde::Serialize;
use utoipa::ToSchema;

use crate::state::rules;

/// Read-only checkout advice for a remaining score.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutAdvice {
    /// Score the advice applies to.
    pub score: u16,
    /// Double that finishes the score with a single dart, if any.
    pub direct_double: Option<u16>,
    /// Fewest darts (1..=3) a checkout could take, if any.
    pub minimum_darts: Option<u8>,
    /// Conventional call-out for well-known routes.
    pub suggestion: Option<String>,
}

impl CheckoutAdvice {
    /// Compute the advice for a score through the rule validator's
    /// read-only queries.
    pub fn for_score(score: u16) -> Self {
        Self {
            score,
            direct_double: rules::direct_checkout_double(score),
            minimum_darts: rules::minimum_checkout_darts(score),
            suggestion: rules::checkout_suggestion(score).map(str::to_string),
        }
    }
}
