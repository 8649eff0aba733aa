use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live darts match engine.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::create_match,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::record_throw,
        crate::routes::matches::undo_last_throw,
        crate::routes::matches::finish_leg,
        crate::routes::matches::finish_match,
        crate::routes::checkout::checkout_advice,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::ThrowRequest,
            crate::dto::matches::UndoRequest,
            crate::dto::matches::LiveMatchView,
            crate::dto::matches::ThrowResponse,
            crate::dto::matches::UndoResponse,
            crate::dto::matches::LegFinishResponse,
            crate::dto::matches::MatchReport,
            crate::dto::checkout::CheckoutAdvice,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Live match scoring operations"),
        (name = "checkout", description = "Read-only checkout queries"),
    )
)]
pub struct ApiDoc;
