use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Path the Swagger UI is mounted under.
const SWAGGER_UI_PATH: &str = "/docs";
/// Path serving the raw OpenAPI JSON document.
const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

/// Interactive documentation for the scoring API: Swagger UI over the
/// generated OpenAPI document.
pub fn router(state: SharedState) -> Router<SharedState> {
    let swagger: Router<SharedState> = SwaggerUi::new(SWAGGER_UI_PATH)
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into();

    swagger.with_state(state)
}
