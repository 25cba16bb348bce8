//! OpenAPI document for the HTTP surface.

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Generated OpenAPI description.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "UFO:AI master server"),
    paths(
        crate::api::handlers::masterserver::masterserver_handler,
        crate::api::handlers::system::health_handler,
    ),
    components(schemas(crate::api::handlers::system::HealthResponse)),
    tags(
        (name = "Master server", description = "Game server discovery protocol"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Path of the JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Serves the OpenAPI JSON and, with the `swagger-ui` feature, Swagger UI.
pub fn routes() -> Router<AppState> {
    #[cfg(feature = "swagger-ui")]
    {
        Router::new().merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()),
        )
    }
    #[cfg(not(feature = "swagger-ui"))]
    {
        use axum::Json;
        use axum::routing::get;

        Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
    }
}
