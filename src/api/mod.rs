//! REST API layer: route handlers, DTOs, OpenAPI and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; system endpoints live at
//! the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
///
/// With the `swagger-ui` feature the interactive docs are served at
/// `/swagger-ui` and the raw document at `/api-docs/openapi.json`.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}
