//! REST API layer: route handlers, DTOs, OpenAPI document and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::system::test_emit_handler,
        handlers::booking::notify_booking,
        handlers::booking::active_connections,
    ),
    components(schemas(
        dto::NotifyBookingRequest,
        dto::DeliveryResponse,
        crate::domain::ActiveConnections,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "System", description = "Health and diagnostics"),
        (name = "Relay", description = "Booking notifications and relay introspection"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
