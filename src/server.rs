//! HTTP application assembly.

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::ws::handler::ws_handler;

/// Builds the full router: REST API, `/ws` endpoint and HTTP layers.
///
/// The request timeout applies to REST routes only; upgraded sockets
/// live as long as the client keeps them open.
pub fn build_app(state: AppState, config: &RelayConfig) -> Router {
    let rest = api::build_router().layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    ));

    Router::new()
        .merge(rest)
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::service::Dispatcher;

    #[tokio::test]
    async fn rest_routes_answer_through_layers() {
        let config = RelayConfig::default();
        let app = build_app(AppState::new(Dispatcher::new(8)), &config);

        let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
    }
}
