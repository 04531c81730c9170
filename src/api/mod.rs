//! HTTP layer: system routes, OpenAPI document, and app composition.
//!
//! The browser client is served from the configured static directory as the
//! router fallback, so any path not claimed by `/ws` or a system route
//! resolves to a client file.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the HTTP system routes.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "gcode-relay", description = "G-code relay system endpoints"),
    paths(handlers::system::health_handler, handlers::system::status_handler)
)]
pub struct ApiDoc;

/// Builds the router with the system endpoints.
pub fn build_router() -> Router<AppState> {
    with_docs(Router::new().merge(handlers::system::routes()))
}

/// Mounts Swagger UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router
}

/// Composes the full application: system routes, `/ws`, static client,
/// tracing and CORS layers.
pub fn build_app(state: AppState, config: &RelayConfig) -> Router {
    let app = build_router()
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http());

    let app = if config.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::service::{NamespaceHandle, RelayNamespace};

    fn app() -> Router {
        let state = AppState {
            namespace: NamespaceHandle::spawn(RelayNamespace::with_defaults(0.01)),
            outbox_capacity: 16,
        };
        build_app(state, &RelayConfig::default())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("request failed");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), 1 << 20).await else {
            panic!("body read failed");
        };
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (status, body) = get_json(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("healthy"));
    }

    #[tokio::test]
    async fn status_reports_empty_namespace() {
        let (status, body) = get_json(app(), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("connections").and_then(|v| v.as_u64()), Some(0));
        assert_eq!(
            body.get("has_active_consumer").and_then(|v| v.as_bool()),
            Some(false)
        );
    }

    #[test]
    fn openapi_lists_system_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/status"));
    }
}
