//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api::{health, webhook};
use crate::middleware::logging::log_request;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes
    let health_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/liveness", get(health::liveness));

    // Meta calls GET for the handshake and POST for every notification
    let webhook_routes = Router::new().route(
        "/webhook",
        get(webhook::verify).post(webhook::receive),
    );

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        // ServiceBuilder order: first added = outermost, so request logging sees the final status
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_request))
                .layer(TraceLayer::new_for_http().make_span_with(request_span)),
        )
        .with_state(state)
}

/// Span for tower-http's request events
///
/// Records the path only: the query string of `GET /webhook` carries the
/// verify token.
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use axum::http::StatusCode;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Log sink shared between the subscriber and the assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn test_verify_token_never_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = create_router(AppState::new(Settings::for_tests()).unwrap());
        let response = app
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = logs.text();
        assert!(text.contains("/webhook"), "{text}");
        assert!(!text.contains("verify-me"), "{text}");
        assert!(!text.contains("hub.verify_token"), "{text}");
    }

    #[tokio::test]
    async fn test_trace_id_generated() {
        let app = create_router(AppState::new(Settings::for_tests()).unwrap());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-trace-id"].len(), 36);
    }

    #[tokio::test]
    async fn test_incoming_request_id_echoed() {
        let app = create_router(AppState::new(Settings::for_tests()).unwrap());
        let response = app
            .oneshot(
                Request::get("/liveness")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-trace-id"], "req-42");
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_webhook_rejects_other_methods() {
        let app = create_router(AppState::new(Settings::for_tests()).unwrap());
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
