//! Read-only HTTP API over the observation history

pub mod error;
pub mod routes;

use crate::core::config::ServerConfig;
use crate::query::QueryService;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Assembles the API router. History routes are served at the root and
/// under `/api`.
pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .merge(routes::history_routes())
        .nest("/api", routes::history_routes())
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Serves the API until Ctrl+C.
pub async fn serve(config: &ServerConfig, service: Arc<QueryService>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, gracefully stopping");
}

#[cfg(test)]
mod tests {
    use super::error::ApiError;
    use super::*;
    use crate::core::{HistoryStore, PersistenceError};
    use crate::query::tests::ManualClock;
    use crate::refresh::RefreshCoordinator;
    use crate::refresh::tests::MockSource;
    use crate::store::memory::MemoryHistoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tower::ServiceExt;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Router over a store holding two cycles, the newest 100 seconds old.
    async fn seeded_app(rate: Arc<MockSource>) -> Router {
        let store = Arc::new(MemoryHistoryStore::new());
        store
            .append_cycle(
                Decimal::from(48),
                Decimal::from(4000),
                now() - Duration::seconds(700),
            )
            .await
            .unwrap();
        store
            .append_cycle(
                Decimal::from(49),
                Decimal::from(4100),
                now() - Duration::seconds(100),
            )
            .await
            .unwrap();
        let coordinator = Arc::new(RefreshCoordinator::new(
            rate,
            MockSource::ok("0.00038015"),
            store,
        ));
        router(Arc::new(QueryService::with_clock(
            coordinator,
            ManualClock::new(now()),
        )))
    }

    #[tokio::test]
    async fn test_gold_history_newest_first() {
        let rate = MockSource::ok("49.5");
        let (status, body) = get_json(seeded_app(rate.clone()).await, "/gold-history/").await;

        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["pricePerGram"], "4100");
        assert_eq!(items[0]["id"], 2);
        assert_eq!(items[1]["pricePerGram"], "4000");
        assert_eq!(items[0]["observedAt"], "2025-03-01T11:58:20Z");
        // newest record is 100s old, nothing fetched
        assert_eq!(rate.count(), 0);
    }

    #[tokio::test]
    async fn test_currency_history_under_api_prefix_with_limit() {
        let app = seeded_app(MockSource::ok("49.5")).await;
        let (status, body) = get_json(app, "/api/currency-history/?limit=1").await;

        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["rate"], "49");
        assert!(items[0].get("observedAt").is_some());
    }

    #[tokio::test]
    async fn test_empty_history_triggers_refresh() {
        let coordinator = Arc::new(RefreshCoordinator::new(
            MockSource::ok("49.5"),
            MockSource::ok("0.00038015"),
            Arc::new(MemoryHistoryStore::new()),
        ));
        let app = router(Arc::new(QueryService::with_clock(
            coordinator,
            ManualClock::new(now()),
        )));

        let (status, body) = get_json(app, "/gold-history/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["pricePerGram"], "4186.4021");
        assert_eq!(body[0]["observedAt"], "2025-03-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_refresh_failure_is_not_an_http_error() {
        let coordinator = Arc::new(RefreshCoordinator::new(
            MockSource::failing(),
            MockSource::failing(),
            Arc::new(MemoryHistoryStore::new()),
        ));
        let app = router(Arc::new(QueryService::with_clock(
            coordinator,
            ManualClock::new(now()),
        )));

        let (status, body) = get_json(app, "/currency-history/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let app = seeded_app(MockSource::ok("49.5")).await;
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_store_error_response() {
        let response = ApiError::from(PersistenceError("io".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
