//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use dashboard_core::{Exchange, PollError};
use serde::Serialize;

use crate::AppState;

/// Price-list poller status for one exchange
#[derive(Debug, Serialize)]
struct PriceListHealth {
    exchange: Exchange,
    running: bool,
    ready: bool,
    error: Option<PollError>,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    open_views: usize,
    price_lists: Vec<PriceListHealth>,
}

/// Health check handler
///
/// Degraded when any price-list poller has stopped or last failed.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let price_lists: Vec<PriceListHealth> = Exchange::ALL
        .iter()
        .filter_map(|exchange| state.price_lists.get(exchange).map(|p| (*exchange, p)))
        .map(|(exchange, poller)| {
            let snapshot = poller.snapshot();
            PriceListHealth {
                exchange,
                running: poller.is_running(),
                ready: snapshot.is_ready(),
                error: snapshot.error,
            }
        })
        .collect();

    let healthy = price_lists.iter().all(|p| p.running && p.error.is_none());
    let status = if healthy { "healthy" } else { "degraded" };

    let response = HealthResponse {
        status: status.to_string(),
        open_views: state.views.len(),
        price_lists,
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
