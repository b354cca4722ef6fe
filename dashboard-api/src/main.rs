//! Exchange Dashboard API Server
//!
//! HTTP API server that polls Binance and Bybit market data and serves
//! price lists and per-symbol detail views.

mod config;
mod error;
mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use dashboard_binance::BinanceClient;
use dashboard_bybit::BybitClient;
use dashboard_core::Exchange;
use dashboard_services::{MarketService, PollerConfig, PriceListFetcher, ViewPoller, ViewRegistry};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServerConfig;

pub type PriceListPoller = ViewPoller<PriceListFetcher>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub market_service: Arc<MarketService>,
    /// One price-list poller per registered exchange
    pub price_lists: Arc<HashMap<Exchange, Arc<PriceListPoller>>>,
    pub views: Arc<ViewRegistry>,
    pub config: Arc<PollerConfig>,
}

impl AppState {
    /// Build pollers and the view registry; nothing polls until `start()`
    pub fn new(market_service: Arc<MarketService>, config: PollerConfig) -> Self {
        let price_lists = market_service
            .exchanges()
            .into_iter()
            .map(|exchange| {
                let fetcher = PriceListFetcher::new(Arc::clone(&market_service), exchange);
                let poller = ViewPoller::new(
                    format!("{} price list", exchange),
                    fetcher,
                    (),
                    config.price_list_period(),
                );
                (exchange, Arc::new(poller))
            })
            .collect();

        let views = ViewRegistry::new(Arc::clone(&market_service), config.clone());

        Self {
            market_service,
            price_lists: Arc::new(price_lists),
            views: Arc::new(views),
            config: Arc::new(config),
        }
    }

    pub fn start(&self) {
        for poller in self.price_lists.values() {
            poller.start();
        }
    }

    /// Stop every price-list poller and close every detail view
    pub fn shutdown(&self) {
        for poller in self.price_lists.values() {
            poller.stop();
        }
        self.views.close_all();
    }
}

/// Build the full HTTP application
pub fn build_app(state: AppState) -> Router {
    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dashboard_api=debug")),
        )
        .init();

    info!("Starting Exchange Dashboard API");

    let config = ServerConfig::from_env()?;

    // Initialize clients
    let binance = match &config.binance_api_url {
        Some(url) => BinanceClient::with_base_url(url),
        None => BinanceClient::new(),
    };
    let bybit = match &config.bybit_api_url {
        Some(url) => BybitClient::with_base_url(url),
        None => BybitClient::new(),
    };
    info!("Binance API: {}", binance.base_url());
    info!("Bybit API: {}", bybit.base_url());

    let market_service = MarketService::new()
        .with_adapter(Arc::new(binance))
        .with_adapter(Arc::new(bybit));

    let state = AppState::new(Arc::new(market_service), config.poller.clone());
    state.start();

    let app = build_app(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown();
    info!("Server stopped");

    Ok(())
}
