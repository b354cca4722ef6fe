//! Binance API client
//!
//! Provides the public spot market-data endpoints of the Binance REST API.
//! Binance returns bare JSON arrays/objects, so HTTP status is the only
//! failure signal.

use crate::types::{
    kline_to_candle, to_tickers, BinanceDepth, BinanceKlineRow, BinanceTickerPrice, BinanceTrade,
    BINANCE_INTERVALS, DEFAULT_INTERVAL,
};
use async_trait::async_trait;
use dashboard_core::{
    Candle, DashboardError, DashboardResult, Exchange, ExchangeAdapter, IntervalOption,
    OrderBookSnapshot, Ticker, Trade,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Base URL for Binance API
const BINANCE_API_BASE: &str = "https://api.binance.com";

/// Binance API client
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    /// Create a new Binance client against the production API
    pub fn new() -> Self {
        Self::with_base_url(BINANCE_API_BASE)
    }

    /// Create a client against an alternate host (mirror, proxy, test server)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the body, failing on any non-2xx status
    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> DashboardResult<T> {
        let url = format!("{}{}", self.base_url, path);

        debug!("Fetching Binance {} from: {}", what, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            DashboardError::transport(format!("Failed to fetch {}: {}", what, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!("Binance {} request failed ({}): {}", what, status, body);
            return Err(DashboardError::transport(format!(
                "Failed to fetch data (HTTP {})",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DashboardError::parse(format!("Failed to parse {}: {}", what, e)))
    }

    /// Get last prices for all symbols
    #[instrument(skip(self))]
    pub async fn get_tickers(&self) -> Result<Vec<Ticker>, DashboardError> {
        let raw: Vec<BinanceTickerPrice> = self.get_json("/api/v3/ticker/price", "tickers").await?;
        let tickers = to_tickers(&raw);

        debug!("Got {} Binance tickers", tickers.len());
        Ok(tickers)
    }

    // ========================================================================
    // Order Book Methods
    // ========================================================================

    /// Get the order book for a symbol
    #[instrument(skip(self))]
    pub async fn get_depth(&self, symbol: &str, limit: u32) -> Result<OrderBookSnapshot, DashboardError> {
        let path = format!("/api/v3/depth?symbol={}&limit={}", symbol, limit);
        let raw: BinanceDepth = self.get_json(&path, "order book").await?;
        raw.to_order_book()
    }

    // ========================================================================
    // Trade History Methods
    // ========================================================================

    /// Get recent trades for a symbol
    #[instrument(skip(self))]
    pub async fn get_trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>, DashboardError> {
        let path = format!("/api/v3/trades?symbol={}&limit={}", symbol, limit);
        let raw: Vec<BinanceTrade> = self.get_json(&path, "trades").await?;
        raw.iter().map(|t| t.to_trade()).collect()
    }

    // ========================================================================
    // Kline Methods
    // ========================================================================

    /// Get klines for a symbol
    #[instrument(skip(self))]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, DashboardError> {
        let path = format!(
            "/api/v3/klines?symbol={}&interval={}&limit={}",
            symbol, interval, limit
        );
        let raw: Vec<BinanceKlineRow> = self.get_json(&path, "klines").await?;
        raw.iter().map(|row| kline_to_candle(row)).collect()
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceClient {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    fn intervals(&self) -> &'static [IntervalOption] {
        BINANCE_INTERVALS
    }

    fn default_interval(&self) -> &'static str {
        DEFAULT_INTERVAL
    }

    async fn fetch_tickers(&self) -> DashboardResult<Vec<Ticker>> {
        self.get_tickers().await
    }

    async fn fetch_order_book(&self, symbol: &str, depth: u32) -> DashboardResult<OrderBookSnapshot> {
        self.get_depth(symbol, depth).await
    }

    async fn fetch_trades(&self, symbol: &str, limit: u32) -> DashboardResult<Vec<Trade>> {
        self.get_trades(symbol, limit).await
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> DashboardResult<Vec<Candle>> {
        self.get_klines(symbol, interval, limit).await
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
