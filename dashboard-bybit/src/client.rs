//! Bybit API client
//!
//! Provides the public v5 spot market-data endpoints. A call fails when the
//! HTTP status is not 2xx, and separately when the envelope's `retCode` is
//! non-zero even though the status was 2xx.

use crate::types::{
    kline_to_candle, to_tickers, BybitEnvelope, BybitKlineRow, BybitList, BybitOrderbook, BybitRecentTrade,
    BybitTicker, BYBIT_INTERVALS, DEFAULT_INTERVAL,
};
use async_trait::async_trait;
use dashboard_core::{
    Candle, DashboardError, DashboardResult, Exchange, ExchangeAdapter, IntervalOption,
    OrderBookSnapshot, Ticker, Trade,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// Base URL for Bybit API
const BYBIT_API_BASE: &str = "https://api.bybit.com";

/// Market category for every request
const CATEGORY: &str = "spot";

/// Bybit API client
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
}

impl BybitClient {
    /// Create a new Bybit client against the production API
    pub fn new() -> Self {
        Self::with_base_url(BYBIT_API_BASE)
    }

    /// Create a client against an alternate host (testnet, proxy, test server)
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

    /// GET `path`, check transport status, then the envelope's `retCode`
    async fn get_result<T: DeserializeOwned>(&self, path: &str, what: &str) -> DashboardResult<T> {
        let url = format!("{}{}", self.base_url, path);

        debug!("Fetching Bybit {} from: {}", what, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            DashboardError::transport(format!("Failed to fetch {}: {}", what, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!("Bybit {} request failed ({}): {}", what, status, body);
            return Err(DashboardError::transport(format!(
                "Failed to fetch data (HTTP {})",
                status
            )));
        }

        let envelope: BybitEnvelope = response
            .json()
            .await
            .map_err(|e| DashboardError::parse(format!("Failed to parse {}: {}", what, e)))?;

        if envelope.ret_code != 0 {
            warn!(
                "Bybit {} rejected: retCode={} retMsg={}",
                what, envelope.ret_code, envelope.ret_msg
            );
        }

        envelope.decode(what)
    }

    /// Get last prices for all spot symbols
    #[instrument(skip(self))]
    pub async fn get_tickers(&self) -> Result<Vec<Ticker>, DashboardError> {
        let path = format!("/v5/market/tickers?category={}", CATEGORY);
        let result: BybitList<BybitTicker> = self.get_result(&path, "tickers").await?;
        let tickers = to_tickers(&result.list);

        debug!("Got {} Bybit tickers", tickers.len());
        Ok(tickers)
    }

    // ========================================================================
    // Order Book Methods
    // ========================================================================

    /// Get the order book for a symbol
    #[instrument(skip(self))]
    pub async fn get_orderbook(&self, symbol: &str, limit: u32) -> Result<OrderBookSnapshot, DashboardError> {
        let path = format!(
            "/v5/market/orderbook?category={}&symbol={}&limit={}",
            CATEGORY, symbol, limit
        );
        let result: BybitOrderbook = self.get_result(&path, "order book").await?;
        result.to_order_book()
    }

    // ========================================================================
    // Trade History Methods
    // ========================================================================

    /// Get recent trades for a symbol
    #[instrument(skip(self))]
    pub async fn get_recent_trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>, DashboardError> {
        let path = format!(
            "/v5/market/recent-trade?category={}&symbol={}&limit={}",
            CATEGORY, symbol, limit
        );
        let result: BybitList<BybitRecentTrade> = self.get_result(&path, "trades").await?;
        result.list.iter().map(|t| t.to_trade()).collect()
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
            "/v5/market/kline?category={}&symbol={}&interval={}&limit={}",
            CATEGORY, symbol, interval, limit
        );
        let result: BybitList<BybitKlineRow> = self.get_result(&path, "klines").await?;
        result.list.iter().map(|row| kline_to_candle(row)).collect()
    }
}

impl Default for BybitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeAdapter for BybitClient {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    fn intervals(&self) -> &'static [IntervalOption] {
        BYBIT_INTERVALS
    }

    fn default_interval(&self) -> &'static str {
        DEFAULT_INTERVAL
    }

    async fn fetch_tickers(&self) -> DashboardResult<Vec<Ticker>> {
        self.get_tickers().await
    }

    async fn fetch_order_book(&self, symbol: &str, depth: u32) -> DashboardResult<OrderBookSnapshot> {
        self.get_orderbook(symbol, depth).await
    }

    async fn fetch_trades(&self, symbol: &str, limit: u32) -> DashboardResult<Vec<Trade>> {
        self.get_recent_trades(symbol, limit).await
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

impl std::fmt::Debug for BybitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BybitClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
