//! Exchange adapter capability
//!
//! Every exchange implements the same four fetches over its own endpoints
//! and response shapes. Callers hold adapters as `Arc<dyn ExchangeAdapter>`
//! and never branch on which exchange they are talking to.

use async_trait::async_trait;

use crate::error::DashboardResult;
use crate::exchange::Exchange;
use crate::market::{Candle, IntervalOption, OrderBookSnapshot, Ticker, Trade};

#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Which exchange this adapter talks to
    fn exchange(&self) -> Exchange;

    /// Kline intervals in the exchange's own vocabulary
    fn intervals(&self) -> &'static [IntervalOption];

    /// Interval selected when a detail view opens
    fn default_interval(&self) -> &'static str;

    /// Check that `interval` belongs to this exchange's vocabulary
    fn supports_interval(&self, interval: &str) -> bool {
        self.intervals().iter().any(|i| i.value == interval)
    }

    /// Last price for every listed symbol
    async fn fetch_tickers(&self) -> DashboardResult<Vec<Ticker>>;

    /// Order book with `depth` levels per side
    async fn fetch_order_book(&self, symbol: &str, depth: u32)
        -> DashboardResult<OrderBookSnapshot>;

    /// Most recent public trades
    async fn fetch_trades(&self, symbol: &str, limit: u32) -> DashboardResult<Vec<Trade>>;

    /// Klines for `interval`, at most `limit` of them
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> DashboardResult<Vec<Candle>>;
}
