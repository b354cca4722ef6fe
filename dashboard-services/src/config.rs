//! Polling and presentation defaults

use std::time::Duration;

use crate::market_service::DetailLimits;

/// Kline limits a detail view may select
pub const KLINE_LIMIT_OPTIONS: &[u32] = &[1, 5, 10, 20, 50, 100];

/// Configuration shared by every poller and view
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Refresh period of a detail view (in seconds)
    pub detail_poll_secs: u64,
    /// Refresh period of an exchange price list (in seconds)
    pub price_list_poll_secs: u64,
    /// Levels requested per order-book side
    pub order_book_depth: u32,
    /// Recent trades requested per cycle
    pub trades_limit: u32,
    /// Candles shown per page in a detail view
    pub candle_page_size: usize,
    /// Tickers shown per page in a price list
    pub price_page_size: usize,
    /// Kline limit used when a view opens without one
    pub default_kline_limit: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            detail_poll_secs: 5,
            price_list_poll_secs: 30,
            order_book_depth: 10,
            trades_limit: 10,
            candle_page_size: 5,
            price_page_size: 20,
            default_kline_limit: 10,
        }
    }
}

impl PollerConfig {
    pub fn detail_period(&self) -> Duration {
        Duration::from_secs(self.detail_poll_secs.max(1))
    }

    pub fn price_list_period(&self) -> Duration {
        Duration::from_secs(self.price_list_poll_secs.max(1))
    }

    /// Fixed request sizes for the detail fan-out
    pub fn detail_limits(&self) -> DetailLimits {
        DetailLimits {
            order_book_depth: self.order_book_depth,
            trades_limit: self.trades_limit,
        }
    }

    /// Selectable kline limits
    pub fn kline_limits(&self) -> &'static [u32] {
        KLINE_LIMIT_OPTIONS
    }

    /// Check that `limit` is one of the selectable kline limits
    pub fn is_valid_kline_limit(&self, limit: u32) -> bool {
        KLINE_LIMIT_OPTIONS.contains(&limit)
    }
}
