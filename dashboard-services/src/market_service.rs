//! Market service routing requests to the registered exchange adapters

use std::collections::HashMap;
use std::sync::Arc;

use dashboard_core::{
    Candle, DashboardError, DashboardResult, Exchange, ExchangeAdapter, OrderBookSnapshot, Ticker,
    Trade,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// The values a detail view's fetch depends on
///
/// Any change here is a dependency change: results fetched under the old
/// values are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySnapshot {
    pub symbol: String,
    pub interval: String,
    pub limit: u32,
}

impl DependencySnapshot {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, limit: u32) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            limit,
        }
    }
}

/// Fixed request sizes for the order book and trade fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailLimits {
    pub order_book_depth: u32,
    pub trades_limit: u32,
}

impl Default for DetailLimits {
    fn default() -> Self {
        Self {
            order_book_depth: 10,
            trades_limit: 10,
        }
    }
}

/// Everything a detail view shows, fetched together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketDetail {
    pub order_book: OrderBookSnapshot,
    pub trades: Vec<Trade>,
    pub candles: Vec<Candle>,
}

/// Service for fetching market data from any registered exchange
pub struct MarketService {
    adapters: HashMap<Exchange, Arc<dyn ExchangeAdapter>>,
}

impl MarketService {
    /// Create an empty service
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under the exchange it reports
    pub fn with_adapter(mut self, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        let exchange = adapter.exchange();
        info!("Registered {} adapter", exchange.display_name());
        self.adapters.insert(exchange, adapter);
        self
    }

    /// Look up the adapter for an exchange
    pub fn adapter(&self, exchange: Exchange) -> DashboardResult<Arc<dyn ExchangeAdapter>> {
        self.adapters.get(&exchange).cloned().ok_or_else(|| {
            DashboardError::not_found(format!("No adapter registered for {}", exchange))
        })
    }

    /// Registered exchanges in declaration order
    pub fn exchanges(&self) -> Vec<Exchange> {
        Exchange::ALL
            .iter()
            .copied()
            .filter(|e| self.adapters.contains_key(e))
            .collect()
    }

    /// Get the full price list of an exchange
    #[instrument(skip(self))]
    pub async fn fetch_price_list(&self, exchange: Exchange) -> DashboardResult<Vec<Ticker>> {
        let adapter = self.adapter(exchange)?;
        adapter.fetch_tickers().await
    }

    /// Get order book, recent trades and candles for one symbol
    ///
    /// The three requests run concurrently and the first failure fails the
    /// whole detail; partial results are never returned.
    #[instrument(skip(self, limits))]
    pub async fn fetch_detail(
        &self,
        exchange: Exchange,
        deps: &DependencySnapshot,
        limits: &DetailLimits,
    ) -> DashboardResult<MarketDetail> {
        let adapter = self.adapter(exchange)?;

        let (order_book, trades, candles) = tokio::try_join!(
            adapter.fetch_order_book(&deps.symbol, limits.order_book_depth),
            adapter.fetch_trades(&deps.symbol, limits.trades_limit),
            adapter.fetch_candles(&deps.symbol, &deps.interval, deps.limit),
        )?;

        debug!(
            "Got {} detail for {}: {} bids, {} asks, {} trades, {} candles",
            exchange,
            deps.symbol,
            order_book.bids.len(),
            order_book.asks.len(),
            trades.len(),
            candles.len()
        );

        Ok(MarketDetail {
            order_book,
            trades,
            candles,
        })
    }
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}
