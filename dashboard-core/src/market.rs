//! Canonical market data structures shared by every exchange adapter

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, DashboardResult};

// ============================================================================
// Ticker Types
// ============================================================================

/// Last traded price for one symbol
///
/// Symbols are unique within a single exchange snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Exchange-native symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Last price
    pub price: Decimal,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

// ============================================================================
// Order Book Types
// ============================================================================

/// A single price level in the order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

impl PriceLevel {
    /// Create a new price level
    pub fn new(price: Decimal, quantity: Decimal) -> Self {
        Self { price, quantity }
    }

    /// Notional value of the level (price x quantity), computed for display
    pub fn total(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Order book snapshot as delivered by the exchange
///
/// Levels keep the exchange's ordering: bids best (highest) first, asks best
/// (lowest) first. Nothing here re-sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// Exchange update id, when the exchange provides one
    pub update_id: Option<u64>,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

impl OrderBookSnapshot {
    /// Best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }
}

// ============================================================================
// Trade Types
// ============================================================================

/// Side of a trade (from the taker's perspective)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Taker bought
    Buy,
    /// Taker sold
    Sell,
}

impl TradeSide {
    /// Parse an exchange-supplied side string, ignoring case
    pub fn parse(s: &str) -> DashboardResult<Self> {
        if s.eq_ignore_ascii_case("buy") {
            Ok(TradeSide::Buy)
        } else if s.eq_ignore_ascii_case("sell") {
            Ok(TradeSide::Sell)
        } else {
            Err(DashboardError::parse(format!("Unknown trade side: {}", s)))
        }
    }

    /// Derive the taker side from a "buyer is maker" flag
    ///
    /// A resting buy order means the taker was the seller.
    pub fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }
}

/// A single public trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Decimal,
    /// Base-asset quantity
    pub amount: Decimal,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub side: TradeSide,
}

impl Trade {
    /// Trade time as a UTC datetime
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

// ============================================================================
// Candle Types
// ============================================================================

/// The per-candle activity statistic
///
/// Exchanges fill this slot with different units, so the unit travels with
/// the value instead of being coerced into one number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CandleActivity {
    /// Number of trades in the bucket (Binance)
    TradeCount(u64),
    /// Quote-asset turnover, price x volume (Bybit)
    Turnover(Decimal),
}

/// A single OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, epoch milliseconds
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub activity: CandleActivity,
}

/// One selectable kline interval in an exchange's own vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalOption {
    /// Value sent to the exchange (e.g., "1d" on Binance, "D" on Bybit)
    pub value: &'static str,
    /// Human-readable label
    pub label: &'static str,
}

impl IntervalOption {
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}
