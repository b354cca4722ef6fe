//! Bybit v5 API response types
//!
//! These types mirror the Bybit market endpoints and are converted
//! to dashboard-core types for use in the application.

use dashboard_core::{
    wire, Candle, CandleActivity, DashboardError, DashboardResult, Exchange, IntervalOption,
    OrderBookSnapshot, PriceLevel, Ticker, Trade, TradeSide,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Kline intervals accepted by `/v5/market/kline`, with display labels
pub const BYBIT_INTERVALS: &[IntervalOption] = &[
    IntervalOption::new("1", "1m"),
    IntervalOption::new("5", "5m"),
    IntervalOption::new("15", "15m"),
    IntervalOption::new("60", "1h"),
    IntervalOption::new("240", "4h"),
    IntervalOption::new("D", "1d"),
    IntervalOption::new("W", "1w"),
    IntervalOption::new("M", "1M"),
];

pub const DEFAULT_INTERVAL: &str = "60";

/// Message used when Bybit reports a failure without text
const FALLBACK_MESSAGE: &str = "Failed to fetch data";

/// Top-level response envelope shared by every v5 endpoint
///
/// `result` stays untyped until `retCode` has been checked: failed calls
/// often carry `{}` where a list payload would be.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitEnvelope<T = Value> {
    /// Return code (0 = success)
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    /// Return message
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    /// Response payload; may be empty or null on failure
    #[serde(default)]
    pub result: Option<T>,
}

impl<T> BybitEnvelope<T> {
    /// Unwrap the payload, turning a non-zero `retCode` into an API error
    pub fn into_result(self, what: &str) -> DashboardResult<T> {
        if self.ret_code != 0 {
            let message = if self.ret_msg.is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                self.ret_msg
            };
            return Err(DashboardError::exchange_api(
                Exchange::Bybit,
                self.ret_code,
                message,
            ));
        }

        self.result
            .ok_or_else(|| DashboardError::parse(format!("Bybit {} returned no result", what)))
    }
}

impl BybitEnvelope<Value> {
    /// Check `retCode`, then decode the payload into its endpoint type
    pub fn decode<T: DeserializeOwned>(self, what: &str) -> DashboardResult<T> {
        let result = self.into_result(what)?;
        if result.is_null() {
            return Err(DashboardError::parse(format!("Bybit {} returned no result", what)));
        }
        serde_json::from_value(result)
            .map_err(|e| DashboardError::parse(format!("Failed to parse {}: {}", what, e)))
    }
}

/// `result` of list-shaped endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct BybitList<T> {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub list: Vec<T>,
}

/// Element of /v5/market/tickers (spot)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitTicker {
    pub symbol: String,
    pub last_price: String,
}

impl BybitTicker {
    /// Convert to dashboard-core Ticker
    pub fn to_ticker(&self) -> DashboardResult<Ticker> {
        Ok(Ticker::new(
            self.symbol.clone(),
            wire::decimal("lastPrice", &self.last_price)?,
        ))
    }
}

/// Convert a price list, skipping rows whose price does not parse
pub fn to_tickers(raw: &[BybitTicker]) -> Vec<Ticker> {
    raw.iter()
        .filter_map(|t| match t.to_ticker() {
            Ok(ticker) => Some(ticker),
            Err(e) => {
                warn!("Skipping Bybit ticker {}: {}", t.symbol, e);
                None
            }
        })
        .collect()
}

/// `result` of /v5/market/orderbook
#[derive(Debug, Clone, Deserialize)]
pub struct BybitOrderbook {
    /// Symbol name
    pub s: String,
    /// Bid levels as `[price, size]` string pairs, best first
    pub b: Vec<[String; 2]>,
    /// Ask levels as `[price, size]` string pairs, best first
    pub a: Vec<[String; 2]>,
    /// Server timestamp in milliseconds
    #[serde(default)]
    pub ts: Option<i64>,
    /// Update ID
    #[serde(default)]
    pub u: Option<u64>,
    #[serde(default)]
    pub seq: Option<u64>,
}

fn parse_level(pair: &[String; 2]) -> DashboardResult<PriceLevel> {
    Ok(PriceLevel::new(
        wire::decimal("price", &pair[0])?,
        wire::decimal("size", &pair[1])?,
    ))
}

impl BybitOrderbook {
    /// Convert to dashboard-core OrderBookSnapshot, keeping level order
    pub fn to_order_book(&self) -> DashboardResult<OrderBookSnapshot> {
        Ok(OrderBookSnapshot {
            update_id: self.u,
            bids: self.b.iter().map(parse_level).collect::<DashboardResult<_>>()?,
            asks: self.a.iter().map(parse_level).collect::<DashboardResult<_>>()?,
        })
    }
}

/// Element of /v5/market/recent-trade
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitRecentTrade {
    #[serde(default)]
    pub exec_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub price: String,
    pub size: String,
    /// "Buy" or "Sell"
    pub side: String,
    /// Trade time in milliseconds, as a string
    pub time: String,
    #[serde(default)]
    pub is_block_trade: Option<bool>,
}

impl BybitRecentTrade {
    /// Convert to dashboard-core Trade
    pub fn to_trade(&self) -> DashboardResult<Trade> {
        Ok(Trade {
            price: wire::decimal("price", &self.price)?,
            amount: wire::decimal("size", &self.size)?,
            timestamp: wire::integer("time", &self.time)?,
            side: TradeSide::parse(&self.side)?,
        })
    }
}

/// Element of /v5/market/kline
///
/// `[startTime, open, high, low, close, volume, turnover]`, all strings
pub type BybitKlineRow = Vec<Value>;

/// Convert a kline row to dashboard-core Candle
pub fn kline_to_candle(row: &[Value]) -> DashboardResult<Candle> {
    Ok(Candle {
        open_time: wire::row_integer(row, 0, "start_time")?,
        open: wire::row_decimal(row, 1, "open")?,
        high: wire::row_decimal(row, 2, "high")?,
        low: wire::row_decimal(row, 3, "low")?,
        close: wire::row_decimal(row, 4, "close")?,
        volume: wire::row_decimal(row, 5, "volume")?,
        activity: CandleActivity::Turnover(wire::row_decimal(row, 6, "turnover")?),
    })
}
