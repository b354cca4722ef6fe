//! Binance API response types
//!
//! These types mirror the Binance REST responses and are converted
//! to dashboard-core types for use in the application.

use dashboard_core::{
    wire, Candle, CandleActivity, DashboardResult, IntervalOption, OrderBookSnapshot, PriceLevel,
    Ticker, Trade, TradeSide,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Kline intervals accepted by `/api/v3/klines`
pub const BINANCE_INTERVALS: &[IntervalOption] = &[
    IntervalOption::new("1m", "1m"),
    IntervalOption::new("3m", "3m"),
    IntervalOption::new("5m", "5m"),
    IntervalOption::new("15m", "15m"),
    IntervalOption::new("30m", "30m"),
    IntervalOption::new("1h", "1h"),
    IntervalOption::new("2h", "2h"),
    IntervalOption::new("4h", "4h"),
    IntervalOption::new("6h", "6h"),
    IntervalOption::new("8h", "8h"),
    IntervalOption::new("12h", "12h"),
    IntervalOption::new("1d", "1d"),
    IntervalOption::new("3d", "3d"),
    IntervalOption::new("1w", "1w"),
    IntervalOption::new("1M", "1M"),
];

pub const DEFAULT_INTERVAL: &str = "1d";

/// Element of GET /api/v3/ticker/price
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceTickerPrice {
    pub symbol: String,
    /// Decimal string
    pub price: String,
}

impl BinanceTickerPrice {
    /// Convert to dashboard-core Ticker
    pub fn to_ticker(&self) -> DashboardResult<Ticker> {
        Ok(Ticker::new(
            self.symbol.clone(),
            wire::decimal("price", &self.price)?,
        ))
    }
}

/// Convert a price list, skipping rows whose price does not parse
pub fn to_tickers(raw: &[BinanceTickerPrice]) -> Vec<Ticker> {
    raw.iter()
        .filter_map(|t| match t.to_ticker() {
            Ok(ticker) => Some(ticker),
            Err(e) => {
                warn!("Skipping Binance ticker {}: {}", t.symbol, e);
                None
            }
        })
        .collect()
}

/// Response from GET /api/v3/depth
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceDepth {
    pub last_update_id: u64,
    /// Bid levels as `[price, quantity]` string pairs, best first
    pub bids: Vec<[String; 2]>,
    /// Ask levels as `[price, quantity]` string pairs, best first
    pub asks: Vec<[String; 2]>,
}

fn parse_level(pair: &[String; 2]) -> DashboardResult<PriceLevel> {
    Ok(PriceLevel::new(
        wire::decimal("price", &pair[0])?,
        wire::decimal("quantity", &pair[1])?,
    ))
}

impl BinanceDepth {
    /// Convert to dashboard-core OrderBookSnapshot, keeping level order
    pub fn to_order_book(&self) -> DashboardResult<OrderBookSnapshot> {
        Ok(OrderBookSnapshot {
            update_id: Some(self.last_update_id),
            bids: self.bids.iter().map(parse_level).collect::<DashboardResult<_>>()?,
            asks: self.asks.iter().map(parse_level).collect::<DashboardResult<_>>()?,
        })
    }
}

/// Element of GET /api/v3/trades
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceTrade {
    pub id: u64,
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub quote_qty: Option<String>,
    /// Trade time (milliseconds since epoch)
    pub time: i64,
    /// `true` if the buyer placed the resting order (taker sold)
    pub is_buyer_maker: bool,
    #[serde(default)]
    pub is_best_match: Option<bool>,
}

impl BinanceTrade {
    /// Convert to dashboard-core Trade
    pub fn to_trade(&self) -> DashboardResult<Trade> {
        Ok(Trade {
            price: wire::decimal("price", &self.price)?,
            amount: wire::decimal("qty", &self.qty)?,
            timestamp: self.time,
            side: TradeSide::from_buyer_maker(self.is_buyer_maker),
        })
    }
}

/// Element of GET /api/v3/klines
///
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume,
/// tradeCount, takerBuyBase, takerBuyQuote, ignore]`
pub type BinanceKlineRow = Vec<Value>;

/// Convert a kline row to dashboard-core Candle
pub fn kline_to_candle(row: &[Value]) -> DashboardResult<Candle> {
    let trade_count = wire::row_integer(row, 8, "trade_count")?;
    Ok(Candle {
        open_time: wire::row_integer(row, 0, "open_time")?,
        open: wire::row_decimal(row, 1, "open")?,
        high: wire::row_decimal(row, 2, "high")?,
        low: wire::row_decimal(row, 3, "low")?,
        close: wire::row_decimal(row, 4, "close")?,
        volume: wire::row_decimal(row, 5, "volume")?,
        activity: CandleActivity::TradeCount(trade_count.max(0) as u64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TICKERS_JSON: &str = r#"[
        {"symbol": "ETHBTC", "price": "0.05112000"},
        {"symbol": "BTCUSDT", "price": "67250.01000000"}
    ]"#;

    const DEPTH_JSON: &str = r#"{
        "lastUpdateId": 1027024,
        "bids": [["4.00000000", "431.00000000"], ["3.99000000", "9.00000000"]],
        "asks": [["4.00000200", "12.00000000"], ["4.01000000", "1.50000000"]]
    }"#;

    const TRADES_JSON: &str = r#"[
        {"id": 28457, "price": "4.00000100", "qty": "12.00000000", "quoteQty": "48.000012",
         "time": 1499865549590, "isBuyerMaker": true, "isBestMatch": true},
        {"id": 28458, "price": "4.00000200", "qty": "1.00000000", "quoteQty": "4.000002",
         "time": 1499865549591, "isBuyerMaker": false, "isBestMatch": true}
    ]"#;

    const KLINE_JSON: &str = r#"[
        1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
        "148976.11427815", 1499644799999, "2434.19055334", 308,
        "1756.87402397", "28.46694368", "0"
    ]"#;

    #[test]
    fn test_ticker_conversion() {
        let raw: Vec<BinanceTickerPrice> = serde_json::from_str(TICKERS_JSON).unwrap();
        let tickers: Vec<Ticker> = raw.iter().map(|t| t.to_ticker().unwrap()).collect();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[1].symbol, "BTCUSDT");
        assert_eq!(tickers[1].price, dec!(67250.01));
    }

    #[test]
    fn test_unparseable_ticker_is_skipped() {
        let raw: Vec<BinanceTickerPrice> = serde_json::from_str(
            r#"[{"symbol": "BTCUSDT", "price": "67250.01"}, {"symbol": "XYZUSDT", "price": "n/a"}]"#,
        )
        .unwrap();
        let tickers = to_tickers(&raw);
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].symbol, "BTCUSDT");
    }

    #[test]
    fn test_depth_keeps_exchange_order() {
        let raw: BinanceDepth = serde_json::from_str(DEPTH_JSON).unwrap();
        let book = raw.to_order_book().unwrap();
        assert_eq!(book.update_id, Some(1027024));
        assert_eq!(book.bids[0].price, dec!(4.0));
        assert_eq!(book.bids[1].price, dec!(3.99));
        assert_eq!(book.asks[0].price, dec!(4.000002));
        assert_eq!(book.asks[1].quantity, dec!(1.5));
    }

    #[test]
    fn test_buyer_maker_maps_to_sell() {
        let raw: Vec<BinanceTrade> = serde_json::from_str(TRADES_JSON).unwrap();
        let first = raw[0].to_trade().unwrap();
        assert_eq!(first.side, TradeSide::Sell);
        assert_eq!(first.amount, dec!(12));
        assert_eq!(first.timestamp, 1499865549590);

        let second = raw[1].to_trade().unwrap();
        assert_eq!(second.side, TradeSide::Buy);
    }

    #[test]
    fn test_kline_uses_trade_count_index() {
        let row: BinanceKlineRow = serde_json::from_str(KLINE_JSON).unwrap();
        let candle = kline_to_candle(&row).unwrap();
        assert_eq!(candle.open_time, 1499040000000);
        assert_eq!(candle.open, dec!(0.0163479));
        assert_eq!(candle.high, dec!(0.8));
        assert_eq!(candle.low, dec!(0.015758));
        assert_eq!(candle.close, dec!(0.015771));
        assert_eq!(candle.volume, dec!(148976.11427815));
        assert_eq!(candle.activity, CandleActivity::TradeCount(308));
    }

    #[test]
    fn test_truncated_kline_fails() {
        let row: BinanceKlineRow = serde_json::from_str(r#"[1499040000000, "1", "2"]"#).unwrap();
        assert!(kline_to_candle(&row).is_err());
    }

    #[test]
    fn test_default_interval_is_listed() {
        assert!(BINANCE_INTERVALS.iter().any(|i| i.value == DEFAULT_INTERVAL));
    }
}
