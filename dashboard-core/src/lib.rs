//! Core types for the Exchange Dashboard
//!
//! This crate defines the canonical market-data shapes every exchange
//! adapter must produce, the error taxonomy shared by adapters and the
//! polling layer, and the adapter capability trait itself.

pub mod adapter;
pub mod error;
pub mod exchange;
pub mod market;
pub mod poll;
pub mod wire;

pub use adapter::ExchangeAdapter;
pub use error::{DashboardError, DashboardResult, ErrorKind};
pub use exchange::Exchange;
pub use market::{
    Candle, CandleActivity, IntervalOption, OrderBookSnapshot, PriceLevel, Ticker, Trade,
    TradeSide,
};
pub use poll::{PollError, PollResult};
