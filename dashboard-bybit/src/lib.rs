//! Bybit integration for the Exchange Dashboard
//!
//! This crate provides a public REST client for Bybit v5 spot market data.
//! Every Bybit response is wrapped in a `{retCode, retMsg, result}`
//! envelope that is checked independently of the HTTP status.

pub mod client;
pub mod types;

pub use client::BybitClient;
pub use types::{BybitEnvelope, BYBIT_INTERVALS, DEFAULT_INTERVAL};
