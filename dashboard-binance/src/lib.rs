//! Binance integration for the Exchange Dashboard
//!
//! This crate provides a public REST client for Binance spot market data
//! and the wire types it normalizes into `dashboard-core` records.

pub mod client;
pub mod types;

pub use client::BinanceClient;
pub use types::{BINANCE_INTERVALS, DEFAULT_INTERVAL};
