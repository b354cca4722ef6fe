//! Service layer for the Exchange Dashboard
//!
//! Orchestrates the exchange adapters: periodic polling with stale-response
//! suppression, the detail-view fan-out, pagination and per-view state.

pub mod config;
pub mod market_service;
pub mod pagination;
pub mod poller;
pub mod view_registry;
pub mod view_state;

pub use config::PollerConfig;
pub use market_service::{DependencySnapshot, DetailLimits, MarketDetail, MarketService};
pub use pagination::{filter_tickers, paginate, total_pages, visible_tickers, Page};
pub use poller::{DetailFetcher, PollPhase, PriceListFetcher, ViewFetcher, ViewPoller};
pub use view_registry::{ViewId, ViewRegistry, ViewSession, ViewUpdate};
pub use view_state::{PriceListState, ViewQuery};
