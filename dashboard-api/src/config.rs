//! Server configuration read from the environment

use dashboard_core::{DashboardError, DashboardResult};
use dashboard_services::PollerConfig;

/// Default port, same as the frontend expects
const DEFAULT_PORT: u16 = 3001;

/// Everything the binary reads from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Alternate Binance host; production when unset
    pub binance_api_url: Option<String>,
    /// Alternate Bybit host; production when unset
    pub bybit_api_url: Option<String>,
    pub poller: PollerConfig,
}

impl ServerConfig {
    /// Read `SERVER_PORT`, `BINANCE_API_URL`, `BYBIT_API_URL`,
    /// `DETAIL_POLL_SECS` and `PRICE_LIST_POLL_SECS`
    pub fn from_env() -> DashboardResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DashboardResult<Self> {
        let number = |key: &str| -> DashboardResult<Option<u64>> {
            match lookup(key).map(|v| v.trim().to_string()) {
                None => Ok(None),
                Some(v) if v.is_empty() => Ok(None),
                Some(v) => v
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|e| DashboardError::config(format!("{}='{}': {}", key, v, e))),
            }
        };
        let url = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut poller = PollerConfig::default();
        if let Some(secs) = number("DETAIL_POLL_SECS")? {
            poller.detail_poll_secs = secs;
        }
        if let Some(secs) = number("PRICE_LIST_POLL_SECS")? {
            poller.price_list_poll_secs = secs;
        }

        let port = match number("SERVER_PORT")? {
            Some(port) => u16::try_from(port)
                .map_err(|_| DashboardError::config(format!("SERVER_PORT out of range: {}", port)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            binance_api_url: url("BINANCE_API_URL"),
            bybit_api_url: url("BYBIT_API_URL"),
            poller,
        })
    }
}
