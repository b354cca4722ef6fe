//! Registry of open detail views
//!
//! Each view owns its poller and query state. Closing a view stops its
//! poller and never touches any other view.

use std::fmt;
use std::sync::Arc;

use dashboard_core::{DashboardError, DashboardResult, Exchange, PollResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::PollerConfig;
use crate::market_service::{MarketDetail, MarketService};
use crate::poller::{DetailFetcher, ViewPoller};
use crate::view_state::ViewQuery;

pub type ViewId = Uuid;

/// Requested changes to an open view; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewUpdate {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<usize>,
}

struct SessionState {
    query: ViewQuery,
    /// Poller revision the current page was chosen against
    seen_revision: u64,
}

/// One mounted detail view
pub struct ViewSession {
    id: ViewId,
    exchange: Exchange,
    poller: ViewPoller<DetailFetcher>,
    state: Mutex<SessionState>,
}

impl fmt::Debug for ViewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSession")
            .field("id", &self.id)
            .field("exchange", &self.exchange)
            .field("poller", &self.poller.name())
            .finish()
    }
}

impl ViewSession {
    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn poller(&self) -> &ViewPoller<DetailFetcher> {
        &self.poller
    }

    pub fn query(&self) -> ViewQuery {
        self.state.lock().query.clone()
    }

    /// Current query and poll result
    ///
    /// Fresh data sends the candle page back to 1; an explicit `page` is
    /// applied after that.
    pub fn observe(&self, page: Option<usize>) -> (ViewQuery, PollResult<MarketDetail>) {
        let revision = self.poller.revision();
        let result = self.poller.snapshot();

        let mut state = self.state.lock();
        if state.seen_revision != revision {
            state.seen_revision = revision;
            state.query.on_data_replaced();
        }
        if let Some(page) = page {
            state.query.set_page(page);
        }
        (state.query.clone(), result)
    }
}

/// Open detail views keyed by id
pub struct ViewRegistry {
    service: Arc<MarketService>,
    config: PollerConfig,
    views: DashMap<ViewId, Arc<ViewSession>>,
}

impl ViewRegistry {
    pub fn new(service: Arc<MarketService>, config: PollerConfig) -> Self {
        Self {
            service,
            config,
            views: DashMap::new(),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    fn validate_interval(&self, exchange: Exchange, interval: &str) -> DashboardResult<()> {
        let adapter = self.service.adapter(exchange)?;
        if adapter.supports_interval(interval) {
            Ok(())
        } else {
            Err(DashboardError::invalid_request(format!(
                "Unsupported {} interval: {}",
                exchange, interval
            )))
        }
    }

    fn validate_limit(&self, limit: u32) -> DashboardResult<()> {
        if self.config.is_valid_kline_limit(limit) {
            Ok(())
        } else {
            Err(DashboardError::invalid_request(format!(
                "Unsupported kline limit: {}",
                limit
            )))
        }
    }

    /// Symbols go into upstream paths and query strings verbatim, so only
    /// ASCII letters, digits, `_` and `-` are accepted.
    fn validate_symbol(symbol: &str) -> DashboardResult<String> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(DashboardError::invalid_request("Symbol must not be empty"));
        }
        if !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DashboardError::invalid_request(format!(
                "Invalid symbol: {}",
                symbol
            )));
        }
        Ok(symbol.to_ascii_uppercase())
    }

    /// Mount a detail view and start polling it
    #[instrument(skip(self))]
    pub fn open(
        &self,
        exchange: Exchange,
        symbol: &str,
        interval: Option<String>,
        limit: Option<u32>,
    ) -> DashboardResult<Arc<ViewSession>> {
        let adapter = self.service.adapter(exchange)?;
        let symbol = Self::validate_symbol(symbol)?;
        let interval = interval.unwrap_or_else(|| adapter.default_interval().to_string());
        let limit = limit.unwrap_or(self.config.default_kline_limit);
        self.validate_interval(exchange, &interval)?;
        self.validate_limit(limit)?;

        let id = Uuid::new_v4();
        let query = ViewQuery::new(symbol, interval, limit);
        let fetcher = DetailFetcher::new(
            Arc::clone(&self.service),
            exchange,
            self.config.detail_limits(),
        );
        let poller = ViewPoller::new(
            format!("{} view {}", exchange, id),
            fetcher,
            query.dependency(),
            self.config.detail_period(),
        );
        poller.start();

        let session = Arc::new(ViewSession {
            id,
            exchange,
            poller,
            state: Mutex::new(SessionState {
                query,
                seen_revision: 0,
            }),
        });
        self.views.insert(id, Arc::clone(&session));

        info!("Opened {} view {} ({} open)", exchange, id, self.views.len());
        Ok(session)
    }

    pub fn get(&self, id: ViewId) -> DashboardResult<Arc<ViewSession>> {
        self.views
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DashboardError::not_found(format!("View {}", id)))
    }

    /// Apply symbol, interval, limit and page changes to a view
    ///
    /// Everything is validated before anything is applied.
    #[instrument(skip(self))]
    pub fn update(&self, id: ViewId, update: ViewUpdate) -> DashboardResult<Arc<ViewSession>> {
        let session = self.get(id)?;

        let symbol = update
            .symbol
            .as_deref()
            .map(Self::validate_symbol)
            .transpose()?;
        if let Some(interval) = &update.interval {
            self.validate_interval(session.exchange, interval)?;
        }
        if let Some(limit) = update.limit {
            self.validate_limit(limit)?;
        }

        // Query and poller dependencies change under the same lock
        {
            let mut state = session.state.lock();
            let mut changed = false;
            if let Some(symbol) = symbol {
                changed |= state.query.set_symbol(symbol);
            }
            if let Some(interval) = update.interval {
                changed |= state.query.set_interval(interval);
            }
            if let Some(limit) = update.limit {
                changed |= state.query.set_limit(limit);
            }
            if let Some(page) = update.page {
                state.query.set_page(page);
            }
            if changed {
                let dependency = state.query.dependency();
                debug!("View {} dependencies now {:?}", id, dependency);
                session.poller.set_params(dependency);
            }
        }

        Ok(session)
    }

    /// Unmount a view and stop its poller
    pub fn close(&self, id: ViewId) -> DashboardResult<()> {
        let (_, session) = self
            .views
            .remove(&id)
            .ok_or_else(|| DashboardError::not_found(format!("View {}", id)))?;
        session.poller.stop();
        info!("Closed view {} ({} open)", id, self.views.len());
        Ok(())
    }

    /// Stop and drop every view
    pub fn close_all(&self) {
        let ids: Vec<ViewId> = self.views.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            let _ = self.close(id);
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
