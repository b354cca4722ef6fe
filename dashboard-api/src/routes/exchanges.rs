//! Exchange metadata and price-list endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use dashboard_core::{DashboardError, Exchange, IntervalOption, PollResult, Ticker};
use dashboard_services::{visible_tickers, Page, PriceListState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

/// What a client needs to build a view for one exchange
#[derive(Debug, Serialize)]
pub struct ExchangeInfo {
    pub id: Exchange,
    pub name: &'static str,
    pub intervals: &'static [IntervalOption],
    pub default_interval: &'static str,
    pub kline_limits: &'static [u32],
    pub default_kline_limit: u32,
}

/// Query parameters for a price list
#[derive(Debug, Deserialize)]
pub struct TickersQuery {
    /// Case-insensitive symbol substring
    pub filter: Option<String>,
    /// 1-based page
    pub page: Option<usize>,
}

/// Response for a price list
#[derive(Debug, Serialize)]
pub struct TickersResponse {
    pub exchange: Exchange,
    pub state: PriceListState,
    pub result: PollResult<Page<Ticker>>,
}

/// Create exchange routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exchanges", get(list_exchanges))
        .route("/{exchange}/tickers", get(get_tickers))
}

/// Parse an exchange path segment
pub fn parse_exchange(raw: &str) -> Result<Exchange, DashboardError> {
    raw.parse::<Exchange>()
        .map_err(|_| DashboardError::invalid_request(format!("Unknown exchange: {}", raw)))
}

/// List registered exchanges with their interval vocabularies
async fn list_exchanges(State(state): State<AppState>) -> ApiResult<Json<Vec<ExchangeInfo>>> {
    let exchanges = state
        .market_service
        .exchanges()
        .into_iter()
        .map(|exchange| {
            let adapter = state.market_service.adapter(exchange)?;
            Ok(ExchangeInfo {
                id: exchange,
                name: exchange.display_name(),
                intervals: adapter.intervals(),
                default_interval: adapter.default_interval(),
                kline_limits: state.config.kline_limits(),
                default_kline_limit: state.config.default_kline_limit,
            })
        })
        .collect::<Result<Vec<_>, DashboardError>>()?;

    Ok(Json(exchanges))
}

/// Current price list of one exchange, filtered then paginated
async fn get_tickers(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    Query(params): Query<TickersQuery>,
) -> ApiResult<Json<TickersResponse>> {
    let exchange = parse_exchange(&exchange)?;
    let poller = state.price_lists.get(&exchange).ok_or_else(|| {
        DashboardError::not_found(format!("No price list for {}", exchange))
    })?;

    let mut list_state = PriceListState::new(state.config.price_page_size);
    if let Some(filter) = params.filter {
        list_state.set_filter(filter);
    }
    if let Some(page) = params.page {
        list_state.set_page(page);
    }

    let result = poller.snapshot().map(|tickers| {
        visible_tickers(
            &tickers,
            &list_state.filter_text,
            list_state.page_size,
            list_state.current_page,
        )
    });

    if let Some(page) = &result.data {
        list_state.set_page(page.page);
        debug!(
            "{} tickers: page {}/{} ({} matching)",
            exchange, page.page, page.total_pages, page.total_items
        );
    }

    Ok(Json(TickersResponse {
        exchange,
        state: list_state,
        result,
    }))
}
