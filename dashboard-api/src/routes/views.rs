//! Detail view endpoints
//!
//! A view is mounted with POST, read with GET, changed with PATCH and
//! unmounted with DELETE. Each mounted view polls on its own timer.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use dashboard_core::{
    Candle, Exchange, OrderBookSnapshot, PollResult, PriceLevel, Trade, TradeSide,
};
use dashboard_services::{
    paginate, MarketDetail, Page, ViewId, ViewQuery, ViewSession, ViewUpdate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// Request body for mounting a view
#[derive(Debug, Deserialize)]
pub struct OpenViewRequest {
    pub exchange: Exchange,
    pub symbol: String,
    pub interval: Option<String>,
    pub limit: Option<u32>,
}

/// Query parameters for reading a view
#[derive(Debug, Deserialize)]
pub struct ViewPageQuery {
    /// 1-based candle page
    pub page: Option<usize>,
}

/// One order-book row as displayed
#[derive(Debug, Serialize)]
pub struct LevelRow {
    pub price: Decimal,
    pub quantity: Decimal,
    /// price x quantity
    pub total: Decimal,
}

impl From<&PriceLevel> for LevelRow {
    fn from(level: &PriceLevel) -> Self {
        Self {
            price: level.price,
            quantity: level.quantity,
            total: level.total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderBookBody {
    pub update_id: Option<u64>,
    pub bids: Vec<LevelRow>,
    pub asks: Vec<LevelRow>,
}

impl From<&OrderBookSnapshot> for OrderBookBody {
    fn from(book: &OrderBookSnapshot) -> Self {
        Self {
            update_id: book.update_id,
            bids: book.bids.iter().map(LevelRow::from).collect(),
            asks: book.asks.iter().map(LevelRow::from).collect(),
        }
    }
}

/// One recent trade as displayed
#[derive(Debug, Serialize)]
pub struct TradeRow {
    pub price: Decimal,
    pub amount: Decimal,
    pub timestamp: i64,
    pub time: Option<DateTime<Utc>>,
    pub side: TradeSide,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        Self {
            price: trade.price,
            amount: trade.amount,
            timestamp: trade.timestamp,
            time: trade.time(),
            side: trade.side,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailBody {
    pub order_book: OrderBookBody,
    pub trades: Vec<TradeRow>,
    pub candles: Page<Candle>,
}

/// Response for a detail view
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub id: ViewId,
    pub exchange: Exchange,
    pub query: ViewQuery,
    pub result: PollResult<DetailBody>,
}

/// Create view routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/views", post(open_view))
        .route(
            "/views/{id}",
            get(get_view).patch(update_view).delete(close_view),
        )
}

fn render(state: &AppState, session: &ViewSession, page: Option<usize>) -> ViewResponse {
    let (mut query, result) = session.observe(page);
    let page_size = state.config.candle_page_size;

    let result = result.map(|detail: MarketDetail| DetailBody {
        order_book: OrderBookBody::from(&detail.order_book),
        trades: detail.trades.iter().map(TradeRow::from).collect(),
        candles: paginate(&detail.candles, page_size, query.current_page),
    });
    if let Some(body) = &result.data {
        query.current_page = body.candles.page;
    }

    ViewResponse {
        id: session.id(),
        exchange: session.exchange(),
        query,
        result,
    }
}

/// Mount a detail view and start polling it
async fn open_view(
    State(state): State<AppState>,
    Json(body): Json<OpenViewRequest>,
) -> ApiResult<(StatusCode, Json<ViewResponse>)> {
    info!("Opening view: {:?}", body);
    let session = state
        .views
        .open(body.exchange, &body.symbol, body.interval, body.limit)?;
    Ok((StatusCode::CREATED, Json(render(&state, &session, None))))
}

/// Read a detail view's latest poll result
async fn get_view(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    Query(params): Query<ViewPageQuery>,
) -> ApiResult<Json<ViewResponse>> {
    let session = state.views.get(id)?;
    Ok(Json(render(&state, &session, params.page)))
}

/// Change symbol, interval, limit or page of a view
async fn update_view(
    State(state): State<AppState>,
    Path(id): Path<ViewId>,
    Json(update): Json<ViewUpdate>,
) -> ApiResult<Json<ViewResponse>> {
    let page = update.page;
    let session = state.views.update(id, update)?;
    Ok(Json(render(&state, &session, page)))
}

/// Unmount a view
async fn close_view(State(state): State<AppState>, Path(id): Path<ViewId>) -> ApiResult<StatusCode> {
    state.views.close(id)?;
    Ok(StatusCode::NO_CONTENT)
}
