//! API route definitions

mod exchanges;
mod health;
mod views;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(exchanges::routes())
        .merge(views::routes())
}

#[cfg(test)]
mod tests {
    use crate::{build_app, AppState};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dashboard_core::{
        Candle, CandleActivity, DashboardResult, Exchange, ExchangeAdapter, IntervalOption,
        OrderBookSnapshot, PriceLevel, Ticker, Trade, TradeSide,
    };
    use dashboard_services::{MarketService, PollerConfig};
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const INTERVALS: &[IntervalOption] = &[
        IntervalOption::new("1h", "1h"),
        IntervalOption::new("1d", "1d"),
    ];

    struct StaticAdapter;

    #[async_trait]
    impl ExchangeAdapter for StaticAdapter {
        fn exchange(&self) -> Exchange {
            Exchange::Binance
        }

        fn intervals(&self) -> &'static [IntervalOption] {
            INTERVALS
        }

        fn default_interval(&self) -> &'static str {
            "1d"
        }

        async fn fetch_tickers(&self) -> DashboardResult<Vec<Ticker>> {
            Ok(vec![
                Ticker::new("BTCUSDT", dec!(67250.01)),
                Ticker::new("ETHBTC", dec!(0.05112)),
                Ticker::new("ETHUSDT", dec!(3500.1)),
            ])
        }

        async fn fetch_order_book(&self, _symbol: &str, _depth: u32) -> DashboardResult<OrderBookSnapshot> {
            Ok(OrderBookSnapshot {
                update_id: Some(7),
                bids: vec![PriceLevel::new(dec!(100), dec!(1.5))],
                asks: vec![PriceLevel::new(dec!(101), dec!(2))],
            })
        }

        async fn fetch_trades(&self, _symbol: &str, _limit: u32) -> DashboardResult<Vec<Trade>> {
            Ok(vec![Trade {
                price: dec!(100.5),
                amount: dec!(0.1),
                timestamp: 1_700_000_000_000,
                side: TradeSide::Sell,
            }])
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            _interval: &str,
            limit: u32,
        ) -> DashboardResult<Vec<Candle>> {
            Ok((0..limit)
                .map(|i| Candle {
                    open_time: i as i64 * 60_000,
                    open: dec!(1),
                    high: dec!(2),
                    low: dec!(0.5),
                    close: dec!(1.5),
                    volume: dec!(10),
                    activity: CandleActivity::TradeCount(4),
                })
                .collect())
        }
    }

    fn make_state() -> AppState {
        let service = MarketService::new().with_adapter(Arc::new(StaticAdapter));
        let state = AppState::new(Arc::new(service), PollerConfig::default());
        state.start();
        state
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let resp = build_app(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn wait_for_price_list(state: &AppState) {
        let mut rx = state.price_lists[&Exchange::Binance].subscribe();
        rx.wait_for(|r| r.is_ready()).await.unwrap();
    }

    #[tokio::test]
    async fn test_liveness() {
        let state = make_state();
        let req = Request::builder()
            .uri("/api/health/live")
            .body(Body::empty())
            .unwrap();

        let resp = build_app(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_health_reports_price_lists() {
        let state = make_state();
        wait_for_price_list(&state).await;

        let (status, json) = send(&state, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["price_lists"][0]["exchange"], "binance");
        assert_eq!(json["price_lists"][0]["ready"], true);
    }

    #[tokio::test]
    async fn test_list_exchanges() {
        let state = make_state();
        let (status, json) = send(&state, "GET", "/api/exchanges", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["id"], "binance");
        assert_eq!(json[0]["name"], "Binance");
        assert_eq!(json[0]["default_interval"], "1d");
        assert_eq!(json[0]["intervals"][0]["value"], "1h");
        assert_eq!(json[0]["kline_limits"], json!([1, 5, 10, 20, 50, 100]));
    }

    #[tokio::test]
    async fn test_tickers_filtered_then_paginated() {
        let state = make_state();
        wait_for_price_list(&state).await;

        let (status, json) = send(&state, "GET", "/api/binance/tickers?filter=ETH&page=9", None).await;
        assert_eq!(status, StatusCode::OK);
        let page = &json["result"]["data"];
        assert_eq!(page["total_items"], 2);
        assert_eq!(page["page"], 1);
        assert_eq!(page["items"][0]["symbol"], "ETHBTC");
        assert_eq!(json["state"]["filter_text"], "ETH");
        assert_eq!(json["state"]["current_page"], 1);
        assert_eq!(json["result"]["loading"], false);
    }

    #[tokio::test]
    async fn test_unknown_or_unregistered_exchange() {
        let state = make_state();
        let (status, json) = send(&state, "GET", "/api/kraken/tickers", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid request: Unknown exchange: kraken");

        let (status, _) = send(&state, "GET", "/api/bybit/tickers", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_view_lifecycle() {
        let state = make_state();

        let (status, json) = send(
            &state,
            "POST",
            "/api/views",
            Some(json!({"exchange": "binance", "symbol": "btcusdt"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["query"]["symbol"], "BTCUSDT");
        assert_eq!(json["query"]["kline_interval"], "1d");
        assert_eq!(json["query"]["kline_limit"], 10);

        let id: uuid::Uuid = serde_json::from_value(json["id"].clone()).unwrap();
        let session = state.views.get(id).unwrap();
        let mut rx = session.poller().subscribe();
        rx.wait_for(|r| r.is_ready()).await.unwrap();

        let uri = format!("/api/views/{}?page=2", id);
        let (status, json) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["result"]["data"];
        assert_eq!(data["order_book"]["bids"][0]["total"], "150.0");
        assert_eq!(data["candles"]["items"].as_array().unwrap().len(), 5);
        assert_eq!(data["candles"]["page"], 2);
        assert_eq!(data["candles"]["total_pages"], 2);
        assert_eq!(data["candles"]["items"][0]["activity"]["kind"], "trade_count");
        assert_eq!(data["trades"][0]["side"], "sell");
        assert_eq!(data["trades"][0]["time"], "2023-11-14T22:13:20Z");

        let uri = format!("/api/views/{}", id);
        let (status, _) = send(&state, "PATCH", &uri, Some(json!({"limit": 7}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(&state, "PATCH", &uri, Some(json!({"interval": "1h", "limit": 20}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["query"]["kline_interval"], "1h");
        assert_eq!(json["query"]["kline_limit"], 20);
        assert_eq!(json["query"]["current_page"], 1);

        let (status, _) = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(session.poller().is_stopped());

        let (status, _) = send(&state, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let state = make_state();
        let (status, _) = send(
            &state,
            "POST",
            "/api/views",
            Some(json!({"exchange": "binance", "symbol": "ETHUSDT", "interval": "1h", "limit": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        state.shutdown();
        assert!(state.views.is_empty());
        assert!(state.price_lists[&Exchange::Binance].is_stopped());
    }
}
