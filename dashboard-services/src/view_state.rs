//! Per-view presentation state

use serde::Serialize;

use crate::market_service::DependencySnapshot;

/// Filter and page of an exchange price list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceListState {
    pub filter_text: String,
    pub current_page: usize,
    pub page_size: usize,
}

impl PriceListState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter_text: String::new(),
            current_page: 1,
            page_size,
        }
    }

    /// Changing the filter always returns to the first page
    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
        self.current_page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }
}

/// Symbol, kline selection and candle page of one detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewQuery {
    pub symbol: String,
    pub kline_interval: String,
    pub kline_limit: u32,
    pub current_page: usize,
}

impl ViewQuery {
    pub fn new(symbol: impl Into<String>, kline_interval: impl Into<String>, kline_limit: u32) -> Self {
        Self {
            symbol: symbol.into(),
            kline_interval: kline_interval.into(),
            kline_limit,
            current_page: 1,
        }
    }

    /// The values the detail fetch depends on
    pub fn dependency(&self) -> DependencySnapshot {
        DependencySnapshot::new(&self.symbol, &self.kline_interval, self.kline_limit)
    }

    /// Returns true when the dependency snapshot changed
    pub fn set_symbol(&mut self, symbol: impl Into<String>) -> bool {
        let symbol = symbol.into();
        self.current_page = 1;
        if self.symbol == symbol {
            return false;
        }
        self.symbol = symbol;
        true
    }

    /// Returns true when the dependency snapshot changed
    pub fn set_interval(&mut self, interval: impl Into<String>) -> bool {
        let interval = interval.into();
        self.current_page = 1;
        if self.kline_interval == interval {
            return false;
        }
        self.kline_interval = interval;
        true
    }

    /// Returns true when the dependency snapshot changed
    pub fn set_limit(&mut self, limit: u32) -> bool {
        self.current_page = 1;
        if self.kline_limit == limit {
            return false;
        }
        self.kline_limit = limit;
        true
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// A fresh candle sequence always starts on page 1
    pub fn on_data_replaced(&mut self) {
        self.current_page = 1;
    }
}
