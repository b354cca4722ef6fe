//! Error types for the dashboard

use crate::exchange::Exchange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dashboard-wide error type
///
/// `Display` is what presentation shows, so exchange-level failures render
/// the exchange's own message and nothing else.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// Network failure or non-2xx HTTP status
    #[error("{0}")]
    Transport(String),

    /// 2xx response whose embedded status code signals failure
    #[error("{message}")]
    ExchangeApi {
        exchange: Exchange,
        code: i64,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error classification carried to presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    ExchangeApi,
    Parse,
    Request,
}

impl DashboardError {
    pub fn transport(msg: impl Into<String>) -> Self {
        DashboardError::Transport(msg.into())
    }

    pub fn exchange_api(exchange: Exchange, code: i64, message: impl Into<String>) -> Self {
        DashboardError::ExchangeApi {
            exchange,
            code,
            message: message.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        DashboardError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DashboardError::NotFound(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        DashboardError::InvalidRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DashboardError::Config(msg.into())
    }

    /// Classify this error for the poll result envelope
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::Transport(_) => ErrorKind::Transport,
            DashboardError::ExchangeApi { .. } => ErrorKind::ExchangeApi,
            DashboardError::Parse(_) => ErrorKind::Parse,
            DashboardError::NotFound(_)
            | DashboardError::InvalidRequest(_)
            | DashboardError::Config(_) => ErrorKind::Request,
        }
    }
}

/// Result type alias for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
