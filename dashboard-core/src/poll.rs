//! Uniform envelope every canonical entity is wrapped in before presentation

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, ErrorKind};

/// Failure recorded for a poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollError {
    pub kind: ErrorKind,
    /// The failure's own message, shown as-is
    pub message: String,
}

impl From<&DashboardError> for PollError {
    fn from(err: &DashboardError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Data, loading flag and error for one polled entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResult<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<PollError>,
}

impl<T> PollResult<T> {
    /// Nothing fetched yet, nothing in flight
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    /// Successful cycle
    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            error: None,
        }
    }

    /// Failed cycle; previous data is not carried over
    pub fn failed(err: &DashboardError) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(PollError::from(err)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }

    /// Error message for display, if the last cycle failed
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Transform the data while keeping the loading and error state
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollResult<U> {
        PollResult {
            data: self.data.map(f),
            loading: self.loading,
            error: self.error,
        }
    }
}

impl<T> Default for PollResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}
