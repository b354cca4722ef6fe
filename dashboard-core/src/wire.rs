//! Helpers for turning exchange wire values into canonical numbers
//!
//! Exchanges send decimals as strings and pack klines into positional
//! arrays whose cells may be strings or numbers.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::error::{DashboardError, DashboardResult};

/// Parse a decimal string, naming the field on failure
pub fn decimal(field: &str, raw: &str) -> DashboardResult<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| DashboardError::parse(format!("Invalid {} '{}': {}", field, raw, e)))
}

/// Parse an integer carried as a string (e.g., millisecond timestamps)
pub fn integer(field: &str, raw: &str) -> DashboardResult<i64> {
    raw.parse::<i64>()
        .map_err(|e| DashboardError::parse(format!("Invalid {} '{}': {}", field, raw, e)))
}

fn cell<'a>(row: &'a [Value], index: usize, field: &str) -> DashboardResult<&'a Value> {
    row.get(index).ok_or_else(|| {
        DashboardError::parse(format!(
            "Kline row has {} cells, missing {} at index {}",
            row.len(),
            field,
            index
        ))
    })
}

/// Read a decimal from a positional row cell
pub fn row_decimal(row: &[Value], index: usize, field: &str) -> DashboardResult<Decimal> {
    match cell(row, index, field)? {
        Value::String(s) => decimal(field, s),
        Value::Number(n) => decimal(field, &n.to_string()),
        other => Err(DashboardError::parse(format!(
            "Unexpected {} value: {}",
            field, other
        ))),
    }
}

/// Read an integer from a positional row cell
pub fn row_integer(row: &[Value], index: usize, field: &str) -> DashboardResult<i64> {
    match cell(row, index, field)? {
        Value::String(s) => integer(field, s),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| DashboardError::parse(format!("Non-integer {}: {}", field, n))),
        other => Err(DashboardError::parse(format!(
            "Unexpected {} value: {}",
            field, other
        ))),
    }
}
