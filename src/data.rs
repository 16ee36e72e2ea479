use std::fmt;

use serde::Serialize;

/// A single parsed CSV cell. Missing cells are represented as `None` by callers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Numeric value usable for binning: finite numbers only.
    pub fn as_finite(&self) -> Option<f64> {
        self.as_number().filter(|n| n.is_finite())
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Number(n) => format_float(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

pub fn parse_cell(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) => Some(Value::Number(parsed)),
        Err(_) => Some(Value::Text(trimmed.to_string())),
    }
}

/// Shortest round-trip representation that always carries a fractional part
/// (`10.0`, `2.5`, `0.1`).
pub fn format_float(value: f64) -> String {
    // -0.0 prints as "-0.0"; fold it into 0.0
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:?}")
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() { rounded } else { value }
}
