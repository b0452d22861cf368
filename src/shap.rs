use std::cmp::Ordering;

use itertools::Itertools;
use serde_json::{Map, Value};

pub const MAX_FACTORS: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct ShapFactor {
    pub feature_key: String,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactorSign {
    Positive,
    Negative,
}

/// Display-ready factor: bar width relative to the strongest factor.
#[derive(Clone, Debug, PartialEq)]
pub struct FactorBar {
    pub feature_key: String,
    pub value: f64,
    pub width_percent: f64,
    pub sign: FactorSign,
}

// Loose numeric coercion: anything that is not a finite number counts as 0.
fn factor_value(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Ranks raw attributions by descending magnitude, keeping the top ten.
/// Ties keep their original order.
pub fn rank(raw: &Map<String, Value>) -> Vec<ShapFactor> {
    raw.iter()
        .map(|(key, value)| ShapFactor {
            feature_key: key.clone(),
            value: factor_value(value),
        })
        .sorted_by(|a, b| {
            b.value
                .abs()
                .partial_cmp(&a.value.abs())
                .unwrap_or(Ordering::Equal)
        })
        .take(MAX_FACTORS)
        .collect()
}

pub fn normalize(factors: &[ShapFactor]) -> Vec<FactorBar> {
    let max = factors
        .iter()
        .map(|f| f.value.abs())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        .filter(|m| *m > 0.0)
        .unwrap_or(1.0);
    factors
        .iter()
        .map(|f| FactorBar {
            feature_key: f.feature_key.clone(),
            value: f.value,
            width_percent: 100.0 * f.value.abs() / max,
            sign: if f.value > 0.0 {
                FactorSign::Positive
            } else {
                FactorSign::Negative
            },
        })
        .collect()
}

/// Extracts `shapValues` from an attribution body. Anything malformed yields
/// no factors rather than an error.
pub fn factors_from_body(body: &Value) -> Vec<ShapFactor> {
    match body.get("shapValues") {
        Some(Value::Object(raw)) => rank(raw),
        _ => Vec::new(),
    }
}
