use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::symbol::compact;

/// A chart description handed to an artifact sink. Rendering is the sink's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub data: ChartData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Candlestick { points: Vec<CandlePoint> },
    Pie { slices: Vec<LabeledValue> },
    Bar { bars: Vec<LabeledValue> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandlePoint {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

/// A named chart on its way to an artifact store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartArtifact {
    pub filename: String,
    pub chart: Chart,
}

/// Artifact file name: `<purpose>_<SYMBOL>_<YYYYMMDD_HHMMSS>.png`.
///
/// The symbol segment is dropped for portfolio-wide charts, and pair
/// separators are stripped (`BTC/USD` -> `BTCUSD`).
pub fn artifact_filename(purpose: &str, symbol: Option<&str>, at: DateTime<Utc>) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    match symbol {
        Some(symbol) => format!("{purpose}_{}_{stamp}.png", compact(symbol)),
        None => format!("{purpose}_{stamp}.png"),
    }
}
