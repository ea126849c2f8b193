use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::result::ToolResult;

/// Bar aggregation interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Minute,
    Hour,
    #[default]
    Day,
}

impl Interval {
    /// Parse an agent-supplied interval. Unrecognized values fall back to `Day`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "minute" => Interval::Minute,
            "hour" => Interval::Hour,
            _ => Interval::Day,
        }
    }

    /// Vendor timeframe string.
    pub fn timeframe(&self) -> &'static str {
        match self {
            Interval::Minute => "1Min",
            Interval::Hour => "1Hour",
            Interval::Day => "1Day",
        }
    }
}

/// One OHLCV bucket, normalized from the vendor's single-letter fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    /// UTC, `%Y-%m-%dT%H:%M:%SZ`.
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: u64,
    /// Volume-weighted average price.
    pub vwap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolHistory {
    pub symbol: String,
    pub historical_data: Vec<Bar>,
}

/// Per-symbol outcome of a multi-symbol history request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalPrices {
    pub results: BTreeMap<String, ToolResult<SymbolHistory>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodayCandles {
    pub candlestick_data: Vec<Bar>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceAction {
    pub symbol: String,
    pub yesterdays_price_action: Vec<Bar>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotOutcome {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsArticle {
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsDigest {
    pub news: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentDate {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
}
