//! Vendor wire format.
//!
//! Raw types mirror the brokerage REST payloads field for field. Required
//! fields are non-optional, so a payload missing one fails to decode and the
//! whole call is reported as failed instead of being half-normalized.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vibe_models::{Interval, OrderSide, TimeInForce};

/// Maximum bars fetched per symbol and request.
pub const BAR_LIMIT: u32 = 10_000;

/// Maximum articles fetched per news request.
pub const NEWS_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Historical bars query for one or more symbols of the same asset class.
#[derive(Debug, Clone, PartialEq)]
pub struct BarsRequest {
    pub symbols: Vec<String>,
    pub interval: Interval,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: u32,
    pub sort: SortOrder,
}

impl BarsRequest {
    pub fn new(symbol: &str, interval: Interval) -> Self {
        Self {
            symbols: vec![symbol.to_string()],
            interval,
            start: None,
            end: None,
            limit: BAR_LIMIT,
            sort: SortOrder::Asc,
        }
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn latest(mut self) -> Self {
        self.limit = 1;
        self.sort = SortOrder::Desc;
        self
    }

    /// Query string pairs shared by the stock and crypto endpoints.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("symbols", self.symbols.join(",")),
            ("timeframe", self.interval.timeframe().to_string()),
            ("limit", self.limit.min(BAR_LIMIT).to_string()),
            ("sort", self.sort.as_str().to_string()),
        ];
        if let Some(start) = self.start {
            query.push(("start", rfc3339(start)));
        }
        if let Some(end) = self.end {
            query.push(("end", rfc3339(end)));
        }
        query
    }
}

/// One bar exactly as the vendor sends it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawBar {
    pub t: DateTime<Utc>,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
    #[serde(default)]
    pub n: u64,
    #[serde(default)]
    pub vw: f64,
}

/// One page of a bars response. `bars` is `null` on some empty answers.
#[derive(Debug, Clone, Deserialize)]
pub struct BarsPage {
    #[serde(default)]
    pub bars: Option<HashMap<String, Vec<RawBar>>>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// All pages of a bars request merged per symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarsResponse {
    pub bars: HashMap<String, Vec<RawBar>>,
}

impl BarsResponse {
    /// Merge one page into the collected bars. Returns the token to request
    /// next, or `None` once the vendor has no more pages or every symbol
    /// already holds `limit` bars.
    pub fn absorb(&mut self, page: BarsPage, limit: usize) -> Option<String> {
        for (symbol, mut rows) in page.bars.unwrap_or_default() {
            self.bars.entry(symbol).or_default().append(&mut rows);
        }

        let fetched = self.bars.values().map(Vec::len).max().unwrap_or(0);
        page.next_page_token.filter(|_| fetched < limit)
    }

    /// Cap every symbol at `limit` bars.
    pub fn truncate(&mut self, limit: usize) {
        for rows in self.bars.values_mut() {
            rows.truncate(limit);
        }
    }

    /// Bars for a symbol, `None` when absent or empty.
    pub fn take(&mut self, symbol: &str) -> Option<Vec<RawBar>> {
        self.bars.remove(symbol).filter(|bars| !bars.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRequest {
    pub symbol: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
}

impl NewsRequest {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbols", self.symbol.clone()),
            ("start", rfc3339(self.start)),
            ("end", rfc3339(self.end)),
            ("sort", SortOrder::Desc.as_str().to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawNews {
    pub id: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsPage {
    #[serde(default)]
    pub news: Vec<RawNews>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Market order submission body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: Decimal,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: &'static str,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    pub fn market(symbol: &str, qty: Decimal, side: OrderSide, time_in_force: TimeInForce) -> Self {
        Self {
            symbol: symbol.to_string(),
            qty,
            side,
            order_type: "market",
            time_in_force,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawOrder {
    pub id: String,
    pub symbol: String,
    pub qty: Option<Decimal>,
    pub filled_qty: Decimal,
    pub filled_avg_price: Option<Decimal>,
    pub order_type: String,
    pub side: String,
    pub time_in_force: String,
    pub status: String,
    #[serde(default)]
    pub position_intent: Option<String>,
    pub asset_class: String,
    pub created_at: String,
    pub submitted_at: Option<String>,
    pub filled_at: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPosition {
    pub symbol: String,
    pub exchange: String,
    pub asset_class: String,
    pub qty: Decimal,
    pub avg_entry_price: Decimal,
    pub side: String,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pl: Decimal,
    pub unrealized_plpc: Decimal,
    pub unrealized_intraday_pl: Decimal,
    pub unrealized_intraday_plpc: Decimal,
    pub current_price: Decimal,
    pub lastday_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawAccount {
    pub account_number: String,
    pub status: String,
    pub currency: String,
    pub buying_power: Decimal,
    pub effective_buying_power: Decimal,
    pub non_marginable_buying_power: Decimal,
    #[serde(default)]
    pub options_buying_power: Option<Decimal>,
    pub cash: Decimal,
    pub equity: Decimal,
    pub last_equity: Decimal,
    pub long_market_value: Decimal,
    pub short_market_value: Decimal,
    pub portfolio_value: Decimal,
    pub pattern_day_trader: bool,
    pub trading_blocked: bool,
    pub account_blocked: bool,
}

/// One entry of the multi-status close-all-positions answer. `body` is an
/// order on success and a `{code, message}` error otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawClosePosition {
    pub symbol: String,
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawAsset {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tradable: bool,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
