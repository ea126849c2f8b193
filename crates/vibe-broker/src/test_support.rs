//! Test support: an in-memory broker that records every vendor call, a
//! recording artifact sink, and vendor payload fixtures.
//!
//! `MockBroker` answers the way the vendor does for the cases the adapters
//! care about: bars honour sort and limit, order listings honour the status
//! filter, unknown orders and positions are 404s, and closing positions
//! removes them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use vibe_models::symbol::compact;
use vibe_models::{AssetClass, ChartArtifact, OrderQueryStatus, OrderSide, TimeInForce};

use crate::api::BrokerApi;
use crate::error::BrokerError;
use crate::sink::ArtifactSink;
use crate::wire::{
    BarsRequest, BarsResponse, NewsRequest, OrderRequest, RawAccount, RawAsset, RawBar,
    RawClosePosition, RawNews, RawOrder, RawPosition, SortOrder,
};

/// Order states the vendor lists under `status=closed`.
const CLOSED_ORDER_STATES: [&str; 4] = ["filled", "canceled", "expired", "rejected"];

/// One recorded vendor call.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    Bars {
        asset_class: AssetClass,
        request: BarsRequest,
    },
    News(NewsRequest),
    SubmitOrder(OrderRequest),
    ListOrders(OrderQueryStatus),
    CancelOrder(String),
    ListPositions,
    ClosePosition(String),
    CloseAllPositions { cancel_orders: bool },
    GetAccount,
    ListAssets(AssetClass),
}

#[derive(Default)]
struct MockState {
    bars: HashMap<String, Vec<RawBar>>,
    news: Vec<RawNews>,
    orders: Vec<RawOrder>,
    positions: Vec<RawPosition>,
    account: Option<RawAccount>,
    assets: Vec<RawAsset>,
    failure: Option<(u16, String)>,
    calls: Vec<BrokerCall>,
}

/// In-memory `BrokerApi`.
#[derive(Default)]
pub struct MockBroker {
    state: Mutex<MockState>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.lock().bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_news(self, news: Vec<RawNews>) -> Self {
        self.lock().news = news;
        self
    }

    pub fn with_orders(self, orders: Vec<RawOrder>) -> Self {
        self.lock().orders = orders;
        self
    }

    pub fn with_positions(self, positions: Vec<RawPosition>) -> Self {
        self.lock().positions = positions;
        self
    }

    pub fn with_account(self, account: RawAccount) -> Self {
        self.lock().account = Some(account);
        self
    }

    pub fn with_assets(self, assets: Vec<RawAsset>) -> Self {
        self.lock().assets = assets;
        self
    }

    /// Reject every call with the given status and vendor message.
    pub fn failing(self, status: u16, message: &str) -> Self {
        self.lock().failure = Some((status, message.to_string()));
        self
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a call and return the state, or the configured failure.
    fn begin(&self, call: BrokerCall) -> Result<MutexGuard<'_, MockState>, BrokerError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some((status, message)) = state.failure.clone() {
            return Err(BrokerError::Api { status, message });
        }
        Ok(state)
    }
}

#[async_trait]
impl BrokerApi for MockBroker {
    async fn get_bars(
        &self,
        asset_class: AssetClass,
        request: &BarsRequest,
    ) -> Result<BarsResponse, BrokerError> {
        let state = self.begin(BrokerCall::Bars {
            asset_class,
            request: request.clone(),
        })?;

        let mut response = BarsResponse::default();
        for symbol in &request.symbols {
            let Some(bars) = state.bars.get(symbol) else {
                continue;
            };
            let mut bars = bars.clone();
            if request.sort == SortOrder::Desc {
                bars.reverse();
            }
            bars.truncate(request.limit as usize);
            response.bars.insert(symbol.clone(), bars);
        }
        Ok(response)
    }

    async fn get_news(&self, request: &NewsRequest) -> Result<Vec<RawNews>, BrokerError> {
        let state = self.begin(BrokerCall::News(request.clone()))?;
        Ok(state
            .news
            .iter()
            .take(request.limit as usize)
            .cloned()
            .collect())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<RawOrder, BrokerError> {
        let mut state = self.begin(BrokerCall::SubmitOrder(order.clone()))?;

        let side = match order.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };
        let time_in_force = match order.time_in_force {
            TimeInForce::Day => "day",
            TimeInForce::Gtc => "gtc",
        };

        let mut raw = raw_order(&uuid::Uuid::new_v4().to_string(), &order.symbol, side);
        raw.qty = Some(order.qty);
        raw.time_in_force = time_in_force.to_string();
        raw.asset_class = AssetClass::of(&order.symbol).as_str().to_string();
        state.orders.push(raw.clone());
        Ok(raw)
    }

    async fn list_orders(&self, status: OrderQueryStatus) -> Result<Vec<RawOrder>, BrokerError> {
        let state = self.begin(BrokerCall::ListOrders(status))?;
        let orders = state.orders.iter().filter(|order| {
            let closed = CLOSED_ORDER_STATES.contains(&order.status.as_str());
            match status {
                OrderQueryStatus::All => true,
                OrderQueryStatus::Open => !closed,
                OrderQueryStatus::Closed => closed,
            }
        });
        Ok(orders.cloned().collect())
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        let mut state = self.begin(BrokerCall::CancelOrder(order_id.to_string()))?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| BrokerError::Api {
                status: 404,
                message: "order not found".to_string(),
            })?;
        order.status = "canceled".to_string();
        Ok(())
    }

    async fn list_positions(&self) -> Result<Vec<RawPosition>, BrokerError> {
        let state = self.begin(BrokerCall::ListPositions)?;
        Ok(state.positions.clone())
    }

    async fn close_position(&self, symbol: &str) -> Result<RawOrder, BrokerError> {
        let mut state = self.begin(BrokerCall::ClosePosition(symbol.to_string()))?;
        let wanted = compact(symbol);
        let index = state
            .positions
            .iter()
            .position(|p| compact(&p.symbol) == wanted)
            .ok_or_else(|| BrokerError::Api {
                status: 404,
                message: format!("position not found: {wanted}"),
            })?;

        let position = state.positions.remove(index);
        Ok(closing_order(&position))
    }

    async fn close_all_positions(
        &self,
        cancel_orders: bool,
    ) -> Result<Vec<RawClosePosition>, BrokerError> {
        let mut state = self.begin(BrokerCall::CloseAllPositions { cancel_orders })?;
        if cancel_orders {
            for order in &mut state.orders {
                order.status = "canceled".to_string();
            }
        }

        let closed = state
            .positions
            .drain(..)
            .map(|position| {
                let order = closing_order(&position);
                RawClosePosition {
                    symbol: position.symbol,
                    status: 200,
                    body: serde_json::json!({ "id": order.id, "status": order.status }),
                }
            })
            .collect();
        Ok(closed)
    }

    async fn get_account(&self) -> Result<RawAccount, BrokerError> {
        let state = self.begin(BrokerCall::GetAccount)?;
        Ok(state.account.clone().unwrap_or_else(raw_account))
    }

    async fn list_assets(&self, asset_class: AssetClass) -> Result<Vec<RawAsset>, BrokerError> {
        let state = self.begin(BrokerCall::ListAssets(asset_class))?;
        Ok(state.assets.clone())
    }
}

/// Artifact sink that remembers what it was given.
#[derive(Default)]
pub struct RecordingSink {
    saved: Mutex<Vec<ChartArtifact>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every save fails.
    pub fn failing() -> Self {
        Self {
            saved: Mutex::default(),
            fail: true,
        }
    }

    pub fn artifacts(&self) -> Vec<ChartArtifact> {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.artifacts().into_iter().map(|a| a.filename).collect()
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn save(&self, artifact: ChartArtifact) -> Result<(), BrokerError> {
        if self.fail {
            return Err(BrokerError::Artifact("artifact store unavailable".to_string()));
        }
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(artifact);
        Ok(())
    }
}

fn closing_order(position: &RawPosition) -> RawOrder {
    let side = if position.side == "short" { "buy" } else { "sell" };
    let mut order = raw_order(&uuid::Uuid::new_v4().to_string(), &position.symbol, side);
    order.qty = Some(position.qty);
    order.asset_class = position.asset_class.clone();
    order
}

pub fn raw_bar(t: DateTime<Utc>, close: f64) -> RawBar {
    RawBar {
        t,
        o: close - 1.0,
        h: close + 1.5,
        l: close - 2.0,
        c: close,
        v: 1_000.0,
        n: 42,
        vw: close - 0.25,
    }
}

pub fn raw_news(id: i64, headline: &str) -> RawNews {
    RawNews {
        id,
        headline: headline.to_string(),
        summary: format!("{headline}, in brief."),
        source: "benzinga".to_string(),
        url: format!("https://www.benzinga.com/news/{id}"),
        author: "Benzinga Newsdesk".to_string(),
        created_at: "2025-07-01T08:19:20Z".to_string(),
        symbols: vec!["BTCUSD".to_string()],
    }
}

pub fn raw_order(id: &str, symbol: &str, side: &str) -> RawOrder {
    RawOrder {
        id: id.to_string(),
        symbol: symbol.to_string(),
        qty: Some(Decimal::ONE),
        filled_qty: Decimal::ZERO,
        filled_avg_price: None,
        order_type: "market".to_string(),
        side: side.to_string(),
        time_in_force: "day".to_string(),
        status: "accepted".to_string(),
        position_intent: Some(format!("{side}_to_open")),
        asset_class: AssetClass::of(symbol).as_str().to_string(),
        created_at: "2025-07-01T13:15:19.895354426Z".to_string(),
        submitted_at: Some("2025-07-01T13:15:19.895354426Z".to_string()),
        filled_at: None,
        expires_at: None,
    }
}

/// Half a share bought at 203.50, now worth 103.50.
pub fn raw_position(symbol: &str) -> RawPosition {
    let crypto = symbol.ends_with("USD") && symbol.len() > 4;
    RawPosition {
        symbol: symbol.to_string(),
        exchange: if crypto { "CRYPTO" } else { "NASDAQ" }.to_string(),
        asset_class: if crypto { "crypto" } else { "us_equity" }.to_string(),
        qty: Decimal::new(5, 1),
        avg_entry_price: Decimal::new(2035, 1),
        side: "long".to_string(),
        market_value: Decimal::new(1035, 1),
        cost_basis: Decimal::new(10175, 2),
        unrealized_pl: Decimal::new(17, 1),
        unrealized_plpc: Decimal::new(167076, 7),
        unrealized_intraday_pl: Decimal::new(865, 3),
        unrealized_intraday_plpc: Decimal::new(84320, 7),
        current_price: Decimal::new(207, 0),
        lastday_price: Decimal::new(20517, 2),
    }
}

pub fn raw_account() -> RawAccount {
    RawAccount {
        account_number: "PA3NV9Q7CWET".to_string(),
        status: "ACTIVE".to_string(),
        currency: "USD".to_string(),
        buying_power: Decimal::new(19917871, 2),
        effective_buying_power: Decimal::new(19917871, 2),
        non_marginable_buying_power: Decimal::new(9932741, 2),
        options_buying_power: Some(Decimal::new(9932741, 2)),
        cash: Decimal::new(9949165, 2),
        equity: Decimal::new(9993641, 2),
        last_equity: Decimal::new(99954515, 3),
        long_market_value: Decimal::new(44476, 2),
        short_market_value: Decimal::ZERO,
        portfolio_value: Decimal::new(9993641, 2),
        pattern_day_trader: false,
        trading_blocked: false,
        account_blocked: false,
    }
}

pub fn raw_asset(symbol: &str) -> RawAsset {
    RawAsset {
        symbol: symbol.to_string(),
        name: format!("{symbol} pair"),
        tradable: true,
    }
}

pub fn sample_position(symbol: &str) -> vibe_models::Position {
    raw_position(symbol).into()
}

pub fn sample_account() -> vibe_models::Account {
    raw_account().into()
}
