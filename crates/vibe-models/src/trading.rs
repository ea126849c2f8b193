use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Rejected side string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSide;

impl fmt::Display for InvalidSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid order side. Use 'buy' or 'sell'.")
    }
}

impl std::error::Error for InvalidSide {}

impl FromStr for OrderSide {
    type Err = InvalidSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("buy") {
            Ok(OrderSide::Buy)
        } else if s.eq_ignore_ascii_case("sell") {
            Ok(OrderSide::Sell)
        } else {
            Err(InvalidSide)
        }
    }
}

/// Order lifetime policy. Fixed per asset class: `Day` for equities,
/// `Gtc` for crypto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    Day,
    Gtc,
}

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderQueryStatus {
    All,
    Open,
    Closed,
}

impl OrderQueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderQueryStatus::All => "all",
            OrderQueryStatus::Open => "open",
            OrderQueryStatus::Closed => "closed",
        }
    }
}

/// An order as last reported by the vendor. Never mutated locally.
///
/// Vendor enums (`side`, `status`, ...) are forwarded as strings so new
/// vendor states pass through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    /// None for notional orders.
    pub qty: Option<Decimal>,
    pub filled_qty: Decimal,
    pub filled_avg_price: Option<Decimal>,
    pub order_type: String,
    pub side: String,
    pub time_in_force: String,
    pub status: String,
    pub position_intent: Option<String>,
    pub asset_class: String,
    pub created_at: String,
    pub submitted_at: Option<String>,
    pub filled_at: Option<String>,
    pub expires_at: Option<String>,
}

/// Snapshot of an open position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub exchange: String,
    pub asset_class: String,
    pub quantity: Decimal,
    pub average_entry_price: Decimal,
    pub side: String,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub total_pnl_since_buy_in_cash: Decimal,
    pub total_pnl_since_buy_in_percentage: Decimal,
    pub total_intraday_pnl_in_cash: Decimal,
    pub total_intraday_pnl_in_percentage: Decimal,
    pub current_price: Decimal,
    pub lastday_price: Decimal,
}

/// Account snapshot, trimmed to what matters for trading decisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub account_number: String,
    pub status: String,
    pub currency: String,
    pub buying_power: Decimal,
    pub cash: Decimal,
    pub equity: Decimal,
    pub last_equity: Decimal,
    pub long_market_value: Decimal,
    pub short_market_value: Decimal,
    pub portfolio_value: Decimal,
    pub buying_power_available: Decimal,
    pub non_marginable_buying_power: Decimal,
    pub options_buying_power: Option<Decimal>,
    pub pattern_day_trader: bool,
    pub trading_blocked: bool,
    pub account_blocked: bool,
}

/// Per-symbol outcome of a close-positions request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedPosition {
    pub symbol: String,
    /// HTTP status the vendor reported for this symbol.
    pub status: u16,
    pub order_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPlaced {
    pub order: Order,
}

/// Order listing. The field name depends on the query, matching what the
/// agent asked for (`orders`, `open_orders`, `closed_orders`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderList {
    #[serde(flatten)]
    pub orders: std::collections::BTreeMap<String, Vec<Order>>,
}

impl OrderList {
    pub fn new(status: OrderQueryStatus, orders: Vec<Order>) -> Self {
        let key = match status {
            OrderQueryStatus::All => "orders",
            OrderQueryStatus::Open => "open_orders",
            OrderQueryStatus::Closed => "closed_orders",
        };
        let mut map = std::collections::BTreeMap::new();
        map.insert(key.to_string(), orders);
        Self { orders: map }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelledOrder {
    pub cancelled_order: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenPositions {
    pub open_positions: Vec<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedPositions {
    pub closed_positions: Vec<ClosedPosition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub account: Account,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CryptoSymbols {
    pub available_crypto_symbols: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_is_case_insensitive() {
        for s in ["buy", "BUY", "Buy", "bUy"] {
            assert_eq!(s.parse::<OrderSide>(), Ok(OrderSide::Buy));
        }
        for s in ["sell", "SELL", "Sell"] {
            assert_eq!(s.parse::<OrderSide>(), Ok(OrderSide::Sell));
        }
    }

    #[test]
    fn unsupported_side_is_rejected() {
        for s in ["hold", "", "buy ", "short"] {
            let err = s.parse::<OrderSide>().unwrap_err();
            assert_eq!(err.to_string(), "Invalid order side. Use 'buy' or 'sell'.");
        }
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&OrderSide::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&TimeInForce::Gtc).unwrap(), "\"gtc\"");
        assert_eq!(OrderQueryStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn order_list_key_follows_query() {
        let json = serde_json::to_value(OrderList::new(OrderQueryStatus::Open, vec![])).unwrap();
        assert_eq!(json, serde_json::json!({"open_orders": []}));

        let json =
            serde_json::to_value(OrderList::new(OrderQueryStatus::Closed, vec![])).unwrap();
        assert_eq!(json, serde_json::json!({"closed_orders": []}));
    }

    #[test]
    fn decimals_serialize_as_strings() {
        let closed = ClosedPosition {
            symbol: "AAPL".to_string(),
            status: 200,
            order_id: Some("abc".to_string()),
            message: None,
        };
        let json = serde_json::to_value(&closed).unwrap();
        assert_eq!(json["status"], 200);

        let value = serde_json::to_value(dec!(0.0001)).unwrap();
        assert_eq!(value, serde_json::json!("0.0001"));
    }
}
