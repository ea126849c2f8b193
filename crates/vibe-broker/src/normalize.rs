//! Vendor payload -> stable agent schema.
//!
//! Conversions are total: the raw types already guarantee every required
//! field is present, so nothing here can half-normalize a payload.

use vibe_models::{Account, Bar, ClosedPosition, NewsArticle, Order, Position};

use crate::wire::{RawAccount, RawBar, RawClosePosition, RawNews, RawOrder, RawPosition};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

impl From<RawBar> for Bar {
    fn from(raw: RawBar) -> Self {
        Bar {
            timestamp: raw.t.format(TIMESTAMP_FORMAT).to_string(),
            open: raw.o,
            high: raw.h,
            low: raw.l,
            close: raw.c,
            volume: raw.v,
            trade_count: raw.n,
            vwap: raw.vw,
        }
    }
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        Order {
            id: raw.id,
            symbol: raw.symbol,
            qty: raw.qty,
            filled_qty: raw.filled_qty,
            filled_avg_price: raw.filled_avg_price,
            order_type: raw.order_type,
            side: raw.side,
            time_in_force: raw.time_in_force,
            status: raw.status,
            position_intent: raw.position_intent,
            asset_class: raw.asset_class,
            created_at: raw.created_at,
            submitted_at: raw.submitted_at,
            filled_at: raw.filled_at,
            expires_at: raw.expires_at,
        }
    }
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Position {
            symbol: raw.symbol,
            exchange: raw.exchange,
            asset_class: raw.asset_class,
            quantity: raw.qty,
            average_entry_price: raw.avg_entry_price,
            side: raw.side,
            market_value: raw.market_value,
            cost_basis: raw.cost_basis,
            total_pnl_since_buy_in_cash: raw.unrealized_pl,
            total_pnl_since_buy_in_percentage: raw.unrealized_plpc,
            total_intraday_pnl_in_cash: raw.unrealized_intraday_pl,
            total_intraday_pnl_in_percentage: raw.unrealized_intraday_plpc,
            current_price: raw.current_price,
            lastday_price: raw.lastday_price,
        }
    }
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        Account {
            account_number: raw.account_number,
            status: raw.status,
            currency: raw.currency,
            buying_power: raw.buying_power,
            cash: raw.cash,
            equity: raw.equity,
            last_equity: raw.last_equity,
            long_market_value: raw.long_market_value,
            short_market_value: raw.short_market_value,
            portfolio_value: raw.portfolio_value,
            buying_power_available: raw.effective_buying_power,
            non_marginable_buying_power: raw.non_marginable_buying_power,
            options_buying_power: raw.options_buying_power,
            pattern_day_trader: raw.pattern_day_trader,
            trading_blocked: raw.trading_blocked,
            account_blocked: raw.account_blocked,
        }
    }
}

impl From<RawNews> for NewsArticle {
    fn from(raw: RawNews) -> Self {
        NewsArticle {
            headline: raw.headline,
            summary: raw.summary,
            source: raw.source,
            url: raw.url,
            created_at: raw.created_at,
        }
    }
}

impl From<RawClosePosition> for ClosedPosition {
    fn from(raw: RawClosePosition) -> Self {
        let field = |name: &str| {
            raw.body
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let (order_id, message) = if (200..300).contains(&raw.status) {
            (field("id"), None)
        } else {
            (None, field("message"))
        };

        ClosedPosition {
            symbol: raw.symbol,
            status: raw.status,
            order_id,
            message,
        }
    }
}

/// Normalize a vendor bar series, preserving order.
pub fn bars(raw: Vec<RawBar>) -> Vec<Bar> {
    raw.into_iter().map(Bar::from).collect()
}
