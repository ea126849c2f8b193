//! Trading adapter: orders, positions and the account snapshot.
//!
//! Side and quantity are checked locally before anything reaches the vendor.
//! Buying power, position existence and symbol validity are the vendor's call.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};
use vibe_models::{
    Account, AccountSnapshot, AssetClass, CancelledOrder, ClosedPosition, ClosedPositions,
    CryptoSymbols, OpenPositions, Order, OrderList, OrderPlaced, OrderQueryStatus, OrderSide,
    Position, TimeInForce, ToolResult,
};

use crate::charts;
use crate::context::AdapterContext;
use crate::error::{conclude, BrokerError};
use crate::market_data::require_symbol;
use crate::wire::OrderRequest;

/// Market order for an equity, valid for the trading day.
pub async fn place_stock_market_order(
    ctx: &AdapterContext,
    symbol: &str,
    qty: Decimal,
    side: &str,
) -> ToolResult<OrderPlaced> {
    conclude(
        "place_stock_market_order",
        market_order(ctx, symbol, qty, side, TimeInForce::Day).await,
    )
}

/// Market order for a crypto pair, good till cancelled.
pub async fn place_crypto_market_order(
    ctx: &AdapterContext,
    symbol: &str,
    qty: Decimal,
    side: &str,
) -> ToolResult<OrderPlaced> {
    conclude(
        "place_crypto_market_order",
        market_order(ctx, symbol, qty, side, TimeInForce::Gtc).await,
    )
}

pub async fn get_all_orders(ctx: &AdapterContext) -> ToolResult<OrderList> {
    conclude("get_all_orders", orders(ctx, OrderQueryStatus::All).await)
}

pub async fn get_open_orders(ctx: &AdapterContext) -> ToolResult<OrderList> {
    conclude("get_open_orders", orders(ctx, OrderQueryStatus::Open).await)
}

pub async fn get_closed_orders(ctx: &AdapterContext) -> ToolResult<OrderList> {
    conclude("get_closed_orders", orders(ctx, OrderQueryStatus::Closed).await)
}

pub async fn cancel_order_by_id(
    ctx: &AdapterContext,
    order_id: &str,
) -> ToolResult<CancelledOrder> {
    conclude("cancel_order_by_id", cancel(ctx, order_id).await)
}

pub async fn get_all_open_positions(ctx: &AdapterContext) -> ToolResult<OpenPositions> {
    conclude("get_all_open_positions", open_positions(ctx).await)
}

/// Liquidate one position.
pub async fn close_position(ctx: &AdapterContext, symbol: &str) -> ToolResult<ClosedPositions> {
    conclude("close_position", close_one(ctx, symbol).await)
}

/// Liquidate every position, leaving open orders in place.
pub async fn close_all_positions(ctx: &AdapterContext) -> ToolResult<ClosedPositions> {
    conclude("close_all_positions", close_all(ctx, false).await)
}

/// Cancel every open order and liquidate every position in one vendor call.
pub async fn panic_exit(ctx: &AdapterContext) -> ToolResult<ClosedPositions> {
    conclude("panic_exit", close_all(ctx, true).await)
}

pub async fn get_account_information(ctx: &AdapterContext) -> ToolResult<AccountSnapshot> {
    conclude("get_account_information", account(ctx).await)
}

pub async fn get_supported_crypto_symbols(ctx: &AdapterContext) -> ToolResult<CryptoSymbols> {
    conclude("get_supported_crypto_symbols", crypto_symbols(ctx).await)
}

async fn market_order(
    ctx: &AdapterContext,
    symbol: &str,
    qty: Decimal,
    side: &str,
    time_in_force: TimeInForce,
) -> Result<OrderPlaced, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let side: OrderSide = side
        .parse()
        .map_err(|e: vibe_models::InvalidSide| BrokerError::InvalidInput(e.to_string()))?;
    if qty <= Decimal::ZERO {
        return Err(BrokerError::InvalidInput(
            "Quantity must be greater than zero.".to_string(),
        ));
    }

    let request = OrderRequest::market(symbol, qty, side, time_in_force);
    let order: Order = ctx.api().submit_order(&request).await?.into();

    info!(
        order_id = %order.id,
        symbol = %order.symbol,
        side = ?side,
        qty = %qty,
        asset_class = AssetClass::of(symbol).as_str(),
        status = %order.status,
        "Market order submitted"
    );
    Ok(OrderPlaced { order })
}

async fn orders(ctx: &AdapterContext, status: OrderQueryStatus) -> Result<OrderList, BrokerError> {
    let orders: Vec<Order> = ctx
        .api()
        .list_orders(status)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    debug!(status = status.as_str(), count = orders.len(), "Orders received");
    Ok(OrderList::new(status, orders))
}

async fn cancel(ctx: &AdapterContext, order_id: &str) -> Result<CancelledOrder, BrokerError> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(BrokerError::InvalidInput(
            "Order id must not be empty.".to_string(),
        ));
    }

    ctx.api().cancel_order(order_id).await?;
    info!(order_id, "Order cancelled");

    Ok(CancelledOrder {
        cancelled_order: order_id.to_string(),
    })
}

async fn open_positions(ctx: &AdapterContext) -> Result<OpenPositions, BrokerError> {
    let positions: Vec<Position> = ctx
        .api()
        .list_positions()
        .await?
        .into_iter()
        .map(Position::from)
        .collect();

    if ctx.charts_enabled() && !positions.is_empty() {
        let now = Utc::now();
        ctx.publish(charts::positions_distribution(&positions, now))
            .await;
        ctx.publish(charts::positions_pnl(&positions, now)).await;
    }

    Ok(OpenPositions {
        open_positions: positions,
    })
}

async fn close_one(ctx: &AdapterContext, symbol: &str) -> Result<ClosedPositions, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let order = ctx.api().close_position(symbol).await?;
    info!(symbol, order_id = %order.id, "Position closed");

    Ok(ClosedPositions {
        closed_positions: vec![ClosedPosition {
            symbol: symbol.to_string(),
            status: 200,
            order_id: Some(order.id),
            message: None,
        }],
    })
}

async fn close_all(
    ctx: &AdapterContext,
    cancel_orders: bool,
) -> Result<ClosedPositions, BrokerError> {
    let closed: Vec<ClosedPosition> = ctx
        .api()
        .close_all_positions(cancel_orders)
        .await?
        .into_iter()
        .map(ClosedPosition::from)
        .collect();

    info!(cancel_orders, count = closed.len(), "Positions closed");
    Ok(ClosedPositions {
        closed_positions: closed,
    })
}

async fn account(ctx: &AdapterContext) -> Result<AccountSnapshot, BrokerError> {
    let account: Account = ctx.api().get_account().await?.into();

    if ctx.charts_enabled() {
        ctx.publish(charts::account_allocation(&account, Utc::now()))
            .await;
    }

    Ok(AccountSnapshot { account })
}

async fn crypto_symbols(ctx: &AdapterContext) -> Result<CryptoSymbols, BrokerError> {
    let symbols = ctx
        .api()
        .list_assets(AssetClass::Crypto)
        .await?
        .into_iter()
        .map(|asset| asset.symbol)
        .collect();

    Ok(CryptoSymbols {
        available_crypto_symbols: symbols,
    })
}
