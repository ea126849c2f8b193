use chrono::Utc;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use vibe_broker::{market_data, news, trading, AdapterContext};
use vibe_models::{CurrentDate, ToolResult};

use crate::error::ToolError;
use crate::spec::{FunctionDeclaration, ParamSpec, ParamType, ToolSpec};

const SYMBOL: ParamSpec = ParamSpec::required(
    "symbol",
    ParamType::String,
    "Ticker symbol, e.g. 'AAPL' for a stock or 'BTC/USD' for a crypto pair.",
);
const STOCK_SYMBOL: ParamSpec =
    ParamSpec::required("symbol", ParamType::String, "Stock ticker symbol, e.g. 'AAPL'.");
const CRYPTO_SYMBOL: ParamSpec = ParamSpec::required(
    "symbol",
    ParamType::String,
    "Crypto pair in BASE/QUOTE form, e.g. 'BTC/USD'.",
);
const SYMBOLS: ParamSpec = ParamSpec::required(
    "symbols",
    ParamType::String,
    "Comma-separated symbols, e.g. 'AAPL,MSFT' or 'BTC/USD'.",
);
const ORDER_ID: ParamSpec =
    ParamSpec::required("order_id", ParamType::String, "Id of the order to cancel.");
const QUANTITY: ParamSpec = ParamSpec::required(
    "quantity",
    ParamType::Number,
    "Positive quantity to trade. Fractional quantities are allowed.",
);
const SIDE: ParamSpec =
    ParamSpec::required("side", ParamType::String, "Order side: 'buy' or 'sell'.");
const START: ParamSpec = ParamSpec::required(
    "start",
    ParamType::String,
    "Start date, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SSZ.",
);
const END: ParamSpec = ParamSpec::required(
    "end",
    ParamType::String,
    "End date, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SSZ.",
);
const INTERVAL: ParamSpec = ParamSpec::optional(
    "interval",
    ParamType::String,
    "Bar size: 'minute', 'hour' or 'day'. Defaults to 'day'.",
);

/// Every tool the registry exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetAccountInformation,
    GetAllOpenPositions,
    GetOpenOrders,
    GetClosedOrders,
    GetAllOrders,
    PlaceStockMarketOrder,
    PlaceCryptoMarketOrder,
    GetSupportedCryptoSymbols,
    FetchTodayNewsForSymbol,
    CancelOrderById,
    PanicExit,
    CloseAllPositions,
    ClosePosition,
    GetTodayCandlestickCryptoData,
    GetTodayCandlestickStockData,
    GetCurrentPrice,
    GetHistoricalPrices,
    GetYesterdaysPriceAction,
    PlotPriceAction,
    GetCurrentDate,
}

impl ToolKind {
    pub const ALL: [ToolKind; 20] = [
        ToolKind::GetAccountInformation,
        ToolKind::GetAllOpenPositions,
        ToolKind::GetOpenOrders,
        ToolKind::GetClosedOrders,
        ToolKind::GetAllOrders,
        ToolKind::PlaceStockMarketOrder,
        ToolKind::PlaceCryptoMarketOrder,
        ToolKind::GetSupportedCryptoSymbols,
        ToolKind::FetchTodayNewsForSymbol,
        ToolKind::CancelOrderById,
        ToolKind::PanicExit,
        ToolKind::CloseAllPositions,
        ToolKind::ClosePosition,
        ToolKind::GetTodayCandlestickCryptoData,
        ToolKind::GetTodayCandlestickStockData,
        ToolKind::GetCurrentPrice,
        ToolKind::GetHistoricalPrices,
        ToolKind::GetYesterdaysPriceAction,
        ToolKind::PlotPriceAction,
        ToolKind::GetCurrentDate,
    ];

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn spec(&self) -> ToolSpec {
        match self {
            ToolKind::GetAccountInformation => describe(
                "get_account_information",
                "Get account information including cash balance, buying power, equity and account status.",
                &[],
            ),
            ToolKind::GetAllOpenPositions => describe(
                "get_all_open_positions",
                "List all open positions with quantity, entry price, market value and profit and loss.",
                &[],
            ),
            ToolKind::GetOpenOrders => describe(
                "get_open_orders",
                "List orders that are still open.",
                &[],
            ),
            ToolKind::GetClosedOrders => describe(
                "get_closed_orders",
                "List orders that are filled, cancelled or expired.",
                &[],
            ),
            ToolKind::GetAllOrders => describe(
                "get_all_orders",
                "List all orders regardless of status.",
                &[],
            ),
            ToolKind::PlaceStockMarketOrder => describe(
                "place_stock_market_order",
                "Place a market order for a stock. The order is valid for the trading day.",
                &[STOCK_SYMBOL, QUANTITY, SIDE],
            ),
            ToolKind::PlaceCryptoMarketOrder => describe(
                "place_crypto_market_order",
                "Place a market order for a crypto pair. The order is good till cancelled.",
                &[CRYPTO_SYMBOL, QUANTITY, SIDE],
            ),
            ToolKind::GetSupportedCryptoSymbols => describe(
                "get_supported_crypto_symbols",
                "List the crypto pairs that can currently be traded, e.g. 'BTC/USD'.",
                &[],
            ),
            ToolKind::FetchTodayNewsForSymbol => describe(
                "fetch_today_news_for_symbol",
                "Fetch up to 10 of today's news articles for a symbol, newest first.",
                &[SYMBOL],
            ),
            ToolKind::CancelOrderById => describe(
                "cancel_order_by_id",
                "Cancel an open order by its id.",
                &[ORDER_ID],
            ),
            ToolKind::PanicExit => describe(
                "panic_exit",
                "Emergency exit: cancel all open orders and close all open positions.",
                &[],
            ),
            ToolKind::CloseAllPositions => describe(
                "close_all_positions",
                "Close all open positions. Open orders are left in place.",
                &[],
            ),
            ToolKind::ClosePosition => describe(
                "close_position",
                "Close the whole open position in one symbol.",
                &[SYMBOL],
            ),
            ToolKind::GetTodayCandlestickCryptoData => describe(
                "get_today_candlestick_crypto_data",
                "Fetch today's hourly candlesticks (UTC) for a crypto pair.",
                &[CRYPTO_SYMBOL],
            ),
            ToolKind::GetTodayCandlestickStockData => describe(
                "get_today_candlestick_stock_data",
                "Fetch today's hourly candlesticks (UTC) for a stock.",
                &[STOCK_SYMBOL],
            ),
            ToolKind::GetCurrentPrice => describe(
                "get_current_price",
                "Get the latest traded price for a stock or crypto pair.",
                &[SYMBOL],
            ),
            ToolKind::GetHistoricalPrices => describe(
                "get_historical_prices",
                "Get historical bars for one or more symbols over a date range.",
                &[SYMBOLS, START, END, INTERVAL],
            ),
            ToolKind::GetYesterdaysPriceAction => describe(
                "get_yesterdays_price_action",
                "Get yesterday's (UTC) open, high, low, close and volume for a symbol.",
                &[SYMBOL],
            ),
            ToolKind::PlotPriceAction => describe(
                "plot_price_action",
                "Plot a candlestick chart of a symbol over a date range and save it as an artifact.",
                &[SYMBOL, START, END, INTERVAL],
            ),
            ToolKind::GetCurrentDate => describe(
                "get_current_date",
                "Get today's date (UTC) as YYYY-MM-DD.",
                &[],
            ),
        }
    }
}

const fn describe(
    name: &'static str,
    description: &'static str,
    params: &'static [ParamSpec],
) -> ToolSpec {
    ToolSpec {
        name,
        description,
        params,
    }
}

#[derive(Debug, Deserialize)]
struct SymbolArgs {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct OrderArgs {
    symbol: String,
    quantity: Decimal,
    side: String,
}

#[derive(Debug, Deserialize)]
struct OrderIdArgs {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryArgs {
    symbols: String,
    start: String,
    end: String,
    #[serde(default = "default_interval")]
    interval: String,
}

#[derive(Debug, Deserialize)]
struct PlotArgs {
    symbol: String,
    start: String,
    end: String,
    #[serde(default = "default_interval")]
    interval: String,
}

fn default_interval() -> String {
    "day".to_string()
}

/// Function declarations for every tool, in registry order. Needs no
/// credentials.
pub fn declarations() -> Vec<FunctionDeclaration> {
    ToolKind::ALL.iter().map(|kind| kind.spec().declaration()).collect()
}

/// Name-based dispatch from agent tool calls to the adapters.
///
/// Adds no behaviour of its own: arguments are decoded, the adapter runs, and
/// its tagged result is serialized unchanged.
#[derive(Clone)]
pub struct ToolRegistry {
    ctx: AdapterContext,
}

impl ToolRegistry {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        ToolKind::ALL.iter().map(ToolKind::spec).collect()
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        declarations()
    }

    /// Invoke a tool by name. Always returns a status-tagged JSON object.
    pub async fn call(&self, name: &str, args: Value) -> Value {
        match self.dispatch(name, args).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool dispatch failed");
                error_value(&e)
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let tool = kind.name();
        let ctx = &self.ctx;
        debug!(tool, "Dispatching tool call");

        match kind {
            ToolKind::GetAccountInformation => {
                render(tool, trading::get_account_information(ctx).await)
            }
            ToolKind::GetAllOpenPositions => {
                render(tool, trading::get_all_open_positions(ctx).await)
            }
            ToolKind::GetOpenOrders => render(tool, trading::get_open_orders(ctx).await),
            ToolKind::GetClosedOrders => render(tool, trading::get_closed_orders(ctx).await),
            ToolKind::GetAllOrders => render(tool, trading::get_all_orders(ctx).await),
            ToolKind::PlaceStockMarketOrder => {
                let a: OrderArgs = decode(tool, args)?;
                render(
                    tool,
                    trading::place_stock_market_order(ctx, &a.symbol, a.quantity, &a.side).await,
                )
            }
            ToolKind::PlaceCryptoMarketOrder => {
                let a: OrderArgs = decode(tool, args)?;
                render(
                    tool,
                    trading::place_crypto_market_order(ctx, &a.symbol, a.quantity, &a.side).await,
                )
            }
            ToolKind::GetSupportedCryptoSymbols => {
                render(tool, trading::get_supported_crypto_symbols(ctx).await)
            }
            ToolKind::FetchTodayNewsForSymbol => {
                let a: SymbolArgs = decode(tool, args)?;
                render(tool, news::fetch_today_news_for_symbol(ctx, &a.symbol).await)
            }
            ToolKind::CancelOrderById => {
                let a: OrderIdArgs = decode(tool, args)?;
                render(tool, trading::cancel_order_by_id(ctx, &a.order_id).await)
            }
            ToolKind::PanicExit => render(tool, trading::panic_exit(ctx).await),
            ToolKind::CloseAllPositions => render(tool, trading::close_all_positions(ctx).await),
            ToolKind::ClosePosition => {
                let a: SymbolArgs = decode(tool, args)?;
                render(tool, trading::close_position(ctx, &a.symbol).await)
            }
            ToolKind::GetTodayCandlestickCryptoData => {
                let a: SymbolArgs = decode(tool, args)?;
                render(
                    tool,
                    market_data::get_today_candlestick_crypto_data(ctx, &a.symbol).await,
                )
            }
            ToolKind::GetTodayCandlestickStockData => {
                let a: SymbolArgs = decode(tool, args)?;
                render(
                    tool,
                    market_data::get_today_candlestick_stock_data(ctx, &a.symbol).await,
                )
            }
            ToolKind::GetCurrentPrice => {
                let a: SymbolArgs = decode(tool, args)?;
                render(tool, market_data::get_current_price(ctx, &a.symbol).await)
            }
            ToolKind::GetHistoricalPrices => {
                let a: HistoryArgs = decode(tool, args)?;
                let result = market_data::get_historical_prices(
                    ctx,
                    &a.symbols,
                    &a.start,
                    &a.end,
                    &a.interval,
                )
                .await;
                render(tool, result)
            }
            ToolKind::GetYesterdaysPriceAction => {
                let a: SymbolArgs = decode(tool, args)?;
                render(tool, market_data::get_yesterdays_price_action(ctx, &a.symbol).await)
            }
            ToolKind::PlotPriceAction => {
                let a: PlotArgs = decode(tool, args)?;
                render(
                    tool,
                    market_data::plot_price_action(ctx, &a.symbol, &a.start, &a.end, &a.interval)
                        .await,
                )
            }
            ToolKind::GetCurrentDate => render(tool, current_date()),
        }
    }
}

/// Today's UTC date.
pub fn current_date() -> ToolResult<CurrentDate> {
    ToolResult::Success(CurrentDate {
        date: Utc::now().format("%Y-%m-%d").to_string(),
    })
}

fn decode<T: DeserializeOwned>(tool: &'static str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn render<T: Serialize>(tool: &'static str, result: ToolResult<T>) -> Result<Value, ToolError> {
    serde_json::to_value(result).map_err(|source| ToolError::Serialize { tool, source })
}

fn error_value(error: &ToolError) -> Value {
    serde_json::json!({ "status": "error", "message": error.to_string() })
}
