pub mod chart;
pub mod config;
pub mod market;
pub mod result;
pub mod symbol;
pub mod trading;

pub use chart::{artifact_filename, CandlePoint, Chart, ChartArtifact, ChartData, LabeledValue};
pub use config::{BrokerConfig, ChartConfig, VibeConfig};
pub use market::{
    Bar, CurrentDate, HistoricalPrices, Interval, NewsArticle, NewsDigest, PlotOutcome,
    PriceAction, PriceQuote, SymbolHistory, TodayCandles,
};
pub use result::ToolResult;
pub use symbol::AssetClass;
pub use trading::{
    Account, AccountSnapshot, CancelledOrder, ClosedPosition, ClosedPositions, CryptoSymbols,
    InvalidSide, OpenPositions, Order, OrderList, OrderPlaced, OrderQueryStatus, OrderSide,
    Position, TimeInForce,
};
