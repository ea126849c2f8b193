//! Market-data adapter: prices, bar history and candlesticks for equities and
//! crypto pairs. The route is picked from the symbol's syntax.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::debug;
use vibe_models::{
    AssetClass, Bar, HistoricalPrices, Interval, PlotOutcome, PriceAction, PriceQuote,
    SymbolHistory, TodayCandles, ToolResult,
};

use crate::charts;
use crate::context::AdapterContext;
use crate::error::{conclude, BrokerError};
use crate::normalize;
use crate::wire::BarsRequest;

/// How far back the latest-price lookup reaches, so weekends and holidays
/// still find the last traded minute.
pub const PRICE_LOOKBACK_DAYS: i64 = 7;

/// Latest one-minute close for a symbol.
pub async fn get_current_price(ctx: &AdapterContext, symbol: &str) -> ToolResult<PriceQuote> {
    conclude("get_current_price", current_price(ctx, symbol, Utc::now()).await)
}

/// Bar history for a comma-separated list of symbols, one tagged result per
/// symbol. `start`/`end` accept `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or RFC 3339.
pub async fn get_historical_prices(
    ctx: &AdapterContext,
    symbols: &str,
    start: &str,
    end: &str,
    interval: &str,
) -> ToolResult<HistoricalPrices> {
    conclude(
        "get_historical_prices",
        historical_prices(ctx, symbols, start, end, interval).await,
    )
}

pub async fn get_today_candlestick_stock_data(
    ctx: &AdapterContext,
    symbol: &str,
) -> ToolResult<TodayCandles> {
    conclude(
        "get_today_candlestick_stock_data",
        today_candles(ctx, AssetClass::Equity, symbol, Utc::now()).await,
    )
}

pub async fn get_today_candlestick_crypto_data(
    ctx: &AdapterContext,
    symbol: &str,
) -> ToolResult<TodayCandles> {
    conclude(
        "get_today_candlestick_crypto_data",
        today_candles(ctx, AssetClass::Crypto, symbol, Utc::now()).await,
    )
}

/// Daily bar(s) for the previous UTC day.
pub async fn get_yesterdays_price_action(
    ctx: &AdapterContext,
    symbol: &str,
) -> ToolResult<PriceAction> {
    conclude(
        "get_yesterdays_price_action",
        yesterdays_price_action(ctx, symbol, Utc::now()).await,
    )
}

/// Hand a candlestick chart of a date range to the artifact sink.
pub async fn plot_price_action(
    ctx: &AdapterContext,
    symbol: &str,
    start: &str,
    end: &str,
    interval: &str,
) -> ToolResult<PlotOutcome> {
    conclude(
        "plot_price_action",
        price_action_plot(ctx, symbol, start, end, interval, Utc::now()).await,
    )
}

async fn current_price(
    ctx: &AdapterContext,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<PriceQuote, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let mut request = BarsRequest::new(symbol, Interval::Minute).latest();
    request.start = Some(now - Duration::days(PRICE_LOOKBACK_DAYS));

    let bar = fetch_bars(ctx, AssetClass::of(symbol), &request)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BrokerError::NoData(format!("No price data found for {symbol}.")))?;

    Ok(PriceQuote {
        symbol: symbol.to_string(),
        price: bar.close,
        timestamp: bar.timestamp,
    })
}

async fn historical_prices(
    ctx: &AdapterContext,
    symbols: &str,
    start: &str,
    end: &str,
    interval: &str,
) -> Result<HistoricalPrices, BrokerError> {
    let symbols = split_symbols(symbols)?;
    let start = parse_when(start)?;
    let end = parse_when(end)?;
    let interval = Interval::parse_lenient(interval);

    let mut results = BTreeMap::new();
    for symbol in symbols {
        let outcome = symbol_history(ctx, &symbol, start, end, interval).await;
        results.insert(symbol, outcome.into());
    }

    Ok(HistoricalPrices { results })
}

async fn symbol_history(
    ctx: &AdapterContext,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: Interval,
) -> Result<SymbolHistory, BrokerError> {
    let request = BarsRequest::new(symbol, interval).between(start, end);
    let bars = fetch_bars(ctx, AssetClass::of(symbol), &request).await?;
    if bars.is_empty() {
        return Err(BrokerError::NoData(format!(
            "No historical data found for {symbol}."
        )));
    }

    Ok(SymbolHistory {
        symbol: symbol.to_string(),
        historical_data: bars,
    })
}

async fn today_candles(
    ctx: &AdapterContext,
    asset_class: AssetClass,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<TodayCandles, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let (start, end) = day_range(now.date_naive())?;
    let request = BarsRequest::new(symbol, Interval::Hour).between(start, end);

    let bars = fetch_bars(ctx, asset_class, &request).await?;
    if bars.is_empty() {
        return Err(BrokerError::NoData(format!(
            "No candlestick data found for symbol {symbol}."
        )));
    }

    if ctx.charts_enabled() {
        let title = format!("{symbol} Today's Candlestick (Hourly)");
        ctx.publish(charts::candlestick("today_candlestick", symbol, title, &bars, now))
            .await;
    }

    Ok(TodayCandles {
        candlestick_data: bars,
    })
}

async fn yesterdays_price_action(
    ctx: &AdapterContext,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<PriceAction, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let yesterday = now.date_naive() - Duration::days(1);
    let (start, _) = day_range(yesterday)?;
    let end = start + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59);

    let no_data = || {
        BrokerError::NoData(format!(
            "No price action found for {symbol} on {yesterday}."
        ))
    };

    let history = match symbol_history(ctx, symbol, start, end, Interval::Day).await {
        Ok(history) => history,
        Err(BrokerError::NoData(_)) => return Err(no_data()),
        Err(e) => return Err(e),
    };

    Ok(PriceAction {
        symbol: symbol.to_string(),
        yesterdays_price_action: history.historical_data,
    })
}

async fn price_action_plot(
    ctx: &AdapterContext,
    symbol: &str,
    start: &str,
    end: &str,
    interval: &str,
    now: DateTime<Utc>,
) -> Result<PlotOutcome, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let start_at = parse_when(start)?;
    let end_at = parse_when(end)?;
    let interval = Interval::parse_lenient(interval);

    let history = symbol_history(ctx, symbol, start_at, end_at, interval).await?;

    if !ctx.charts_enabled() {
        return Ok(PlotOutcome {
            message: "Chart plotting is disabled.".to_string(),
        });
    }

    let title = format!("{symbol} Price Action ({start} to {end})");
    let artifact =
        charts::candlestick("price_action", symbol, title, &history.historical_data, now);
    let filename = artifact.filename.clone();

    let message = if ctx.publish(artifact).await {
        format!("Chart saved as {filename}.")
    } else {
        format!("Chart {filename} could not be saved.")
    };

    Ok(PlotOutcome { message })
}

/// Fetch and normalize the bars of a single-symbol request.
async fn fetch_bars(
    ctx: &AdapterContext,
    asset_class: AssetClass,
    request: &BarsRequest,
) -> Result<Vec<Bar>, BrokerError> {
    let mut response = ctx.api().get_bars(asset_class, request).await?;
    let bars = request
        .symbols
        .first()
        .and_then(|symbol| response.take(symbol))
        .map(normalize::bars)
        .unwrap_or_default();

    debug!(symbols = ?request.symbols, count = bars.len(), "Bars received");
    Ok(bars)
}

pub(crate) fn require_symbol(symbol: &str) -> Result<&str, BrokerError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(BrokerError::InvalidInput(
            "Symbol must not be empty.".to_string(),
        ));
    }
    Ok(symbol)
}

fn split_symbols(symbols: &str) -> Result<Vec<String>, BrokerError> {
    let list: Vec<String> = symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if list.is_empty() {
        return Err(BrokerError::InvalidInput(
            "At least one symbol is required.".to_string(),
        ));
    }
    Ok(list)
}

/// Parse an agent-supplied date or timestamp. Values without an offset are
/// taken as UTC.
pub fn parse_when(value: &str) -> Result<DateTime<Utc>, BrokerError> {
    let value = value.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&at));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    Err(BrokerError::InvalidInput(format!(
        "Invalid date '{value}'. Use YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or an RFC 3339 timestamp."
    )))
}

/// First and last microsecond of a UTC day.
pub fn day_range(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), BrokerError> {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    let end = start
        .checked_add_signed(Duration::days(1))
        .and_then(|next| next.checked_sub_signed(Duration::microseconds(1)))
        .ok_or_else(|| BrokerError::InvalidInput(format!("Date {date} is out of range.")))?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_support::{raw_bar, BrokerCall, MockBroker, RecordingSink};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn ctx(mock: MockBroker) -> (Arc<MockBroker>, AdapterContext) {
        let mock = Arc::new(mock);
        (mock.clone(), AdapterContext::new(mock))
    }

    #[tokio::test]
    async fn current_price_is_latest_close() {
        let (mock, ctx) = ctx(MockBroker::new().with_bars(
            "AAPL",
            vec![
                raw_bar(at(2025, 6, 30, 13, 58, 0), 200.10),
                raw_bar(at(2025, 6, 30, 13, 59, 0), 200.50),
            ],
        ));

        let quote = get_current_price(&ctx, "AAPL").await.success().unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, 200.50);
        assert_eq!(quote.timestamp, "2025-06-30T13:59:00Z");

        match &mock.calls()[0] {
            BrokerCall::Bars { asset_class, request } => {
                assert_eq!(*asset_class, AssetClass::Equity);
                assert_eq!(request.interval, Interval::Minute);
                assert_eq!(request.limit, 1);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn slash_symbol_routes_to_crypto() {
        let (mock, ctx) = ctx(MockBroker::new().with_bars(
            "BTC/USD",
            vec![raw_bar(at(2025, 7, 1, 0, 0, 0), 107_000.0)],
        ));

        let quote = get_current_price(&ctx, "BTC/USD").await;
        assert!(quote.is_success());
        assert!(matches!(
            mock.calls()[0],
            BrokerCall::Bars {
                asset_class: AssetClass::Crypto,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_symbol_has_no_price() {
        let (_, ctx) = ctx(MockBroker::new());
        let result = get_current_price(&ctx, "ZZZZ").await;
        assert_eq!(result.message(), Some("No price data found for ZZZZ."));
    }

    #[tokio::test]
    async fn blank_symbol_is_rejected_before_any_call() {
        let (mock, ctx) = ctx(MockBroker::new());
        let result = get_current_price(&ctx, "  ").await;
        assert_eq!(result.message(), Some("Symbol must not be empty."));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn vendor_failure_becomes_error_result() {
        let (_, ctx) = ctx(MockBroker::new().failing(401, "request is not authorized"));
        let result = get_current_price(&ctx, "AAPL").await;
        assert_eq!(result.message(), Some("request is not authorized"));
    }

    #[tokio::test]
    async fn history_reports_each_symbol() {
        let (mock, ctx) = ctx(MockBroker::new().with_bars(
            "AAPL",
            vec![
                raw_bar(at(2025, 6, 2, 4, 0, 0), 201.0),
                raw_bar(at(2025, 6, 3, 4, 0, 0), 203.0),
            ],
        ));

        let prices = get_historical_prices(&ctx, "AAPL, NOPE,", "2025-06-01", "2025-06-30", "DAY")
            .await
            .success()
            .unwrap();

        assert_eq!(prices.results.len(), 2);
        let aapl = prices.results["AAPL"].clone().success().unwrap();
        assert_eq!(aapl.historical_data.len(), 2);
        assert_eq!(aapl.historical_data[1].close, 203.0);
        assert_eq!(
            prices.results["NOPE"].message(),
            Some("No historical data found for NOPE.")
        );

        match &mock.calls()[0] {
            BrokerCall::Bars { request, .. } => {
                assert_eq!(request.start, Some(at(2025, 6, 1, 0, 0, 0)));
                assert_eq!(request.end, Some(at(2025, 6, 30, 0, 0, 0)));
                assert_eq!(request.limit, 10_000);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_rows_is_an_error_not_an_empty_success() {
        let (_, ctx) = ctx(MockBroker::new().with_bars("MSFT", vec![]));
        let prices = get_historical_prices(&ctx, "MSFT", "2025-06-01", "2025-06-02", "hour")
            .await
            .success()
            .unwrap();
        assert!(prices.results["MSFT"].is_error());
    }

    #[tokio::test]
    async fn malformed_date_is_rejected_before_any_call() {
        let (mock, ctx) = ctx(MockBroker::new());
        let result = get_historical_prices(&ctx, "AAPL", "June 1st", "2025-06-30", "day").await;
        assert!(result.message().unwrap().starts_with("Invalid date 'June 1st'"));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_symbol_list_is_rejected() {
        let (mock, ctx) = ctx(MockBroker::new());
        let result = get_historical_prices(&ctx, " , ", "2025-06-01", "2025-06-30", "day").await;
        assert_eq!(result.message(), Some("At least one symbol is required."));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn today_candles_use_hourly_bars_and_publish_chart() {
        let sink = Arc::new(RecordingSink::new());
        let mock = Arc::new(MockBroker::new().with_bars(
            "ETH/USD",
            vec![raw_bar(at(2025, 7, 1, 0, 0, 0), 2400.0)],
        ));
        let ctx = AdapterContext::new(mock.clone()).with_artifact_sink(sink.clone());

        let candles = get_today_candlestick_crypto_data(&ctx, "ETH/USD")
            .await
            .success()
            .unwrap();
        assert_eq!(candles.candlestick_data.len(), 1);

        match &mock.calls()[0] {
            BrokerCall::Bars { asset_class, request } => {
                assert_eq!(*asset_class, AssetClass::Crypto);
                assert_eq!(request.interval, Interval::Hour);
            }
            other => panic!("unexpected call {other:?}"),
        }

        let names = sink.filenames();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("today_candlestick_ETHUSD_"));
    }

    #[tokio::test]
    async fn today_candles_empty() {
        let (_, ctx) = ctx(MockBroker::new());
        let result = get_today_candlestick_stock_data(&ctx, "AAPL").await;
        assert_eq!(
            result.message(),
            Some("No candlestick data found for symbol AAPL.")
        );
    }

    #[tokio::test]
    async fn yesterday_covers_previous_utc_day() {
        let (mock, ctx) = ctx(MockBroker::new().with_bars(
            "SPY",
            vec![raw_bar(at(2025, 6, 30, 4, 0, 0), 617.0)],
        ));

        let action = yesterdays_price_action(&ctx, "SPY", at(2025, 7, 1, 15, 0, 0))
            .await
            .unwrap();
        assert_eq!(action.yesterdays_price_action.len(), 1);

        match &mock.calls()[0] {
            BrokerCall::Bars { request, .. } => {
                assert_eq!(request.start, Some(at(2025, 6, 30, 0, 0, 0)));
                assert_eq!(request.end, Some(at(2025, 6, 30, 23, 59, 59)));
                assert_eq!(request.interval, Interval::Day);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn yesterday_without_data_names_the_date() {
        let (_, ctx) = ctx(MockBroker::new());
        let err = yesterdays_price_action(&ctx, "SPY", at(2025, 7, 1, 15, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No price action found for SPY on 2025-06-30.");
    }

    #[tokio::test]
    async fn plot_without_sink_reports_disabled() {
        let (_, ctx) = ctx(MockBroker::new().with_bars(
            "AAPL",
            vec![raw_bar(at(2025, 6, 2, 4, 0, 0), 201.0)],
        ));
        let outcome = plot_price_action(&ctx, "AAPL", "2025-06-01", "2025-06-30", "day")
            .await
            .success()
            .unwrap();
        assert_eq!(outcome.message, "Chart plotting is disabled.");
    }

    #[tokio::test]
    async fn plot_names_the_artifact() {
        let sink = Arc::new(RecordingSink::new());
        let mock = Arc::new(MockBroker::new().with_bars(
            "AAPL",
            vec![raw_bar(at(2025, 6, 2, 4, 0, 0), 201.0)],
        ));
        let ctx = AdapterContext::new(mock).with_artifact_sink(sink.clone());

        let outcome = price_action_plot(
            &ctx,
            "AAPL",
            "2025-06-01",
            "2025-06-30",
            "day",
            at(2025, 7, 1, 12, 0, 0),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome.message,
            "Chart saved as price_action_AAPL_20250701_120000.png."
        );
        assert_eq!(sink.filenames(), vec!["price_action_AAPL_20250701_120000.png"]);
    }

    #[tokio::test]
    async fn plot_survives_sink_failure() {
        let mock = Arc::new(MockBroker::new().with_bars(
            "AAPL",
            vec![raw_bar(at(2025, 6, 2, 4, 0, 0), 201.0)],
        ));
        let ctx = AdapterContext::new(mock).with_artifact_sink(Arc::new(RecordingSink::failing()));

        let result = plot_price_action(&ctx, "AAPL", "2025-06-01", "2025-06-30", "day").await;
        assert!(result.is_success());
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_when("2025-06-01").unwrap(), at(2025, 6, 1, 0, 0, 0));
        assert_eq!(
            parse_when("2025-06-01T09:30:00").unwrap(),
            at(2025, 6, 1, 9, 30, 0)
        );
        assert_eq!(
            parse_when("2025-06-01T09:30:00Z").unwrap(),
            at(2025, 6, 1, 9, 30, 0)
        );
        assert_eq!(
            parse_when("2025-06-01T09:30:00-04:00").unwrap(),
            at(2025, 6, 1, 13, 30, 0)
        );
        assert!(matches!(
            parse_when("06/01/2025"),
            Err(BrokerError::InvalidInput(_))
        ));
    }

    #[test]
    fn day_range_spans_whole_day() {
        let (start, end) = day_range(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()).unwrap();
        assert_eq!(start, at(2025, 7, 1, 0, 0, 0));
        assert_eq!(end, at(2025, 7, 2, 0, 0, 0) - Duration::microseconds(1));
    }

    #[test]
    fn last_representable_day_is_an_input_error() {
        assert!(matches!(
            day_range(NaiveDate::MAX),
            Err(BrokerError::InvalidInput(_))
        ));
        assert!(parse_when("+262142-12-31").is_ok());
    }

    #[tokio::test]
    async fn far_future_dates_do_not_escape_as_panics() {
        let (_, ctx) = ctx(MockBroker::new());

        let history =
            get_historical_prices(&ctx, "AAPL", "+262142-12-31", "2025-01-01", "day").await;
        assert!(history.is_success());

        let plot = plot_price_action(&ctx, "AAPL", "2025-01-01", "+262142-12-31", "day").await;
        assert_eq!(plot.message(), Some("No historical data found for AAPL."));
    }
}
