//! Chart descriptors for the side-channel artifact sink.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use vibe_models::{
    artifact_filename, Account, Bar, CandlePoint, Chart, ChartArtifact, ChartData, LabeledValue,
    Position,
};

pub fn candlestick(
    purpose: &str,
    symbol: &str,
    title: String,
    bars: &[Bar],
    at: DateTime<Utc>,
) -> ChartArtifact {
    let points = bars
        .iter()
        .map(|bar| CandlePoint {
            time: bar.timestamp.clone(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        })
        .collect();

    ChartArtifact {
        filename: artifact_filename(purpose, Some(symbol), at),
        chart: Chart {
            title,
            x_label: Some("Time".to_string()),
            y_label: Some("Price".to_string()),
            data: ChartData::Candlestick { points },
        },
    }
}

/// Market value share of each open position.
pub fn positions_distribution(positions: &[Position], at: DateTime<Utc>) -> ChartArtifact {
    let slices = positions
        .iter()
        .map(|p| labeled(&p.symbol, p.market_value))
        .collect();

    ChartArtifact {
        filename: artifact_filename("open_positions_distribution", None, at),
        chart: Chart {
            title: "Open Positions Distribution".to_string(),
            x_label: None,
            y_label: None,
            data: ChartData::Pie { slices },
        },
    }
}

/// Unrealized P&L per position, in percent.
pub fn positions_pnl(positions: &[Position], at: DateTime<Utc>) -> ChartArtifact {
    let bars = positions
        .iter()
        .map(|p| {
            labeled(
                &p.symbol,
                p.total_pnl_since_buy_in_percentage * Decimal::ONE_HUNDRED,
            )
        })
        .collect();

    ChartArtifact {
        filename: artifact_filename("open_positions_pnl", None, at),
        chart: Chart {
            title: "Open Positions P&L (%)".to_string(),
            x_label: Some("Symbol".to_string()),
            y_label: Some("P&L (%)".to_string()),
            data: ChartData::Bar { bars },
        },
    }
}

pub fn account_allocation(account: &Account, at: DateTime<Utc>) -> ChartArtifact {
    let slices = vec![
        labeled("Cash", account.cash),
        labeled("Equity", account.equity),
        labeled("Long Market Value", account.long_market_value),
        labeled("Short Market Value", account.short_market_value),
    ];

    ChartArtifact {
        filename: artifact_filename("account_asset_allocation", None, at),
        chart: Chart {
            title: "Account Asset Allocation".to_string(),
            x_label: None,
            y_label: None,
            data: ChartData::Pie { slices },
        },
    }
}

fn labeled(label: &str, value: Decimal) -> LabeledValue {
    LabeledValue {
        label: label.to_string(),
        value: value.to_f64().unwrap_or_default(),
    }
}
