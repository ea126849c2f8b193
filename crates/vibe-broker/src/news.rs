use chrono::{DateTime, Utc};
use tracing::debug;
use vibe_models::{NewsArticle, NewsDigest, ToolResult};

use crate::context::AdapterContext;
use crate::error::{conclude, BrokerError};
use crate::market_data::{day_range, require_symbol};
use crate::wire::{NewsRequest, NEWS_LIMIT};

/// Today's (UTC) headlines for a symbol, newest first.
pub async fn fetch_today_news_for_symbol(
    ctx: &AdapterContext,
    symbol: &str,
) -> ToolResult<NewsDigest> {
    conclude(
        "fetch_today_news_for_symbol",
        today_news(ctx, symbol, Utc::now()).await,
    )
}

async fn today_news(
    ctx: &AdapterContext,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<NewsDigest, BrokerError> {
    let symbol = require_symbol(symbol)?;
    let (start, end) = day_range(now.date_naive())?;
    let request = NewsRequest {
        symbol: symbol.to_string(),
        start,
        end,
        limit: NEWS_LIMIT,
    };

    let articles = ctx.api().get_news(&request).await?;
    debug!(symbol, count = articles.len(), "News received");

    if articles.is_empty() {
        return Err(BrokerError::NoData(format!(
            "There is no news found for symbol {symbol}. It may be an invalid symbol."
        )));
    }

    let news = articles
        .into_iter()
        .take(NEWS_LIMIT as usize)
        .map(NewsArticle::from)
        .collect();

    Ok(NewsDigest { news })
}
