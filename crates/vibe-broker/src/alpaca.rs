use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use vibe_models::symbol::compact;
use vibe_models::{AssetClass, BrokerConfig, OrderQueryStatus};

use crate::api::BrokerApi;
use crate::credentials::Credentials;
use crate::error::BrokerError;
use crate::wire::{
    BarsPage, BarsRequest, BarsResponse, NewsPage, NewsRequest, OrderRequest, RawAccount,
    RawAsset, RawClosePosition, RawNews, RawOrder, RawPosition, BAR_LIMIT,
};

const KEY_HEADER: &str = "apca-api-key-id";
const SECRET_HEADER: &str = "apca-api-secret-key";

/// Brokerage, market-data and news REST client.
///
/// One long-lived instance per process. Holds the HTTP connection pool,
/// authentication headers and base URLs; no per-call state.
pub struct AlpacaClient {
    http: Client,
    trading_url: Url,
    data_url: Url,
    news_url: Url,
    stock_feed: String,
}

impl AlpacaClient {
    pub fn new(credentials: &Credentials, config: &BrokerConfig) -> Result<Self, BrokerError> {
        let mut headers = HeaderMap::new();
        headers.insert(KEY_HEADER, header_value(&credentials.api_key, false)?);
        headers.insert(SECRET_HEADER, header_value(&credentials.secret_key, true)?);

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            trading_url: parse_base(config.trading_url())?,
            data_url: parse_base(config.data_url())?,
            news_url: parse_base(config.news_url())?,
            stock_feed: config.stock_feed.clone(),
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BrokerError> {
        let body = self.send_raw(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_raw(&self, request: RequestBuilder) -> Result<String, BrokerError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), body = %body, "Broker rejected request");
            return Err(BrokerError::from_response(status.as_u16(), &body));
        }

        Ok(body)
    }

    fn bars_url(&self, asset_class: AssetClass) -> Result<Url, BrokerError> {
        match asset_class {
            AssetClass::Equity => endpoint(&self.data_url, &["v2", "stocks", "bars"]),
            AssetClass::Crypto => endpoint(&self.data_url, &["v1beta3", "crypto", "us", "bars"]),
        }
    }
}

#[async_trait]
impl BrokerApi for AlpacaClient {
    async fn get_bars(
        &self,
        asset_class: AssetClass,
        request: &BarsRequest,
    ) -> Result<BarsResponse, BrokerError> {
        let url = self.bars_url(asset_class)?;
        let limit = request.limit.min(BAR_LIMIT) as usize;

        let mut response = BarsResponse::default();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = request.query();
            if asset_class == AssetClass::Equity {
                query.push(("feed", self.stock_feed.clone()));
            }
            if let Some(token) = page_token.take() {
                query.push(("page_token", token));
            }

            debug!(
                url = %url,
                symbols = ?request.symbols,
                timeframe = request.interval.timeframe(),
                "Fetching bars"
            );
            let page: BarsPage = self.send(self.http.get(url.clone()).query(&query)).await?;

            match response.absorb(page, limit) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        response.truncate(limit);
        Ok(response)
    }

    async fn get_news(&self, request: &NewsRequest) -> Result<Vec<RawNews>, BrokerError> {
        let url = endpoint(&self.news_url, &["v1beta1", "news"])?;
        debug!(symbol = %request.symbol, "Fetching news");
        let page: NewsPage = self.send(self.http.get(url).query(&request.query())).await?;
        Ok(page.news)
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<RawOrder, BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "orders"])?;
        debug!(symbol = %order.symbol, side = ?order.side, qty = %order.qty, "Submitting order");
        self.send(self.http.post(url).json(order)).await
    }

    async fn list_orders(&self, status: OrderQueryStatus) -> Result<Vec<RawOrder>, BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "orders"])?;
        debug!(status = status.as_str(), "Listing orders");
        self.send(self.http.get(url).query(&[("status", status.as_str())]))
            .await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "orders", order_id])?;
        debug!(order_id, "Cancelling order");
        self.send_raw(self.http.delete(url)).await?;
        Ok(())
    }

    async fn list_positions(&self) -> Result<Vec<RawPosition>, BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "positions"])?;
        self.send(self.http.get(url)).await
    }

    async fn close_position(&self, symbol: &str) -> Result<RawOrder, BrokerError> {
        let symbol = compact(symbol);
        let url = endpoint(&self.trading_url, &["v2", "positions", symbol.as_str()])?;
        debug!(symbol = %symbol, "Closing position");
        self.send(self.http.delete(url)).await
    }

    async fn close_all_positions(
        &self,
        cancel_orders: bool,
    ) -> Result<Vec<RawClosePosition>, BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "positions"])?;
        debug!(cancel_orders, "Closing all positions");
        self.send(
            self.http
                .delete(url)
                .query(&[("cancel_orders", cancel_orders.to_string())]),
        )
        .await
    }

    async fn get_account(&self) -> Result<RawAccount, BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "account"])?;
        self.send(self.http.get(url)).await
    }

    async fn list_assets(&self, asset_class: AssetClass) -> Result<Vec<RawAsset>, BrokerError> {
        let url = endpoint(&self.trading_url, &["v2", "assets"])?;
        self.send(
            self.http
                .get(url)
                .query(&[("status", "active"), ("asset_class", asset_class.as_str())]),
        )
        .await
    }
}

fn header_value(value: &str, sensitive: bool) -> Result<HeaderValue, BrokerError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| BrokerError::Config(format!("Invalid credential value: {e}")))?;
    header.set_sensitive(sensitive);
    Ok(header)
}

fn parse_base(url: &str) -> Result<Url, BrokerError> {
    let parsed =
        Url::parse(url).map_err(|e| BrokerError::Config(format!("Invalid base URL '{url}': {e}")))?;
    if parsed.cannot_be_a_base() {
        return Err(BrokerError::Config(format!(
            "Base URL '{url}' cannot carry a path"
        )));
    }
    Ok(parsed)
}

/// Append percent-encoded path segments to a base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, BrokerError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BrokerError::Config(format!("Base URL '{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use vibe_models::Interval;

    fn base(url: &str) -> Url {
        parse_base(url).unwrap()
    }

    #[test]
    fn endpoint_appends_segments() {
        let url = endpoint(&base("https://paper-api.alpaca.markets"), &["v2", "orders"]).unwrap();
        assert_eq!(url.as_str(), "https://paper-api.alpaca.markets/v2/orders");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = endpoint(&base("http://localhost:8080/proxy/"), &["v2", "account"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v2/account");
    }

    #[test]
    fn endpoint_escapes_ids() {
        let url =
            endpoint(&base("https://api.alpaca.markets"), &["v2", "orders", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.alpaca.markets/v2/orders/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(matches!(
            parse_base("mailto:desk@example.com"),
            Err(BrokerError::Config(_))
        ));
        assert!(matches!(parse_base("not a url"), Err(BrokerError::Config(_))));
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = AlpacaClient::new(
            &Credentials::new("PKTEST", "secret"),
            &BrokerConfig::default(),
        )
        .unwrap();
        assert_eq!(client.trading_url.as_str(), "https://paper-api.alpaca.markets/");
        assert_eq!(
            client.bars_url(AssetClass::Crypto).unwrap().as_str(),
            "https://data.alpaca.markets/v1beta3/crypto/us/bars"
        );
        assert_eq!(
            client.bars_url(AssetClass::Equity).unwrap().as_str(),
            "https://data.alpaca.markets/v2/stocks/bars"
        );
    }

    /// Serve canned responses on a local port, one connection each, and
    /// hand back the request lines seen.
    async fn serve(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    let n = stream.read(&mut buf[read..]).await.unwrap();
                    read += n;
                    if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                seen.push(head.lines().next().unwrap_or_default().to_string());

                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
            seen
        });

        (base, handle)
    }

    fn local_client(base: &str) -> AlpacaClient {
        let config = BrokerConfig {
            trading_base_url: Some(base.to_string()),
            data_base_url: Some(base.to_string()),
            news_base_url: Some(base.to_string()),
            ..BrokerConfig::default()
        };
        AlpacaClient::new(&Credentials::new("PKTEST", "secret"), &config).unwrap()
    }

    #[tokio::test]
    async fn bars_follow_page_tokens() {
        let (base, server) = serve(vec![
            (
                200,
                r#"{"bars":{"AAPL":[{"t":"2025-06-02T00:00:00Z","o":1,"h":1,"l":1,"c":201.5,"v":10}]},"next_page_token":"p2"}"#,
            ),
            (
                200,
                r#"{"bars":{"AAPL":[{"t":"2025-06-03T00:00:00Z","o":1,"h":1,"l":1,"c":203.0,"v":12}]},"next_page_token":null}"#,
            ),
        ])
        .await;

        let client = local_client(&base);
        let mut response = client
            .get_bars(AssetClass::Equity, &BarsRequest::new("AAPL", Interval::Day))
            .await
            .unwrap();

        let closes: Vec<f64> = response.take("AAPL").unwrap().iter().map(|b| b.c).collect();
        assert_eq!(closes, vec![201.5, 203.0]);

        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("GET /v2/stocks/bars?"));
        assert!(seen[0].contains("feed=iex"));
        assert!(!seen[0].contains("page_token"));
        assert!(seen[1].contains("page_token=p2"));
    }

    #[tokio::test]
    async fn rejected_request_carries_vendor_message() {
        let (base, server) =
            serve(vec![(404, r#"{"code":40410000,"message":"order not found"}"#)]).await;

        let err = local_client(&base).cancel_order("missing").await.unwrap_err();
        assert!(matches!(err, BrokerError::Api { status: 404, .. }));
        assert_eq!(err.to_string(), "order not found");

        let seen = server.await.unwrap();
        assert!(seen[0].starts_with("DELETE /v2/orders/missing"));
    }

    #[test]
    fn invalid_credential_bytes_are_rejected() {
        let result = AlpacaClient::new(
            &Credentials::new("bad\nkey", "secret"),
            &BrokerConfig::default(),
        );
        assert!(matches!(result, Err(BrokerError::Config(_))));
    }
}
