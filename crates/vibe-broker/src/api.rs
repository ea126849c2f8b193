use async_trait::async_trait;
use vibe_models::{AssetClass, OrderQueryStatus};

use crate::error::BrokerError;
use crate::wire::{
    BarsRequest, BarsResponse, NewsRequest, OrderRequest, RawAccount, RawAsset,
    RawClosePosition, RawNews, RawOrder, RawPosition,
};

/// The vendor seam: brokerage, market data and news REST calls returning
/// vendor-shaped payloads. Mockable for testing.
///
/// Implementations hold only read-only configuration (keys, base URLs) and
/// are shared across concurrent tool calls without locking.
#[async_trait]
pub trait BrokerApi: Send + Sync {
    /// Historical bars on the stock or crypto route.
    async fn get_bars(
        &self,
        asset_class: AssetClass,
        request: &BarsRequest,
    ) -> Result<BarsResponse, BrokerError>;

    async fn get_news(&self, request: &NewsRequest) -> Result<Vec<RawNews>, BrokerError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<RawOrder, BrokerError>;

    async fn list_orders(&self, status: OrderQueryStatus) -> Result<Vec<RawOrder>, BrokerError>;

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError>;

    async fn list_positions(&self) -> Result<Vec<RawPosition>, BrokerError>;

    /// Liquidate one position; returns the closing order.
    async fn close_position(&self, symbol: &str) -> Result<RawOrder, BrokerError>;

    /// Liquidate every position, optionally cancelling open orders first.
    async fn close_all_positions(
        &self,
        cancel_orders: bool,
    ) -> Result<Vec<RawClosePosition>, BrokerError>;

    async fn get_account(&self) -> Result<RawAccount, BrokerError>;

    /// Active assets of one class.
    async fn list_assets(&self, asset_class: AssetClass) -> Result<Vec<RawAsset>, BrokerError>;
}
