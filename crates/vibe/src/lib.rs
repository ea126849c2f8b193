//! vibe - brokerage, market-data and news tools for an LLM trading agent.
//!
//! Every tool returns a status-tagged result (`success` with a normalized
//! payload, or `error` with a message) and never fails past its boundary.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use vibe::broker::Credentials;
//! use vibe::models::VibeConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = vibe::build_registry(&VibeConfig::default(), Credentials::from_env()?)?;
//! let result = registry
//!     .call("get_current_price", serde_json::json!({"symbol": "AAPL"}))
//!     .await;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub use vibe_broker as broker;
pub use vibe_models as models;
pub use vibe_tools as tools;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use vibe_broker::{
    AdapterContext, AlpacaClient, ArtifactSink, BrokerError, Credentials, JsonFileSink, TracingSink,
};
use vibe_models::VibeConfig;
use vibe_tools::ToolRegistry;

/// Build a tool registry backed by the live vendor client.
pub fn build_registry(
    config: &VibeConfig,
    credentials: Credentials,
) -> Result<ToolRegistry, BrokerError> {
    let client = AlpacaClient::new(&credentials, &config.broker)?;
    let mut ctx = AdapterContext::new(Arc::new(client));

    if config.charts.enabled {
        let sink: Arc<dyn ArtifactSink> = match &config.charts.output_dir {
            Some(dir) => Arc::new(JsonFileSink::new(dir)),
            None => Arc::new(TracingSink),
        };
        ctx = ctx.with_artifact_sink(sink);
    }

    info!(
        paper = config.broker.paper,
        trading_url = config.broker.trading_url(),
        charts = config.charts.enabled,
        "Tool registry ready"
    );
    Ok(ToolRegistry::new(ctx))
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<VibeConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            toml::from_str(&text).with_context(|| "Failed to parse config")?
        }
        None => VibeConfig::default(),
    };

    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
