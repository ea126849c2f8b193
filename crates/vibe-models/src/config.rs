use serde::{Deserialize, Serialize};

pub const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";
pub const LIVE_TRADING_URL: &str = "https://api.alpaca.markets";
pub const MARKET_DATA_URL: &str = "https://data.alpaca.markets";

/// Top-level configuration. Every field has a default, so an empty TOML file
/// (or no file at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VibeConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub charts: ChartConfig,
}

impl VibeConfig {
    /// Apply `ALPACA_PAPER`, `SAVE_CHART_ARTIFACT` and `CHART_OUTPUT_DIR`
    /// from the given lookup (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ALPACA_PAPER") {
            self.broker.paper = parse_flag(&value);
        }
        if let Some(value) = lookup("SAVE_CHART_ARTIFACT") {
            self.charts.enabled = parse_flag(&value);
        }
        if let Some(dir) = lookup("CHART_OUTPUT_DIR").filter(|d| !d.trim().is_empty()) {
            self.charts.output_dir = Some(dir);
        }
    }
}

/// Vendor endpoints and trading mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerConfig {
    /// Paper trading (vendor sandbox) when true.
    #[serde(default = "default_true")]
    pub paper: bool,
    /// Overrides the paper/live trading URL.
    #[serde(default)]
    pub trading_base_url: Option<String>,
    #[serde(default)]
    pub data_base_url: Option<String>,
    /// Defaults to the market data URL.
    #[serde(default)]
    pub news_base_url: Option<String>,
    /// Stock bar feed. `iex` is the only feed on free vendor plans.
    #[serde(default = "default_stock_feed")]
    pub stock_feed: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            paper: true,
            trading_base_url: None,
            data_base_url: None,
            news_base_url: None,
            stock_feed: default_stock_feed(),
        }
    }
}

impl BrokerConfig {
    pub fn trading_url(&self) -> &str {
        match &self.trading_base_url {
            Some(url) => url.as_str(),
            None if self.paper => PAPER_TRADING_URL,
            None => LIVE_TRADING_URL,
        }
    }

    pub fn data_url(&self) -> &str {
        self.data_base_url.as_deref().unwrap_or(MARKET_DATA_URL)
    }

    pub fn news_url(&self) -> &str {
        self.news_base_url.as_deref().unwrap_or_else(|| self.data_url())
    }
}

/// Side-channel chart generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Directory for chart descriptors. Charts are only logged when unset.
    #[serde(default)]
    pub output_dir: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_stock_feed() -> String {
    "iex".to_string()
}

/// `true`/`1` (any case) enable a flag, anything else disables it.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}
