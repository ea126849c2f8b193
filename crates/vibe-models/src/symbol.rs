use serde::{Deserialize, Serialize};

/// Asset class a symbol routes to.
///
/// Crypto pairs are written `BASE/QUOTE` (e.g. `BTC/USD`); everything else is
/// treated as a plain equity ticker. No further validation happens locally,
/// the vendor rejects unknown symbols.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[serde(rename = "us_equity")]
    Equity,
    Crypto,
}

impl AssetClass {
    /// Route a symbol by its syntax: a `/` means a crypto pair.
    pub fn of(symbol: &str) -> Self {
        if symbol.contains('/') {
            AssetClass::Crypto
        } else {
            AssetClass::Equity
        }
    }

    /// The vendor's wire name for this asset class.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "us_equity",
            AssetClass::Crypto => "crypto",
        }
    }
}

/// Strip the pair separator, e.g. `BTC/USD` -> `BTCUSD`.
///
/// Used where the symbol ends up in a URL path or a file name.
pub fn compact(symbol: &str) -> String {
    symbol.replace('/', "")
}
