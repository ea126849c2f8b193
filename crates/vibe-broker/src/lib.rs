pub mod alpaca;
pub mod api;
pub mod charts;
pub mod context;
pub mod credentials;
pub mod error;
pub mod market_data;
pub mod news;
pub mod normalize;
pub mod sink;
pub mod trading;
pub mod wire;

pub mod test_support;

pub use alpaca::AlpacaClient;
pub use api::BrokerApi;
pub use context::AdapterContext;
pub use credentials::Credentials;
pub use error::BrokerError;
pub use sink::{ArtifactSink, JsonFileSink, TracingSink};
