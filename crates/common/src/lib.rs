pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::Config;
pub use error::{Error, ProviderFailure, Result};
pub use provider::{DataFeed, MarketDataProvider};
pub use types::*;
