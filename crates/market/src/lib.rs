pub mod adapters;
pub mod availability;
pub mod registry;
pub mod router;
pub mod routing;

pub use availability::AvailabilityMap;
pub use registry::{ProviderRegistry, ProviderStatus};
pub use router::{FallbackRouter, FetchOptions};
pub use routing::{CoinRoutingRule, RoutingTable};
