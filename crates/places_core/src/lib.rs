//! Optimistic synchronization core for a user's place collection.
//! The store here is the single source of truth for what the user sees.

pub mod config;
pub mod error_sink;
pub mod logging;
pub mod model;
pub mod observable;
pub mod remote;
pub mod store;

pub use config::{ConfigError, ConfigResult, CoreConfig, EndpointConfig, LogConfig};
pub use error_sink::{process_error_channel, ErrorChannel, ErrorSink};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::place::{Place, PlaceId, PlaceImage};
pub use observable::{Notification, Observable, SubscriptionId};
pub use remote::{
    Endpoint, Endpoints, GatewayCall, GatewayResult, InMemoryGateway, PlaceSource, RemoteGateway,
    TransportError,
};
pub use store::{CancellationToken, PlacesStore, StoreError, StoreMessages, StoreResult};

use std::sync::Arc;

/// Builds a store wired from `config`.
pub fn store_from_config(
    config: &CoreConfig,
    gateway: Arc<dyn RemoteGateway>,
    errors: Arc<dyn ErrorSink>,
) -> PlacesStore {
    PlacesStore::new(gateway, errors)
        .with_endpoints(config.endpoints.endpoints())
        .with_messages(config.messages.clone())
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
