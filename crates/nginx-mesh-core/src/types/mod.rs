//! Type definitions shared across the adapter crates

mod runtime_config;

pub use runtime_config::{
    normalize_server_address, EndpointsConfig, NetworkConfig, ReleaseFeedConfig, RuntimeConfig,
    ServerConfig,
};
