//! Configuration types for service discovery
//!
//! Re-exports configuration from slpkit-core so callers only need this crate

pub use slpkit_core::discovery_config::DiscoveryConfig;
