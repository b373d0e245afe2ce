//! SLP Service Discovery
//!
//! This crate finds services advertised through the Service Location
//! Protocol (RFC 2608):
//! - List the service types an agent knows about
//! - Find the first service of a type that matches a set of predicates
//! - Collect every matching service of a type
//! - Fetch attribute maps and reverse-resolve hostnames along the way
//!
//! # Architecture
//!
//! Wire-level SLP is delegated to an [`SlpTransport`]. The stock
//! [`SlptoolTransport`] runs the OpenSLP `slptool` command; tests and other
//! agents plug in their own implementation. The [`DiscoveryEngine`] turns
//! transport answers into [`Service`] records:
//! 1. Query the agent for `service:<name>[:<protocol>]`
//! 2. For each response, fetch its attributes and reverse-resolve its
//!    address through the shared [`DnsResolver`] cache
//! 3. Keep the services whose fields or attributes match every predicate
//!
//! # Example
//!
//! ```no_run
//! use slpkit_discovery::{DiscoveryConfig, DiscoveryEngine, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = DiscoveryEngine::from_config(DiscoveryConfig::default())?;
//!
//!     let options = QueryOptions::new()
//!         .protocol("http")
//!         .with("machine", "x86_64");
//!
//!     if let Some(service) = engine.find("install.suse", &options).await? {
//!         println!("{} at {}", service.slp_url, service.display_host());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dns;
pub mod engine;
pub mod matcher;
pub mod slptool;
pub mod transport;
pub mod types;

pub use config::DiscoveryConfig;
pub use dns::{DnsCache, DnsResolver, ReverseLookup, SystemReverseLookup};
pub use engine::{DiscoveryEngine, QueryOptions};
pub use matcher::{Predicate, Predicates};
pub use slpkit_core::{Result, ServiceTypeDescriptor, SlpError, TransportError};
pub use slptool::SlptoolTransport;
pub use transport::SlpTransport;
pub use types::{Attributes, MatchedService, Service};
