//! # SLPKit Core
//!
//! Core types, error handling, and configuration shared by the SLPKit crates.
//!
//! - **Types**: [`ServiceTypeDescriptor`] and its parser, raw agent records
//!   and [`ServiceUrl`].
//! - **Errors**: [`SlpError`] covering malformed types, invalid patterns,
//!   agent failures and configuration problems.
//! - **Configuration**: YAML files with environment overrides and validation.
//!
//! ## Example
//!
//! ```
//! use slpkit_core::types::{build_query_type, ServiceTypeDescriptor};
//!
//! let ty = ServiceTypeDescriptor::parse("service:install.suse:http").unwrap();
//! assert_eq!(ty.name, "install.suse");
//! assert_eq!(ty.protocol, "http");
//!
//! assert_eq!(build_query_type("ldap", None), "service:ldap");
//! ```

pub mod config;
pub mod discovery_config;
pub mod error;
pub mod types;
pub mod url;

// Re-export commonly used types for convenience
pub use config::{AppConfig, LogFormat, LoggingConfig};
pub use discovery_config::DiscoveryConfig;
pub use error::{ConfigError, Result, SlpError, TransportError};
pub use types::{RawServiceRecord, ServiceTypeDescriptor};
pub use url::ServiceUrl;
