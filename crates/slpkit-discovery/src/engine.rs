//! SLP Discovery Engine Implementation

use crate::config::DiscoveryConfig;
use crate::dns::DnsResolver;
use crate::matcher::Predicates;
use crate::slptool::SlptoolTransport;
use crate::transport::SlpTransport;
use crate::types::{Attributes, MatchedService, Service};
use futures::{future, stream, StreamExt};
use regex::Regex;
use slpkit_core::types::build_query_type;
use slpkit_core::{ConfigError, RawServiceRecord, Result, ServiceTypeDescriptor, SlpError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options for [`DiscoveryEngine::find`] and [`DiscoveryEngine::all`].
///
/// `protocol` and `scope` shape the query; everything else is a predicate
/// the discovered services must satisfy.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Protocol segment of the service type, e.g. "http"
    pub protocol: Option<String>,

    /// Scope list to search, defaults to the configured scope
    pub scope: Option<String>,

    /// `(key, pattern)` predicates over fields and attributes
    pub predicates: Vec<(String, String)>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to one protocol
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Searches the given scope list instead of the default one
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Adds a predicate. The keys `protocol` and `scope` set the query
    /// options of the same name instead.
    pub fn with(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        let key = key.into();
        match key.as_str() {
            "protocol" => self.protocol = Some(pattern.into()),
            "scope" => self.scope = Some(pattern.into()),
            _ => self.predicates.push((key, pattern.into())),
        }
        self
    }

    /// Builds options from `key=value` style pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |options, (key, value)| options.with(key, value))
    }
}

/// Finds SLP services and the service types on offer
pub struct DiscoveryEngine {
    /// Configuration
    config: DiscoveryConfig,

    /// Agent query interface
    transport: Arc<dyn SlpTransport>,

    /// Reverse resolver with its hostname cache
    resolver: DnsResolver,
}

impl DiscoveryEngine {
    /// Creates an engine over an explicit transport and resolver
    pub fn new(
        config: DiscoveryConfig,
        transport: Arc<dyn SlpTransport>,
        resolver: DnsResolver,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|reason| ConfigError::invalid_value("discovery", reason))?;

        debug!(
            default_scope = %config.default_scope,
            concurrency = config.lookup_concurrency,
            "Discovery engine created"
        );

        Ok(Self {
            config,
            transport,
            resolver,
        })
    }

    /// Creates an engine that talks to `slptool` and the system resolver
    pub fn from_config(config: DiscoveryConfig) -> Result<Self> {
        let transport = Arc::new(SlptoolTransport::new(&config));
        let resolver = if config.resolve_hostnames {
            DnsResolver::system()?
        } else {
            DnsResolver::disabled()
        };
        Self::new(config, transport, resolver)
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// The resolver used for service hostnames
    pub fn resolver(&self) -> &DnsResolver {
        &self.resolver
    }

    /// Returns the first discovered service that satisfies `options`.
    ///
    /// Responses are examined in the order the agent returned them and
    /// services after the first match are never built.
    pub async fn find(
        &self,
        service_name: &str,
        options: &QueryOptions,
    ) -> Result<Option<Service>> {
        let predicates = Predicates::compile(options.predicates.iter().cloned())?;
        let records = self.discover(service_name, options).await?;

        for raw in &records {
            let service = self
                .build_service(service_name, options.protocol.as_deref(), raw)
                .await;
            if predicates.matches(&service) {
                info!(service = service_name, url = %service.slp_url, "Found service");
                return Ok(Some(service));
            }
            debug!(url = %raw.srv_url, "Service does not match predicates");
        }

        info!(service = service_name, responses = records.len(), "No matching service");
        Ok(None)
    }

    /// Returns every discovered service that satisfies `options`, in the
    /// order the agent returned them.
    pub async fn all(&self, service_name: &str, options: &QueryOptions) -> Result<Vec<Service>> {
        let predicates = Predicates::compile(options.predicates.iter().cloned())?;
        let records = self.discover(service_name, options).await?;

        let services: Vec<Service> = stream::iter(records.iter())
            .map(|raw| self.build_service(service_name, options.protocol.as_deref(), raw))
            .buffered(self.config.lookup_concurrency)
            .filter(|service| future::ready(predicates.matches(service)))
            .collect()
            .await;

        info!(
            service = service_name,
            responses = records.len(),
            matched = services.len(),
            "Collected services"
        );
        Ok(services)
    }

    /// Lists the service types the agent knows about.
    ///
    /// A single malformed type string fails the whole call.
    pub async fn types(&self) -> Result<Vec<ServiceTypeDescriptor>> {
        let raw_types = self
            .transport
            .find_service_types(&self.config.naming_authority, &self.config.default_scope)
            .await?;

        if raw_types.is_empty() {
            debug!("No service types discovered");
            return Ok(Vec::new());
        }

        raw_types
            .iter()
            .map(|raw| ServiceTypeDescriptor::parse(raw))
            .collect()
    }

    /// Fetches the attribute map of a service URL or type, unicast to `ip`
    /// when it is non-empty.
    pub async fn attributes(&self, url_or_type: &str, ip: &str) -> Result<Attributes> {
        let raw = self.transport.find_attributes(url_or_type, ip).await?;
        Ok(Attributes::parse(raw))
    }

    /// Queries every service type whose name matches `pattern` and returns
    /// the raw records with their multicast attribute maps.
    pub async fn match_type(&self, pattern: &str) -> Result<Vec<MatchedService>> {
        let regex = Regex::new(pattern)
            .map_err(|e| SlpError::invalid_pattern("type", pattern, e.to_string()))?;

        let raw_types = self
            .transport
            .find_service_types(&self.config.naming_authority, &self.config.default_scope)
            .await?;

        let mut seen = HashSet::new();
        let mut matched = Vec::new();

        for service_type in raw_types.iter().filter(|t| regex.is_match(t)) {
            let records = self
                .transport
                .find_services(service_type, &self.config.default_scope)
                .await?;

            for record in records {
                if !seen.insert(record.srv_url.clone()) {
                    continue;
                }
                let attributes = self.fetch_attributes(&record.srv_url, "").await;
                matched.push(MatchedService { record, attributes });
            }
        }

        info!(pattern, matched = matched.len(), "Matched service types");
        Ok(matched)
    }

    /// Runs the instance query for `service:<name>[:<protocol>]`
    async fn discover(
        &self,
        service_name: &str,
        options: &QueryOptions,
    ) -> Result<Vec<RawServiceRecord>> {
        let service_type = build_query_type(service_name, options.protocol.as_deref());
        let scope = options
            .scope
            .as_deref()
            .unwrap_or(&self.config.default_scope);

        debug!(service_type = %service_type, scope, "Querying services");
        let records = self.transport.find_services(&service_type, scope).await?;
        debug!(service_type = %service_type, count = records.len(), "Services discovered");

        Ok(records)
    }

    /// Resolves hostname and attributes for one response
    async fn build_service(
        &self,
        service_name: &str,
        protocol: Option<&str>,
        raw: &RawServiceRecord,
    ) -> Service {
        let (host, attributes) = future::join(
            self.resolver.resolve(&raw.ip),
            self.fetch_attributes(&raw.srv_url, &raw.ip),
        )
        .await;

        Service::from_raw(service_name, protocol, raw, host, attributes)
    }

    /// Attribute query that degrades to an empty map on failure
    async fn fetch_attributes(&self, url: &str, ip: &str) -> Attributes {
        match self.attributes(url, ip).await {
            Ok(attributes) => attributes,
            Err(e) => {
                warn!(url, ip, error = %e, "Attribute query failed, continuing without attributes");
                Attributes::new()
            }
        }
    }
}
