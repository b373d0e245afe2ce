use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use slpkit_core::{AppConfig, LogFormat, LoggingConfig};
use slpkit_discovery::{
    DiscoveryEngine, QueryOptions, Service, SlpTransport, SlptoolTransport,
};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// SLPKit - Service Location Protocol discovery client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, env = "SLPKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the service types known to the agent
    Types,

    /// Show the first service matching the query
    Find(QueryArgs),

    /// Show every service matching the query
    All(QueryArgs),

    /// Show the attributes of a service URL or type
    Attrs {
        /// Service URL or service type
        url: String,

        /// Ask this address directly instead of multicasting
        #[arg(long, default_value = "")]
        ip: String,
    },

    /// Query every service type matching a regular expression
    MatchType {
        /// Pattern applied to the raw service type
        pattern: String,
    },

    /// Register a service URL with the local agent
    Register {
        /// Service URL to register
        url: String,

        /// Attribute to attach, as key=value (repeatable)
        #[arg(short, long = "attr", value_parser = parse_key_value)]
        attributes: Vec<(String, String)>,
    },

    /// Remove a registration from the local agent
    Deregister {
        /// Service URL to remove
        url: String,
    },
}

#[derive(ClapArgs, Debug)]
struct QueryArgs {
    /// Service name, e.g. "install.suse" or "ldap"
    service: String,

    /// Protocol segment of the service type, e.g. "http"
    #[arg(short, long)]
    protocol: Option<String>,

    /// Scope list to search
    #[arg(short, long)]
    scope: Option<String>,

    /// Predicate as key=pattern (repeatable)
    #[arg(short = 'm', long = "match", value_parser = parse_key_value)]
    predicates: Vec<(String, String)>,
}

impl QueryArgs {
    fn options(&self) -> QueryOptions {
        let mut options = QueryOptions::from_pairs(self.predicates.iter().cloned());
        if let Some(protocol) = &self.protocol {
            options = options.protocol(protocol.as_str());
        }
        if let Some(scope) = &self.scope {
            options = options.scope(scope.as_str());
        }
        options
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_config_builder(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => AppConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.file_line)
        .with_line_number(logging.file_line);

    // Ignore if a subscriber is already installed
    let _ = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn print_service(service: &Service) {
    println!("{}", service.slp_url);
    println!("  host:     {}", service.display_host());
    println!("  ip:       {}", service.ip);
    println!("  protocol: {}", service.protocol);
    println!("  lifetime: {}", service.lifetime);
    for (name, value) in service.attributes.iter() {
        println!("  {} = {}", name, value);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration file
    let config = load_config(args.config.as_ref())?;
    init_logging(&config.logging);

    debug!(?config, "Configuration loaded");

    match args.command {
        Command::Types => {
            let engine = DiscoveryEngine::from_config(config.discovery)?;
            let types = engine.types().await.context("Failed to list service types")?;
            if args.json {
                print_json(&types)?;
            } else {
                for ty in &types {
                    println!("{}", ty);
                }
            }
        }
        Command::Find(query) => {
            let engine = DiscoveryEngine::from_config(config.discovery)?;
            let found = engine
                .find(&query.service, &query.options())
                .await
                .with_context(|| format!("Failed to find service '{}'", query.service))?;
            match (found, args.json) {
                (Some(service), true) => print_json(&service)?,
                (Some(service), false) => print_service(&service),
                (None, true) => println!("null"),
                (None, false) => info!(service = %query.service, "No matching service found"),
            }
        }
        Command::All(query) => {
            let engine = DiscoveryEngine::from_config(config.discovery)?;
            let services = engine
                .all(&query.service, &query.options())
                .await
                .with_context(|| format!("Failed to query services '{}'", query.service))?;
            if args.json {
                print_json(&services)?;
            } else {
                for service in &services {
                    print_service(service);
                }
            }
        }
        Command::Attrs { url, ip } => {
            let engine = DiscoveryEngine::from_config(config.discovery)?;
            let attributes = engine
                .attributes(&url, &ip)
                .await
                .with_context(|| format!("Failed to query attributes of '{}'", url))?;
            if args.json {
                print_json(&attributes)?;
            } else {
                for (name, value) in attributes.iter() {
                    println!("{} = {}", name, value);
                }
            }
        }
        Command::MatchType { pattern } => {
            let engine = DiscoveryEngine::from_config(config.discovery)?;
            let matched = engine
                .match_type(&pattern)
                .await
                .with_context(|| format!("Failed to match service types '{}'", pattern))?;
            if args.json {
                print_json(&matched)?;
            } else {
                for entry in &matched {
                    println!("{} ({})", entry.record.srv_url, entry.record.ip);
                    for (name, value) in entry.attributes.iter() {
                        println!("  {} = {}", name, value);
                    }
                }
            }
        }
        Command::Register { url, attributes } => {
            let transport = SlptoolTransport::new(&config.discovery);
            transport
                .register(&url, &attributes)
                .await
                .with_context(|| format!("Failed to register '{}'", url))?;
            info!(url = %url, "Service registered");
        }
        Command::Deregister { url } => {
            let transport = SlptoolTransport::new(&config.discovery);
            transport
                .deregister(&url)
                .await
                .with_context(|| format!("Failed to deregister '{}'", url))?;
            info!(url = %url, "Service deregistered");
        }
    }

    Ok(())
}
