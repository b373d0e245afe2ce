//! Transport backed by the OpenSLP `slptool` command.
//!
//! Each operation runs one `slptool` process and parses what it prints:
//!
//! | Operation | Invocation | Output |
//! |---|---|---|
//! | service types | `slptool [-s scopes] findsrvtypes [authority]` | comma separated types |
//! | services | `slptool [-s scopes] findsrvs <type>` | `url,lifetime` per line |
//! | attributes | `slptool unicastfindattrs <ip> <url>` or `findattrs <url>` | `(a=b),(c=d)` |
//! | register | `slptool register <url> [attrs]` | exit status only |
//! | deregister | `slptool deregister <url>` | exit status only |

use crate::config::DiscoveryConfig;
use crate::transport::{format_attribute_list, split_attribute_list, SlpTransport};
use async_trait::async_trait;
use slpkit_core::{RawServiceRecord, Result, ServiceUrl, SlpError, TransportError};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// [`SlpTransport`] that shells out to `slptool`
#[derive(Debug, Clone)]
pub struct SlptoolTransport {
    program: PathBuf,
    timeout: Duration,
}

impl SlptoolTransport {
    /// Creates a transport using the configured executable and timeout
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            program: config.slptool_path.clone(),
            timeout: config.command_timeout(),
        }
    }

    /// Path of the executable this transport runs
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    async fn run(&self, operation: &str, args: &[&str]) -> Result<String> {
        debug!(program = %self.program.display(), ?args, "Running slptool");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TransportError::spawn_failed(self.program.display().to_string(), e.to_string())
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TransportError::timeout(operation, self.timeout.as_secs()))??;

        if !output.status.success() {
            return Err(TransportError::CommandFailed {
                operation: operation.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        String::from_utf8(output.stdout).map_err(|e| {
            TransportError::InvalidOutput {
                operation: operation.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Builds a raw record from one `findsrvs` line
    async fn to_record(url: &str, lifetime: u32) -> Result<RawServiceRecord> {
        let parsed = ServiceUrl::parse(url)?;
        let ip = resolve_ip(&parsed.host, parsed.port).await;

        Ok(RawServiceRecord {
            ip,
            host: parsed.host,
            port: parsed.port,
            srv_type: parsed.srv_type,
            srv_url: url.to_string(),
            srv_part: parsed.srv_part,
            family: "IP".to_string(),
            lifetime,
        })
    }
}

/// Returns the host itself when it is an address, otherwise its first
/// forward-resolved address, falling back to the host string.
async fn resolve_ip(host: &str, port: u16) -> String {
    if host.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }

    match tokio::net::lookup_host((host, port)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr.ip().to_string(),
            None => host.to_string(),
        },
        Err(e) => {
            debug!(host, error = %e, "Forward lookup failed, keeping host name");
            host.to_string()
        }
    }
}

/// Splits `findsrvtypes` output into individual type strings
pub fn parse_service_types(output: &str) -> Vec<String> {
    output
        .split(|c: char| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `findsrvs` output into `(url, lifetime)` pairs, skipping lines
/// that do not end in a lifetime.
pub fn parse_service_lines(output: &str) -> Vec<(String, u32)> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.rsplit_once(',') {
            Some((url, lifetime)) => match lifetime.trim().parse() {
                Ok(lifetime) => Some((url.trim().to_string(), lifetime)),
                Err(_) => {
                    warn!(line, "Ignoring findsrvs line with invalid lifetime");
                    None
                }
            },
            None => {
                warn!(line, "Ignoring findsrvs line without lifetime");
                None
            }
        })
        .collect()
}

fn scope_args<'a>(scope_list: &'a str, args: &mut Vec<&'a str>) {
    if !scope_list.is_empty() {
        args.push("-s");
        args.push(scope_list);
    }
}

#[async_trait]
impl SlpTransport for SlptoolTransport {
    async fn find_service_types(
        &self,
        naming_authority: &str,
        scope_list: &str,
    ) -> Result<Vec<String>> {
        let mut args = Vec::new();
        scope_args(scope_list, &mut args);
        args.push("findsrvtypes");
        if !naming_authority.is_empty() {
            args.push(naming_authority);
        }

        let output = self.run("findsrvtypes", &args).await?;
        Ok(parse_service_types(&output))
    }

    async fn find_services(
        &self,
        service_type: &str,
        scope_list: &str,
    ) -> Result<Vec<RawServiceRecord>> {
        let mut args = Vec::new();
        scope_args(scope_list, &mut args);
        args.push("findsrvs");
        args.push(service_type);

        let output = self.run("findsrvs", &args).await?;

        let mut records = Vec::new();
        for (url, lifetime) in parse_service_lines(&output) {
            match Self::to_record(&url, lifetime).await {
                Ok(record) => records.push(record),
                Err(SlpError::InvalidServiceUrl { url, reason }) => {
                    warn!(url = %url, reason = %reason, "Skipping unparsable service URL");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(service_type, count = records.len(), "findsrvs finished");
        Ok(records)
    }

    async fn find_attributes(&self, url_or_type: &str, ip: &str) -> Result<Vec<String>> {
        let output = if ip.is_empty() {
            self.run("findattrs", &["findattrs", url_or_type]).await?
        } else {
            self.run("unicastfindattrs", &["unicastfindattrs", ip, url_or_type])
                .await?
        };

        Ok(split_attribute_list(&output))
    }

    async fn register(&self, service_url: &str, attributes: &[(String, String)]) -> Result<()> {
        let attr_list = format_attribute_list(attributes);
        let mut args = vec!["register", service_url];
        if !attr_list.is_empty() {
            args.push(&attr_list);
        }

        self.run("register", &args).await.map_err(|e| {
            TransportError::RegistrationFailed {
                operation: "register".to_string(),
                service_url: service_url.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(service_url, "Registered service");
        Ok(())
    }

    async fn deregister(&self, service_url: &str) -> Result<()> {
        self.run("deregister", &["deregister", service_url])
            .await
            .map_err(|e| TransportError::RegistrationFailed {
                operation: "deregister".to_string(),
                service_url: service_url.to_string(),
                reason: e.to_string(),
            })?;

        debug!(service_url, "Deregistered service");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_types() {
        let types = parse_service_types("service:smtp,service:install.suse:http,service:ntp\n");
        assert_eq!(
            types,
            vec!["service:smtp", "service:install.suse:http", "service:ntp"]
        );
        assert!(parse_service_types("").is_empty());
    }

    #[test]
    fn test_parse_service_lines() {
        let output = "service:ldap://server.me:389,65535\n\
                      service:install.suse:http://10.100.2.16/install/DVD1,3600\n\
                      garbage\n\
                      service:ntp://10.0.0.1,notanumber\n";

        let lines = parse_service_lines(output);
        assert_eq!(
            lines,
            vec![
                ("service:ldap://server.me:389".to_string(), 65535),
                (
                    "service:install.suse:http://10.100.2.16/install/DVD1".to_string(),
                    3600
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_to_record_with_ip_host() {
        let record = SlptoolTransport::to_record(
            "service:install.suse:http://10.100.2.16/install/DVD1",
            65535,
        )
        .await
        .unwrap();

        assert_eq!(record.ip, "10.100.2.16");
        assert_eq!(record.host, "10.100.2.16");
        assert_eq!(record.port, 0);
        assert_eq!(record.srv_type, "service:install.suse:http");
        assert_eq!(record.srv_part, "/install/DVD1");
        assert_eq!(record.lifetime, 65535);
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let config = DiscoveryConfig {
            slptool_path: PathBuf::from("/nonexistent/slptool"),
            ..Default::default()
        };
        let transport = SlptoolTransport::new(&config);

        let err = transport.find_service_types("*", "").await.unwrap_err();
        assert!(matches!(
            err,
            SlpError::Transport(TransportError::SpawnFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command() {
        let config = DiscoveryConfig {
            slptool_path: PathBuf::from("false"),
            ..Default::default()
        };
        let transport = SlptoolTransport::new(&config);

        let err = transport.find_services("service:ldap", "").await.unwrap_err();
        assert!(matches!(
            err,
            SlpError::Transport(TransportError::CommandFailed { .. })
        ));

        let err = transport.deregister("service:ldap://host").await.unwrap_err();
        assert!(matches!(
            err,
            SlpError::Transport(TransportError::RegistrationFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_agent_yields_empty_results() {
        let config = DiscoveryConfig {
            slptool_path: PathBuf::from("true"),
            ..Default::default()
        };
        let transport = SlptoolTransport::new(&config);

        assert!(transport.find_service_types("*", "").await.unwrap().is_empty());
        assert!(transport
            .find_services("service:ldap", "DEFAULT")
            .await
            .unwrap()
            .is_empty());
        assert!(transport
            .find_attributes("service:ldap://host", "10.0.0.1")
            .await
            .unwrap()
            .is_empty());
    }
}
