//! Service type descriptors and raw agent records.

use crate::error::{Result, SlpError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheme prefix of every SLP service type
pub const SCHEME: &str = "service";

/// Separator between service type segments
pub const DELIMITER: char = ':';

/// A parsed SLP service type such as `service:install.suse:http`.
///
/// For abstract types with no separate protocol (`service:ntp`) the name and
/// the protocol are the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceTypeDescriptor {
    /// Service name, e.g. `install.suse`
    pub name: String,
    /// Protocol, e.g. `http`
    pub protocol: String,
}

impl ServiceTypeDescriptor {
    /// Parses a raw service type string.
    ///
    /// `service:ntp` yields `{ name: "ntp", protocol: "ntp" }` and
    /// `service:install.suse:http` yields `{ name: "install.suse", protocol: "http" }`.
    /// Any other number of segments is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(DELIMITER).collect();
        match parts.as_slice() {
            [_, protocol] => Ok(Self {
                name: protocol.to_string(),
                protocol: protocol.to_string(),
            }),
            [_, name, protocol] => Ok(Self {
                name: name.to_string(),
                protocol: protocol.to_string(),
            }),
            _ => Err(SlpError::malformed_type(raw)),
        }
    }

    /// Returns true when the service name doubles as the protocol
    pub fn is_abstract(&self) -> bool {
        self.name == self.protocol
    }
}

impl fmt::Display for ServiceTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_abstract() {
            write!(f, "{}{}{}", SCHEME, DELIMITER, self.name)
        } else {
            write!(
                f,
                "{}{}{}{}{}",
                SCHEME, DELIMITER, self.name, DELIMITER, self.protocol
            )
        }
    }
}

impl FromStr for ServiceTypeDescriptor {
    type Err = SlpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Builds the query type string `service:<name>[:<protocol>]`.
///
/// The protocol segment is left out entirely when not given, so there is
/// never a trailing colon.
pub fn build_query_type(service_name: &str, protocol: Option<&str>) -> String {
    match protocol {
        Some(protocol) => format!(
            "{}{}{}{}{}",
            SCHEME, DELIMITER, service_name, DELIMITER, protocol
        ),
        None => format!("{}{}{}", SCHEME, DELIMITER, service_name),
    }
}

/// Returns the last colon-delimited segment of a service type.
pub fn protocol_of(slp_type: &str) -> &str {
    slp_type.rsplit(DELIMITER).next().unwrap_or(slp_type)
}

/// One unparsed service instance as reported by the SLP agent.
///
/// Field names follow the agent's keys when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawServiceRecord {
    /// Address the service answered from
    pub ip: String,

    /// Host part of the service URL
    #[serde(rename = "pcHost", default)]
    pub host: String,

    /// Port of the service URL (0 when absent)
    #[serde(rename = "pcPort")]
    pub port: u16,

    /// Service type of the URL, e.g. `service:install.suse:http`
    #[serde(rename = "pcSrvType")]
    pub srv_type: String,

    /// Full service URL
    #[serde(rename = "srvurl")]
    pub srv_url: String,

    /// Path part of the service URL
    #[serde(rename = "pcSrvPart", default)]
    pub srv_part: String,

    /// Network family, "IP" or "Other"
    #[serde(rename = "pcFamily", default = "default_family")]
    pub family: String,

    /// Registration lifetime in seconds
    pub lifetime: u32,
}

fn default_family() -> String {
    "IP".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_segments() {
        let ty = ServiceTypeDescriptor::parse("service:install.suse:http").unwrap();
        assert_eq!(ty.name, "install.suse");
        assert_eq!(ty.protocol, "http");
        assert!(!ty.is_abstract());
    }

    #[test]
    fn test_parse_two_segments() {
        let ty = ServiceTypeDescriptor::parse("service:ntp").unwrap();
        assert_eq!(ty.name, "ntp");
        assert_eq!(ty.protocol, "ntp");
        assert!(ty.is_abstract());
    }

    #[test]
    fn test_parse_rejects_other_segment_counts() {
        for raw in ["ntp", "service:a:b:c", "service:printer:lpr:x:y", ""] {
            let err = ServiceTypeDescriptor::parse(raw).unwrap_err();
            assert!(matches!(err, SlpError::MalformedType { .. }), "{raw}");
        }
    }

    #[test]
    fn test_display_matches_query_type() {
        let ty: ServiceTypeDescriptor = "service:install.suse:http".parse().unwrap();
        assert_eq!(ty.to_string(), "service:install.suse:http");

        let ty: ServiceTypeDescriptor = "service:ldap".parse().unwrap();
        assert_eq!(ty.to_string(), "service:ldap");
    }

    #[test]
    fn test_build_query_type() {
        assert_eq!(
            build_query_type("install.suse", Some("http")),
            "service:install.suse:http"
        );
        assert_eq!(build_query_type("install.suse", None), "service:install.suse");
    }

    #[test]
    fn test_protocol_of() {
        assert_eq!(protocol_of("service:install.suse:http"), "http");
        assert_eq!(protocol_of("service:ldap"), "ldap");
        assert_eq!(protocol_of("service:install.suse.http"), "install.suse.http");
    }

    #[test]
    fn test_raw_record_uses_agent_keys() {
        let json = r#"{
            "ip": "10.100.2.16",
            "pcFamily": "IP",
            "pcHost": "10.100.2.16",
            "pcPort": 0,
            "pcSrvPart": "/install/SLP/SLE-10-SP4-SDK-RC3/x86_64/DVD1",
            "pcSrvType": "service:install.suse:http",
            "srvurl": "service:install.suse:http://10.100.2.16/install/SLP/SLE-10-SP4-SDK-RC3/x86_64/DVD1",
            "lifetime": 65535
        }"#;

        let record: RawServiceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.ip, "10.100.2.16");
        assert_eq!(record.port, 0);
        assert_eq!(record.srv_type, "service:install.suse:http");
        assert_eq!(record.lifetime, 65535);
    }
}
