//! Types for discovered services and their attributes

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use slpkit_core::types::{protocol_of, RawServiceRecord};
use std::collections::BTreeMap;

/// Service attributes reported by the SLP agent.
///
/// Names are looked up case-insensitively; names and values are stored as
/// received. Entries keep the order in which the agent listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Creates an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the attribute map from raw `(name=value)` strings.
    ///
    /// The surrounding parentheses are stripped and the remainder is split
    /// on the first `=`. A bare `(keyword)` becomes an entry with an empty
    /// value.
    pub fn parse<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attributes = Self::new();
        for item in raw {
            let item = item.as_ref().trim();
            let item = item.strip_prefix('(').unwrap_or(item);
            let item = item.strip_suffix(')').unwrap_or(item);
            if item.is_empty() {
                continue;
            }

            match item.split_once('=') {
                Some((name, value)) => attributes.insert(name, value),
                None => attributes.insert(item, ""),
            }
        }
        attributes
    }

    /// Inserts an attribute, replacing any entry whose name differs only in case
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Looks up an attribute value ignoring the case of `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if an attribute with this name exists (any case)
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, value)` pairs in agent order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(map.into_iter().collect())
    }
}

/// A discovered, attribute-resolved SLP service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Logical service name the caller searched for (e.g. "install.suse")
    pub name: String,

    /// Address from the agent response
    pub ip: String,

    /// Port from the service URL
    pub port: u16,

    /// Raw service type (e.g. "service:install.suse:http")
    pub slp_type: String,

    /// Raw service URL
    pub slp_url: String,

    /// Requested protocol, or the last segment of the service type
    pub protocol: String,

    /// Reverse-resolved hostname, if the lookup succeeded
    pub host: Option<String>,

    /// Registration lifetime in seconds
    pub lifetime: u32,

    /// Attributes from the unicast attribute query
    pub attributes: Attributes,

    /// When this record was built
    pub discovered_at: DateTime<Utc>,
}

impl Service {
    /// Builds a service from an agent response and its resolved extras
    pub fn from_raw(
        name: impl Into<String>,
        protocol: Option<&str>,
        raw: &RawServiceRecord,
        host: Option<String>,
        attributes: Attributes,
    ) -> Self {
        let protocol = protocol
            .map(str::to_string)
            .unwrap_or_else(|| protocol_of(&raw.srv_type).to_string());

        Self {
            name: name.into(),
            ip: raw.ip.clone(),
            port: raw.port,
            slp_type: raw.srv_type.clone(),
            slp_url: raw.srv_url.clone(),
            protocol,
            host,
            lifetime: raw.lifetime,
            attributes,
            discovered_at: Utc::now(),
        }
    }

    /// Returns the resolved hostname, or the IP when resolution failed
    pub fn display_host(&self) -> &str {
        self.host.as_deref().unwrap_or(&self.ip)
    }

    /// Gets the service description attribute if available
    pub fn description(&self) -> Option<&str> {
        self.attributes.get("description")
    }
}

/// A raw agent record paired with its multicast attribute map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedService {
    #[serde(flatten)]
    pub record: RawServiceRecord,

    /// Attributes from a multicast attribute query on the service URL
    #[serde(rename = "attr")]
    pub attributes: Attributes,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_record() -> RawServiceRecord {
        RawServiceRecord {
            ip: "10.100.2.16".to_string(),
            host: "10.100.2.16".to_string(),
            port: 0,
            srv_type: "service:install.suse:http".to_string(),
            srv_url: "service:install.suse:http://10.100.2.16/install/DVD1".to_string(),
            srv_part: "/install/DVD1".to_string(),
            family: "IP".to_string(),
            lifetime: 65535,
        }
    }

    #[test]
    fn test_attribute_parse() {
        let attrs = Attributes::parse([
            "(machine=x86_64)",
            "(description=SLE_10_SP4_SDK)",
            "(url=http://host/?a=b)",
            "(secure)",
        ]);

        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs.get("machine"), Some("x86_64"));
        assert_eq!(attrs.get("description"), Some("SLE_10_SP4_SDK"));
        assert_eq!(attrs.get("url"), Some("http://host/?a=b"));
        assert_eq!(attrs.get("secure"), Some(""));
    }

    #[test]
    fn test_attribute_lookup_ignores_case() {
        let attrs = Attributes::parse(["(Description=Main LDAP server)"]);
        assert_eq!(attrs.get("description"), Some("Main LDAP server"));
        assert_eq!(attrs.get("DESCRIPTION"), Some("Main LDAP server"));
        assert!(attrs.contains("DeScRiPtIoN"));
        assert!(!attrs.contains("machine"));
    }

    #[test]
    fn test_attribute_insert_replaces_case_variant() {
        let mut attrs = Attributes::new();
        attrs.insert("Machine", "i586");
        attrs.insert("machine", "x86_64");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("MACHINE"), Some("x86_64"));
    }

    #[test]
    fn test_attributes_serialize_as_map() {
        let attrs = Attributes::parse(["(b=2)", "(a=1)"]);
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);

        let back: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("a"), Some("1"));
    }

    #[test]
    fn test_service_copies_raw_fields() {
        let raw = raw_record();
        let service = Service::from_raw(
            "install.suse",
            None,
            &raw,
            Some("fallback.suse.cz".to_string()),
            Attributes::new(),
        );

        assert_eq!(service.name, "install.suse");
        assert_eq!(service.ip, "10.100.2.16");
        assert_eq!(service.port, 0);
        assert_eq!(service.slp_type, raw.srv_type);
        assert_eq!(service.slp_url, raw.srv_url);
        assert_eq!(service.protocol, "http");
        assert_eq!(service.lifetime, 65535);
        assert_eq!(service.display_host(), "fallback.suse.cz");
    }

    #[test]
    fn test_protocol_override() {
        let service = Service::from_raw("install.suse", Some("ftp"), &raw_record(), None, Attributes::new());
        assert_eq!(service.protocol, "ftp");
        assert_eq!(service.host, None);
        assert_eq!(service.display_host(), "10.100.2.16");
    }
}
