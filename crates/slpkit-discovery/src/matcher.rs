//! Predicate matching against discovered services.
//!
//! A predicate is a `(key, pattern)` pair. The key names either one of the
//! fixed [`Service`] fields or an attribute; fields win when both exist. The
//! pattern is a case-insensitive regular expression that only has to match
//! somewhere in the value. A service matches when every predicate does.

use crate::types::Service;
use regex::{Regex, RegexBuilder};
use slpkit_core::{Result, SlpError};
use tracing::trace;

type FieldAccessor = fn(&Service) -> String;

/// Fixed service fields a predicate can name, checked before attributes
const FIELD_ACCESSORS: &[(&str, FieldAccessor)] = &[
    ("name", |s: &Service| s.name.clone()),
    ("ip", |s: &Service| s.ip.clone()),
    ("host", |s: &Service| s.host.clone().unwrap_or_default()),
    ("protocol", |s: &Service| s.protocol.clone()),
    ("port", |s: &Service| s.port.to_string()),
    ("slp_type", |s: &Service| s.slp_type.clone()),
    ("slp_url", |s: &Service| s.slp_url.clone()),
    ("lifetime", |s: &Service| s.lifetime.to_string()),
];

/// Returns the string form of whatever `key` names on `service`.
///
/// `None` means the key is neither a field nor an attribute.
pub fn lookup(service: &Service, key: &str) -> Option<String> {
    FIELD_ACCESSORS
        .iter()
        .find(|(field, _)| *field == key)
        .map(|(_, accessor)| accessor(service))
        .or_else(|| service.attributes.get(key).map(str::to_string))
}

/// A single compiled predicate
#[derive(Debug, Clone)]
pub struct Predicate {
    key: String,
    pattern: Regex,
}

impl Predicate {
    /// Compiles `pattern` as a case-insensitive regex
    pub fn new(key: impl Into<String>, pattern: &str) -> Result<Self> {
        let key = key.into();
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SlpError::invalid_pattern(key.as_str(), pattern, e.to_string()))?;

        Ok(Self {
            key,
            pattern: regex,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Evaluates the predicate; an unknown key never matches
    pub fn evaluate(&self, service: &Service) -> bool {
        match lookup(service, &self.key) {
            Some(value) => self.pattern.is_match(&value),
            None => {
                trace!(key = %self.key, service = %service.slp_url, "Predicate key not found");
                false
            }
        }
    }
}

/// A conjunction of predicates, compiled once per query
#[derive(Debug, Clone, Default)]
pub struct Predicates {
    predicates: Vec<Predicate>,
}

impl Predicates {
    /// Compiles every `(key, pattern)` pair, failing on the first bad pattern
    pub fn compile<I, K, P>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: AsRef<str>,
    {
        let predicates = pairs
            .into_iter()
            .map(|(key, pattern)| Predicate::new(key, pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { predicates })
    }

    /// True when every predicate holds; an empty set always matches
    pub fn matches(&self, service: &Service) -> bool {
        self.predicates.iter().all(|p| p.evaluate(service))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Checks `service` against compiled predicates
pub fn matches(service: &Service, predicates: &Predicates) -> bool {
    predicates.matches(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attributes;
    use slpkit_core::RawServiceRecord;

    fn service() -> Service {
        let raw = RawServiceRecord {
            ip: "10.100.2.16".to_string(),
            host: "10.100.2.16".to_string(),
            port: 389,
            srv_type: "service:ldap".to_string(),
            srv_url: "service:ldap://10.100.2.16:389".to_string(),
            srv_part: String::new(),
            family: "IP".to_string(),
            lifetime: 65535,
        };
        let attributes = Attributes::parse([
            "(machine=x86_64)",
            "(Description=SLE_10_SP4_SDK)",
            "(name=attribute-name)",
        ]);
        Service::from_raw("ldap", None, &raw, Some("server.me".to_string()), attributes)
    }

    #[test]
    fn test_empty_predicates_match() {
        let predicates = Predicates::compile(Vec::<(String, String)>::new()).unwrap();
        assert!(predicates.is_empty());
        assert!(matches(&service(), &predicates));
    }

    #[test]
    fn test_field_predicates() {
        let predicates =
            Predicates::compile([("port", "389"), ("host", "server"), ("protocol", "^ldap$")])
                .unwrap();
        assert!(predicates.matches(&service()));

        let predicates = Predicates::compile([("port", "636")]).unwrap();
        assert!(!predicates.matches(&service()));
    }

    #[test]
    fn test_attribute_substring_ignores_case() {
        let predicates = Predicates::compile([("description", "sdk")]).unwrap();
        assert!(predicates.matches(&service()));

        let predicates = Predicates::compile([("DESCRIPTION", "Sp4")]).unwrap();
        assert!(predicates.matches(&service()));
    }

    #[test]
    fn test_conjunction() {
        let predicates = Predicates::compile([("machine", "x86_64"), ("description", "dell")]).unwrap();
        assert!(!predicates.matches(&service()));

        let predicates =
            Predicates::compile([("description", "dell"), ("machine", "x86_64")]).unwrap();
        assert!(!predicates.matches(&service()));
    }

    #[test]
    fn test_unknown_key_fails_match() {
        let predicates = Predicates::compile([("machine", "x86_64"), ("color", ".*")]).unwrap();
        assert!(!predicates.matches(&service()));
    }

    #[test]
    fn test_field_beats_attribute() {
        assert_eq!(lookup(&service(), "name").as_deref(), Some("ldap"));

        let predicates = Predicates::compile([("name", "attribute")]).unwrap();
        assert!(!predicates.matches(&service()));
    }

    #[test]
    fn test_missing_host_is_empty_string() {
        let mut svc = service();
        svc.host = None;
        assert_eq!(lookup(&svc, "host").as_deref(), Some(""));
        assert!(Predicates::compile([("host", "")]).unwrap().matches(&svc));
        assert!(!Predicates::compile([("host", "server")]).unwrap().matches(&svc));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Predicates::compile([("machine", "x86_(64")]).unwrap_err();
        assert!(matches!(err, SlpError::InvalidPattern { .. }));
    }
}
