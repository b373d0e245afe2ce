//! The query interface of the SLP agent.

use async_trait::async_trait;
use slpkit_core::{RawServiceRecord, Result};

/// Primitive SLP operations provided by an agent or daemon.
///
/// Implementations return the agent's answers unparsed; turning them into
/// [`Service`](crate::Service) records is the engine's job. An empty answer
/// is an empty vector, never an error.
#[async_trait]
pub trait SlpTransport: Send + Sync {
    /// Lists service types. A naming authority of `"*"` means all
    /// authorities, `""` the default (IANA) one.
    async fn find_service_types(
        &self,
        naming_authority: &str,
        scope_list: &str,
    ) -> Result<Vec<String>>;

    /// Multicast query for instances of `service_type`.
    async fn find_services(
        &self,
        service_type: &str,
        scope_list: &str,
    ) -> Result<Vec<RawServiceRecord>>;

    /// Attribute query for a service URL or type, returning `(name=value)`
    /// strings. Unicast to `ip` when it is non-empty, multicast otherwise.
    async fn find_attributes(&self, url_or_type: &str, ip: &str) -> Result<Vec<String>>;

    /// Registers a service URL with the given attributes.
    async fn register(&self, service_url: &str, attributes: &[(String, String)]) -> Result<()>;

    /// Removes a previously registered service URL.
    async fn deregister(&self, service_url: &str) -> Result<()>;
}

/// Formats attributes the way the agent expects them: `(a=1),(b=2)`.
pub fn format_attribute_list(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!("({}={})", name, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits an agent attribute list on commas that are outside parentheses.
///
/// `(a=1,2),(b=3)` yields `["(a=1,2)", "(b=3)"]`. Line breaks separate
/// entries as well.
pub fn split_attribute_list(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in list.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => push_item(&mut items, &mut current),
            '\n' | '\r' => {
                depth = 0;
                push_item(&mut items, &mut current);
            }
            _ => current.push(c),
        }
    }
    push_item(&mut items, &mut current);

    items
}

fn push_item(items: &mut Vec<String>, current: &mut String) {
    let item = current.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
    current.clear();
}
