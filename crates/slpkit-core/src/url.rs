//! SLP service URL parsing.

use crate::error::{Result, SlpError};
use std::fmt;

/// The components of a service URL such as
/// `service:install.suse:http://10.100.2.16/install/DVD1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl {
    /// Everything before `://`, e.g. `service:install.suse:http`
    pub srv_type: String,
    /// Host name or address, without IPv6 brackets
    pub host: String,
    /// Port, 0 when the URL carries none
    pub port: u16,
    /// Remainder of the URL starting at the first `/`, possibly empty
    pub srv_part: String,
}

impl ServiceUrl {
    /// Splits a service URL into type, host, port and path.
    pub fn parse(url: &str) -> Result<Self> {
        let (srv_type, rest) = url
            .split_once("://")
            .ok_or_else(|| SlpError::invalid_url(url, "missing \"://\""))?;

        if srv_type.is_empty() {
            return Err(SlpError::invalid_url(url, "empty service type"));
        }

        let (host_port, srv_part) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };

        let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| SlpError::invalid_url(url, "unterminated IPv6 address"))?;
            let port = match after.strip_prefix(':') {
                Some(port) => parse_port(url, port)?,
                None if after.is_empty() => 0,
                None => return Err(SlpError::invalid_url(url, "garbage after IPv6 address")),
            };
            (host, port)
        } else {
            match host_port.rsplit_once(':') {
                Some((host, port)) => (host, parse_port(url, port)?),
                None => (host_port, 0),
            }
        };

        if host.is_empty() {
            return Err(SlpError::invalid_url(url, "empty host"));
        }

        Ok(Self {
            srv_type: srv_type.to_string(),
            host: host.to_string(),
            port,
            srv_part: srv_part.to_string(),
        })
    }
}

fn parse_port(url: &str, port: &str) -> Result<u16> {
    port.parse()
        .map_err(|_| SlpError::invalid_url(url, format!("invalid port {:?}", port)))
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.srv_type)?;
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            write!(f, "{}", self.host)?;
        }
        if self.port != 0 {
            write!(f, ":{}", self.port)?;
        }
        write!(f, "{}", self.srv_part)
    }
}
