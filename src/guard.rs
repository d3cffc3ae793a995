use std::{
    fmt,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A host and port supplied by the caller for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Runs the address guard and yields the socket address to dial.
    pub fn resolve(&self) -> Result<SocketAddr, ValidationError> {
        let ip = check_public_ipv4(&self.host)?;
        Ok(SocketAddr::V4(SocketAddrV4::new(ip, self.port)))
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Accepts only a literal dotted-quad IPv4 address outside loopback,
/// unspecified and private ranges. No name resolution takes place here.
pub fn check_public_ipv4(host: &str) -> Result<Ipv4Addr, ValidationError> {
    let reject = || {
        warn!("rejected target address {:?}", host);
        ValidationError::DisallowedAddress(host.to_string())
    };

    let ip: Ipv4Addr = host.parse().map_err(|_| reject())?;

    if ip.is_loopback() || ip.is_unspecified() || ip.is_private() {
        return Err(reject());
    }

    Ok(ip)
}
