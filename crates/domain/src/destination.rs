use std::fmt;
use std::str::FromStr;

use crate::DialError;

/// Transport kind of an outbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    #[default]
    Unknown,
    Tcp,
    Udp,
    Unix,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Unix => "unix",
        }
    }

    pub fn is_dialable(&self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = DialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "unix" => Ok(Self::Unix),
            other => Err(DialError::UnsupportedTransport(other.to_string())),
        }
    }
}

/// Where the engine wants to connect: a transport kind plus a `host:port`
/// network address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub network: Network,
    pub address: String,
}

impl Destination {
    pub fn new(network: Network, address: impl Into<String>) -> Self {
        Self {
            network,
            address: address.into(),
        }
    }

    pub fn tcp(address: impl Into<String>) -> Self {
        Self::new(Network::Tcp, address)
    }

    pub fn udp(address: impl Into<String>) -> Self {
        Self::new(Network::Udp, address)
    }

    pub fn net_addr(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocketOptions {
    /// `SO_MARK` applied before connecting. Linux and Android only.
    pub mark: Option<u32>,
    pub tcp_nodelay: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse() {
        assert_eq!("tcp".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("UDP".parse::<Network>().unwrap(), Network::Udp);
        assert!(matches!(
            "sctp".parse::<Network>(),
            Err(DialError::UnsupportedTransport(_))
        ));
    }

    #[test]
    fn test_destination_display() {
        let dest = Destination::tcp("proxy.example:443");
        assert_eq!(dest.to_string(), "tcp:proxy.example:443");
        assert_eq!(dest.net_addr(), "proxy.example:443");
    }
}
