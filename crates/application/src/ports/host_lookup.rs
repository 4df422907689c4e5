use async_trait::async_trait;
use std::net::IpAddr;
use tunnel_dialer_domain::DialError;

/// Name and service lookups backed by the host's resolver.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Maps a TCP service name such as `https` to its port number.
    async fn lookup_port(&self, service: &str) -> Result<u16, DialError>;

    /// Resolves `host` to every address the system resolver returns, in the
    /// resolver's order. IP literals resolve to themselves.
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, DialError>;
}
