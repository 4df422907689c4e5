use crate::ports::HostLookup;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use tunnel_dialer_domain::{order_by_family, split_host_port, DialError, ResolvedEndpoint};

pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns a `host:port` string into a [`ResolvedEndpoint`].
///
/// Port and host lookups share one deadline.
#[derive(Clone)]
pub struct AddressResolver {
    lookup: Arc<dyn HostLookup>,
    timeout: Duration,
}

impl AddressResolver {
    pub fn new(lookup: Arc<dyn HostLookup>) -> Self {
        Self {
            lookup,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve(
        &self,
        address: &str,
        prefer_ipv6: bool,
    ) -> Result<ResolvedEndpoint, DialError> {
        // Unrepresentable deadlines mean no deadline.
        let deadline = Instant::now().checked_add(self.timeout);
        let (host, port_token) = split_host_port(address)?;

        let port = match parse_port(port_token) {
            Some(parsed) => parsed?,
            None => within(deadline, self.lookup.lookup_port(port_token))
                .await
                .ok_or_else(|| DialError::PortResolutionFailed {
                    port: port_token.to_string(),
                    reason: "lookup timed out".to_string(),
                })??,
        };

        let mut ips = within(deadline, self.lookup.lookup_ip(host))
            .await
            .ok_or_else(|| DialError::NameResolutionFailed {
                host: host.to_string(),
                reason: format!("lookup timed out after {:?}", self.timeout),
            })??;

        if ips.is_empty() {
            return Err(DialError::NoAddressesFound(address.to_string()));
        }

        if order_by_family(&mut ips, prefer_ipv6) {
            debug!(address, ips = ?ips, "Preferring IPv4, resolver order reversed");
        }

        ResolvedEndpoint::new(host, ips, port)
    }
}

/// `None` when `deadline` passes first.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Decimal port tokens are handled locally; `None` means the token must be
/// looked up as a service name.
fn parse_port(token: &str) -> Option<Result<u16, DialError>> {
    if token.is_empty() {
        return Some(Err(DialError::PortResolutionFailed {
            port: token.to_string(),
            reason: "empty port".to_string(),
        }));
    }

    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(token.parse::<u16>().map_err(|_| DialError::PortResolutionFailed {
        port: token.to_string(),
        reason: "port out of range".to_string(),
    }))
}
