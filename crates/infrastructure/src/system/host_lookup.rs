use async_trait::async_trait;
use std::ffi::{CStr, CString};
use std::io;
use std::net::IpAddr;
use tracing::debug;
use tunnel_dialer_application::ports::HostLookup;
use tunnel_dialer_domain::DialError;

/// Used when the services database is missing, as on minimal containers and
/// Android.
const WELL_KNOWN_TCP_SERVICES: &[(&str, u16)] = &[
    ("ftp", 21),
    ("ftps", 990),
    ("gopher", 70),
    ("http", 80),
    ("https", 443),
    ("imap2", 143),
    ("imap3", 220),
    ("imaps", 993),
    ("pop3", 110),
    ("pop3s", 995),
    ("smtp", 25),
    ("submissions", 465),
    ("ssh", 22),
    ("telnet", 23),
];

/// Lookups through the operating system resolver (`getaddrinfo`), so hosts
/// files, search domains and platform DNS settings all apply.
#[derive(Debug, Clone, Default)]
pub struct SystemHostLookup;

impl SystemHostLookup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostLookup for SystemHostLookup {
    async fn lookup_port(&self, service: &str) -> Result<u16, DialError> {
        let name = service.to_ascii_lowercase();
        let lookup_name = name.clone();

        let from_system = tokio::task::spawn_blocking(move || service_port(&lookup_name))
            .await
            .map_err(|e| io::Error::other(e.to_string()))
            .and_then(|r| r);

        match from_system {
            Ok(port) => Ok(port),
            Err(e) => {
                debug!(service, error = %e, "Service database lookup failed, using built-in table");
                WELL_KNOWN_TCP_SERVICES
                    .iter()
                    .find(|(known, _)| *known == name)
                    .map(|(_, port)| *port)
                    .ok_or_else(|| DialError::PortResolutionFailed {
                        port: service.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    }

    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, DialError> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| DialError::NameResolutionFailed {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }

        debug!(host, ips = ?ips, "System lookup complete");
        Ok(ips)
    }
}

struct AddrInfoList(*mut libc::addrinfo);

impl Drop for AddrInfoList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { libc::freeaddrinfo(self.0) };
        }
    }
}

fn service_port(service: &str) -> io::Result<u16> {
    let c_service = CString::new(service)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "service name contains NUL"))?;

    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_flags = libc::AI_PASSIVE;

    let mut res: *mut libc::addrinfo = std::ptr::null_mut();
    let rc = unsafe { libc::getaddrinfo(std::ptr::null(), c_service.as_ptr(), &hints, &mut res) };
    if rc != 0 {
        let msg = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }
            .to_string_lossy()
            .into_owned();
        return Err(io::Error::new(io::ErrorKind::NotFound, msg));
    }
    let list = AddrInfoList(res);

    let mut cur = list.0;
    while !cur.is_null() {
        let ai = unsafe { &*cur };
        if !ai.ai_addr.is_null() {
            match ai.ai_family {
                libc::AF_INET => {
                    let sin = unsafe { &*(ai.ai_addr as *const libc::sockaddr_in) };
                    return Ok(u16::from_be(sin.sin_port));
                }
                libc::AF_INET6 => {
                    let sin6 = unsafe { &*(ai.ai_addr as *const libc::sockaddr_in6) };
                    return Ok(u16::from_be(sin6.sin6_port));
                }
                _ => {}
            }
        }
        cur = ai.ai_next;
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no port for service {}", service),
    ))
}
