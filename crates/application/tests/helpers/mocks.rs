use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tunnel_dialer_application::ports::{HostLookup, ProtectedConnect, ProtectedConnection};
use tunnel_dialer_domain::{DialError, Network, SocketOptions};

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

#[derive(Clone, Default)]
pub struct MockHostLookup {
    hosts: Arc<Mutex<HashMap<String, Vec<IpAddr>>>>,
    services: Arc<Mutex<HashMap<String, u16>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    ip_calls: Arc<AtomicUsize>,
    port_calls: Arc<AtomicUsize>,
}

impl MockHostLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(self, host: &str, ips: &[&str]) -> Self {
        self.hosts
            .lock()
            .unwrap()
            .insert(host.to_string(), ips.iter().map(|s| ip(s)).collect());
        self
    }

    pub fn with_service(self, name: &str, port: u16) -> Self {
        self.services.lock().unwrap().insert(name.to_string(), port);
        self
    }

    pub fn with_failing_host(self, host: &str) -> Self {
        self.failing.lock().unwrap().insert(host.to_string());
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn set_host(&self, host: &str, ips: &[&str]) {
        self.failing.lock().unwrap().remove(host);
        self.hosts
            .lock()
            .unwrap()
            .insert(host.to_string(), ips.iter().map(|s| ip(s)).collect());
    }

    pub fn ip_calls(&self) -> usize {
        self.ip_calls.load(Ordering::SeqCst)
    }

    pub fn port_calls(&self) -> usize {
        self.port_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostLookup for MockHostLookup {
    async fn lookup_port(&self, service: &str) -> Result<u16, DialError> {
        self.port_calls.fetch_add(1, Ordering::SeqCst);
        let port = self.services.lock().unwrap().get(service).copied();
        port.ok_or_else(|| DialError::PortResolutionFailed {
            port: service.to_string(),
            reason: "unknown service".to_string(),
        })
    }

    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, DialError> {
        self.ip_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(host) {
            return Err(DialError::NameResolutionFailed {
                host: host.to_string(),
                reason: "mock failure".to_string(),
            });
        }

        let ips = self.hosts.lock().unwrap().get(host).cloned();
        ips.ok_or_else(|| DialError::NameResolutionFailed {
            host: host.to_string(),
            reason: "no such host".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectCall {
    pub ip: IpAddr,
    pub port: u16,
    pub network: Network,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Succeed,
    Refuse,
    Hang,
}

/// Records every connect call. Successful connects go to a loopback
/// listener regardless of the requested address.
#[derive(Clone)]
pub struct MockConnector {
    listener_addr: SocketAddr,
    behavior: Arc<Mutex<ConnectBehavior>>,
    refused_ips: Arc<Mutex<HashSet<IpAddr>>>,
    calls: Arc<Mutex<Vec<ConnectCall>>>,
}

impl MockConnector {
    pub async fn new(behavior: ConnectBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut accepted = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                accepted.push(stream);
            }
        });

        Self {
            listener_addr,
            behavior: Arc::new(Mutex::new(behavior)),
            refused_ips: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn refuse_ip(&self, refused: IpAddr) {
        self.refused_ips.lock().unwrap().insert(refused);
    }

    pub fn calls(&self) -> Vec<ConnectCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_ips(&self) -> Vec<IpAddr> {
        self.calls().into_iter().map(|c| c.ip).collect()
    }
}

#[async_trait]
impl ProtectedConnect for MockConnector {
    async fn connect(
        &self,
        ip: IpAddr,
        port: u16,
        network: Network,
        _options: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError> {
        self.calls
            .lock()
            .unwrap()
            .push(ConnectCall { ip, port, network });

        if !network.is_dialable() {
            return Err(DialError::UnsupportedTransport(network.to_string()));
        }

        let behavior = *self.behavior.lock().unwrap();
        let refused = self.refused_ips.lock().unwrap().contains(&ip);
        let target = SocketAddr::new(ip, port);

        match behavior {
            ConnectBehavior::Hang => std::future::pending().await,
            ConnectBehavior::Refuse => Err(DialError::connect_failed(
                target,
                &io::Error::from(io::ErrorKind::ConnectionRefused),
            )),
            ConnectBehavior::Succeed if refused => Err(DialError::connect_failed(
                target,
                &io::Error::from(io::ErrorKind::ConnectionRefused),
            )),
            ConnectBehavior::Succeed => match network {
                Network::Udp => {
                    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
                    socket.connect(self.listener_addr).await.unwrap();
                    Ok(ProtectedConnection::Datagram(socket))
                }
                _ => {
                    let stream = TcpStream::connect(self.listener_addr).await.unwrap();
                    Ok(ProtectedConnection::Stream(stream))
                }
            },
        }
    }
}
