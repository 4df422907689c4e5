use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, SocketAddr, SocketAddrV6};
use std::os::fd::AsRawFd;
use std::sync::Arc;
use tokio::net::{TcpSocket, UdpSocket};
use tracing::{debug, warn};
use tunnel_dialer_application::ports::{ProtectedConnect, ProtectedConnection, SocketProtector};
use tunnel_dialer_domain::{DialError, Network, SocketOptions};

use crate::system::set_socket_mark;

/// Connects dual-stack sockets after the host has protected them.
///
/// Descriptor ownership moves from `socket2::Socket` into the std and then
/// the tokio socket type, so every failure path closes the descriptor
/// exactly once and the returned connection owns it alone.
pub struct ProtectedConnector {
    protector: Arc<dyn SocketProtector>,
}

impl ProtectedConnector {
    pub fn new(protector: Arc<dyn SocketProtector>) -> Self {
        Self { protector }
    }

    fn open_socket(
        &self,
        network: Network,
        options: Option<&SocketOptions>,
    ) -> Result<Socket, DialError> {
        let (ty, protocol) = match network {
            Network::Tcp => (Type::STREAM, Protocol::TCP),
            Network::Udp => (Type::DGRAM, Protocol::UDP),
            other => return Err(DialError::UnsupportedTransport(other.to_string())),
        };

        let socket = Socket::new(Domain::IPV6, ty, Some(protocol))
            .map_err(|e| DialError::socket_creation(&e))?;
        socket
            .set_only_v6(false)
            .map_err(|e| DialError::socket_creation(&e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| DialError::socket_creation(&e))?;

        if let Some(mark) = options.and_then(|o| o.mark) {
            set_socket_mark(socket.as_raw_fd(), mark)
                .map_err(|e| DialError::socket_creation(&e))?;
        }

        Ok(socket)
    }
}

#[async_trait]
impl ProtectedConnect for ProtectedConnector {
    async fn connect(
        &self,
        ip: IpAddr,
        port: u16,
        network: Network,
        options: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError> {
        let socket = self.open_socket(network, options)?;
        let fd = socket.as_raw_fd();

        if !self.protector.protect(fd) {
            warn!(fd, "Failed to protect socket, closing");
            return Err(DialError::ProtectionRejected { fd });
        }

        let target = SocketAddr::new(ip, port);
        let mapped = SocketAddr::V6(SocketAddrV6::new(to_dual_stack(ip), port, 0, 0));

        match network {
            Network::Tcp => {
                let stream = TcpSocket::from_std_stream(socket.into())
                    .connect(mapped)
                    .await
                    .map_err(|e| {
                        warn!(fd, target = %target, error = %e, "Connect failed, closing");
                        DialError::connect_failed(target, &e)
                    })?;

                if options.is_some_and(|o| o.tcp_nodelay) {
                    stream
                        .set_nodelay(true)
                        .map_err(|e| DialError::socket_creation(&e))?;
                }

                debug!(fd, target = %target, "Protected stream connected");
                Ok(ProtectedConnection::Stream(stream))
            }
            _ => {
                socket.connect(&mapped.into()).map_err(|e| {
                    warn!(fd, target = %target, error = %e, "Connect failed, closing");
                    DialError::connect_failed(target, &e)
                })?;

                let socket = UdpSocket::from_std(socket.into())
                    .map_err(|e| DialError::socket_creation(&e))?;

                debug!(fd, target = %target, "Protected datagram socket connected");
                Ok(ProtectedConnection::Datagram(socket))
            }
        }
    }
}

fn to_dual_stack(ip: IpAddr) -> std::net::Ipv6Addr {
    match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}
