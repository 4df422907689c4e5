use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpStream, UdpSocket};
use tunnel_dialer_domain::{DialError, Network, SocketOptions};

#[derive(Debug)]
pub enum ProtectedConnection {
    Stream(TcpStream),
    Datagram(UdpSocket),
}

impl ProtectedConnection {
    pub fn network(&self) -> Network {
        match self {
            Self::Stream(_) => Network::Tcp,
            Self::Datagram(_) => Network::Udp,
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Self::Stream(s) => s.peer_addr(),
            Self::Datagram(s) => s.peer_addr(),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Self::Stream(s) => s.local_addr(),
            Self::Datagram(s) => s.local_addr(),
        }
    }

    pub fn into_stream(self) -> Option<TcpStream> {
        match self {
            Self::Stream(s) => Some(s),
            Self::Datagram(_) => None,
        }
    }

    pub fn into_datagram(self) -> Option<UdpSocket> {
        match self {
            Self::Datagram(s) => Some(s),
            Self::Stream(_) => None,
        }
    }
}

/// Opens a connection whose socket was protected before connecting.
#[async_trait]
pub trait ProtectedConnect: Send + Sync {
    async fn connect(
        &self,
        ip: IpAddr,
        port: u16,
        network: Network,
        options: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError>;
}
