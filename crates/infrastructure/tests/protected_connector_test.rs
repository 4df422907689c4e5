use std::io;
use std::os::fd::RawFd;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tunnel_dialer_application::ports::{ProtectedConnect, SocketProtector};
use tunnel_dialer_domain::{DialError, Network, SocketOptions};
use tunnel_dialer_infrastructure::{AllowAllProtector, FwmarkProtector, ProtectedConnector};

#[derive(Clone, Default)]
struct RecordingProtector {
    approve: bool,
    seen: Arc<Mutex<Vec<(RawFd, bool)>>>,
    inodes: Arc<Mutex<Vec<libc::ino_t>>>,
}

impl RecordingProtector {
    fn approving() -> Self {
        Self {
            approve: true,
            ..Default::default()
        }
    }

    fn rejecting() -> Self {
        Self::default()
    }

    fn seen(&self) -> Vec<(RawFd, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

/// Inode behind `fd`, or `None` when the descriptor is closed.
fn socket_inode(fd: RawFd) -> Option<libc::ino_t> {
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(fd, &mut stat) } == 0 {
        Some(stat.st_ino)
    } else {
        None
    }
}

impl SocketProtector for RecordingProtector {
    fn protect(&self, fd: RawFd) -> bool {
        let inode = socket_inode(fd);
        if let Some(inode) = inode {
            self.inodes.lock().unwrap().push(inode);
        }
        self.seen.lock().unwrap().push((fd, inode.is_some()));
        self.approve
    }
}

fn connector(protector: &RecordingProtector) -> ProtectedConnector {
    ProtectedConnector::new(Arc::new(protector.clone()))
}

#[tokio::test]
async fn test_tcp_connect_through_dual_stack_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let protector = RecordingProtector::approving();

    let conn = connector(&protector)
        .connect("127.0.0.1".parse().unwrap(), port, Network::Tcp, None)
        .await
        .unwrap();

    let (mut accepted, _) = listener.accept().await.unwrap();
    let peer = conn.peer_addr().unwrap();
    assert_eq!(peer.port(), port);
    assert_eq!(peer.ip().to_string(), "::ffff:127.0.0.1");

    let seen = protector.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1, "protector must see an open descriptor");

    let mut stream = conn.into_stream().unwrap();
    stream.write_all(b"hello").await.unwrap();
    let mut buf = [0u8; 5];
    accepted.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");
}

#[tokio::test]
async fn test_udp_connect_exchanges_datagrams() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = server.local_addr().unwrap().port();
    let protector = RecordingProtector::approving();

    let conn = connector(&protector)
        .connect("127.0.0.1".parse().unwrap(), port, Network::Udp, None)
        .await
        .unwrap();
    assert_eq!(conn.network(), Network::Udp);

    let socket = conn.into_datagram().unwrap();
    socket.send(b"ping").await.unwrap();

    let mut buf = [0u8; 16];
    let (n, from) = server.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"ping");

    server.send_to(b"pong", from).await.unwrap();
    let n = socket.recv(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"pong");
}

#[tokio::test]
async fn test_rejected_protection_fails_before_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let protector = RecordingProtector::rejecting();

    let result = connector(&protector)
        .connect("127.0.0.1".parse().unwrap(), port, Network::Tcp, None)
        .await;

    let seen = protector.seen();
    assert_eq!(seen.len(), 1);
    match result {
        Err(DialError::ProtectionRejected { fd }) => assert_eq!(fd, seen[0].0),
        other => panic!("expected ProtectionRejected, got {:?}", other),
    }

    // The fd number may already be reused by a parallel test, but never for
    // the same socket.
    let shown = protector.inodes.lock().unwrap()[0];
    assert_ne!(socket_inode(seen[0].0), Some(shown));

    let accepted =
        tokio::time::timeout(std::time::Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "no connection should reach the listener");
}

#[tokio::test]
async fn test_unsupported_transport_never_reaches_protector() {
    let protector = RecordingProtector::approving();

    for network in [Network::Unix, Network::Unknown] {
        let result = connector(&protector)
            .connect("127.0.0.1".parse().unwrap(), 80, network, None)
            .await;
        assert!(matches!(result, Err(DialError::UnsupportedTransport(_))));
    }

    assert!(protector.seen().is_empty());
}

#[tokio::test]
async fn test_refused_connect_is_connect_failed() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let protector = RecordingProtector::approving();

    let result = connector(&protector)
        .connect("127.0.0.1".parse().unwrap(), port, Network::Tcp, None)
        .await;

    match result {
        Err(DialError::ConnectFailed { target, kind, .. }) => {
            assert_eq!(target, format!("127.0.0.1:{}", port));
            assert_eq!(kind, io::ErrorKind::ConnectionRefused);
        }
        other => panic!("expected ConnectFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_nodelay_option_applied() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let options = SocketOptions {
        mark: None,
        tcp_nodelay: true,
    };

    let conn = ProtectedConnector::new(Arc::new(AllowAllProtector))
        .connect("127.0.0.1".parse().unwrap(), port, Network::Tcp, Some(&options))
        .await
        .unwrap();

    assert!(conn.into_stream().unwrap().nodelay().unwrap());
}

#[test]
fn test_fwmark_protector_rejects_invalid_descriptor() {
    let protector = FwmarkProtector::new(0x1);
    assert_eq!(protector.mark(), 0x1);
    assert!(!protector.protect(-1));
}

#[test]
fn test_closure_protector() {
    let protector = |fd: RawFd| fd > 2;
    assert!(protector.protect(10));
    assert!(!SocketProtector::protect(&protector, 1));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_mark_option_applied_before_protect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let protector = RecordingProtector::approving();
    let options = SocketOptions {
        mark: Some(0x2a),
        tcp_nodelay: false,
    };

    let result = connector(&protector)
        .connect("127.0.0.1".parse().unwrap(), port, Network::Tcp, Some(&options))
        .await;

    match result {
        // CAP_NET_ADMIN present: the marked socket connects.
        Ok(conn) => {
            assert_eq!(conn.peer_addr().unwrap().port(), port);
            assert_eq!(protector.seen().len(), 1);
        }
        Err(DialError::SocketCreationFailed { kind, .. }) => {
            assert_eq!(kind, io::ErrorKind::PermissionDenied);
            assert!(protector.seen().is_empty());
        }
        Err(other) => panic!("unexpected error: {:?}", other),
    }
}
