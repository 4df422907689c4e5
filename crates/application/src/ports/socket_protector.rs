use std::os::fd::RawFd;

/// Host capability that exempts a socket from VPN interception.
///
/// Implementations are called with a freshly created, unconnected socket and
/// must not close or retain the descriptor.
pub trait SocketProtector: Send + Sync {
    fn protect(&self, fd: RawFd) -> bool;
}

impl<F> SocketProtector for F
where
    F: Fn(RawFd) -> bool + Send + Sync,
{
    fn protect(&self, fd: RawFd) -> bool {
        self(fd)
    }
}
