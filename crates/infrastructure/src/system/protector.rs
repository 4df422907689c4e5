use std::io;
use std::os::fd::RawFd;
use tracing::{debug, warn};
use tunnel_dialer_application::ports::SocketProtector;

/// Approves every socket. For hosts without traffic interception.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllProtector;

impl SocketProtector for AllowAllProtector {
    fn protect(&self, _fd: RawFd) -> bool {
        true
    }
}

/// Exempts sockets by tagging them with a firewall mark that policy routing
/// sends around the tunnel. Needs `CAP_NET_ADMIN`.
#[derive(Debug, Clone, Copy)]
pub struct FwmarkProtector {
    mark: u32,
}

impl FwmarkProtector {
    pub fn new(mark: u32) -> Self {
        Self { mark }
    }

    pub fn mark(&self) -> u32 {
        self.mark
    }
}

impl SocketProtector for FwmarkProtector {
    fn protect(&self, fd: RawFd) -> bool {
        match set_socket_mark(fd, self.mark) {
            Ok(()) => {
                debug!(fd, mark = self.mark, "Socket marked");
                true
            }
            Err(e) => {
                warn!(fd, mark = self.mark, error = %e, "Failed to mark socket");
                false
            }
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn set_socket_mark(fd: RawFd, mark: u32) -> io::Result<()> {
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_MARK,
            &mark as *const u32 as *const libc::c_void,
            std::mem::size_of::<u32>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn set_socket_mark(_fd: RawFd, _mark: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "SO_MARK is only available on Linux",
    ))
}
