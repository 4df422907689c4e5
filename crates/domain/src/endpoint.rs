use crate::DialError;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_ROTATION_THROTTLE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    SingleAddress,
    Throttled,
    Rotated { to: IpAddr },
}

#[derive(Debug, Default)]
struct RotationState {
    cursor: usize,
    last_rotation: Option<Instant>,
}

/// A resolved proxy server address with a round-robin failover cursor.
///
/// The address list is fixed at construction; only the cursor and the time
/// of the last rotation change, both behind one lock. Concurrent connect
/// failures race on that lock, so a burst may advance the cursor more or
/// fewer times than there were failures.
#[derive(Debug)]
pub struct ResolvedEndpoint {
    hostname: Arc<str>,
    ips: Arc<[IpAddr]>,
    port: u16,
    throttle: Duration,
    state: Mutex<RotationState>,
}

impl ResolvedEndpoint {
    pub fn new(hostname: &str, ips: Vec<IpAddr>, port: u16) -> Result<Self, DialError> {
        if ips.is_empty() {
            return Err(DialError::NoAddressesFound(format!("{}:{}", hostname, port)));
        }

        Ok(Self {
            hostname: Arc::from(hostname),
            ips: Arc::from(ips),
            port,
            throttle: DEFAULT_ROTATION_THROTTLE,
            state: Mutex::new(RotationState::default()),
        })
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ips(&self) -> &[IpAddr] {
        &self.ips
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn cursor(&self) -> usize {
        self.lock_state().cursor
    }

    pub fn current_ip(&self) -> Option<IpAddr> {
        let state = self.lock_state();
        self.ips.get(state.cursor).copied()
    }

    pub fn current_socket_addr(&self) -> Option<SocketAddr> {
        self.current_ip().map(|ip| SocketAddr::new(ip, self.port))
    }

    pub fn rotate(&self) -> RotationOutcome {
        self.rotate_at(Instant::now())
    }

    /// Advances the cursor as of `now`. Rotations closer together than the
    /// throttle window are suppressed.
    pub fn rotate_at(&self, now: Instant) -> RotationOutcome {
        let mut state = self.lock_state();

        if self.ips.len() <= 1 {
            return RotationOutcome::SingleAddress;
        }

        if let Some(last) = state.last_rotation {
            if now.saturating_duration_since(last) < self.throttle {
                return RotationOutcome::Throttled;
            }
        }

        state.last_rotation = Some(now);
        state.cursor = (state.cursor + 1) % self.ips.len();

        RotationOutcome::Rotated {
            to: self.ips[state.cursor],
        }
    }

    // The guarded state is two plain fields, so a panic while holding the
    // lock cannot leave it inconsistent.
    fn lock_state(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
