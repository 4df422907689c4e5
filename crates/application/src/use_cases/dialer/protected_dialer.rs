use crate::ports::{DialContext, ProtectedConnect, ProtectedConnection, SystemDialer};
use crate::services::{AddressResolver, ReadinessSignal};
use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tunnel_dialer_domain::{
    Destination, DialError, ResolvedEndpoint, RotationOutcome, SocketOptions,
    DEFAULT_ROTATION_THROTTLE,
};

const DEFAULT_MAX_RESOLVE_ATTEMPTS: u32 = 10;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparationOutcome {
    Ready { attempts: u32 },
    Cancelled { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Dials through protected sockets, caching the proxy server's address.
///
/// The server address given to [`prepare_target`](Self::prepare_target) is
/// resolved once; dials to it reuse the cached endpoint and rotate to the
/// next address after a failure. Every other destination is resolved fresh
/// on each dial.
pub struct ProtectedDialer {
    resolver: AddressResolver,
    connector: Arc<dyn ProtectedConnect>,
    target: ArcSwapOption<String>,
    endpoint: ArcSwapOption<ResolvedEndpoint>,
    prefer_ipv6: AtomicBool,
    readiness: ArcSwap<ReadinessSignal>,
    max_resolve_attempts: u32,
    retry_interval: Duration,
    rotation_throttle: Duration,
}

impl ProtectedDialer {
    pub fn new(resolver: AddressResolver, connector: Arc<dyn ProtectedConnect>) -> Self {
        Self {
            resolver,
            connector,
            target: ArcSwapOption::empty(),
            endpoint: ArcSwapOption::empty(),
            prefer_ipv6: AtomicBool::new(false),
            readiness: ArcSwap::from_pointee(ReadinessSignal::new()),
            max_resolve_attempts: DEFAULT_MAX_RESOLVE_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            rotation_throttle: DEFAULT_ROTATION_THROTTLE,
        }
    }

    pub fn with_retry_policy(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.max_resolve_attempts = max_attempts.max(1);
        self.retry_interval = interval;
        self
    }

    pub fn with_rotation_throttle(mut self, throttle: Duration) -> Self {
        self.rotation_throttle = throttle;
        self
    }

    /// Starts a new preparation cycle: forgets the cached endpoint and arms
    /// a fresh readiness signal.
    pub fn begin_preparation(&self) {
        self.endpoint.store(None);
        self.readiness.store(Arc::new(ReadinessSignal::new()));
    }

    pub fn readiness_signal(&self) -> Arc<ReadinessSignal> {
        self.readiness.load_full()
    }

    pub fn is_target_ready(&self) -> bool {
        self.endpoint.load().is_some()
    }

    pub fn target_address(&self) -> Option<String> {
        self.target.load().as_deref().cloned()
    }

    pub fn endpoint(&self) -> Option<Arc<ResolvedEndpoint>> {
        self.endpoint.load_full()
    }

    /// Resolves and caches the proxy server address.
    ///
    /// Failed lookups are retried until the attempt bound is reached, waiting
    /// between attempts unless `cancel` fires. Any endpoint from an earlier
    /// cycle is dropped first. The readiness signal of the current cycle
    /// fires exactly once when this returns, or if the future is dropped
    /// early.
    pub async fn prepare_target(
        &self,
        address: &str,
        cancel: &CancellationToken,
        prefer_ipv6: bool,
    ) -> PreparationOutcome {
        // A call after an earlier cycle finished starts a new cycle.
        self.endpoint.store(None);
        if self.readiness.load().is_fired() {
            self.readiness.store(Arc::new(ReadinessSignal::new()));
        }
        let _fire = FireOnDrop(self.readiness.load_full());

        info!(address, prefer_ipv6, "Preparing target");
        self.target.store(Some(Arc::new(address.to_string())));
        self.prefer_ipv6.store(prefer_ipv6, Ordering::Relaxed);

        let mut attempts = 0;
        loop {
            attempts += 1;

            match self.resolver.resolve(address, prefer_ipv6).await {
                Ok(endpoint) => {
                    let endpoint = endpoint.with_throttle(self.rotation_throttle);
                    info!(
                        host = endpoint.hostname(),
                        port = endpoint.port(),
                        ips = ?endpoint.ips(),
                        attempts,
                        "Target prepared"
                    );
                    self.endpoint.store(Some(Arc::new(endpoint)));
                    return PreparationOutcome::Ready { attempts };
                }
                Err(e) => {
                    warn!(address, attempt = attempts, error = %e, "Target resolution failed");
                }
            }

            if attempts >= self.max_resolve_attempts {
                warn!(address, attempts, "Target preparation gave up, max attempts reached");
                return PreparationOutcome::Exhausted { attempts };
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(address, attempts, "Target preparation cancelled");
                    return PreparationOutcome::Cancelled { attempts };
                }
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }

    fn is_target(&self, destination: &Destination) -> bool {
        self.target
            .load()
            .as_deref()
            .is_some_and(|target| target.as_str() == destination.net_addr())
    }

    async fn prepared_endpoint(
        &self,
        ctx: &DialContext,
        address: &str,
    ) -> Result<Arc<ResolvedEndpoint>, DialError> {
        if let Some(endpoint) = self.endpoint.load_full() {
            return Ok(endpoint);
        }

        debug!(address, "Dial pending target preparation");
        let signal = self.readiness.load_full();
        ctx.bound(address, async {
            signal.wait().await;
            Ok(())
        })
        .await?;

        // Preparation may have been cancelled or exhausted its attempts.
        self.endpoint
            .load_full()
            .ok_or_else(|| DialError::TargetPreparationFailed(address.to_string()))
    }

    async fn dial_target(
        &self,
        ctx: &DialContext,
        destination: &Destination,
        sockopt: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError> {
        let address = destination.net_addr();
        let endpoint = self.prepared_endpoint(ctx, address).await?;
        let ip = endpoint
            .current_ip()
            .ok_or_else(|| DialError::TargetPreparationFailed(address.to_string()))?;
        let target = SocketAddr::new(ip, endpoint.port()).to_string();

        let result = ctx
            .bound(
                &target,
                self.connector
                    .connect(ip, endpoint.port(), destination.network, sockopt),
            )
            .await;

        match result {
            Ok(conn) => {
                debug!(address, ip = %ip, "Using prepared address");
                Ok(conn)
            }
            Err(e) => {
                if !matches!(e, DialError::UnsupportedTransport(_)) {
                    log_rotation(address, endpoint.rotate());
                }
                Err(e)
            }
        }
    }

    async fn dial_direct(
        &self,
        ctx: &DialContext,
        destination: &Destination,
        sockopt: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError> {
        let address = destination.net_addr();
        debug!(destination = %destination, "Not using prepared address");

        let prefer_ipv6 = self.prefer_ipv6.load(Ordering::Relaxed);
        let resolved = ctx
            .bound(address, self.resolver.resolve(address, prefer_ipv6))
            .await?;
        let ip = resolved
            .ips()
            .first()
            .copied()
            .ok_or_else(|| DialError::NoAddressesFound(address.to_string()))?;
        let target = SocketAddr::new(ip, resolved.port()).to_string();

        ctx.bound(
            &target,
            self.connector
                .connect(ip, resolved.port(), destination.network, sockopt),
        )
        .await
    }
}

#[async_trait]
impl SystemDialer for ProtectedDialer {
    fn init(&self) {}

    async fn dial(
        &self,
        ctx: &DialContext,
        _source: Option<IpAddr>,
        destination: &Destination,
        sockopt: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError> {
        if self.is_target(destination) {
            self.dial_target(ctx, destination, sockopt).await
        } else {
            self.dial_direct(ctx, destination, sockopt).await
        }
    }
}

fn log_rotation(address: &str, outcome: RotationOutcome) {
    match outcome {
        RotationOutcome::Rotated { to } => info!(address, ip = %to, "Switched to next IP"),
        RotationOutcome::Throttled => debug!(address, "Switch too quickly, rotation suppressed"),
        RotationOutcome::SingleAddress => {}
    }
}

struct FireOnDrop(Arc<ReadinessSignal>);

impl Drop for FireOnDrop {
    fn drop(&mut self) {
        self.0.fire();
    }
}
