use async_trait::async_trait;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tunnel_dialer_domain::{Destination, DialError, SocketOptions};

use super::ProtectedConnection;

/// Deadline and cancellation carried by one dial call.
#[derive(Debug, Clone, Default)]
pub struct DialContext {
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl DialContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline measured from now. A timeout too large to represent leaves
    /// the dial unbounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Runs `fut` until it completes, the deadline passes, or the context is
    /// cancelled, whichever comes first.
    pub async fn bound<T, F>(&self, target: &str, fut: F) -> Result<T, DialError>
    where
        F: Future<Output = Result<T, DialError>>,
    {
        let deadline_bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| DialError::DialTimeout(target.to_string()))?,
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(DialError::Cancelled(target.to_string())),
            result = deadline_bounded => result,
        }
    }
}

/// Connection-opening contract expected by the proxy engine.
#[async_trait]
pub trait SystemDialer: Send + Sync {
    fn init(&self);

    async fn dial(
        &self,
        ctx: &DialContext,
        source: Option<IpAddr>,
        destination: &Destination,
        sockopt: Option<&SocketOptions>,
    ) -> Result<ProtectedConnection, DialError>;
}
