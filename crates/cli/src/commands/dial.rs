use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tunnel_dialer_application::ports::{DialContext, SystemDialer};
use tunnel_dialer_application::use_cases::PreparationOutcome;
use tunnel_dialer_domain::{Destination, DialerConfig, Network, SocketOptions};

use crate::di;

pub struct DialArgs<'a> {
    pub address: &'a str,
    pub network: Network,
    pub attempts: u32,
}

/// Prepares `address` as the protected target, then dials it up to
/// `attempts` times, stopping at the first connection.
pub async fn run_dial(
    args: DialArgs<'_>,
    config: &DialerConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let dialer = di::build_dialer(config);
    dialer.init();

    match dialer
        .prepare_target(args.address, &cancel, config.prefer_ipv6)
        .await
    {
        PreparationOutcome::Ready { attempts } => {
            info!(address = args.address, attempts, "Target ready");
        }
        PreparationOutcome::Cancelled { .. } => {
            anyhow::bail!("Preparation of {} cancelled", args.address);
        }
        PreparationOutcome::Exhausted { attempts } => {
            anyhow::bail!(
                "Could not resolve {} after {} attempts",
                args.address,
                attempts
            );
        }
    }

    let destination = Destination::new(args.network, args.address);
    let options = SocketOptions {
        mark: None,
        tcp_nodelay: args.network == Network::Tcp,
    };

    let mut last_error = None;
    for attempt in 1..=args.attempts {
        let ctx = DialContext::new()
            .with_timeout(config.connect_timeout())
            .with_cancellation(cancel.clone());

        match dialer.dial(&ctx, None, &destination, Some(&options)).await {
            Ok(conn) => {
                println!(
                    "{} connected {} -> {}",
                    conn.network(),
                    conn.local_addr()?,
                    conn.peer_addr()?
                );
                return Ok(());
            }
            Err(e) if e.is_retryable() && !cancel.is_cancelled() => {
                warn!(attempt, error = %e, "Dial failed");
                last_error = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    match last_error {
        Some(e) => Err(anyhow::anyhow!("All {} dial attempts failed: {}", args.attempts, e)),
        None => anyhow::bail!("No dial attempts made"),
    }
}
