use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tunnel_dialer_domain::{CliOverrides, Network};

mod bootstrap;
mod commands;
mod di;

#[derive(Parser)]
#[command(name = "tunnel-dialer")]
#[command(version)]
#[command(about = "Protected outbound dialer for VPN proxy servers")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Keep IPv6 addresses first for the server
    #[arg(long, global = true)]
    prefer_ipv6: bool,

    /// SO_MARK applied to every protected socket
    #[arg(long, global = true)]
    fwmark: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a server address and print its failover order
    Resolve {
        /// host:port, port may be a service name
        address: String,
    },
    /// Prepare a server address and open a protected connection to it
    Dial {
        address: String,

        /// Dial over UDP instead of TCP
        #[arg(long)]
        udp: bool,

        /// Number of dial attempts, each failure rotates the server address
        #[arg(long, default_value_t = 3)]
        attempts: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        prefer_ipv6: cli.prefer_ipv6,
        fwmark: cli.fwmark,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting tunnel-dialer v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Command::Resolve { address } => commands::run_resolve(&address, &config.dialer).await,
        Command::Dial {
            address,
            udp,
            attempts,
        } => {
            let args = commands::DialArgs {
                address: &address,
                network: if udp { Network::Udp } else { Network::Tcp },
                attempts,
            };
            commands::run_dial(args, &config.dialer, cancel).await
        }
    }
}
