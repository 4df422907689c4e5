//! tunnel-dialer domain layer
pub mod address_order;
pub mod config;
pub mod destination;
pub mod endpoint;
pub mod errors;
pub mod host_port;

pub use address_order::{is_ipv4_like, order_by_family};
pub use config::{CliOverrides, Config, ConfigError, DialerConfig, LoggingConfig};
pub use destination::{Destination, Network, SocketOptions};
pub use endpoint::{ResolvedEndpoint, RotationOutcome, DEFAULT_ROTATION_THROTTLE};
pub use errors::DialError;
pub use host_port::split_host_port;
