mod host_lookup;
mod protected_connect;
mod socket_protector;
mod system_dialer;

pub use host_lookup::HostLookup;
pub use protected_connect::{ProtectedConnect, ProtectedConnection};
pub use socket_protector::SocketProtector;
pub use system_dialer::{DialContext, SystemDialer};

// Re-export for convenience
pub use tunnel_dialer_domain::{Destination, DialError, Network, SocketOptions};
