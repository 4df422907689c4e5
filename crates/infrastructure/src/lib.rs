//! tunnel-dialer infrastructure: OS resolver lookups, socket protection and
//! the protected connector.
pub mod system;
pub mod transport;

pub use system::{AllowAllProtector, FwmarkProtector, SystemHostLookup};
pub use transport::ProtectedConnector;
