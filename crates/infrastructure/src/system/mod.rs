pub mod host_lookup;
pub mod protector;

pub use host_lookup::SystemHostLookup;
pub use protector::{set_socket_mark, AllowAllProtector, FwmarkProtector};
