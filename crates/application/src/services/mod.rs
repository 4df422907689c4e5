mod address_resolver;
mod readiness;

pub use address_resolver::{AddressResolver, DEFAULT_RESOLVE_TIMEOUT};
pub use readiness::ReadinessSignal;
