//! tunnel-dialer application layer: ports, services and the dialer use case.
pub mod ports;
pub mod services;
pub mod use_cases;
