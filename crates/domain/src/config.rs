pub mod dialer;
pub mod errors;
pub mod logging;
pub mod root;

pub use dialer::DialerConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
