mod dial;
mod resolve;

pub use dial::{run_dial, DialArgs};
pub use resolve::run_resolve;
