pub mod dialer;

pub use dialer::{PreparationOutcome, ProtectedDialer};
