mod protected_dialer;

pub use protected_dialer::{PreparationOutcome, ProtectedDialer};
