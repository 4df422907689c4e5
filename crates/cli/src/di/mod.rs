mod dialer;

pub use dialer::build_dialer;
