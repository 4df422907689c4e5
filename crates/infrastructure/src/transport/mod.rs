pub mod protected;

pub use protected::ProtectedConnector;
