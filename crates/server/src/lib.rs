pub mod routes;
pub mod startup;
pub mod errors;

pub use startup::{serve, shutdown_signal};
