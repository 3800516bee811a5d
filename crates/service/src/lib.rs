//! Service layer mediating between the HTTP façade and the persistence layer.
//! - Owns validation and (de)serialization policy for per-user state.
//! - Talks to storage only through the `StateStore` trait.

pub mod errors;
pub mod state;
#[cfg(test)]
pub mod test_support;
