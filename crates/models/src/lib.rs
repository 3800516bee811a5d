//! Persistence layer: connection setup and the `states` entity.

pub mod errors;
pub mod db;
pub mod state_record;

#[cfg(test)]
mod tests;
