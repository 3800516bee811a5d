/// Persistence tests against an in-memory SQLite database
pub mod store_tests;
