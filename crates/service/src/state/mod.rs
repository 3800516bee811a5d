//! Per-user state: store seam, SeaORM-backed store, and the service on top.

pub mod repository;
pub mod repo;
pub mod service;

pub use repository::StateStore;
pub use repo::seaorm::SeaOrmStateStore;
pub use service::StateService;
