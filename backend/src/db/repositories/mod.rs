//! Catalog repository backends.
//!
//! - `local`: in-memory store for tests and development
//! - `postgres`: PostgreSQL via Diesel
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PostgresConfig, PostgresRepository};
