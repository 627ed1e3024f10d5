/// Database module for PostgreSQL/TimescaleDB integration
///
/// This module provides:
/// - Connection pooling and embedded migrations
/// - Repository traits with diesel and in-memory implementations
/// - Database models and schema

pub mod connection;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{establish_connection_pool, run_blocking, DatabaseError, DatabasePool};
pub use memory::{InMemorySettingsRepository, InMemoryTickRepository};
