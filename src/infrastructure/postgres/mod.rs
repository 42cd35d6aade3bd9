//! PostgreSQL persistence module.
//!
//! Provides connection pooling for the PostgreSQL template store.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
