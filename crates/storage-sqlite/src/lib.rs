//! SQLite storage implementation for Fundfolio.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the storage traits defined in
//! `fundfolio-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The price-cache repository
//! - Database-specific model types (with Diesel derives)
//!
//! This is the only crate in the workspace where Diesel dependencies exist;
//! `core` is database-agnostic and works with traits.

pub mod db;
pub mod errors;
pub mod schema;

pub mod prices;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};
pub use prices::PriceRepository;

// Re-export from fundfolio-core for convenience
pub use fundfolio_core::errors::{DatabaseError, Error, Result};
