//! SQLite storage implementation for Ledgerfolio.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerfolio-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for accounts, holdings, transactions and tax lots
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//! core (domain)       server (HTTP)
//!       │                  │
//!       └────────┬─────────┘
//!                │
//!                ▼
//!        storage-sqlite (this crate)
//!                │
//!                ▼
//!            SQLite DB
//! ```
//!
//! Reads go through the r2d2 pool. Every write is serialized through a single
//! writer task (see [`db::write_actor`]) and runs inside an immediate
//! transaction.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod accounts;
pub mod holdings;
pub mod tax_lots;
pub mod transactions;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from ledgerfolio-core for convenience
pub use ledgerfolio_core::errors::{DatabaseError, Error, Result};
