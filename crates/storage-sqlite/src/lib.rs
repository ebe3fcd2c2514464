//! SQLite storage implementation for the study goals engine.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `studygoals-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The goal repository and the activity log reader
//! - Database-specific model types (with Diesel derives)
//!
//! ```text
//!          studygoals-core (domain)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod activities;
pub mod goals;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from studygoals-core for convenience
pub use studygoals_core::errors::{DatabaseError, Error, Result};

pub use activities::ActivityLogRepository;
pub use goals::GoalRepository;
