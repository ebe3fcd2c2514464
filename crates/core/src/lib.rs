//! Study Goals Core - Domain entities, services, and traits.
//!
//! This crate contains the goal progress-reconciliation and lifecycle engine.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod activities;
pub mod errors;
pub mod goals;
pub mod settings;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
