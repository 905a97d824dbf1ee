//! # moorage-database
//!
//! PostgreSQL database connection management and concrete repository
//! implementations for the Moorage notification core: notification
//! policies, audit records, and background jobs.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
