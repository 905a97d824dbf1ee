//! # moorage-core
//!
//! Core crate for the Moorage registry service. Contains the unified error
//! system, configuration schemas, runtime-tunable settings, the request
//! context, and the domain event model (topics and event data variants).
//!
//! This crate has **no** internal dependencies on other Moorage crates.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod result;
pub mod settings;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
