//! # moorage-entity
//!
//! Domain entity models for Moorage: notification policies and targets,
//! audit log records, and background jobs. All persisted structs derive
//! `sqlx::FromRow` for the PostgreSQL repositories.

pub mod audit;
pub mod job;
pub mod policy;
