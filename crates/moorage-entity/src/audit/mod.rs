//! Audit log entities.

pub mod model;

pub use model::{AuditRecord, CreateAuditRecord, MAX_USERNAME_LEN, truncate_username};
