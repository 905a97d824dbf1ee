//! Audit logging for Moorage.
//!
//! Domain events that describe auditable operations are turned into rows
//! of the `audit_log_ext` table by the [`handler::AuditHandler`], mirrored
//! to an optional syslog-over-TCP endpoint, and aged out by the
//! [`purge::PurgeService`]. Generic mutating HTTP operations (users,
//! configuration, login) are captured by the [`common`] resolver
//! framework.

pub mod common;
pub mod forward;
pub mod handler;
pub mod purge;

pub use forward::{AuditForwarder, SyslogForwarder};
pub use handler::{AUDIT_TOPICS, AuditHandler, AuditStore, DatabaseAuditStore};
pub use purge::{PurgeParams, PurgeService};
