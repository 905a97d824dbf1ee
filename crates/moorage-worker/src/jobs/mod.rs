//! Built-in job handlers.
//!
//! - [`delivery`] — webhook/Slack/Teams hook delivery over HTTP
//! - [`purge`] — scheduled audit-log purge

pub mod delivery;
pub mod purge;

pub use delivery::DeliveryJobHandler;
pub use purge::{AUDIT_PURGE_JOB, AuditPurgeJobHandler};
