//! # moorage-notifier
//!
//! Webhook notification pipeline: matches events against per-project
//! notification policies, renders the payload in the target's wire format
//! (Default, CloudEvents, CDEvents, Slack, Teams), and submits delivery
//! jobs to the job queue.

pub mod dispatcher;
pub mod formatter;
pub mod jobs;
pub mod lookup;
pub mod model;
pub mod policy;
pub mod project;
pub mod replication;
pub mod scan;

pub use dispatcher::WebhookHandler;
pub use jobs::{HookSender, QueueHookSender};
pub use lookup::{DatabaseProjectLookup, DatabaseReplicationLookup, DatabaseScanReportLookup};
pub use model::{HookEvent, Payload};
pub use policy::PolicyService;
