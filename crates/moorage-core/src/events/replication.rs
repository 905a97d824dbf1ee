//! Replication domain events.

use serde::{Deserialize, Serialize};

/// A replication run changed status.
///
/// The event carries only the task id; the webhook dispatcher resolves the
/// task into its execution, policy, and registries when building a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationEvent {
    /// The replication task id.
    pub task_id: i64,
    /// The final task status (`"Succeed"`, `"Failed"`, `"Stopped"`).
    pub status: String,
}
