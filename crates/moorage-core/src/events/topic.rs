//! Well-known topic names.
//!
//! Topics are a closed set known at startup. Consumers subscribe by name,
//! so adding a topic is backward-compatible while renaming or removing one
//! is a breaking change.

/// An artifact was pushed.
pub const PUSH_ARTIFACT: &str = "PUSH_ARTIFACT";
/// An artifact was pulled.
pub const PULL_ARTIFACT: &str = "PULL_ARTIFACT";
/// An artifact was deleted.
pub const DELETE_ARTIFACT: &str = "DELETE_ARTIFACT";
/// A tag was created.
pub const CREATE_TAG: &str = "CREATE_TAG";
/// A tag was deleted.
pub const DELETE_TAG: &str = "DELETE_TAG";
/// A label was attached to an artifact.
pub const ARTIFACT_LABELED: &str = "ARTIFACT_LABELED";
/// A project was created.
pub const CREATE_PROJECT: &str = "CREATE_PROJECT";
/// A project was deleted.
pub const DELETE_PROJECT: &str = "DELETE_PROJECT";
/// A repository was deleted.
pub const DELETE_REPOSITORY: &str = "DELETE_REPOSITORY";
/// A vulnerability scan finished successfully.
pub const SCANNING_COMPLETED: &str = "SCANNING_COMPLETED";
/// A vulnerability scan was stopped.
pub const SCANNING_STOPPED: &str = "SCANNING_STOPPED";
/// A vulnerability scan failed.
pub const SCANNING_FAILED: &str = "SCANNING_FAILED";
/// A project quota was exceeded.
pub const QUOTA_EXCEED: &str = "QUOTA_EXCEED";
/// A project quota crossed the warning threshold.
pub const QUOTA_WARNING: &str = "QUOTA_WARNING";
/// A replication run changed status.
pub const REPLICATION: &str = "REPLICATION";
/// A tag retention run finished.
pub const TAG_RETENTION: &str = "TAG_RETENTION";
/// A chart was uploaded.
pub const UPLOAD_CHART: &str = "UPLOAD_CHART";
/// A chart was downloaded.
pub const DOWNLOAD_CHART: &str = "DOWNLOAD_CHART";
/// A chart was deleted.
pub const DELETE_CHART: &str = "DELETE_CHART";
/// A robot account was created.
pub const CREATE_ROBOT: &str = "CREATE_ROBOT";
/// A robot account was deleted.
pub const DELETE_ROBOT: &str = "DELETE_ROBOT";
/// A role binding was created.
pub const CREATE_ROLE: &str = "CREATE_ROLE";
/// A role binding was deleted.
pub const DELETE_ROLE: &str = "DELETE_ROLE";
/// A generic audited HTTP operation.
pub const COMMON_EVENT: &str = "COMMON_EVENT";

/// All topics, in declaration order.
pub const ALL: &[&str] = &[
    PUSH_ARTIFACT,
    PULL_ARTIFACT,
    DELETE_ARTIFACT,
    CREATE_TAG,
    DELETE_TAG,
    ARTIFACT_LABELED,
    CREATE_PROJECT,
    DELETE_PROJECT,
    DELETE_REPOSITORY,
    SCANNING_COMPLETED,
    SCANNING_STOPPED,
    SCANNING_FAILED,
    QUOTA_EXCEED,
    QUOTA_WARNING,
    REPLICATION,
    TAG_RETENTION,
    UPLOAD_CHART,
    DOWNLOAD_CHART,
    DELETE_CHART,
    CREATE_ROBOT,
    DELETE_ROBOT,
    CREATE_ROLE,
    DELETE_ROLE,
    COMMON_EVENT,
];

/// Check whether a topic name belongs to the closed set.
pub fn is_known(topic: &str) -> bool {
    ALL.contains(&topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_topics() {
        assert!(is_known(PUSH_ARTIFACT));
        assert!(is_known(COMMON_EVENT));
        assert!(!is_known("push_artifact"));
        assert!(!is_known(""));
    }
}
