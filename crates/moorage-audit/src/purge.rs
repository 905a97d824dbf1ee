//! Audit log purge.

use chrono::{Duration, Utc};
use tracing::{info, warn};

use moorage_core::config::audit::AuditConfig;
use moorage_core::result::AppResult;
use moorage_database::repositories::audit::AuditRepository;

/// Event types that may be named in a purge request. Anything else is
/// silently dropped, so the deletion predicate can only ever contain
/// known values.
pub const PURGE_ALLOWED_EVENT_TYPES: &[&str] = &[
    "create_artifact",
    "delete_artifact",
    "pull_artifact",
    "create_project",
    "delete_project",
    "delete_repository",
    "login_user",
    "logout_user",
    "create_user",
    "delete_user",
    "update_user",
    "create_robot",
    "delete_robot",
    "update_configure",
];

/// The expansion of the `other` catch-all: auditable event types that are
/// not individually selectable.
pub const OTHER_EVENT_TYPES: &[&str] = &["create_tag", "delete_tag", "update_configuration"];

/// Parameters of one purge run.
#[derive(Debug, Clone)]
pub struct PurgeParams {
    /// Delete records older than this many hours. Zero and negative
    /// values disable the run.
    pub retention_hours: i64,
    /// Event types to purge; filtered through the allow-list. `"other"`
    /// expands to [`OTHER_EVENT_TYPES`].
    pub include_event_types: Vec<String>,
    /// Count candidates without deleting.
    pub dry_run: bool,
}

/// Filter requested event types through the allow-list, expanding the
/// `other` catch-all. Unknown values are dropped.
pub fn filter_event_types(requested: &[String]) -> Vec<String> {
    let mut filtered = Vec::new();
    for event_type in requested {
        if event_type == "other" {
            for other in OTHER_EVENT_TYPES {
                if !filtered.iter().any(|t| t == other) {
                    filtered.push((*other).to_string());
                }
            }
        } else if PURGE_ALLOWED_EVENT_TYPES.contains(&event_type.as_str())
            && !filtered.contains(event_type)
        {
            filtered.push(event_type.clone());
        }
    }
    filtered
}

/// Bulk deletion of audit records older than a retention window.
pub struct PurgeService {
    records: AuditRepository,
    max_retention_hours: i64,
}

impl PurgeService {
    /// Create a purge service.
    pub fn new(records: AuditRepository, config: &AuditConfig) -> Self {
        Self {
            records,
            max_retention_hours: config.max_retention_hours,
        }
    }

    /// Run one purge. Returns the number of affected (or, on dry run,
    /// matching) records.
    pub async fn purge(&self, params: &PurgeParams) -> AppResult<u64> {
        let Some(hours) = effective_retention_hours(params.retention_hours, self.max_retention_hours)
        else {
            info!(
                retention_hours = params.retention_hours,
                "Audit purge disabled by retention setting"
            );
            return Ok(0);
        };
        let event_types = filter_event_types(&params.include_event_types);
        if event_types.is_empty() {
            warn!("Audit purge requested with no purgeable event types");
            return Ok(0);
        }

        let cutoff = Utc::now() - Duration::hours(hours);
        let affected = if params.dry_run {
            self.records.count_purge_candidates(cutoff, &event_types).await?
        } else {
            self.records.purge(cutoff, &event_types).await?
        };
        info!(
            retention_hours = hours,
            dry_run = params.dry_run,
            affected,
            "Audit purge finished"
        );
        Ok(affected)
    }
}

/// The retention window actually applied: `None` disables the run,
/// anything above the cap is clamped. Every non-positive value disables:
/// a negative window would put the cutoff in the future and match the
/// entire table.
fn effective_retention_hours(requested: i64, max: i64) -> Option<i64> {
    if requested <= 0 {
        return None;
    }
    Some(requested.min(max))
}
