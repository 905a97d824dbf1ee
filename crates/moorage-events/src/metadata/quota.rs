//! Quota threshold resolver.

use moorage_core::error::AppError;
use moorage_core::events::topic;
use moorage_core::events::{Event, EventData, QuotaEvent};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A project quota threshold was crossed. Level 1 means the hard limit was
/// exceeded; level 2 means the warning threshold was crossed.
#[derive(Debug, Clone)]
pub struct QuotaMetadata {
    /// Threshold level, 1 or 2.
    pub level: u8,
    /// The project whose quota was affected.
    pub project_id: i64,
    /// The project name.
    pub project_name: String,
    /// Full repository name of the violating operation, if any.
    pub repository: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Metadata for QuotaMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        let topic = match self.level {
            1 => topic::QUOTA_EXCEED,
            2 => topic::QUOTA_WARNING,
            other => {
                return Err(AppError::validation(format!(
                    "unsupported quota level {other}"
                )));
            }
        };
        Ok(envelope(
            ctx,
            topic,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::Quota(QuotaEvent {
                project_id: self.project_id,
                project_name: self.project_name.clone(),
                repository: self.repository.clone(),
                message: self.message.clone(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::test_support::TestContext;

    use moorage_core::context::RequestContext;
    use moorage_core::error::ErrorKind;

    fn metadata(level: u8) -> QuotaMetadata {
        QuotaMetadata {
            level,
            project_id: 1,
            project_name: "library".into(),
            repository: "library/hello-world".into(),
            message: "quota exceeded".into(),
        }
    }

    #[test]
    fn level_maps_to_topic() {
        let ctx = TestContext::new(RequestContext::new("admin"));
        assert_eq!(
            metadata(1).resolve(&ctx.resolve_ctx()).unwrap().topic,
            topic::QUOTA_EXCEED
        );
        assert_eq!(
            metadata(2).resolve(&ctx.resolve_ctx()).unwrap().topic,
            topic::QUOTA_WARNING
        );
    }

    #[test]
    fn unknown_level_is_rejected() {
        let ctx = TestContext::new(RequestContext::anonymous());
        let err = metadata(3).resolve(&ctx.resolve_ctx()).unwrap_err();
        assert!(err.is_kind(ErrorKind::Validation));
    }
}
