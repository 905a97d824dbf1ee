//! Payload formatters.
//!
//! A formatter renders a [`HookEvent`] into delivery headers and a body.
//! Every formatter sets `Content-Type`; the dispatcher appends the
//! target's `Authorization` header afterwards.

pub mod cdevents;
pub mod cloudevents;
pub mod default;
pub mod slack;
pub mod teams;

use std::collections::HashMap;
use std::sync::Arc;

use moorage_core::error::AppError;
use moorage_core::result::AppResult;

use crate::model::HookEvent;

pub use cdevents::CdEventsFormatter;
pub use cloudevents::CloudEventsFormatter;
pub use default::DefaultFormatter;
pub use slack::SlackFormatter;
pub use teams::TeamsFormatter;

/// Delivery headers, serialized into the job parameters as a JSON
/// `map<string, [string]>`.
pub type HookHeaders = HashMap<String, Vec<String>>;

/// Build a header map carrying only `Content-Type`.
pub(crate) fn content_type(value: &str) -> HookHeaders {
    HookHeaders::from([("Content-Type".to_string(), vec![value.to_string()])])
}

/// A wire-protocol renderer for webhook payloads.
pub trait Formatter: Send + Sync {
    /// Render the event into `(headers, body)`.
    fn format(&self, event: &HookEvent) -> AppResult<(HookHeaders, Vec<u8>)>;
}

/// Lookup table of formatters by name, initialized once at startup.
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    /// Create a registry with every built-in formatter. The default
    /// format is also registered under the empty string for backward
    /// compatibility.
    pub fn with_defaults() -> Self {
        let mut formatters: HashMap<String, Arc<dyn Formatter>> = HashMap::new();
        let default: Arc<dyn Formatter> = Arc::new(DefaultFormatter);
        formatters.insert(String::new(), Arc::clone(&default));
        formatters.insert("Default".to_string(), default);
        formatters.insert("CloudEvents".to_string(), Arc::new(CloudEventsFormatter));
        formatters.insert("CDEvents".to_string(), Arc::new(CdEventsFormatter));
        formatters.insert("Slack".to_string(), Arc::new(SlackFormatter));
        formatters.insert("Teams".to_string(), Arc::new(TeamsFormatter));
        Self { formatters }
    }

    /// Look up a formatter by name.
    pub fn get(&self, name: &str) -> AppResult<Arc<dyn Formatter>> {
        self.formatters
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::validation(format!("unknown payload format '{name}'")))
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use moorage_entity::policy::target::{PayloadFormat, Target, TargetType};

    use crate::model::{EventPayloadData, HookEvent, Payload, Repository, Resource};

    pub fn push_hook_event() -> HookEvent {
        HookEvent {
            policy_id: 3,
            project_id: 1,
            event_type: "PUSH_ARTIFACT".to_string(),
            target: Target {
                target_type: TargetType::Http,
                address: "http://sink/hook".to_string(),
                auth_header: None,
                skip_cert_verify: false,
                payload_format: PayloadFormat::Default,
            },
            payload: Payload {
                kind: "PUSH_ARTIFACT".to_string(),
                occur_at: 1_678_082_923,
                operator: "admin".to_string(),
                event_data: Some(EventPayloadData {
                    resources: vec![Resource {
                        digest: Some("sha256:abc".to_string()),
                        tag: Some("v1.0".to_string()),
                        resource_url: "registry.example.com/library/hello-world:v1.0"
                            .to_string(),
                        scan_overview: None,
                    }],
                    repository: Some(Repository {
                        date_created: None,
                        name: "hello-world".to_string(),
                        namespace: "library".to_string(),
                        repo_full_name: "library/hello-world".to_string(),
                        repo_type: "public".to_string(),
                    }),
                    ..EventPayloadData::default()
                }),
            },
            request_id: Some("req-1".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorage_core::error::ErrorKind;

    #[test]
    fn empty_string_resolves_to_the_default_formatter() {
        let registry = FormatterRegistry::with_defaults();
        assert!(registry.get("").is_ok());
        assert!(registry.get("Default").is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let registry = FormatterRegistry::with_defaults();
        match registry.get("XML") {
            Ok(_) => panic!("lookup of an unknown format should fail"),
            Err(err) => assert!(err.is_kind(ErrorKind::Validation)),
        }
    }
}
