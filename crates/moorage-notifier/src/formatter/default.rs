//! The native JSON payload format.

use moorage_core::result::AppResult;

use crate::model::HookEvent;

use super::{Formatter, HookHeaders, content_type};

/// Renders the payload as plain `application/json`.
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, event: &HookEvent) -> AppResult<(HookHeaders, Vec<u8>)> {
        let body = serde_json::to_vec(&event.payload)?;
        Ok((content_type("application/json"), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::test_support::push_hook_event;

    #[test]
    fn body_is_the_payload_json() {
        let event = push_hook_event();
        let (headers, body) = DefaultFormatter.format(&event).unwrap();
        assert_eq!(
            headers.get("Content-Type"),
            Some(&vec!["application/json".to_string()])
        );

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["type"], "PUSH_ARTIFACT");
        assert_eq!(json["occur_at"], 1_678_082_923);
        assert_eq!(json["operator"], "admin");
        assert_eq!(
            json["event_data"]["repository"]["repo_full_name"],
            "library/hello-world"
        );
        assert_eq!(json["event_data"]["repository"]["repo_type"], "public");
        let resource = &json["event_data"]["resources"][0];
        assert_eq!(resource["digest"], "sha256:abc");
        assert_eq!(resource["tag"], "v1.0");
        // Wire contract: the field exists even when there is no report.
        assert!(resource["scan_overview"].is_null());
        assert!(resource.get("scan_overview").is_some());
    }
}
