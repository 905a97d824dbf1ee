//! Slack message format.

use serde_json::json;

use moorage_core::result::AppResult;

use crate::model::HookEvent;

use super::{Formatter, HookHeaders, content_type};

/// Renders a Slack message: the envelope fields as mrkdwn, the event data
/// pretty-printed inside a code block.
pub struct SlackFormatter;

impl Formatter for SlackFormatter {
    fn format(&self, event: &HookEvent) -> AppResult<(HookHeaders, Vec<u8>)> {
        let event_data = match &event.payload.event_data {
            Some(data) => serde_json::to_string_pretty(data)?,
            None => String::new(),
        };
        let text = format!(
            "*type:* {}\n*occur_at:* {}\n*operator:* {}\n*event_data:*\n```{}```",
            event.payload.kind, event.payload.occur_at, event.payload.operator, event_data
        );

        let message = json!({
            "text": "Moorage webhook event",
            "blocks": [{
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": text,
                },
            }],
        });

        let body = serde_json::to_vec(&message)?;
        Ok((content_type("application/json"), body))
    }
}
