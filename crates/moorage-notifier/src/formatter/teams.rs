//! Microsoft Teams message format.

use serde_json::json;

use moorage_core::result::AppResult;

use crate::model::HookEvent;

use super::{Formatter, HookHeaders, content_type};

/// Renders a Teams message carrying an AdaptiveCard with the event data
/// pretty-printed in a text block.
pub struct TeamsFormatter;

impl Formatter for TeamsFormatter {
    fn format(&self, event: &HookEvent) -> AppResult<(HookHeaders, Vec<u8>)> {
        let event_data = match &event.payload.event_data {
            Some(data) => serde_json::to_string_pretty(data)?,
            None => String::new(),
        };
        let summary = format!(
            "type: {}\noccur_at: {}\noperator: {}",
            event.payload.kind, event.payload.occur_at, event.payload.operator
        );

        let message = json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "content": {
                    "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                    "type": "AdaptiveCard",
                    "version": "1.2",
                    "body": [
                        {
                            "type": "TextBlock",
                            "size": "Medium",
                            "weight": "Bolder",
                            "text": "Moorage webhook event",
                        },
                        {
                            "type": "TextBlock",
                            "text": summary,
                            "wrap": true,
                        },
                        {
                            "type": "TextBlock",
                            "text": event_data,
                            "wrap": true,
                            "fontType": "Monospace",
                        },
                    ],
                },
            }],
        });

        let body = serde_json::to_vec(&message)?;
        Ok((content_type("application/json"), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::test_support::push_hook_event;

    #[test]
    fn message_carries_an_adaptive_card() {
        let event = push_hook_event();
        let (_, body) = TeamsFormatter.format(&event).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let card = &json["attachments"][0];
        assert_eq!(
            card["contentType"],
            "application/vnd.microsoft.card.adaptive"
        );
        assert_eq!(card["content"]["type"], "AdaptiveCard");
        let text = card["content"]["body"][1]["text"].as_str().unwrap();
        assert!(text.contains("type: PUSH_ARTIFACT"));
    }
}
