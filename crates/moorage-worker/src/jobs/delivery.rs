//! Hook delivery job handler.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use moorage_core::error::AppError;
use moorage_entity::job::model::Job;

use crate::executor::{JobExecutionError, JobHandler};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers one rendered hook payload with an HTTP POST.
///
/// One instance per job name; `WEBHOOK`, `SLACK`, and `TEAMS` share the
/// implementation since the payload was already rendered by the
/// dispatcher. Targets with `skip_cert_verify` use a separate client that
/// accepts invalid certificates.
pub struct DeliveryJobHandler {
    name: &'static str,
    client: reqwest::Client,
    insecure_client: reqwest::Client,
}

impl DeliveryJobHandler {
    /// Handler for plain webhook targets.
    pub fn webhook() -> Result<Self, AppError> {
        Self::new("WEBHOOK")
    }

    /// Handler for Slack targets.
    pub fn slack() -> Result<Self, AppError> {
        Self::new("SLACK")
    }

    /// Handler for Teams targets.
    pub fn teams() -> Result<Self, AppError> {
        Self::new("TEAMS")
    }

    fn new(name: &'static str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        let insecure_client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            name,
            client,
            insecure_client,
        })
    }
}

#[async_trait]
impl JobHandler for DeliveryJobHandler {
    fn job_name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let params = &*job.parameters;
        let headers = parse_headers(&params.header)?;
        let client = if params.skip_cert_verify {
            &self.insecure_client
        } else {
            &self.client
        };

        let response = client
            .post(&params.address)
            .headers(headers)
            .body(params.payload.clone())
            .send()
            .await
            .map_err(|e| JobExecutionError::Transient(format!("delivery failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobExecutionError::Transient(format!(
                "target answered {status}"
            )));
        }
        tracing::info!(job_id = %job.id, address = %params.address, %status, "Hook delivered");
        Ok(())
    }
}

/// Parse the JSON-encoded `name -> [values]` header map of a delivery
/// job. Malformed headers are a permanent failure since a retry cannot
/// fix the stored job.
fn parse_headers(encoded: &str) -> Result<HeaderMap, JobExecutionError> {
    if encoded.is_empty() {
        return Ok(HeaderMap::new());
    }
    let parsed: HashMap<String, Vec<String>> = serde_json::from_str(encoded)
        .map_err(|e| JobExecutionError::Permanent(format!("invalid header map: {e}")))?;

    let mut headers = HeaderMap::new();
    for (name, values) in parsed {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| JobExecutionError::Permanent(format!("invalid header name: {e}")))?;
        for value in values {
            let value = HeaderValue::from_str(&value)
                .map_err(|e| JobExecutionError::Permanent(format!("invalid header value: {e}")))?;
            headers.append(name.clone(), value);
        }
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_is_decoded() {
        let headers = parse_headers(
            r#"{"Content-Type":["application/json"],"Authorization":["Bearer x"]}"#,
        )
        .unwrap();
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(headers.get("Authorization").unwrap(), "Bearer x");
    }

    #[test]
    fn empty_header_string_means_no_headers() {
        assert!(parse_headers("").unwrap().is_empty());
    }

    #[test]
    fn malformed_headers_are_permanent_failures() {
        assert!(matches!(
            parse_headers("not json"),
            Err(JobExecutionError::Permanent(_))
        ));
    }
}
