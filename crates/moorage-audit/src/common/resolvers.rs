//! Built-in common-event resolvers: users, configuration, login, logout.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use regex::Regex;

use moorage_core::context::RequestContext;
use moorage_core::error::AppError;
use moorage_core::result::AppResult;

use super::registry::{CommonEventResolver, ResolverRegistry, ResourceNameLookup};

/// Maximum captured configuration payload, in bytes.
const MAX_CONFIGURATION_PAYLOAD_BYTES: usize = 450;

/// Build a registry with the built-in resolvers registered. User-id
/// resolution goes through the given lookup.
pub fn default_registry(users: Arc<dyn ResourceNameLookup>) -> AppResult<ResolverRegistry> {
    let registry = ResolverRegistry::new();
    registry.register(Arc::new(UserResolver::new(users)?));
    registry.register(Arc::new(ConfigurationResolver::new()?));
    registry.register(Arc::new(LoginResolver::new()?));
    registry.register(Arc::new(LogoutResolver::new()?));
    Ok(registry)
}

fn pattern(re: &str) -> AppResult<Regex> {
    Regex::new(re)
        .map_err(|e| AppError::with_source(moorage_core::error::ErrorKind::Configuration, "invalid resolver URL pattern", e))
}

/// Audits create/update/delete of user accounts.
pub struct UserResolver {
    pattern: Regex,
    users: Arc<dyn ResourceNameLookup>,
}

impl UserResolver {
    /// Create a user resolver backed by the given name lookup.
    pub fn new(users: Arc<dyn ResourceNameLookup>) -> AppResult<Self> {
        Ok(Self {
            pattern: pattern(r"^/api/v1/users(?:/(\d+))?/?$")?,
            users,
        })
    }
}

#[async_trait]
impl CommonEventResolver for UserResolver {
    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn url_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn should_resolve_name(&self) -> bool {
        true
    }

    async fn id_to_name(&self, id: i64) -> AppResult<Option<String>> {
        self.users.name_of(id).await
    }
}

/// Audits configuration updates. The captured payload is capped so a
/// large settings blob cannot bloat the audit row.
pub struct ConfigurationResolver {
    pattern: Regex,
}

impl ConfigurationResolver {
    /// Create a configuration resolver.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            pattern: pattern(r"^/api/v1/configurations/?$")?,
        })
    }
}

#[async_trait]
impl CommonEventResolver for ConfigurationResolver {
    fn resource_type(&self) -> &'static str {
        "configuration"
    }

    fn url_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn operation_for(&self, method: &Method) -> Option<&'static str> {
        (*method == Method::PUT).then_some("update")
    }

    fn payload(&self, body: &str) -> String {
        truncate_bytes(
            super::redact::redact(body, &self.sensitive_attributes()),
            MAX_CONFIGURATION_PAYLOAD_BYTES,
        )
    }
}

/// Audits form logins. The operator comes from the request body since the
/// request is not yet authenticated.
pub struct LoginResolver {
    pattern: Regex,
}

impl LoginResolver {
    /// Create a login resolver.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            pattern: pattern(r"^/c/login/?$")?,
        })
    }
}

#[async_trait]
impl CommonEventResolver for LoginResolver {
    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn url_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn operation_for(&self, method: &Method) -> Option<&'static str> {
        (*method == Method::POST).then_some("login")
    }

    fn operator(&self, _ctx: &RequestContext, body: &str) -> String {
        principal_from_form(body).unwrap_or_default()
    }

    fn resource_name_hint(&self, ctx: &RequestContext, body: &str) -> Option<String> {
        Some(self.operator(ctx, body))
    }
}

/// Audits logouts. The OIDC flow answers with a redirect, so anything
/// below 400 counts as success.
pub struct LogoutResolver {
    pattern: Regex,
}

impl LogoutResolver {
    /// Create a logout resolver.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            pattern: pattern(r"^/c/log_out/?$")?,
        })
    }
}

#[async_trait]
impl CommonEventResolver for LogoutResolver {
    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn url_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn operation_for(&self, method: &Method) -> Option<&'static str> {
        (*method == Method::GET).then_some("logout")
    }

    fn is_success(&self, status: StatusCode) -> bool {
        status.as_u16() < 400
    }

    fn resource_name_hint(&self, ctx: &RequestContext, _body: &str) -> Option<String> {
        Some(ctx.principal_or("").to_string())
    }
}

/// Extract the `principal` field from a form-encoded login body.
fn principal_from_form(body: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        pair.strip_prefix("principal=")
            .map(|value| value.to_string())
    })
}

/// Truncate a string to at most `max` bytes on a char boundary, suffixing
/// `"..."` when anything was cut.
fn truncate_bytes(value: String, max: usize) -> String {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoUsers;

    #[async_trait]
    impl ResourceNameLookup for NoUsers {
        async fn name_of(&self, _id: i64) -> AppResult<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn registry_routes_urls_to_the_right_resolver() {
        let registry = default_registry(Arc::new(NoUsers)).unwrap();
        assert_eq!(registry.find("/api/v1/users/7").unwrap().resource_type(), "user");
        assert_eq!(
            registry.find("/api/v1/configurations").unwrap().resource_type(),
            "configuration"
        );
        assert!(registry.find("/c/login").is_some());
        assert!(registry.find("/c/log_out").is_some());
        assert!(registry.find("/api/v1/projects/1").is_none());
    }

    #[test]
    fn login_operator_comes_from_the_form_body() {
        let resolver = LoginResolver::new().unwrap();
        let ctx = RequestContext::anonymous();
        assert_eq!(
            resolver.operator(&ctx, "principal=admin&password=secret"),
            "admin"
        );
        assert_eq!(resolver.operator(&ctx, "password=secret"), "");
    }

    #[test]
    fn configuration_accepts_only_put() {
        let resolver = ConfigurationResolver::new().unwrap();
        assert_eq!(resolver.operation_for(&Method::PUT), Some("update"));
        assert_eq!(resolver.operation_for(&Method::POST), None);
        assert_eq!(resolver.operation_for(&Method::DELETE), None);
    }

    #[test]
    fn configuration_payload_is_capped() {
        let resolver = ConfigurationResolver::new().unwrap();
        let body = format!(r#"{{"ldap_url":"{}"}}"#, "x".repeat(600));
        let captured = resolver.payload(&body);
        assert!(captured.len() <= MAX_CONFIGURATION_PAYLOAD_BYTES + 3);
        assert!(captured.ends_with("..."));
    }

    #[test]
    fn logout_counts_redirects_as_success() {
        let resolver = LogoutResolver::new().unwrap();
        assert!(resolver.is_success(StatusCode::SEE_OTHER));
        assert!(resolver.is_success(StatusCode::OK));
        assert!(!resolver.is_success(StatusCode::UNAUTHORIZED));
    }
}
