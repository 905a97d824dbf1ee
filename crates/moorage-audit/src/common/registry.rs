//! URL-pattern registry of common-event resolvers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use regex::Regex;

use moorage_core::context::RequestContext;
use moorage_core::result::AppResult;

use super::redact::{default_sensitive_attributes, redact};

/// Resolves a numeric resource id to its display name.
///
/// Delete operations need the name before the row is gone; create
/// operations resolve it from the id in the `Location` header.
#[async_trait]
pub trait ResourceNameLookup: Send + Sync {
    /// The display name for an id, or `None` when unknown.
    async fn name_of(&self, id: i64) -> AppResult<Option<String>>;
}

/// Describes how one family of mutating URLs turns into audit events.
#[async_trait]
pub trait CommonEventResolver: Send + Sync {
    /// The audited resource type (`"user"`, `"configuration"`, ...).
    fn resource_type(&self) -> &'static str;

    /// The URL pattern this resolver owns. Capture group 1, when present,
    /// is the numeric resource id.
    fn url_pattern(&self) -> &Regex;

    /// Whether numeric ids should be resolved to display names.
    fn should_resolve_name(&self) -> bool {
        false
    }

    /// The audit operation for an HTTP method, or `None` when the method
    /// is not audited on this URL.
    fn operation_for(&self, method: &Method) -> Option<&'static str> {
        match *method {
            Method::POST => Some("create"),
            Method::PUT => Some("update"),
            Method::DELETE => Some("delete"),
            _ => None,
        }
    }

    /// Whether a response status counts as a successful operation.
    fn is_success(&self, status: StatusCode) -> bool {
        status.is_success()
    }

    /// Attribute names masked in the captured payload.
    fn sensitive_attributes(&self) -> HashSet<String> {
        default_sensitive_attributes()
    }

    /// The redacted payload recorded with the event.
    fn payload(&self, body: &str) -> String {
        redact(body, &self.sensitive_attributes())
    }

    /// The operator of the request. Login resolvers extract it from the
    /// body; everything else uses the authenticated principal.
    fn operator(&self, ctx: &RequestContext, _body: &str) -> String {
        ctx.principal_or("").to_string()
    }

    /// Resolve a numeric id to a display name.
    async fn id_to_name(&self, _id: i64) -> AppResult<Option<String>> {
        Ok(None)
    }

    /// A resource name known without an id, e.g. the principal of a login
    /// request. Takes precedence over id-based resolution.
    fn resource_name_hint(&self, _ctx: &RequestContext, _body: &str) -> Option<String> {
        None
    }

    /// The resource id captured from a URL, when the pattern has one.
    fn resource_id(&self, url: &str) -> Option<i64> {
        self.url_pattern()
            .captures(url)
            .and_then(|captures| captures.get(1))
            .and_then(|id| id.as_str().parse().ok())
    }
}

/// Ordered registry of resolvers. Written once at startup; lookups scan
/// in registration order so overlapping patterns pick the first
/// registered resolver deterministically.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: Mutex<Vec<Arc<dyn CommonEventResolver>>>,
}

impl ResolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver.
    pub fn register(&self, resolver: Arc<dyn CommonEventResolver>) {
        self.lock().push(resolver);
    }

    /// The first resolver whose pattern matches the URL path.
    pub fn find(&self, path: &str) -> Option<Arc<dyn CommonEventResolver>> {
        self.lock()
            .iter()
            .find(|resolver| resolver.url_pattern().is_match(path))
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn CommonEventResolver>>> {
        match self.resolvers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
