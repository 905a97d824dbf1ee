//! Request-scoped context carried through event resolution and dispatch.
//!
//! There is no thread-local ambient state: the context is passed explicitly
//! to metadata resolution and is baked into the resolved event before
//! handlers run, because the originating request (and its context) may
//! already be gone by the time a handler executes.

use serde::{Deserialize, Serialize};

/// The identity and correlation data of the request that produced an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated principal, if any.
    pub principal: Option<String>,
    /// The `X-Request-Id` correlation id, if any.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Create a context for an authenticated principal.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            request_id: None,
        }
    }

    /// Create an empty (unauthenticated) context.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach a request correlation id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// The principal name, or the given fallback when unauthenticated.
    pub fn principal_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.principal.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => fallback,
        }
    }
}
