//! Common-event resolver framework.
//!
//! Some auditable operations are not modeled as domain events; they are
//! plain mutating HTTP requests (users, configuration, login). A registry
//! maps URL patterns to [`registry::CommonEventResolver`]s; the
//! [`middleware::resolve_common_events`] layer matches each mutating
//! request, asks the resolver whether it is audit-enabled, and after the
//! inner handler queues a generic event with a redacted copy of the
//! request payload.

pub mod middleware;
pub mod redact;
pub mod registry;
pub mod resolvers;
pub mod users;

pub use middleware::{CommonEventState, resolve_common_events};
pub use redact::{default_sensitive_attributes, redact};
pub use registry::{CommonEventResolver, ResolverRegistry};
pub use users::DatabaseUserNameLookup;
