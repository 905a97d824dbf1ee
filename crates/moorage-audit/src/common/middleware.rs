//! Middleware capturing generic mutating operations as audit events.

use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use moorage_core::context::RequestContext;
use moorage_core::settings::RuntimeSettings;
use moorage_events::collector::PendingEventQueue;
use moorage_events::metadata::CommonEventMetadata;

use super::registry::{CommonEventResolver, ResolverRegistry};

/// Largest request body captured for auditing. Bigger bodies are still
/// served, just audited without a payload.
const MAX_CAPTURED_BODY_BYTES: usize = 1024 * 1024;

/// Shared state for the common-event middleware.
#[derive(Clone)]
pub struct CommonEventState {
    /// The resolver registry, populated at startup.
    pub registry: Arc<ResolverRegistry>,
    /// Runtime audit gates.
    pub settings: Arc<RuntimeSettings>,
}

/// Middleware turning matched mutating requests into queued common
/// events.
///
/// Before the inner handler runs it checks the per-type audit gate and,
/// for deletes of name-resolvable resources, pre-fetches the display name
/// (the row is gone afterwards). After the handler it builds the event
/// from the response status and queues it on the request's pending-event
/// queue marked must-notify: failed operations (a rejected login, a
/// delete that 404s) are audited too, so the collector must flush the
/// queue regardless of the response status.
pub async fn resolve_common_events(
    State(state): State<CommonEventState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let Some(resolver) = state.registry.find(&path) else {
        return next.run(request).await;
    };
    let Some(operation) = resolver.operation_for(request.method()) else {
        return next.run(request).await;
    };

    let event_type = format!("{operation}_{}", resolver.resource_type());
    if !state.settings.audit_event_enabled(&event_type) {
        debug!(event_type, "Common event type is disabled");
        return next.run(request).await;
    }

    let method = request.method().clone();
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();
    let queue = request.extensions().get::<Arc<PendingEventQueue>>().cloned();

    let mut pre_resolved_name = None;
    if method == Method::DELETE && resolver.should_resolve_name() {
        if let Some(id) = resolver.resource_id(&path) {
            match resolver.id_to_name(id).await {
                Ok(name) => pre_resolved_name = name,
                Err(e) => warn!(id, error = %e, "Pre-delete name resolution failed"),
            }
        }
    }

    let (request, body) = buffer_body(request).await;
    let body_str = String::from_utf8_lossy(&body).to_string();

    let response = next.run(request).await;

    let resource_name = resolve_resource_name(
        resolver.as_ref(),
        &path,
        &method,
        response.headers(),
        pre_resolved_name,
        &ctx,
        &body_str,
    )
    .await;
    let operator = resolver.operator(&ctx, &body_str);
    let is_successful = resolver.is_success(response.status());

    let metadata = CommonEventMetadata {
        operator,
        project_id: None,
        resource_type: resolver.resource_type().to_string(),
        resource_name: resource_name.clone(),
        operation: operation.to_string(),
        operation_description: format!(
            "{operation} {} {resource_name}",
            resolver.resource_type()
        ),
        is_successful,
        payload: resolver.payload(&body_str),
    };
    match queue {
        Some(queue) => {
            queue.push(Box::new(metadata));
            // Common events record failures too; without the flag the
            // collector would drop them on any non-2xx response.
            queue.set_must_notify();
        }
        None => warn!(path, "No pending-event queue on the request"),
    }

    response
}

/// Buffer the request body so it can be both audited and replayed to the
/// inner handler. Oversized or unreadable bodies are passed through
/// unbuffered and audited without a payload.
async fn buffer_body(request: Request) -> (Request, Bytes) {
    let too_large = request
        .body()
        .size_hint()
        .upper()
        .is_none_or(|upper| upper > MAX_CAPTURED_BODY_BYTES as u64);
    if too_large {
        return (request, Bytes::new());
    }
    let (parts, body) = request.into_parts();
    match to_bytes(body, MAX_CAPTURED_BODY_BYTES).await {
        Ok(bytes) => (
            Request::from_parts(parts, Body::from(bytes.clone())),
            bytes,
        ),
        Err(e) => {
            warn!(error = %e, "Failed to buffer request body for auditing");
            (Request::from_parts(parts, Body::empty()), Bytes::new())
        }
    }
}

/// Pick the resource name: an explicit hint (login principal), then the
/// pre-fetched name, then the id from the `Location` header (create) or
/// the request URL, then the resource type itself.
async fn resolve_resource_name(
    resolver: &dyn CommonEventResolver,
    path: &str,
    method: &Method,
    response_headers: &HeaderMap,
    pre_resolved_name: Option<String>,
    ctx: &RequestContext,
    body: &str,
) -> String {
    if let Some(hint) = resolver.resource_name_hint(ctx, body) {
        if !hint.is_empty() {
            return hint;
        }
    }
    if let Some(name) = pre_resolved_name {
        return name;
    }

    let id = if *method == Method::POST {
        created_id(path, response_headers)
    } else {
        resolver.resource_id(path)
    };
    if let Some(id) = id {
        if resolver.should_resolve_name() {
            match resolver.id_to_name(id).await {
                Ok(Some(name)) => return name,
                Ok(None) => {}
                Err(e) => warn!(id, error = %e, "Name resolution failed"),
            }
        }
        return id.to_string();
    }
    resolver.resource_type().to_string()
}

/// The id of a freshly created resource, taken from a `Location` header
/// of the form `{request_path}/{id}`.
fn created_id(path: &str, headers: &HeaderMap) -> Option<i64> {
    let location = headers.get("Location")?.to_str().ok()?;
    let rest = location.strip_prefix(path)?.strip_prefix('/')?;
    rest.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use axum::Router;
    use axum::http::{HeaderValue, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::{get, post, put};
    use tower::ServiceExt;

    use moorage_core::config::audit::AuditConfig;
    use moorage_core::config::notification::NotificationConfig;
    use moorage_core::events::topic;
    use moorage_core::events::{Event, EventData};
    use moorage_core::result::AppResult;
    use moorage_events::collector::{CollectorState, collect_events};
    use moorage_events::metadata::ResolveContext;
    use moorage_events::{EventBus, EventHandler, Metadata};

    use crate::common::registry::ResourceNameLookup;
    use crate::common::resolvers::default_registry;

    struct NamedUsers;

    #[async_trait::async_trait]
    impl ResourceNameLookup for NamedUsers {
        async fn name_of(&self, id: i64) -> AppResult<Option<String>> {
            Ok((id == 7).then(|| "alice".to_string()))
        }
    }

    fn settings() -> Arc<RuntimeSettings> {
        Arc::new(RuntimeSettings::from_config(
            &NotificationConfig::default(),
            &AuditConfig::default(),
        ))
    }

    fn app(state: CommonEventState, queue: Arc<PendingEventQueue>) -> Router {
        Router::new()
            .route(
                "/api/v1/users",
                post(|| async {
                    let mut response = Response::new(Body::empty());
                    *response.status_mut() = StatusCode::CREATED;
                    response
                        .headers_mut()
                        .insert(header::LOCATION, HeaderValue::from_static("/api/v1/users/7"));
                    response
                }),
            )
            .route("/api/v1/configurations", put(|| async { StatusCode::OK }))
            .layer(from_fn_with_state(state, resolve_common_events))
            .layer(axum::Extension(queue))
    }

    fn resolve_queued(queue: &PendingEventQueue) -> Vec<moorage_core::events::Event> {
        let request = RequestContext::new("admin");
        let config = NotificationConfig::default();
        let ctx = ResolveContext {
            request: &request,
            config: &config,
        };
        queue
            .drain()
            .into_iter()
            .map(|m| m.resolve(&ctx).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn user_creation_is_audited_with_the_resolved_name() {
        let queue = Arc::new(PendingEventQueue::new());
        let state = CommonEventState {
            registry: Arc::new(default_registry(Arc::new(NamedUsers)).unwrap()),
            settings: settings(),
        };

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"alice","password":"p"}"#))
            .unwrap();
        let response = app(state, queue.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let events = resolve_queued(&queue);
        assert_eq!(events.len(), 1);
        let moorage_core::events::EventData::Common(common) = &events[0].data else {
            panic!("expected a common event");
        };
        assert_eq!(common.operation, "create");
        assert_eq!(common.resource_type, "user");
        assert_eq!(common.resource_name, "alice");
        assert!(common.is_successful);
        assert!(common.payload.contains("\"password\": \"***\""));
        assert!(common.payload.contains("alice"));
    }

    #[tokio::test]
    async fn disabled_event_types_are_not_captured() {
        let queue = Arc::new(PendingEventQueue::new());
        let settings = settings();
        settings.set_disabled_audit_events(["update_configuration".to_string()]);
        let state = CommonEventState {
            registry: Arc::new(default_registry(Arc::new(NamedUsers)).unwrap()),
            settings,
        };

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/configurations")
            .body(Body::from(r#"{"ldap_url":"ldap://x"}"#))
            .unwrap();
        let response = app(state, queue.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(queue.is_empty());
    }

    struct CommonCapture {
        seen: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait::async_trait]
    impl EventHandler for CommonCapture {
        fn name(&self) -> &'static str {
            "CommonCapture"
        }

        async fn handle(&self, event: &Event) -> AppResult<()> {
            if let EventData::Common(common) = &event.data {
                self.seen
                    .lock()
                    .unwrap()
                    .push((common.operation.clone(), common.is_successful));
            }
            Ok(())
        }
    }

    /// The resolver middleware composed with the collector, the way the
    /// server wires them: the collector owns the queue, the resolver
    /// queues matched requests on it.
    fn full_stack_app(bus: Arc<EventBus>) -> Router {
        let common_state = CommonEventState {
            registry: Arc::new(default_registry(Arc::new(NamedUsers)).unwrap()),
            settings: settings(),
        };
        let collector_state = CollectorState {
            bus,
            notification: Arc::new(NotificationConfig::default()),
        };
        Router::new()
            .route("/c/login", post(|| async { StatusCode::UNAUTHORIZED }))
            .route("/c/log_out", get(|| async { StatusCode::SEE_OTHER }))
            .layer(from_fn_with_state(common_state, resolve_common_events))
            .layer(from_fn_with_state(collector_state, collect_events))
    }

    fn common_bus() -> (Arc<EventBus>, Arc<CommonCapture>) {
        let bus = Arc::new(EventBus::new());
        let capture = Arc::new(CommonCapture {
            seen: Mutex::new(Vec::new()),
        });
        bus.subscribe(topic::COMMON_EVENT, capture.clone()).unwrap();
        (bus, capture)
    }

    async fn wait_for_capture(capture: &CommonCapture) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while capture.seen.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("common event was not delivered in time");
    }

    #[tokio::test]
    async fn failed_login_is_still_audited() {
        let (bus, capture) = common_bus();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/c/login")
            .body(Body::from("principal=eve&password=wrong"))
            .unwrap();

        let response = full_stack_app(bus).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        wait_for_capture(&capture).await;
        assert_eq!(
            *capture.seen.lock().unwrap(),
            vec![("login".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn logout_redirect_is_audited_as_success() {
        let (bus, capture) = common_bus();
        let request = Request::builder()
            .method(Method::GET)
            .uri("/c/log_out")
            .body(Body::empty())
            .unwrap();

        let response = full_stack_app(bus).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        wait_for_capture(&capture).await;
        assert_eq!(
            *capture.seen.lock().unwrap(),
            vec![("logout".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn unmatched_urls_pass_through() {
        let queue = Arc::new(PendingEventQueue::new());
        let state = CommonEventState {
            registry: Arc::new(default_registry(Arc::new(NamedUsers)).unwrap()),
            settings: settings(),
        };
        let app = Router::new()
            .route("/api/v1/projects", post(|| async { StatusCode::CREATED }))
            .layer(from_fn_with_state(state, resolve_common_events))
            .layer(axum::Extension(queue.clone()));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/projects")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap();
        assert!(queue.is_empty());
    }
}
