//! Post-transaction event collector.
//!
//! Domain actions do not publish events directly: they queue metadata on a
//! per-request [`PendingEventQueue`]. The [`collect_events`] middleware
//! flushes the queue only when the response status is 2xx (or the queue
//! was explicitly marked `must_notify`), so events describing state
//! changes never fire for a request that failed at the HTTP layer.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use moorage_core::config::NotificationConfig;
use moorage_core::context::RequestContext;
use moorage_core::error::ErrorKind;

use crate::bus::EventBus;
use crate::metadata::{Metadata, ResolveContext, build_and_publish};

/// Ordered queue of unresolved event metadata for one request.
#[derive(Default)]
pub struct PendingEventQueue {
    items: Mutex<Vec<Box<dyn Metadata>>>,
    must_notify: AtomicBool,
}

impl PendingEventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a metadata to the queue.
    pub fn push(&self, metadata: Box<dyn Metadata>) {
        self.lock_items().push(metadata);
    }

    /// Force the queue to flush regardless of the response status.
    pub fn set_must_notify(&self) {
        self.must_notify.store(true, Ordering::SeqCst);
    }

    /// Whether the queue was marked for unconditional flush.
    pub fn must_notify(&self) -> bool {
        self.must_notify.load(Ordering::SeqCst)
    }

    /// Number of queued metadata.
    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    /// Take every queued metadata, preserving insertion order.
    pub fn drain(&self) -> Vec<Box<dyn Metadata>> {
        std::mem::take(&mut *self.lock_items())
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Vec<Box<dyn Metadata>>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Shared state for the collector middleware.
#[derive(Clone)]
pub struct CollectorState {
    /// The bus events are published on.
    pub bus: Arc<EventBus>,
    /// Notification settings passed to metadata resolution.
    pub notification: Arc<NotificationConfig>,
}

/// Whether the queue should flush for the given response status.
pub fn should_flush(status: StatusCode, must_notify: bool) -> bool {
    status.is_success() || must_notify
}

/// Middleware wrapping each request with a pending-event queue.
///
/// The queue is placed in the request extensions so downstream handlers
/// can push metadata; after the inner handler returns, queued metadata is
/// resolved and published in insertion order, or discarded on failure.
pub async fn collect_events(
    State(state): State<CollectorState>,
    mut request: Request,
    next: Next,
) -> Response {
    let queue = Arc::new(PendingEventQueue::new());
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();
    request.extensions_mut().insert(Arc::clone(&queue));

    let response = next.run(request).await;

    if should_flush(response.status(), queue.must_notify()) {
        flush(&state, &ctx, queue.as_ref());
    } else {
        debug!(
            status = %response.status(),
            discarded = queue.len(),
            "Discarding pending events for failed request"
        );
    }

    response
}

fn flush(state: &CollectorState, ctx: &RequestContext, queue: &PendingEventQueue) {
    let resolve_ctx = ResolveContext {
        request: ctx,
        config: &state.notification,
    };
    for metadata in queue.drain() {
        if let Err(e) = build_and_publish(&state.bus, &resolve_ctx, metadata.as_ref()) {
            if e.is_kind(ErrorKind::NoSubscribers) {
                debug!(error = %e, "No subscribers for pending event");
            } else {
                warn!(error = %e, "Failed to publish pending event");
            }
        }
    }
}
