//! The event handler contract.

use async_trait::async_trait;

use moorage_core::events::Event;
use moorage_core::result::AppResult;

/// A side-effecting consumer of events.
///
/// Handlers live for the process lifetime and are registered on the bus by
/// topic. A handler's [`name`](EventHandler::name) identifies its concrete
/// type: the bus rejects two registrations of the same name on one topic,
/// and serializes stateful handlers per name across all topics.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Stable identifier for this handler type.
    fn name(&self) -> &'static str;

    /// Whether invocations of this handler type must never overlap.
    fn is_stateful(&self) -> bool {
        false
    }

    /// Consume one event. Errors are logged by the bus and never reach the
    /// publisher.
    async fn handle(&self, event: &Event) -> AppResult<()>;
}
