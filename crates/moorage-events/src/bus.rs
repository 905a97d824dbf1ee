//! The topic-based event bus.
//!
//! `publish` snapshots the subscriber set under a read lock, releases it,
//! then spawns one task per handler, so handlers may block without ever
//! blocking the publisher and may re-subscribe from within `handle`.
//! Stateful handler types share a single-permit semaphore keyed by handler
//! name, which serializes their invocations in acquisition order across
//! all topics.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use moorage_core::error::AppError;
use moorage_core::events::Event;
use moorage_core::result::AppResult;

use crate::handler::EventHandler;

/// Serialization slot for one stateful handler type.
struct StatefulSlot {
    /// Single-permit semaphore shared by every topic the type is bound to.
    semaphore: Arc<Semaphore>,
    /// How many topic bindings currently reference the slot. The slot is
    /// dropped when this reaches zero.
    bound: usize,
}

#[derive(Default)]
struct Registry {
    /// Topic name → handler name → handler.
    topics: HashMap<String, HashMap<&'static str, Arc<dyn EventHandler>>>,
    /// Handler name → serialization slot, stateful types only.
    slots: HashMap<&'static str, StatefulSlot>,
}

/// The in-process event bus.
pub struct EventBus {
    registry: RwLock<Registry>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Bind a handler to a topic.
    ///
    /// Fails with a validation error on an empty topic and with a conflict
    /// error when a handler of the same name is already bound to the topic.
    pub fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) -> AppResult<()> {
        if topic.is_empty() {
            return Err(AppError::validation("topic must not be empty"));
        }

        let name = handler.name();
        let stateful = handler.is_stateful();
        let mut registry = self.write_registry();

        let handlers = registry.topics.entry(topic.to_string()).or_default();
        if handlers.contains_key(name) {
            return Err(AppError::conflict(format!(
                "handler '{name}' is already subscribed to topic '{topic}'"
            )));
        }
        handlers.insert(name, handler);

        if stateful {
            registry
                .slots
                .entry(name)
                .and_modify(|slot| slot.bound += 1)
                .or_insert_with(|| StatefulSlot {
                    semaphore: Arc::new(Semaphore::new(1)),
                    bound: 1,
                });
        }

        debug!(topic, handler = name, stateful, "Subscribed handler");
        Ok(())
    }

    /// Bind a handler to several topics at once.
    pub fn subscribe_all(&self, topics: &[&str], handler: Arc<dyn EventHandler>) -> AppResult<()> {
        for topic in topics {
            self.subscribe(topic, handler.clone())?;
        }
        Ok(())
    }

    /// Remove a handler binding. With `handler_name = None` every handler
    /// bound to the topic is removed.
    pub fn unsubscribe(&self, topic: &str, handler_name: Option<&str>) -> AppResult<()> {
        let mut registry = self.write_registry();

        let handlers = registry
            .topics
            .get_mut(topic)
            .ok_or_else(|| AppError::not_found(format!("no handlers for topic '{topic}'")))?;

        let removed: Vec<Arc<dyn EventHandler>> = match handler_name {
            Some(name) => {
                let handler = handlers.remove(name).ok_or_else(|| {
                    AppError::not_found(format!(
                        "handler '{name}' is not subscribed to topic '{topic}'"
                    ))
                })?;
                vec![handler]
            }
            None => handlers.drain().map(|(_, h)| h).collect(),
        };

        if handlers.is_empty() {
            registry.topics.remove(topic);
        }

        for handler in &removed {
            if !handler.is_stateful() {
                continue;
            }
            let name = handler.name();
            if let Some(slot) = registry.slots.get_mut(name) {
                slot.bound -= 1;
                if slot.bound == 0 {
                    registry.slots.remove(name);
                }
            }
        }

        Ok(())
    }

    /// Publish an event to every handler bound to its topic.
    ///
    /// Returns as soon as the handler tasks are spawned; delivery is
    /// asynchronous and handler failures never reach the publisher. Fails
    /// with a validation error on an empty topic and with a
    /// no-subscribers error when nothing is bound.
    pub fn publish(&self, event: Event) -> AppResult<()> {
        if event.topic.is_empty() {
            return Err(AppError::validation("topic must not be empty"));
        }

        // Snapshot under the read lock, then release before spawning.
        let handlers: Vec<(Arc<dyn EventHandler>, Option<Arc<Semaphore>>)> = {
            let registry = self.read_registry();
            let Some(bound) = registry.topics.get(&event.topic) else {
                return Err(AppError::no_subscribers(&event.topic));
            };
            bound
                .values()
                .map(|h| {
                    let slot = registry
                        .slots
                        .get(h.name())
                        .map(|s| Arc::clone(&s.semaphore));
                    (Arc::clone(h), slot)
                })
                .collect()
        };

        if handlers.is_empty() {
            return Err(AppError::no_subscribers(&event.topic));
        }

        let event = Arc::new(event);
        for (handler, slot) in handlers {
            let event = Arc::clone(&event);
            tokio::spawn(async move {
                let _permit = match slot {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => return,
                    },
                    None => None,
                };

                let name = handler.name();
                let outcome = AssertUnwindSafe(handler.handle(&event)).catch_unwind().await;
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(topic = %event.topic, handler = name, error = %e, "Handler failed");
                    }
                    Err(_) => {
                        error!(topic = %event.topic, handler = name, "Handler panicked");
                    }
                }
            });
        }

        Ok(())
    }

    /// Number of handlers currently bound to a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.read_registry()
            .topics
            .get(topic)
            .map(|h| h.len())
            .unwrap_or(0)
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, Registry> {
        match self.registry.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Event bus registry lock poisoned");
                poisoned.into_inner()
            }
        }
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, Registry> {
        match self.registry.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Event bus registry lock poisoned");
                poisoned.into_inner()
            }
        }
    }
}
