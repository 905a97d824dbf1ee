//! # moorage-events
//!
//! The in-process notification core: a topic-based event bus with stateful
//! and stateless handlers, lazy metadata resolution, and the
//! post-transaction collector middleware that defers publication until the
//! originating HTTP request has succeeded.

pub mod bus;
pub mod collector;
pub mod handler;
pub mod metadata;

pub use bus::EventBus;
pub use handler::EventHandler;
pub use metadata::{Metadata, ResolveContext, build_event, build_and_publish};
