//! Notification policy entities.

pub mod model;
pub mod target;

pub use model::{CreatePolicy, NotificationPolicy};
pub use target::{PayloadFormat, Target, TargetType};
