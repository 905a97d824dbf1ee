//! Background job entities.

pub mod model;
pub mod status;

pub use model::{CreateJob, Job, JobParameters};
pub use status::JobStatus;
