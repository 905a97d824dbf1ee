//! Concrete repository implementations.

pub mod audit;
pub mod job;
pub mod policy;
pub mod project;
pub mod replication;
pub mod scan;
