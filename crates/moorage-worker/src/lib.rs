//! Background job processing for Moorage.
//!
//! This crate provides:
//! - A job queue over the `jobs` table
//! - A worker runner that polls for and executes queued jobs
//! - A cron scheduler for the periodic audit-log purge
//! - Job handlers for webhook delivery and the purge

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use queue::JobQueue;
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
