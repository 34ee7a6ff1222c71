#![forbid(unsafe_code)]

//! Interruptible task-session stack.
//!
//! A root task can be interrupted by nested work up to a bounded depth,
//! checkpointed with opaque payloads, resumed where it left off, and flushed
//! to a recovery store when it goes idle for too long.

pub mod audit;
pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod persistence;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use orchestrator::SessionStackManager;
