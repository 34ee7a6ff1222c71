//! Session stack orchestration.
//!
//! Covers the pure stack data structure, staleness classification and the
//! manager facade that ties them to persistence and events.

pub mod monitor;
pub mod stack;
pub mod stack_manager;

pub use monitor::{Recommendation, StaleReport, Staleness, StalenessMonitor};
pub use stack::SessionStack;
pub use stack_manager::{SessionStackManager, StackView, SweepAction, SweepReport};
