//! User-account entity: state machine and control loop.
//!
//! A single durable instance per username, driven entirely by commands
//! delivered through the host and observed time from the host's
//! deterministic clock. The crate has two halves:
//!
//! - [`state::UserAccountState`] — the business rules: permission
//!   grant/approval, soft delete with a 60-second undo window, indexed
//!   projection publishing.
//! - [`orchestration::UserAccountOrchestration`] — the control loop:
//!   handler registration, the suspend-until-terminal-or-compaction wait,
//!   and the continuation hand-off.
//!
//! Concurrency model: one logical thread of control per entity.
//! Command handlers and the deletion watcher are cooperative routines
//! that yield only at suspension points (activity calls, durable waits).
//! Between suspension points, reads and writes of the shared account
//! fields are atomic with respect to every other routine.

#![forbid(unsafe_code)]

pub mod config;
pub mod orchestration;
pub mod state;

pub use config::AccountConfig;
pub use orchestration::{LoopExit, UserAccountOrchestration};
pub use state::{AccountEffects, UserAccountState};
