//! Deterministic in-process host for entity tests.
//!
//! Everything a real durable-execution engine would provide, shrunk to a
//! single-process, manually-driven form: a virtual clock that only moves
//! when a test advances it, condition waits re-evaluated on every poke,
//! a recording attribute index, a scriptable approver verifier, and a
//! [`TestHost`] aggregate that dispatches commands in delivery order.
//!
//! Tests run on a current-thread tokio runtime; [`settle`] (or
//! [`TestHost::settle`]) yields until spawned routines reach their next
//! suspension point, which keeps interleavings reproducible.

#![forbid(unsafe_code)]

mod clock;
mod host;
mod index;
mod notifier;
mod spawner;
mod verifier;

pub use clock::{settle, VirtualClock};
pub use host::TestHost;
pub use index::RecordingIndex;
pub use notifier::RecordingNotifier;
pub use spawner::TokioSpawner;
pub use verifier::{ScriptedVerifier, VerifierScript};
