//! Deterministic clock and durable conditional waits.

use crate::errors::HostError;
use crate::time::Timestamp;
use async_trait::async_trait;

/// A predicate over entity state, re-evaluated by the host after every
/// state transition it applies.
pub type Condition = Box<dyn Fn() -> bool + Send + Sync>;

/// The host's replay-safe clock and durable timer.
///
/// `now` is a synchronous read — observing the clock is not a suspension
/// point. The two wait methods are the durable timed/conditional
/// suspension primitive: while a routine is parked on one, other routines
/// of the same entity may run and mutate shared state.
#[async_trait]
pub trait ClockEffects: Send + Sync {
    /// Current deterministic time.
    fn now(&self) -> Timestamp;

    /// Suspend until `condition` holds.
    ///
    /// Errors only when the host cancels the wait (instance shutdown).
    async fn await_condition(&self, condition: Condition) -> Result<(), HostError>;

    /// Suspend until `condition` holds or `timeout` elapses on the
    /// deterministic clock.
    ///
    /// `Ok(true)` means the condition was met first, `Ok(false)` means
    /// the timeout won. Errors only on host cancellation.
    async fn await_condition_with_timeout(
        &self,
        condition: Condition,
        timeout: std::time::Duration,
    ) -> Result<bool, HostError>;
}
