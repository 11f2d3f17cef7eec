//! Manually-advanced virtual clock with durable-wait semantics.

use async_trait::async_trait;
use entity_core::effects::{ClockEffects, Condition};
use entity_core::{HostError, Timestamp};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Virtual epoch-millis clock.
///
/// Time moves only through [`VirtualClock::advance`] / `set`. Parked
/// condition waits are re-evaluated whenever the clock changes or is
/// poked (the test host pokes after every applied command, mirroring a
/// real host re-evaluating awaits after each state transition).
#[derive(Clone)]
pub struct VirtualClock {
    now_ms: Arc<Mutex<u64>>,
    cancelled: Arc<AtomicBool>,
    changed: Arc<Notify>,
}

impl VirtualClock {
    /// Start the clock at the given epoch-millis instant.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(Mutex::new(start_ms)),
            cancelled: Arc::new(AtomicBool::new(false)),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Start the clock at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(0)
    }

    /// Move time forward and wake parked waits.
    pub fn advance(&self, duration: Duration) {
        {
            let mut now = self.now_ms.lock();
            *now = now.saturating_add(duration.as_millis() as u64);
        }
        self.changed.notify_waiters();
    }

    /// Jump to an absolute instant and wake parked waits.
    pub fn set(&self, now_ms: u64) {
        *self.now_ms.lock() = now_ms;
        self.changed.notify_waiters();
    }

    /// Re-evaluate parked waits without moving time.
    pub fn poke(&self) {
        self.changed.notify_waiters();
    }

    /// Cancel every current and future wait, as a host tearing down the
    /// instance would. Waits return [`HostError::Cancelled`].
    pub fn cancel_waits(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.changed.notify_waiters();
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::at_epoch()
    }
}

#[async_trait]
impl ClockEffects for VirtualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(*self.now_ms.lock())
    }

    async fn await_condition(&self, condition: Condition) -> Result<(), HostError> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if condition() {
                return Ok(());
            }
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(HostError::cancelled("instance cancelled by test host"));
            }
            notified.await;
        }
    }

    async fn await_condition_with_timeout(
        &self,
        condition: Condition,
        timeout: Duration,
    ) -> Result<bool, HostError> {
        let deadline = self.now().saturating_add(timeout);
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if condition() {
                return Ok(true);
            }
            if self.cancelled.load(Ordering::SeqCst) {
                return Err(HostError::cancelled("instance cancelled by test host"));
            }
            if self.now() >= deadline {
                return Ok(false);
            }
            notified.await;
        }
    }
}

/// Yield the current-thread runtime until spawned routines have reached
/// their next suspension point, poking the clock so parked waits
/// re-evaluate along the way.
pub async fn settle(clock: &VirtualClock) {
    for _ in 0..32 {
        tokio::task::yield_now().await;
        clock.poke();
    }
}
