//! Deterministic-clock instants.
//!
//! The entity never reads wall-clock time; every timestamp comes from the
//! host's replay-safe clock ([`crate::effects::ClockEffects::now`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A deterministic-clock instant in epoch milliseconds.
///
/// Absent instants are modelled as `Option<Timestamp>`, never as a zero
/// sentinel.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Milliseconds since the Unix epoch, as reported by the host clock.
    pub ts_ms: u64,
}

impl Timestamp {
    /// Construct from epoch milliseconds.
    pub fn from_millis(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Epoch milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.ts_ms
    }

    /// Offset this instant forward, saturating at the numeric bound.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self {
            ts_ms: self.ts_ms.saturating_add(duration.as_millis() as u64),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.ts_ms)
    }
}
