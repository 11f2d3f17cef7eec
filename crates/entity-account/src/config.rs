//! Tunables for one account instance.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for the account state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Grace period after a delete request during which an undo prevents
    /// terminal deletion.
    pub undo_deletion_window: Duration,
    /// Bound on the approver-verification activity call.
    pub verify_approver_timeout: Duration,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            undo_deletion_window: Duration::from_secs(60),
            verify_approver_timeout: Duration::from_secs(60),
        }
    }
}
