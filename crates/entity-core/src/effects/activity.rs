//! Activity contracts consumed by the entity.
//!
//! Activities are the entity's only reach outside its own state. Their
//! implementations live with the host's worker, not here; the core only
//! fixes the call shapes. An activity call suspends the calling routine
//! only — retry policy belongs to the host.

use crate::errors::ActivityError;
use crate::messages::{SendNotificationsRequest, VerifyApproverRequest, VerifyApproverResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Wire name of the approver-verification activity.
pub const VERIFY_APPROVER_ACTIVITY: &str = "VerifyApprover";

/// Wire name of the grant-notification activity.
pub const SEND_NOTIFICATIONS_ACTIVITY: &str = "SendNotifications";

/// Checks whether an approver already holds the power to grant a
/// permission. Suspension point.
#[async_trait]
pub trait ApprovalVerifier: Send + Sync {
    /// Verify the approver, bounded by `timeout`.
    async fn verify_approver(
        &self,
        request: VerifyApproverRequest,
        timeout: Duration,
    ) -> Result<VerifyApproverResponse, ActivityError>;
}

/// Best-effort notification hook fired after a successful grant.
///
/// Invoked but never awaited for correctness; failures are logged and
/// dropped by the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a grant notification.
    async fn send_notifications(
        &self,
        request: SendNotificationsRequest,
    ) -> Result<(), ActivityError>;
}
