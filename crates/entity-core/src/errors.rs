//! Unified error taxonomy for the entity lifecycle.
//!
//! Three layers: [`HostError`] for durable-host infrastructure failures,
//! [`ActivityError`] for collaborator (activity) failures, and
//! [`EntityError`] for what callers of a command actually see. All three
//! cross the host boundary, so they stay plain serializable data.

use crate::messages::Permission;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Convenience result alias for command handlers.
pub type EntityResult<T> = Result<T, EntityError>;

/// Failures raised by the durable-execution host itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum HostError {
    /// The instance (and any wait it was parked on) was cancelled.
    #[error("wait cancelled: {reason}")]
    Cancelled {
        /// Why the host cancelled the wait.
        reason: String,
    },

    /// The host refused to register command/query handlers. Fatal to the
    /// instance.
    #[error("handler registration rejected: {message}")]
    RegistrationRejected {
        /// Host-supplied rejection detail.
        message: String,
    },

    /// An indexed-attribute publish was not accepted.
    #[error("attribute index unavailable: {message}")]
    IndexUnavailable {
        /// Host-supplied failure detail.
        message: String,
    },

    /// Anything else the host reports.
    #[error("host error: {message}")]
    Internal {
        /// Host-supplied failure detail.
        message: String,
    },
}

impl HostError {
    /// Create a cancellation error.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Create a registration-rejected error.
    pub fn registration_rejected(message: impl Into<String>) -> Self {
        Self::RegistrationRejected {
            message: message.into(),
        }
    }

    /// Create an index-unavailable error.
    pub fn index_unavailable(message: impl Into<String>) -> Self {
        Self::IndexUnavailable {
            message: message.into(),
        }
    }

    /// Create a generic host error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Failures of an external activity call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ActivityError {
    /// The bounded call did not complete in time.
    #[error("activity {name} timed out after {timeout_ms}ms")]
    Timeout {
        /// Activity wire name.
        name: String,
        /// The bound that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The activity ran and reported failure.
    #[error("activity {name} failed: {message}")]
    Failed {
        /// Activity wire name.
        name: String,
        /// Collaborator-supplied failure detail.
        message: String,
    },
}

impl ActivityError {
    /// Create a timeout error for the named activity.
    pub fn timeout(name: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            name: name.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a failure error for the named activity.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Command failures returned synchronously to callers.
///
/// The display strings of the domain variants are part of the caller
/// contract and must not change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum EntityError {
    /// The account is terminal or inside an open deletion window.
    #[error("user deleted")]
    UserDeleted,

    /// Undo arrived after the account became terminal.
    #[error("already deleted")]
    AlreadyDeleted,

    /// The permission being approved is not pending.
    #[error("permission not found")]
    PermissionNotFound,

    /// The approver does not hold the power to grant.
    #[error("{approver} cannot grant permission {permission}")]
    ApproverUnauthorized {
        /// Who tried to grant.
        approver: String,
        /// What they tried to grant.
        permission: Permission,
    },

    /// An activity call failed or timed out; state is unchanged.
    #[error(transparent)]
    Activity(#[from] ActivityError),

    /// The host failed underneath the handler.
    #[error(transparent)]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_messages_match_the_caller_contract() {
        assert_eq!(EntityError::UserDeleted.to_string(), "user deleted");
        assert_eq!(EntityError::AlreadyDeleted.to_string(), "already deleted");
        assert_eq!(
            EntityError::PermissionNotFound.to_string(),
            "permission not found"
        );
        assert_eq!(
            EntityError::ApproverUnauthorized {
                approver: "bob".to_owned(),
                permission: "read_files".into(),
            }
            .to_string(),
            "bob cannot grant permission read_files"
        );
    }

    #[test]
    fn activity_errors_carry_the_activity_name() {
        let err = ActivityError::timeout("VerifyApprover", Duration::from_secs(60));
        assert_eq!(
            err.to_string(),
            "activity VerifyApprover timed out after 60000ms"
        );
    }
}
