//! Wire-facing data contracts: commands, queries, activity payloads, and
//! the continuation snapshot.
//!
//! The command and query sets are closed tagged variants with fixed
//! request/response shapes; dispatch over them is an exhaustive match,
//! never name-keyed reflection. The wire names exposed through
//! [`Command::name`] / [`Query::name`] are what the host routes on.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A capability tag held by (or requested for) a user account.
///
/// Duplicates are meaningful: no command deduplicates the granted or
/// pending sequences.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Wrap a capability tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(tag: &str) -> Self {
        Self(tag.to_owned())
    }
}

impl From<String> for Permission {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// Identity of a durable entity instance (one per username).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a username.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Initial grant set for a new account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Permissions granted at creation, appended verbatim.
    pub permissions: Vec<Permission>,
}

/// Ask for a permission to be queued for approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPermissionRequest {
    /// The permission to queue.
    pub permission: Permission,
}

/// Ask an approver to grant a pending permission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovePermissionRequest {
    /// Who is granting.
    pub approver_id: String,
    /// The pending permission to grant.
    pub permission: Permission,
}

/// Open the soft-delete undo window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserRequest;

/// Cancel a pending soft delete.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoDeleteRequest;

/// Permissions currently queued for approval.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitingApprovalResponse {
    /// Pending permissions, in request order.
    pub permissions: Vec<Permission>,
}

/// Permissions currently granted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsGrantedResponse {
    /// Granted permissions, in grant order.
    pub permissions: Vec<Permission>,
}

/// Composite account view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetailsResponse {
    /// Pending permissions.
    pub awaiting_approval: AwaitingApprovalResponse,
    /// Whether a soft-delete grace window is currently open.
    pub deletion_requested: bool,
    /// When deletion was last requested, if ever.
    pub deletion_requested_at: Option<Timestamp>,
    /// When the open grace window elapses.
    pub deletion_scheduled_for: Option<Timestamp>,
    /// Granted permissions.
    pub permissions: PermissionsGrantedResponse,
}

/// Request payload for the approver-verification activity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyApproverRequest {
    /// The approver whose authority is being checked.
    pub approver_id: String,
    /// The permission they want to grant.
    pub permission: Permission,
}

/// Result of the approver-verification activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyApproverResponse {
    /// True when the approver already holds the power to grant.
    pub verified: bool,
}

/// Payload for the best-effort grant notification activity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendNotificationsRequest {
    /// Who granted.
    pub approver_id: String,
    /// What was granted.
    pub permission: Permission,
    /// The account the grant landed on.
    pub requester_id: EntityId,
}

/// State carried from a retiring instance to its successor.
///
/// The same type seeds fresh construction; [`Default`] is the zero
/// snapshot of a previously unseen identity. A `Some`
/// `deletion_requested_at` makes the successor re-arm the undo-window
/// watcher with a fresh window — the residual countdown is not preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Pending permissions at hand-off.
    pub awaiting_approval: Vec<Permission>,
    /// Granted permissions at hand-off.
    pub permissions: Vec<Permission>,
    /// Deletion stamp at hand-off, if a grace window was open.
    pub deletion_requested_at: Option<Timestamp>,
}

/// The closed set of mutating commands an entity accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Create the account with an initial grant set.
    Create(CreateUserRequest),
    /// Queue a permission for approval.
    AddPermission(AddPermissionRequest),
    /// Grant a pending permission, subject to approver verification.
    ApprovePermission(ApprovePermissionRequest),
    /// Open the soft-delete undo window.
    Delete(DeleteUserRequest),
    /// Cancel a pending soft delete.
    UndoDelete(UndoDeleteRequest),
}

impl Command {
    /// The wire name the host routes this command on.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::AddPermission(_) => "add_permission",
            Command::ApprovePermission(_) => "approve_permission",
            Command::Delete(_) => "delete",
            Command::UndoDelete(_) => "undo_delete",
        }
    }
}

/// Per-command acknowledgements (all empty-bodied).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandReply {
    /// `create` applied.
    Created,
    /// `add_permission` applied.
    PermissionRequested,
    /// `approve_permission` applied.
    PermissionApproved,
    /// `delete` applied; the undo window is open.
    DeletionRequested,
    /// `undo_delete` applied.
    DeletionUndone,
}

/// The closed set of read-only queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// Current pending permissions.
    AwaitingApproval,
    /// Current granted permissions.
    PermissionsGranted,
    /// Composite account view.
    UserDetails,
}

impl Query {
    /// The wire name the host routes this query on.
    pub fn name(&self) -> &'static str {
        match self {
            Query::AwaitingApproval => "awaiting_approval",
            Query::PermissionsGranted => "granted",
            Query::UserDetails => "user_details",
        }
    }
}

/// Typed query results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryReply {
    /// Result of [`Query::AwaitingApproval`].
    AwaitingApproval(AwaitingApprovalResponse),
    /// Result of [`Query::PermissionsGranted`].
    PermissionsGranted(PermissionsGrantedResponse),
    /// Result of [`Query::UserDetails`].
    UserDetails(UserDetailsResponse),
}
