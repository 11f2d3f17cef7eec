//! Entity Core - contracts for a durable, command-driven entity
//!
//! This crate defines the pure surface of the entity lifecycle system:
//! the typed command/query sets, the snapshot carried across continuation
//! boundaries, the error taxonomy, and the effect interfaces through which
//! the entity observes its durable-execution host.
//!
//! Nothing in here performs I/O or reads a clock. All non-determinism is
//! behind the traits in [`effects`], which a host (or the deterministic
//! test host in `entity-testkit`) implements. Code built on these
//! contracts can therefore be replayed safely by a durable-execution
//! engine.

#![forbid(unsafe_code)]

pub mod effects;
pub mod errors;
pub mod messages;
pub mod time;

pub use errors::{ActivityError, EntityError, EntityResult, HostError};
pub use messages::{
    AccountSnapshot, AddPermissionRequest, ApprovePermissionRequest, AwaitingApprovalResponse,
    Command, CommandReply, CreateUserRequest, DeleteUserRequest, EntityId, Permission,
    PermissionsGrantedResponse, Query, QueryReply, SendNotificationsRequest, UndoDeleteRequest,
    UserDetailsResponse, VerifyApproverRequest, VerifyApproverResponse,
};
pub use time::Timestamp;
