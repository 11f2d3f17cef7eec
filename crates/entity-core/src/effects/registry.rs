//! Handler registration and the closed dispatch surface.

use crate::errors::{EntityResult, HostError};
use crate::messages::{Command, CommandReply, EntityId, Query, QueryReply};
use async_trait::async_trait;
use std::sync::Arc;

/// The dispatch surface a control loop registers for its entity.
///
/// The host guarantees each accepted command is applied exactly once, in
/// delivery order, and its result returned synchronously to the caller.
/// Queries are pure reads: they never suspend and never mutate.
#[async_trait]
pub trait EntityDispatcher: Send + Sync {
    /// Apply one mutating command.
    async fn apply(&self, command: Command) -> EntityResult<CommandReply>;

    /// Answer one read-only query.
    fn inspect(&self, query: Query) -> QueryReply;
}

/// Host-side registry the control loop binds its dispatcher into.
pub trait HandlerRegistry: Send + Sync {
    /// Bind `dispatcher` as the handler set for `entity_id`.
    ///
    /// Failure here is fatal to the instance: the control loop aborts
    /// rather than run unreachable.
    fn register(
        &self,
        entity_id: &EntityId,
        dispatcher: Arc<dyn EntityDispatcher>,
    ) -> Result<(), HostError>;
}
