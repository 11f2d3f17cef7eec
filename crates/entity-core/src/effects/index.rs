//! Host-maintained indexed attributes for external listing/search.

use crate::errors::HostError;

/// Index key holding the current granted set.
pub const PERMISSIONS_ATTRIBUTE: &str = "permissions";

/// Index key holding the current pending set.
pub const AWAITING_APPROVAL_ATTRIBUTE: &str = "awaitingApproval";

/// Publishes key → value-set projections the host indexes per entity.
///
/// Publishing is synchronous — it is not a suspension point. The entity
/// republishes both keys after every mutation that changes them so
/// external search always reflects current state.
pub trait AttributeIndex: Send + Sync {
    /// Replace the indexed value set for `key`.
    fn publish(&self, key: &'static str, values: Vec<String>) -> Result<(), HostError>;
}
