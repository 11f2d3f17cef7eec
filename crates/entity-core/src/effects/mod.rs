//! Effect trait definitions for the durable-execution host.
//!
//! Pure signatures only: this module defines **what** the entity may ask
//! of its host; handlers (a real durable-execution engine, or the
//! deterministic test host in `entity-testkit`) define **how**. The core
//! stays replay-safe by observing time and concurrency exclusively
//! through these interfaces.
//!
//! Suspension points are exactly two: an activity call
//! ([`ApprovalVerifier::verify_approver`]) and a durable wait
//! ([`ClockEffects::await_condition`] /
//! [`ClockEffects::await_condition_with_timeout`]). Reading the clock and
//! publishing indexed attributes do not suspend.

pub mod activity;
pub mod clock;
pub mod continuation;
pub mod index;
pub mod registry;
pub mod task;

mod supertraits;

pub use activity::{
    ApprovalVerifier, Notifier, SEND_NOTIFICATIONS_ACTIVITY, VERIFY_APPROVER_ACTIVITY,
};
pub use clock::{ClockEffects, Condition};
pub use continuation::ContinuationSignal;
pub use index::{AttributeIndex, AWAITING_APPROVAL_ATTRIBUTE, PERMISSIONS_ATTRIBUTE};
pub use registry::{EntityDispatcher, HandlerRegistry};
pub use supertraits::EntityHost;
pub use task::TaskSpawner;
