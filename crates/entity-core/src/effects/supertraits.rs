//! Supertrait grouping the host-facing effect combination.

use super::{AttributeIndex, ClockEffects, ContinuationSignal, HandlerRegistry, TaskSpawner};

/// Everything a durable-execution host provides to one entity instance.
///
/// Activity contracts ([`super::ApprovalVerifier`], [`super::Notifier`])
/// stay separate: they are collaborator handles injected alongside the
/// host, not part of it.
pub trait EntityHost:
    ClockEffects + TaskSpawner + AttributeIndex + HandlerRegistry + ContinuationSignal
{
}

impl<T> EntityHost for T where
    T: ClockEffects + TaskSpawner + AttributeIndex + HandlerRegistry + ContinuationSignal
{
}
