//! Host-facing lifecycle interface for managed resources.
//!
//! An orchestration host owns diffing, planning and state persistence. It
//! drives resources through this trait and records whatever state the
//! operations return.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Default deadline for create and delete waits.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Future returned by lifecycle operations.
pub type LifecycleFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Result of refreshing a resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadOutcome<S> {
    /// The resource exists; its current state is attached.
    Found(S),
    /// The resource no longer exists and should be dropped from host state.
    Gone,
}

impl<S> ReadOutcome<S> {
    /// Returns the state when the resource exists.
    #[must_use]
    pub fn found(self) -> Option<S> {
        match self {
            Self::Found(state) => Some(state),
            Self::Gone => None,
        }
    }

    /// Returns `true` when the resource no longer exists.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }
}

/// Deadlines for the operations that wait on the provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timeouts {
    /// Deadline for a create to become active.
    pub create: Duration,
    /// Deadline for a delete to complete.
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_OPERATION_TIMEOUT,
            delete: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

/// Lifecycle operations a host invokes on a resource type.
pub trait Lifecycle {
    /// Desired configuration supplied by the host.
    type Config;
    /// State returned to the host.
    type State;
    /// Error type returned by the operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates the resource and waits until it is usable.
    fn create<'a>(&'a self, config: &'a Self::Config)
    -> LifecycleFuture<'a, Self::State, Self::Error>;

    /// Refreshes the resource identified by `id`.
    fn read<'a>(
        &'a self,
        id: &'a str,
    ) -> LifecycleFuture<'a, ReadOutcome<Self::State>, Self::Error>;

    /// Applies in-place changes from `prior` towards `desired`.
    fn update<'a>(
        &'a self,
        id: &'a str,
        prior: &'a Self::State,
        desired: &'a Self::Config,
    ) -> LifecycleFuture<'a, Self::State, Self::Error>;

    /// Destroys the resource and waits until it is gone.
    fn delete<'a>(&'a self, id: &'a str) -> LifecycleFuture<'a, (), Self::Error>;

    /// Adopts an existing resource by its remote identifier.
    fn import<'a>(&'a self, id: &'a str) -> LifecycleFuture<'a, Self::State, Self::Error>;

    /// Deadlines applied by the waiting operations.
    fn timeouts(&self) -> Timeouts;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_are_ten_minutes() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.create, Duration::from_secs(600));
        assert_eq!(timeouts.delete, Duration::from_secs(600));
    }

    #[test]
    fn read_outcome_accessors() {
        assert_eq!(ReadOutcome::Found(7).found(), Some(7));
        assert!(ReadOutcome::<u8>::Gone.is_gone());
        assert_eq!(ReadOutcome::<u8>::Gone.found(), None);
    }
}
