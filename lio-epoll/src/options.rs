use crate::error::{Result, ValidationError};
use crate::event::check_max_events;
use crate::poller::ReadinessPoller;

/// Construction options for a [`ReadinessPoller`].
///
/// ```rust,no_run
/// use lio_epoll::PollerOptions;
///
/// let poller = PollerOptions::new()
///   .capacity_hint(64)
///   .default_max_events(256)
///   .build()?;
/// # Ok::<(), lio_epoll::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerOptions {
  pub(crate) capacity_hint: i32,
  pub(crate) close_on_exec: bool,
  pub(crate) default_max_events: usize,
}

impl Default for PollerOptions {
  fn default() -> Self {
    Self::new()
  }
}

impl PollerOptions {
  pub const DEFAULT_CAPACITY_HINT: i32 = 1024;
  pub const DEFAULT_MAX_EVENTS: usize = 1024;

  pub const fn new() -> Self {
    Self {
      capacity_hint: Self::DEFAULT_CAPACITY_HINT,
      close_on_exec: true,
      default_max_events: Self::DEFAULT_MAX_EVENTS,
    }
  }

  /// Advisory sizing hint. Must be positive.
  pub const fn capacity_hint(mut self, hint: i32) -> Self {
    self.capacity_hint = hint;
    self
  }

  /// Whether the epoll descriptor is closed across `exec`. Defaults to `true`.
  ///
  /// Turning this off creates the instance with `epoll_create(hint)`.
  pub const fn close_on_exec(mut self, cloexec: bool) -> Self {
    self.close_on_exec = cloexec;
    self
  }

  /// Batch size used by [`ReadinessPoller::wait_default`]. Must be positive.
  pub const fn default_max_events(mut self, max_events: usize) -> Self {
    self.default_max_events = max_events;
    self
  }

  pub(crate) fn validate(&self) -> Result<()> {
    if self.capacity_hint <= 0 {
      return Err(ValidationError::CapacityHint(self.capacity_hint).into());
    }
    check_max_events(self.default_max_events)
  }

  /// Create a poller with these options.
  pub fn build(self) -> Result<ReadinessPoller> {
    ReadinessPoller::with_options(self)
  }
}
