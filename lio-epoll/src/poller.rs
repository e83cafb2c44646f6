//! The readiness poller.
//!
//! Owns one epoll instance plus a table of what is registered with it. The
//! table is never handed to the kernel; it exists so that duplicate adds,
//! modifies of unknown descriptors and double removals are caught the same
//! way regardless of what the kernel would do.

use std::collections::HashMap;
use std::collections::hash_map;
use std::io;
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::time::Duration;

use crate::error::{Error, Result, ValidationError};
use crate::event::{Events, ReadyEvent, check_max_events};
use crate::interest::InterestMask;
use crate::options::PollerOptions;
use crate::sys::{self, CtlOp};
use crate::util::{duration_to_timeout_ms, is_not_found_error};

/// Edge-triggered readiness notification over one epoll instance.
///
/// # Threading
///
/// Not internally synchronized. All mutating calls take `&mut self`, which
/// gives the single-writer guarantee at compile time. The type is `Send`, so
/// it can move to another thread; to share it, wrap it in a lock. Several
/// threads waiting on the same epoll descriptor is something the kernel
/// allows but this type does not coordinate.
///
/// # Lifecycle
///
/// [`ReadinessPoller::destroy`] (or dropping the poller) closes the epoll
/// descriptor. The kernel drops every registration along with it, so no
/// per-descriptor removal is issued; the local table is just cleared.
#[derive(Debug)]
pub struct ReadinessPoller {
  epoll_fd: Option<OwnedFd>,
  registrations: HashMap<RawFd, InterestMask>,
  default_max_events: usize,
}

impl ReadinessPoller {
  /// Create a poller with default options and the given capacity hint.
  ///
  /// The hint is advisory, but must be positive.
  pub fn new(capacity_hint: i32) -> Result<Self> {
    Self::with_options(PollerOptions::new().capacity_hint(capacity_hint))
  }

  pub fn with_options(options: PollerOptions) -> Result<Self> {
    options.validate()?;

    let epoll_fd =
      sys::create(options.capacity_hint, options.close_on_exec).map_err(
        |err| {
          log::debug!("epoll instance creation failed: {err}");
          Error::from(err)
        },
      )?;

    log::debug!(
      "created epoll instance fd={} (hint={}, cloexec={})",
      epoll_fd.as_raw_fd(),
      options.capacity_hint,
      options.close_on_exec
    );

    Ok(Self {
      epoll_fd: Some(epoll_fd),
      registrations: HashMap::new(),
      default_max_events: options.default_max_events,
    })
  }

  fn epfd(&self) -> Result<RawFd> {
    match &self.epoll_fd {
      Some(fd) => Ok(fd.as_raw_fd()),
      None => Err(Error::from_errno(libc::EBADF)),
    }
  }

  fn check_descriptor(descriptor: RawFd) -> Result<()> {
    if descriptor < 0 {
      return Err(ValidationError::Descriptor(descriptor).into());
    }
    Ok(())
  }

  /// Start watching `descriptor`.
  ///
  /// The kernel is asked first; the table only records the registration once
  /// the kernel has accepted it.
  pub fn register(
    &mut self,
    descriptor: RawFd,
    interest: InterestMask,
  ) -> Result<()> {
    Self::check_descriptor(descriptor)?;
    let epfd = self.epfd()?;

    let hash_map::Entry::Vacant(slot) = self.registrations.entry(descriptor)
    else {
      return Err(Error::Duplicate { descriptor });
    };

    sys::ctl(epfd, CtlOp::Add, descriptor, interest.bits())?;
    slot.insert(interest);

    log::trace!("registered fd={descriptor} interest={interest:?}");
    Ok(())
  }

  /// Replace the interest of a registered descriptor.
  ///
  /// The new mask is a full snapshot, not a delta. On a one-shot registration
  /// this is also how the descriptor is re-armed.
  pub fn modify(
    &mut self,
    descriptor: RawFd,
    interest: InterestMask,
  ) -> Result<()> {
    Self::check_descriptor(descriptor)?;
    let epfd = self.epfd()?;

    let Some(stored) = self.registrations.get_mut(&descriptor) else {
      return Err(Error::NotFound { descriptor });
    };

    sys::ctl(epfd, CtlOp::Modify, descriptor, interest.bits())?;
    *stored = interest;

    log::trace!("modified fd={descriptor} interest={interest:?}");
    Ok(())
  }

  /// Stop watching `descriptor`.
  ///
  /// If the kernel no longer knows the descriptor (it was closed, which
  /// drops it from the interest list) the removal still succeeds. Any other
  /// kernel failure leaves the registration in place.
  pub fn deregister(&mut self, descriptor: RawFd) -> Result<()> {
    Self::check_descriptor(descriptor)?;
    let epfd = self.epfd()?;

    if !self.registrations.contains_key(&descriptor) {
      return Err(Error::NotFound { descriptor });
    }

    match sys::ctl(epfd, CtlOp::Delete, descriptor, 0) {
      Ok(()) => {}
      Err(err) if is_not_found_error(&err) => {
        log::trace!("fd={descriptor} already gone from epoll set ({err})");
      }
      Err(err) => return Err(err.into()),
    }
    self.registrations.remove(&descriptor);

    log::trace!("deregistered fd={descriptor}");
    Ok(())
  }

  /// Wait for ready descriptors.
  ///
  /// `timeout` is in milliseconds; `-1` blocks until something is ready and
  /// `0` returns immediately. At most `max_events` events are returned;
  /// anything else that is ready stays pending for the next call.
  ///
  /// A wait interrupted by a signal returns an empty batch rather than an
  /// error, so the caller's loop simply calls again.
  pub fn wait(
    &mut self,
    max_events: usize,
    timeout: i32,
  ) -> Result<Vec<ReadyEvent>> {
    // Scratch buffer lives for this call only and is freed on every return.
    let mut events = Events::with_capacity(max_events)?;
    self.wait_into(&mut events, timeout)?;
    Ok(events.iter().collect())
  }

  /// [`wait`](Self::wait) with a [`Duration`] timeout. `None` blocks.
  pub fn wait_timeout(
    &mut self,
    max_events: usize,
    timeout: Option<Duration>,
  ) -> Result<Vec<ReadyEvent>> {
    self.wait(max_events, duration_to_timeout_ms(timeout))
  }

  /// [`wait`](Self::wait) using the batch size from [`PollerOptions`].
  pub fn wait_default(&mut self, timeout: i32) -> Result<Vec<ReadyEvent>> {
    self.wait(self.default_max_events, timeout)
  }

  /// Wait into a caller-owned buffer, returning how many events it holds.
  ///
  /// The buffer's capacity plays the role of `max_events`. Its previous
  /// contents are discarded even if the wait fails.
  pub fn wait_into(
    &mut self,
    events: &mut Events,
    timeout: i32,
  ) -> Result<usize> {
    events.clear();

    check_max_events(events.capacity())?;
    if timeout < -1 {
      return Err(ValidationError::Timeout(timeout).into());
    }
    let epfd = self.epfd()?;

    let n = match sys::wait(epfd, events.as_buf_mut(), timeout) {
      Ok(n) => n,
      Err(err) if err.kind() == io::ErrorKind::Interrupted => {
        log::trace!("wait on epoll fd={epfd} interrupted, no events");
        0
      }
      Err(err) => return Err(err.into()),
    };
    events.set_len(n);

    log::trace!("wait on epoll fd={epfd} returned {n} event(s)");
    Ok(n)
  }

  /// Close the epoll instance.
  ///
  /// Idempotent. Registrations are not removed one by one; closing the
  /// instance drops them all in the kernel and the table is cleared to match.
  pub fn destroy(&mut self) {
    let Some(fd) = self.epoll_fd.take() else {
      return;
    };
    let raw = fd.into_raw_fd();
    let tracked = self.registrations.len();
    self.registrations.clear();

    if let Err(err) = syscall!(close(raw)) {
      log::warn!("closing epoll fd={raw} failed: {err}");
    }
    log::debug!(
      "destroyed epoll instance fd={raw} ({tracked} registration(s) dropped)"
    );
  }

  /// `true` once [`destroy`](Self::destroy) has run.
  pub fn is_closed(&self) -> bool {
    self.epoll_fd.is_none()
  }

  /// The epoll descriptor, unless destroyed.
  pub fn raw_fd(&self) -> Option<RawFd> {
    self.epoll_fd.as_ref().map(AsRawFd::as_raw_fd)
  }

  /// Number of tracked registrations.
  pub fn len(&self) -> usize {
    self.registrations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registrations.is_empty()
  }

  pub fn is_registered(&self, descriptor: RawFd) -> bool {
    self.registrations.contains_key(&descriptor)
  }

  /// Interest currently stored for `descriptor`.
  pub fn interest(&self, descriptor: RawFd) -> Option<InterestMask> {
    self.registrations.get(&descriptor).copied()
  }

  /// Iterate over `(descriptor, interest)` pairs in no particular order.
  pub fn registrations(&self) -> Registrations<'_> {
    Registrations { inner: self.registrations.iter() }
  }
}

impl Drop for ReadinessPoller {
  fn drop(&mut self) {
    self.destroy();
  }
}

/// Iterator returned by [`ReadinessPoller::registrations`].
pub struct Registrations<'a> {
  inner: hash_map::Iter<'a, RawFd, InterestMask>,
}

impl Iterator for Registrations<'_> {
  type Item = (RawFd, InterestMask);

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|(fd, interest)| (*fd, *interest))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

impl ExactSizeIterator for Registrations<'_> {}
