//! Raw epoll bindings.
//!
//! Constants here carry the kernel's own bit values and op codes. Nothing in
//! this module keeps state; [`crate::ReadinessPoller`] layers the
//! registration table on top.

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

/// Descriptor is readable.
pub const EPOLLIN: u32 = libc::EPOLLIN as u32;
/// Descriptor is writable.
pub const EPOLLOUT: u32 = libc::EPOLLOUT as u32;
/// Error condition on the descriptor. Always reported, never needs requesting.
pub const EPOLLERR: u32 = libc::EPOLLERR as u32;
/// Hang up on the descriptor. Always reported, never needs requesting.
pub const EPOLLHUP: u32 = libc::EPOLLHUP as u32;
/// Request edge-triggered notification.
pub const EPOLLET: u32 = libc::EPOLLET as u32;
/// Request one-shot notification.
pub const EPOLLONESHOT: u32 = libc::EPOLLONESHOT as u32;

/// Add a descriptor to the interest list.
pub const EPOLL_CTL_ADD: i32 = libc::EPOLL_CTL_ADD;
/// Change the event mask of a registered descriptor.
pub const EPOLL_CTL_MOD: i32 = libc::EPOLL_CTL_MOD;
/// Remove a descriptor from the interest list.
pub const EPOLL_CTL_DEL: i32 = libc::EPOLL_CTL_DEL;

/// Native event record filled in by `epoll_wait`.
pub type NativeEvent = libc::epoll_event;

/// Largest batch `epoll_wait` accepts (the kernel's `EP_MAX_EVENTS`).
pub const MAX_EVENTS: usize =
  i32::MAX as usize / std::mem::size_of::<NativeEvent>();

/// Control operation passed to `epoll_ctl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtlOp {
  Add,
  Modify,
  Delete,
}

impl CtlOp {
  pub const fn as_raw(self) -> i32 {
    match self {
      Self::Add => EPOLL_CTL_ADD,
      Self::Modify => EPOLL_CTL_MOD,
      Self::Delete => EPOLL_CTL_DEL,
    }
  }
}

/// Create an epoll instance.
///
/// With `cloexec` the instance is created through `epoll_create1`, which has
/// no size argument. Otherwise the legacy `epoll_create(hint)` is used and the
/// kernel receives the hint (it only checks that it is positive).
pub fn create(hint: i32, cloexec: bool) -> io::Result<OwnedFd> {
  let fd = if cloexec {
    syscall!(epoll_create1(libc::EPOLL_CLOEXEC))?
  } else {
    syscall!(epoll_create(hint))?
  };

  // SAFETY: the kernel just handed us this descriptor and nothing else owns it.
  Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Issue one `epoll_ctl` call.
///
/// The descriptor is stored as the event payload so that wait results map
/// back to it directly.
pub fn ctl(epfd: RawFd, op: CtlOp, fd: RawFd, events: u32) -> io::Result<()> {
  let mut event = NativeEvent { events, u64: fd as u64 };

  let event_ptr = match op {
    // For EPOLL_CTL_DEL, event pointer can be NULL in Linux 2.6.9+
    CtlOp::Delete => std::ptr::null_mut(),
    CtlOp::Add | CtlOp::Modify => &mut event as *mut NativeEvent,
  };

  syscall!(epoll_ctl(epfd, op.as_raw(), fd, event_ptr))?;
  Ok(())
}

/// Wait for events on `epfd`, filling `events` from the front.
///
/// Returns the number of records written. An interrupted wait surfaces as an
/// [`io::ErrorKind::Interrupted`] error; the caller decides what it means.
pub fn wait(
  epfd: RawFd,
  events: &mut [NativeEvent],
  timeout_ms: i32,
) -> io::Result<usize> {
  assert!(timeout_ms >= -1, "timeout_ms must be >= -1, got {}", timeout_ms);
  let max = i32::try_from(events.len()).unwrap_or(i32::MAX);

  let n =
    syscall!(epoll_wait(epfd, events.as_mut_ptr(), max, timeout_ms))? as usize;

  assert!(
    n <= events.len(),
    "epoll_wait returned more events ({}) than buffer size ({})",
    n,
    events.len()
  );
  Ok(n)
}

/// Descriptor stored in a native event's payload.
pub fn event_descriptor(event: &NativeEvent) -> RawFd {
  event.u64 as RawFd
}

/// Raw event bits of a native event.
pub fn event_bits(event: &NativeEvent) -> u32 {
  event.events
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::os::fd::AsRawFd;

  #[test]
  fn constants_match_kernel_abi() {
    assert_eq!(EPOLLIN, 0x001);
    assert_eq!(EPOLLOUT, 0x004);
    assert_eq!(EPOLLERR, 0x008);
    assert_eq!(EPOLLHUP, 0x010);
    assert_eq!(EPOLLONESHOT, 1 << 30);
    assert_eq!(EPOLLET, 1 << 31);
    assert_eq!(EPOLL_CTL_ADD, 1);
    assert_eq!(EPOLL_CTL_DEL, 2);
    assert_eq!(EPOLL_CTL_MOD, 3);
  }

  #[test]
  fn max_events_matches_kernel_limit() {
    let size = std::mem::size_of::<NativeEvent>();
    assert!(MAX_EVENTS * size <= i32::MAX as usize);
    assert!((MAX_EVENTS + 1) * size > i32::MAX as usize);
  }

  #[test]
  fn ctl_op_codes() {
    assert_eq!(CtlOp::Add.as_raw(), libc::EPOLL_CTL_ADD);
    assert_eq!(CtlOp::Modify.as_raw(), libc::EPOLL_CTL_MOD);
    assert_eq!(CtlOp::Delete.as_raw(), libc::EPOLL_CTL_DEL);
  }

  #[test]
  fn create_legacy_rejects_zero_hint() {
    let err = create(0, false).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
  }

  #[test]
  fn create_both_paths() {
    let a = create(1, true).unwrap();
    let b = create(16, false).unwrap();
    assert!(a.as_raw_fd() >= 0);
    assert!(b.as_raw_fd() >= 0);
    assert_ne!(a.as_raw_fd(), b.as_raw_fd());
  }

  #[test]
  fn ctl_on_bad_descriptor() {
    let ep = create(1, true).unwrap();
    let err = ctl(ep.as_raw_fd(), CtlOp::Add, 1_000_000, EPOLLIN).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EBADF));
  }

  #[test]
  fn wait_empty_returns_zero() {
    let ep = create(1, true).unwrap();
    let mut events = [NativeEvent { events: 0, u64: 0 }; 4];
    assert_eq!(wait(ep.as_raw_fd(), &mut events, 0).unwrap(), 0);
  }
}
