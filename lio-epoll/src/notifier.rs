//! Wakeup descriptor for cutting a blocked wait short.
//!
//! A wait has no cancellation of its own. Register a [`Notifier`] for
//! [`InterestMask::READABLE`](crate::InterestMask::READABLE), call
//! [`Notifier::notify`] from any thread, and treat its readiness as the
//! wakeup signal. Uses eventfd, falling back to a non-blocking pipe.

use crate::error::Result;
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

#[derive(Debug)]
pub enum Notifier {
  /// The primary notifier, using eventfd.
  EventFd(OwnedFd),

  /// The fallback notifier, using a pipe.
  Pipe {
    /// The read end of the pipe.
    read_pipe: OwnedFd,

    /// The write end of the pipe.
    write_pipe: OwnedFd,
  },
}

impl AsFd for Notifier {
  fn as_fd(&self) -> BorrowedFd<'_> {
    match self {
      Notifier::EventFd(fd) => fd.as_fd(),
      Notifier::Pipe { read_pipe: read, .. } => read.as_fd(),
    }
  }
}

impl AsRawFd for Notifier {
  fn as_raw_fd(&self) -> RawFd {
    self.as_fd().as_raw_fd()
  }
}

fn pipe() -> io::Result<(OwnedFd, OwnedFd)> {
  let mut result = MaybeUninit::<[OwnedFd; 2]>::uninit();
  syscall!(pipe2(
    result.as_mut_ptr().cast::<libc::c_int>(),
    libc::O_CLOEXEC | libc::O_NONBLOCK
  ))?;
  // SAFETY: pipe2 succeeded, so both slots hold fresh descriptors.
  let [read, write] = unsafe { result.assume_init() };
  Ok((read, write))
}

impl Notifier {
  pub fn new() -> Result<Self> {
    match syscall!(eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK)) {
      Ok(fd) => {
        // SAFETY: eventfd returned a descriptor nothing else owns.
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        return Ok(Notifier::EventFd(owned));
      }
      Err(err) => {
        log::debug!("eventfd unavailable ({err}), falling back to a pipe");
      }
    }

    let (read, write) = pipe()?;
    Ok(Notifier::Pipe { read_pipe: read, write_pipe: write })
  }

  /// Make the notifier readable.
  ///
  /// Notifying an already pending notifier is fine; a full eventfd counter or
  /// pipe buffer still leaves it readable, so `EAGAIN` is not an error.
  pub fn notify(&self) -> Result<()> {
    let result = match self {
      Self::EventFd(fd) => {
        let buf: [u8; 8] = 1u64.to_ne_bytes();
        syscall!(write(
          fd.as_raw_fd(),
          buf.as_ptr().cast::<libc::c_void>(),
          buf.len()
        ))
      }

      Self::Pipe { write_pipe, .. } => {
        let buf = [1u8; 1];
        syscall!(write(
          write_pipe.as_raw_fd(),
          buf.as_ptr().cast::<libc::c_void>(),
          buf.len()
        ))
      }
    };

    match result {
      Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
      other => other.map(|_| ()).map_err(Into::into),
    }
  }

  /// Clear the notification.
  pub fn clear(&self) {
    match self {
      Self::EventFd(fd) => {
        const SIZE: usize = 8;
        let mut buf = [0u8; SIZE];
        match syscall!(read(
          fd.as_raw_fd(),
          buf.as_mut_ptr().cast::<libc::c_void>(),
          SIZE
        )) {
          Ok(_) => {}
          // Nothing pending.
          Err(err) if err.kind() == io::ErrorKind::WouldBlock => {}
          Err(err) => {
            log::warn!("clearing eventfd={} failed: {err}", fd.as_raw_fd());
          }
        }
      }

      Self::Pipe { read_pipe, .. } => {
        const SIZE: usize = 1024;
        let mut buf = [0u8; SIZE];
        loop {
          match syscall!(read(
            read_pipe.as_raw_fd(),
            buf.as_mut_ptr().cast::<libc::c_void>(),
            SIZE
          )) {
            Ok(n) if n > 0 => {}
            Ok(_) => break,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => {
              log::warn!(
                "clearing pipe fd={} failed: {err}",
                read_pipe.as_raw_fd()
              );
              break;
            }
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::is_readable_now;

  fn pipe_notifier() -> Notifier {
    let (read_pipe, write_pipe) = pipe().unwrap();
    Notifier::Pipe { read_pipe, write_pipe }
  }

  #[test]
  fn eventfd_notify_and_clear() {
    let notifier = Notifier::new().unwrap();
    assert!(!is_readable_now(notifier.as_raw_fd()));

    notifier.notify().unwrap();
    notifier.notify().unwrap();
    assert!(is_readable_now(notifier.as_raw_fd()));

    notifier.clear();
    assert!(!is_readable_now(notifier.as_raw_fd()));
  }

  #[test]
  fn clear_without_pending_notification() {
    for notifier in [Notifier::new().unwrap(), pipe_notifier()] {
      notifier.clear();
      assert!(!is_readable_now(notifier.as_raw_fd()));

      // Still usable after an empty clear.
      notifier.notify().unwrap();
      assert!(is_readable_now(notifier.as_raw_fd()));
      notifier.clear();
      assert!(!is_readable_now(notifier.as_raw_fd()));
    }
  }

  #[test]
  fn pipe_notify_and_clear() {
    let notifier = pipe_notifier();
    assert!(!is_readable_now(notifier.as_raw_fd()));

    for _ in 0..3 {
      notifier.notify().unwrap();
    }
    assert!(is_readable_now(notifier.as_raw_fd()));

    notifier.clear();
    assert!(!is_readable_now(notifier.as_raw_fd()));
  }

  #[test]
  fn pipe_notify_when_full_is_ok() {
    let notifier = pipe_notifier();
    // Default pipe capacity is 64KiB; overshoot it.
    for _ in 0..70_000 {
      notifier.notify().unwrap();
    }
    notifier.clear();
    assert!(!is_readable_now(notifier.as_raw_fd()));
  }
}
