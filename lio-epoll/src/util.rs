use std::io;
use std::time::Duration;

/// Convert `Option<Duration>` to an epoll millisecond timeout.
///
/// `None` blocks (`-1`). Sub-millisecond remainders round up so a short but
/// non-zero timeout never turns into a busy poll. Values past `i32::MAX`
/// milliseconds clamp.
pub fn duration_to_timeout_ms(timeout: Option<Duration>) -> i32 {
  match timeout {
    None => -1,
    Some(d) => {
      let mut ms = d.as_millis();
      if d.subsec_nanos() % 1_000_000 != 0 {
        ms += 1;
      }
      if ms > i32::MAX as u128 { i32::MAX } else { ms as i32 }
    }
  }
}

/// Check if an error means "not in the interest list"
///
/// `EBADF` counts too: closing a descriptor drops it from every epoll set it
/// was in, so there is nothing left to delete.
pub(crate) fn is_not_found_error(err: &io::Error) -> bool {
  matches!(err.raw_os_error(), Some(libc::ENOENT) | Some(libc::EBADF))
}
