// Helper utilities shared by the unit tests.

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

/// Create a pair of connected sockets (Unix domain socket pair)
pub fn create_socket_pair() -> io::Result<(OwnedFd, OwnedFd)> {
  let mut fds = [0i32; 2];

  syscall!(socketpair(
    libc::AF_UNIX,
    libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
    0,
    fds.as_mut_ptr()
  ))?;

  // SAFETY: socketpair succeeded and returned two fresh descriptors.
  Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

/// Create a non-blocking pipe, returning `(read, write)`.
pub fn create_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
  let mut fds = [0i32; 2];
  syscall!(pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK))?;

  // SAFETY: pipe2 succeeded and returned two fresh descriptors.
  Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

pub fn write_bytes(fd: RawFd, data: &[u8]) -> io::Result<usize> {
  let n = syscall!(write(fd, data.as_ptr().cast::<libc::c_void>(), data.len()))?;
  Ok(n as usize)
}

/// `poll(2)` the descriptor once without blocking.
pub fn is_readable_now(fd: RawFd) -> bool {
  let mut pfd = libc::pollfd { fd, events: libc::POLLIN, revents: 0 };
  let n = syscall!(poll(&mut pfd, 1, 0)).expect("poll failed");
  n == 1 && pfd.revents & libc::POLLIN != 0
}
