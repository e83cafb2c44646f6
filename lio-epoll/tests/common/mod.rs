#![allow(dead_code)]

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};

/// Create a non-blocking pipe, returning `(read, write)`.
pub fn pipe() -> (OwnedFd, OwnedFd) {
  let mut fds = [0i32; 2];
  let rc = unsafe {
    libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK)
  };
  assert_eq!(rc, 0, "pipe2 failed: {}", io::Error::last_os_error());
  unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
}

/// Create a pair of connected, non-blocking Unix stream sockets.
pub fn socket_pair() -> (OwnedFd, OwnedFd) {
  let mut fds = [0i32; 2];
  let rc = unsafe {
    libc::socketpair(
      libc::AF_UNIX,
      libc::SOCK_STREAM | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
      0,
      fds.as_mut_ptr(),
    )
  };
  assert_eq!(rc, 0, "socketpair failed: {}", io::Error::last_os_error());
  unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
}

pub fn write_all(fd: RawFd, data: &[u8]) {
  let n = unsafe {
    libc::write(fd, data.as_ptr().cast::<libc::c_void>(), data.len())
  };
  assert_eq!(
    n,
    data.len() as isize,
    "write failed: {}",
    io::Error::last_os_error()
  );
}

/// Read until the descriptor reports `EAGAIN`, returning the byte count.
pub fn drain(fd: RawFd) -> usize {
  let mut buf = [0u8; 4096];
  let mut total = 0;
  loop {
    let n = unsafe {
      libc::read(fd, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len())
    };
    if n > 0 {
      total += n as usize;
      continue;
    }
    if n == 0 {
      return total;
    }
    let err = io::Error::last_os_error();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock, "read failed: {err}");
    return total;
  }
}

/// Read exactly `len` bytes that are known to be buffered.
pub fn read_some(fd: RawFd, len: usize) -> usize {
  let mut buf = vec![0u8; len];
  let n =
    unsafe { libc::read(fd, buf.as_mut_ptr().cast::<libc::c_void>(), len) };
  assert!(n >= 0, "read failed: {}", io::Error::last_os_error());
  n as usize
}
