use std::fmt;
use std::io;
use std::os::fd::RawFd;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a poller operation.
///
/// [`Error::Resource`] means the kernel refused the call and carries its
/// `errno`. Every other variant means the caller misused the API; no OS call
/// was made for those.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
  /// The OS rejected the call.
  Resource { errno: i32 },
  /// The descriptor is already registered with this poller.
  Duplicate { descriptor: RawFd },
  /// The descriptor is not registered with this poller.
  NotFound { descriptor: RawFd },
  /// An argument was out of range.
  Validation(ValidationError),
}

/// Argument rejected before reaching the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
  CapacityHint(i32),
  MaxEvents(usize),
  Timeout(i32),
  Descriptor(RawFd),
}

impl Error {
  pub(crate) fn from_errno(errno: i32) -> Self {
    Self::Resource { errno }
  }

  /// The raw OS error code, if this is a [`Error::Resource`].
  pub fn errno(&self) -> Option<i32> {
    match self {
      Self::Resource { errno } => Some(*errno),
      _ => None,
    }
  }

  /// `true` when the caller misused the API rather than the OS refusing.
  pub fn is_misuse(&self) -> bool {
    !matches!(self, Self::Resource { .. })
  }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Resource { errno } => {
        write!(f, "os error: {}", io::Error::from_raw_os_error(*errno))
      }
      Self::Duplicate { descriptor } => {
        write!(f, "descriptor {descriptor} is already registered")
      }
      Self::NotFound { descriptor } => {
        write!(f, "descriptor {descriptor} is not registered")
      }
      Self::Validation(err) => fmt::Display::fmt(err, f),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::CapacityHint(v) => {
        write!(f, "capacity hint must be positive, got {v}")
      }
      Self::MaxEvents(v) => write!(
        f,
        "max_events must be between 1 and {}, got {v}",
        crate::sys::MAX_EVENTS
      ),
      Self::Timeout(v) => {
        write!(f, "timeout must be -1 or non-negative milliseconds, got {v}")
      }
      Self::Descriptor(v) => {
        write!(f, "descriptor must be non-negative, got {v}")
      }
    }
  }
}

impl From<ValidationError> for Error {
  fn from(err: ValidationError) -> Self {
    Self::Validation(err)
  }
}

impl From<io::Error> for Error {
  fn from(err: io::Error) -> Self {
    Self::from_errno(err.raw_os_error().unwrap_or(libc::EIO))
  }
}

impl From<Error> for io::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Resource { errno } => io::Error::from_raw_os_error(errno),
      Error::Duplicate { .. } => {
        io::Error::new(io::ErrorKind::AlreadyExists, err)
      }
      Error::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
      Error::Validation(_) => {
        io::Error::new(io::ErrorKind::InvalidInput, err)
      }
    }
  }
}
