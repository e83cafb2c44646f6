use crate::sys;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub};

/// Interest/Event flags for I/O readiness
///
/// This type is used for both:
/// - Registering interest (what you want to be notified about)
/// - Receiving events (what actually happened)
///
/// Every flag carries the kernel's own bit value, so [`InterestMask::bits`]
/// can be handed to `epoll_ctl` as-is and event bits read back from
/// `epoll_wait` convert without remapping.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterestMask {
  bits: u32,
}

impl InterestMask {
  pub const EMPTY: Self = Self { bits: 0 };
  pub const READABLE: Self = Self { bits: sys::EPOLLIN };
  pub const WRITABLE: Self = Self { bits: sys::EPOLLOUT };
  pub const ERROR: Self = Self { bits: sys::EPOLLERR };
  pub const HANGUP: Self = Self { bits: sys::EPOLLHUP };
  pub const EDGE_TRIGGERED: Self = Self { bits: sys::EPOLLET };
  pub const ONESHOT: Self = Self { bits: sys::EPOLLONESHOT };

  /// Flags that only modify how a registration behaves. They are never
  /// reported back in a [`ReadyEvent`](crate::ReadyEvent).
  pub const MODIFIERS: Self =
    Self { bits: sys::EPOLLET | sys::EPOLLONESHOT };

  /// Every flag this type knows about.
  pub const ALL: Self = Self {
    bits: sys::EPOLLIN
      | sys::EPOLLOUT
      | sys::EPOLLERR
      | sys::EPOLLHUP
      | sys::EPOLLET
      | sys::EPOLLONESHOT,
  };

  const NAMES: [(Self, &'static str); 6] = [
    (Self::READABLE, "READABLE"),
    (Self::WRITABLE, "WRITABLE"),
    (Self::ERROR, "ERROR"),
    (Self::HANGUP, "HANGUP"),
    (Self::EDGE_TRIGGERED, "EDGE_TRIGGERED"),
    (Self::ONESHOT, "ONESHOT"),
  ];

  /// Raw OS representation.
  pub const fn bits(self) -> u32 {
    self.bits
  }

  /// Converts raw OS bits, returning `None` if any bit is not one of the
  /// six known flags.
  pub const fn from_bits(bits: u32) -> Option<Self> {
    if bits & !Self::ALL.bits != 0 {
      return None;
    }
    Some(Self { bits })
  }

  /// Converts raw OS bits, dropping anything unknown (`EPOLLPRI`,
  /// `EPOLLRDHUP`, ...).
  pub const fn from_bits_truncate(bits: u32) -> Self {
    Self { bits: bits & Self::ALL.bits }
  }

  pub const fn is_empty(self) -> bool {
    self.bits == 0
  }

  pub const fn is_readable(self) -> bool {
    self.bits & Self::READABLE.bits != 0
  }

  pub const fn is_writable(self) -> bool {
    self.bits & Self::WRITABLE.bits != 0
  }

  pub const fn is_error(self) -> bool {
    self.bits & Self::ERROR.bits != 0
  }

  pub const fn is_hangup(self) -> bool {
    self.bits & Self::HANGUP.bits != 0
  }

  pub const fn is_edge_triggered(self) -> bool {
    self.bits & Self::EDGE_TRIGGERED.bits != 0
  }

  pub const fn is_oneshot(self) -> bool {
    self.bits & Self::ONESHOT.bits != 0
  }

  /// Combine interests using bitwise OR
  pub const fn or(self, other: Self) -> Self {
    Self { bits: self.bits | other.bits }
  }

  /// Check if this interest contains all bits from another
  pub const fn contains(self, other: Self) -> bool {
    (self.bits & other.bits) == other.bits
  }

  /// Check if this interest shares any bit with another
  pub const fn intersects(self, other: Self) -> bool {
    (self.bits & other.bits) != 0
  }

  /// The subset of flags meaningful in a notification, with the request-only
  /// modifiers stripped.
  pub const fn observed(self) -> Self {
    Self { bits: self.bits & !Self::MODIFIERS.bits }
  }
}

impl BitOr for InterestMask {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self::Output {
    self.or(rhs)
  }
}

impl BitOrAssign for InterestMask {
  fn bitor_assign(&mut self, rhs: Self) {
    *self = self.or(rhs);
  }
}

impl BitAnd for InterestMask {
  type Output = Self;

  fn bitand(self, rhs: Self) -> Self::Output {
    Self { bits: self.bits & rhs.bits }
  }
}

impl Sub for InterestMask {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self::Output {
    Self { bits: self.bits & !rhs.bits }
  }
}

impl fmt::Debug for InterestMask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("InterestMask(")?;
    if self.is_empty() {
      f.write_str("EMPTY")?;
    }
    let mut first = true;
    for (flag, name) in Self::NAMES {
      if self.contains(flag) {
        if !first {
          f.write_str(" | ")?;
        }
        f.write_str(name)?;
        first = false;
      }
    }
    f.write_str(")")
  }
}
