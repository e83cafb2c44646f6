use crate::error::{Result, ValidationError};
use crate::interest::InterestMask;
use crate::sys::{self, NativeEvent};
use std::os::fd::RawFd;

/// A descriptor the kernel reported as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyEvent {
  pub descriptor: RawFd,
  /// What was observed. Never contains
  /// [`InterestMask::EDGE_TRIGGERED`] or [`InterestMask::ONESHOT`].
  pub observed: InterestMask,
}

impl ReadyEvent {
  pub(crate) fn from_native(native: &NativeEvent) -> Self {
    Self {
      descriptor: sys::event_descriptor(native),
      observed: InterestMask::from_bits_truncate(sys::event_bits(native))
        .observed(),
    }
  }

  pub fn is_readable(&self) -> bool {
    self.observed.is_readable()
  }

  pub fn is_writable(&self) -> bool {
    self.observed.is_writable()
  }

  pub fn is_error(&self) -> bool {
    self.observed.is_error()
  }

  pub fn is_hangup(&self) -> bool {
    self.observed.is_hangup()
  }
}

/// Scratch buffer that receives native event records from one wait.
///
/// The capacity bounds how many events a single wait can report; anything
/// beyond it stays pending in the kernel for the next call. Memory is
/// released when the buffer drops.
pub struct Events {
  buf: Vec<NativeEvent>,
  len: usize,
}

impl Events {
  /// Create an empty buffer with room for `capacity` events.
  ///
  /// `capacity` must be between 1 and [`sys::MAX_EVENTS`]; nothing is
  /// allocated otherwise.
  pub fn with_capacity(capacity: usize) -> Result<Self> {
    check_max_events(capacity)?;
    Ok(Self {
      buf: vec![NativeEvent { events: 0, u64: 0 }; capacity],
      len: 0,
    })
  }

  /// Maximum number of events one wait can fill in.
  pub fn capacity(&self) -> usize {
    self.buf.len()
  }

  /// Number of events filled in by the last wait.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn clear(&mut self) {
    self.len = 0;
  }

  /// Get an iterator over the events
  pub fn iter(&self) -> EventsIter<'_> {
    EventsIter { inner: self.buf[..self.len].iter() }
  }

  /// Returns the whole allocated buf
  pub(crate) fn as_buf_mut(&mut self) -> &mut [NativeEvent] {
    &mut self.buf
  }

  pub(crate) fn set_len(&mut self, len: usize) {
    assert!(len <= self.buf.len(), "set_len: len must be <= capacity");
    self.len = len;
  }
}

impl<'a> IntoIterator for &'a Events {
  type Item = ReadyEvent;
  type IntoIter = EventsIter<'a>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

/// Batch sizes `epoll_wait` accepts.
pub(crate) fn check_max_events(max_events: usize) -> Result<()> {
  if max_events == 0 || max_events > sys::MAX_EVENTS {
    return Err(ValidationError::MaxEvents(max_events).into());
  }
  Ok(())
}

/// Iterator over events
pub struct EventsIter<'a> {
  inner: std::slice::Iter<'a, NativeEvent>,
}

impl Iterator for EventsIter<'_> {
  type Item = ReadyEvent;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(ReadyEvent::from_native)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

impl ExactSizeIterator for EventsIter<'_> {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  #[test]
  fn translate_strips_modifiers_and_unknown_bits() {
    let native = NativeEvent {
      events: sys::EPOLLIN | sys::EPOLLHUP | sys::EPOLLET | libc::EPOLLRDHUP as u32,
      u64: 9,
    };
    let event = ReadyEvent::from_native(&native);
    assert_eq!(event.descriptor, 9);
    assert_eq!(event.observed, InterestMask::READABLE | InterestMask::HANGUP);
    assert!(event.is_readable());
    assert!(event.is_hangup());
    assert!(!event.is_writable());
    assert!(!event.is_error());
  }

  #[test]
  fn iter_only_covers_filled_prefix() {
    let mut events = Events::with_capacity(4).unwrap();
    assert_eq!(events.capacity(), 4);
    assert!(events.is_empty());

    let buf = events.as_buf_mut();
    buf[0] = NativeEvent { events: sys::EPOLLOUT, u64: 3 };
    buf[1] = NativeEvent { events: sys::EPOLLERR, u64: 5 };
    events.set_len(2);

    let got: Vec<_> = events.iter().collect();
    assert_eq!(
      got,
      vec![
        ReadyEvent { descriptor: 3, observed: InterestMask::WRITABLE },
        ReadyEvent { descriptor: 5, observed: InterestMask::ERROR },
      ]
    );

    events.clear();
    assert_eq!(events.iter().len(), 0);
  }

  #[test]
  #[should_panic(expected = "len must be <= capacity")]
  fn set_len_past_capacity_panics() {
    Events::with_capacity(1).unwrap().set_len(2);
  }

  #[test]
  fn capacity_out_of_range_is_rejected() {
    for capacity in [0, sys::MAX_EVENTS + 1, usize::MAX] {
      let err = Events::with_capacity(capacity).err().unwrap();
      assert_eq!(err, Error::Validation(ValidationError::MaxEvents(capacity)));
    }
  }
}
