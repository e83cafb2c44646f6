#![cfg(epoll)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # lio-epoll - Edge-triggered readiness notification
//!
//! A small polling core for building an event loop on top of Linux `epoll`.
//! It owns one kernel notification instance, tracks which descriptors are
//! registered with which interest, and hands back batches of ready events.
//!
//! There is no scheduler, no buffering and no retry policy here. What the
//! crate adds over the raw syscalls is descriptor lifecycle bookkeeping, a
//! typed error taxonomy and scoped event buffers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lio_epoll::{InterestMask, Notifier, ReadinessPoller};
//! use std::os::fd::AsRawFd;
//!
//! fn main() -> lio_epoll::Result<()> {
//!   let notifier = Notifier::new()?;
//!   let mut poller = ReadinessPoller::new(1024)?;
//!
//!   poller.register(
//!     notifier.as_raw_fd(),
//!     InterestMask::READABLE | InterestMask::EDGE_TRIGGERED,
//!   )?;
//!   notifier.notify()?;
//!
//!   for event in poller.wait(64, 1000)? {
//!     println!("fd {} is ready: {:?}", event.descriptor, event.observed);
//!   }
//!
//!   poller.destroy();
//!   Ok(())
//! }
//! ```
//!
//! ## Threading
//!
//! [`ReadinessPoller`] is **not** internally synchronized. Every mutating
//! call (`register`, `modify`, `deregister`, `wait`, `destroy`) takes
//! `&mut self`, so a single owner drives it. Callers that need to share a
//! poller between threads must wrap it in their own lock.
//!
//! A blocked [`ReadinessPoller::wait`] can only be cut short by its timeout or
//! by a registered descriptor becoming ready. Register a [`Notifier`] and call
//! [`Notifier::notify`] from another thread to wake it early.
//!
//! ## Error Handling
//!
//! Every fallible call returns [`Result`]. [`Error::Resource`] carries the
//! `errno` the kernel reported; the other variants mean the caller misused
//! the API and no OS call was made.

#[macro_use]
mod macros;

mod error;
mod event;
mod interest;
mod notifier;
mod options;
mod poller;
pub mod sys;
mod util;

#[cfg(test)]
pub(crate) mod tests;

pub use error::{Error, Result, ValidationError};
pub use event::{Events, EventsIter, ReadyEvent};
pub use interest::InterestMask;
pub use notifier::Notifier;
pub use options::PollerOptions;
pub use poller::{ReadinessPoller, Registrations};
pub use util::duration_to_timeout_ms;

/// Timeout value that makes [`ReadinessPoller::wait`] block until an event
/// arrives.
pub const BLOCK: i32 = -1;

/// Timeout value that makes [`ReadinessPoller::wait`] return immediately.
pub const NO_WAIT: i32 = 0;
