//! A bounded MPMC queue with an explicit, idempotent close.
//!
//! [`ClosableQueue`] is a fixed-capacity FIFO that any number of threads can
//! write to and read from. On top of plain blocking send/recv it adds:
//!
//! - a query-able closed state ([`can_write`](ClosableQueue::can_write),
//!   [`is_closed`](ClosableQueue::is_closed))
//! - a live element count ([`count`](ClosableQueue::count))
//! - a close that can be called any number of times, from any thread, and
//!   never panics or loses a value
//!
//! # Lifecycle
//!
//! ```text
//!   new(capacity)          close()
//! ┌───────────────┐      ┌───────────────────────────────┐
//! │ OPEN          │ ───> │ CLOSED                        │
//! │ write: blocks │      │ write: Err(WriteError(value)) │
//! │   while full  │      │ read:  drains buffered values │
//! │ read: blocks  │      │        then Err(ReadError)    │
//! │   while empty │      └───────────────────────────────┘
//! └───────────────┘          (one-way, idempotent)
//! ```
//!
//! # Example
//!
//! ```
//! use nexus_closable::{ClosableQueue, ReadError};
//!
//! let queue = ClosableQueue::new(5);
//!
//! queue.write("Test Data").unwrap();
//! assert_eq!(queue.count(), 1);
//! assert_eq!(queue.read().unwrap(), "Test Data");
//!
//! queue.close();
//! assert!(!queue.can_write());
//! assert!(queue.write("More Data").is_err());
//! assert_eq!(queue.read(), Err(ReadError));
//! ```
//!
//! # Read Policy
//!
//! [`read`](ClosableQueue::read) blocks until an element is available or the
//! queue is both closed and empty. Everything successfully written before
//! [`close`](ClosableQueue::close) is delivered, so a consumer loop can simply
//! run until it sees [`ReadError`]:
//!
//! ```
//! use nexus_closable::ClosableQueue;
//! use std::thread;
//!
//! let queue = ClosableQueue::<u64>::new(8);
//!
//! let consumer = {
//!     let queue = queue.clone();
//!     thread::spawn(move || queue.iter().sum::<u64>())
//! };
//!
//! for i in 0..100 {
//!     queue.write(i).unwrap();
//! }
//! queue.close();
//!
//! assert_eq!(consumer.join().unwrap(), 4950);
//! ```
//!
//! The non-blocking [`try_read`](ClosableQueue::try_read) follows the same
//! policy: a closed queue that still holds elements keeps returning them, and
//! [`TryReadError::NoDataAvailable`] is distinct from
//! [`TryReadError::ClosedAndEmpty`].
//!
//! # Zero Capacity
//!
//! `ClosableQueue::new(0)` is a rendezvous queue. Nothing is buffered: a write
//! waits until a reader is parked and hands the value straight to it.
//!
//! # Blocking Strategy
//!
//! Blocking calls avoid the condition variable until cheaper options are
//! exhausted:
//!
//! ```text
//! Phase 1: Fast path      try the operation once under the lock
//! Phase 2: Backoff        crossbeam Backoff::snooze() + retry (default 8x)
//! Phase 3: Park           Condvar wait until notified or closed
//! ```
//!
//! Writers and readers record themselves as parked under the lock, so the
//! opposite side only issues a notification when someone is actually asleep.
//! Tune phase 2 with [`ClosableQueue::with_config`].
//!
//! # Close Race
//!
//! The closed check and the append in [`write`](ClosableQueue::write) happen
//! under one lock acquisition, and [`close`](ClosableQueue::close) takes the
//! same lock. A write racing a close therefore either completes before it (and
//! its value is drained by readers) or fails cleanly with [`WriteError`].
//! [`count`](ClosableQueue::count) and [`can_write`](ClosableQueue::can_write)
//! read atomic mirrors and never touch the lock; they are snapshots only.
//!
//! # Tracing
//!
//! With the `tracing` feature enabled the queue emits a `debug` event on close
//! and `trace` events on rejected writes. Without it, nothing is logged.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod iter;
mod queue;
mod trace;

pub use error::{ReadError, TryReadError, TryWriteError, WriteError};
pub use iter::{IntoIter, Iter, TryIter};
pub use queue::{ClosableQueue, DEFAULT_SNOOZE_ITERS};
pub use trace::init_tracing;
