//! The closable queue handle and its shared state.

use core::fmt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_utils::{Backoff, CachePadded};

use crate::error::{ReadError, TryReadError, TryWriteError, WriteError};
use crate::iter::{Iter, TryIter};
use crate::trace::{debug, trace};

/// Default number of backoff snooze iterations before parking.
///
/// Each snooze uses `crossbeam_utils::Backoff::snooze()` which starts with
/// spinning and eventually yields to the OS scheduler.
pub const DEFAULT_SNOOZE_ITERS: usize = 8;

/// Most elements preallocated at construction. Larger queues grow on demand.
const PREALLOC_LIMIT: usize = 1024;

/// Mutable queue state. Only touched with the mutex held.
struct State<T> {
    buffer: VecDeque<T>,
    closed: bool,
    parked_readers: usize,
    parked_writers: usize,
}

impl<T> State<T> {
    /// Whether a write could be appended right now.
    ///
    /// A zero-capacity queue only has room for a handoff to a reader that is
    /// already parked and has not yet been matched.
    #[inline]
    fn has_room(&self, capacity: usize) -> bool {
        if capacity == 0 {
            self.buffer.len() < self.parked_readers
        } else {
            self.buffer.len() < capacity
        }
    }
}

/// State shared by every clone of a [`ClosableQueue`].
///
/// `closed` and `count` mirror the locked state so that snapshots never
/// contend with writers and readers. They are cache-padded to keep snapshot
/// polling from bouncing the mutex's cache line.
struct Shared<T> {
    state: CachePadded<Mutex<State<T>>>,
    not_empty: Condvar,
    not_full: Condvar,
    closed: CachePadded<AtomicBool>,
    count: CachePadded<AtomicUsize>,
    capacity: usize,
    snooze_iters: usize,
}

impl<T> Shared<T> {
    /// Locks the state, recovering from poisoning.
    ///
    /// No user code runs while the lock is held, so a poisoned guard still
    /// protects consistent state.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn park<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, State<T>>,
    ) -> MutexGuard<'a, State<T>> {
        condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }

    /// Mirrors the buffer occupancy into the lock-free counter.
    ///
    /// Handoffs in a zero-capacity queue are never counted.
    #[inline]
    fn publish_count(&self, state: &State<T>) {
        let count = if self.capacity == 0 {
            0
        } else {
            state.buffer.len()
        };
        self.count.store(count, Ordering::Release);
    }

    /// Appends under the lock. Returns `true` if a parked reader needs waking.
    #[inline]
    fn push_locked(&self, state: &mut State<T>, value: T) -> bool {
        state.buffer.push_back(value);
        self.publish_count(state);
        state.parked_readers > 0
    }

    /// Returns `true` if a parked writer could now make progress.
    #[inline]
    fn writer_should_wake(&self, state: &State<T>) -> bool {
        state.parked_writers > 0 && state.has_room(self.capacity)
    }
}

/// A bounded multi-producer multi-consumer FIFO queue that can be closed.
///
/// The handle is cheap to clone; every clone refers to the same queue and all
/// operations take `&self`, so producers and consumers can live on any number
/// of threads.
///
/// Closing is one-way and idempotent. After [`close`](Self::close):
/// - every [`write`](Self::write) fails with [`WriteError`], returning the value
/// - [`read`](Self::read) keeps returning buffered elements until the queue is
///   drained, then returns [`ReadError`]
///
/// # Example
///
/// ```
/// use nexus_closable::ClosableQueue;
/// use std::thread;
///
/// let queue = ClosableQueue::<u64>::new(16);
///
/// let producer = {
///     let queue = queue.clone();
///     thread::spawn(move || {
///         for i in 0..100 {
///             queue.write(i).unwrap();
///         }
///         queue.close();
///     })
/// };
///
/// let received: Vec<u64> = queue.iter().collect();
/// producer.join().unwrap();
///
/// assert_eq!(received, (0..100).collect::<Vec<_>>());
/// ```
pub struct ClosableQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ClosableQueue<T> {
    /// Creates an open, empty queue holding at most `capacity` elements.
    ///
    /// A `capacity` of zero creates a rendezvous queue: nothing is ever
    /// buffered, each [`write`](Self::write) waits until a reader is parked in
    /// [`read`](Self::read) and hands its value straight to it, and
    /// [`count`](Self::count) is always zero.
    ///
    /// `capacity` is a logical bound only. At most a small fixed number of
    /// slots is allocated up front, so any `capacity` (including
    /// `usize::MAX`) is accepted and the buffer grows as elements arrive.
    ///
    /// Uses default backoff settings (8 snooze iterations before parking).
    /// For custom backoff tuning, use [`with_config`](Self::with_config).
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::ClosableQueue;
    ///
    /// let queue = ClosableQueue::<String>::new(5);
    /// assert_eq!(queue.capacity(), 5);
    /// assert_eq!(queue.count(), 0);
    /// assert!(queue.can_write());
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self::with_config(capacity, DEFAULT_SNOOZE_ITERS)
    }

    /// Creates a queue with custom backoff configuration.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of buffered elements (zero for rendezvous)
    /// * `snooze_iters` - Number of backoff iterations a blocking call spends
    ///   retrying before it parks on a condition variable. Zero parks
    ///   immediately.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::ClosableQueue;
    ///
    /// // Park straight away, for queues that are usually idle
    /// let queue = ClosableQueue::<u64>::with_config(1024, 0);
    /// assert_eq!(queue.capacity(), 1024);
    /// ```
    pub fn with_config(capacity: usize, snooze_iters: usize) -> Self {
        let shared = Shared {
            state: CachePadded::new(Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity.min(PREALLOC_LIMIT)),
                closed: false,
                parked_readers: 0,
                parked_writers: 0,
            })),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            closed: CachePadded::new(AtomicBool::new(false)),
            count: CachePadded::new(AtomicUsize::new(0)),
            capacity,
            snooze_iters,
        };

        Self {
            shared: Arc::new(shared),
        }
    }

    /// Writes a value into the queue, blocking while it is full.
    ///
    /// If the queue is full, this method will:
    /// 1. Try immediately (fast path)
    /// 2. Retry with backoff, eventually yielding to the scheduler
    /// 3. Park the thread until space is available or the queue is closed
    ///
    /// The closed check and the append happen under one lock acquisition, so a
    /// concurrent [`close`](Self::close) either lands before the write (and the
    /// write fails) or after it (and the value is drained by readers).
    ///
    /// # Errors
    ///
    /// Returns `Err(WriteError(value))` if the queue is closed, including when
    /// it is closed while this call is parked.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::ClosableQueue;
    ///
    /// let queue = ClosableQueue::new(2);
    /// queue.write("Test Data").unwrap();
    /// assert_eq!(queue.count(), 1);
    ///
    /// queue.close();
    /// let err = queue.write("More Data").unwrap_err();
    /// assert_eq!(err.into_inner(), "More Data");
    /// assert_eq!(queue.count(), 1);
    /// ```
    pub fn write(&self, value: T) -> Result<(), WriteError<T>> {
        let shared = &*self.shared;

        // Fast path
        let mut value = match self.try_write(value) {
            Ok(()) => return Ok(()),
            Err(TryWriteError::Closed(v)) => return Err(WriteError(v)),
            Err(TryWriteError::Full(v)) => v,
        };

        // Backoff phase
        let backoff = Backoff::new();
        for _ in 0..shared.snooze_iters {
            backoff.snooze();

            value = match self.try_write(value) {
                Ok(()) => return Ok(()),
                Err(TryWriteError::Closed(v)) => return Err(WriteError(v)),
                Err(TryWriteError::Full(v)) => v,
            };
        }

        // Park phase
        let mut state = shared.lock();
        loop {
            if state.closed {
                drop(state);
                trace!("write rejected while parked: queue closed");
                return Err(WriteError(value));
            }

            if state.has_room(shared.capacity) {
                let wake_reader = shared.push_locked(&mut state, value);
                drop(state);
                if wake_reader {
                    shared.not_empty.notify_one();
                }
                return Ok(());
            }

            state.parked_writers += 1;
            state = shared.park(&shared.not_full, state);
            state.parked_writers -= 1;
        }
    }

    /// Attempts to write a value without blocking.
    ///
    /// Returns immediately with:
    /// - `Ok(())` if the value was appended
    /// - `Err(TryWriteError::Full(value))` if there is no room
    /// - `Err(TryWriteError::Closed(value))` if the queue is closed
    ///
    /// A closed queue reports `Closed` even when it is also full. A
    /// zero-capacity queue only accepts a value when a reader is parked and
    /// waiting for one.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::{ClosableQueue, TryWriteError};
    ///
    /// let queue = ClosableQueue::new(1);
    ///
    /// assert!(queue.try_write(1).is_ok());
    /// assert!(matches!(queue.try_write(2), Err(TryWriteError::Full(2))));
    ///
    /// queue.close();
    /// assert!(matches!(queue.try_write(3), Err(TryWriteError::Closed(3))));
    /// ```
    pub fn try_write(&self, value: T) -> Result<(), TryWriteError<T>> {
        let shared = &*self.shared;

        // Closing is monotonic, so a set flag can be trusted without the lock.
        if shared.closed.load(Ordering::Acquire) {
            trace!("write rejected: queue closed");
            return Err(TryWriteError::Closed(value));
        }

        let mut state = shared.lock();
        if state.closed {
            drop(state);
            trace!("write rejected: queue closed");
            return Err(TryWriteError::Closed(value));
        }
        if !state.has_room(shared.capacity) {
            return Err(TryWriteError::Full(value));
        }

        let wake_reader = shared.push_locked(&mut state, value);
        drop(state);
        if wake_reader {
            shared.not_empty.notify_one();
        }
        Ok(())
    }

    /// Reads the oldest element, blocking while the queue is empty and open.
    ///
    /// Elements written before [`close`](Self::close) are always delivered:
    /// a closed queue keeps handing out buffered elements until it is
    /// drained.
    ///
    /// # Errors
    ///
    /// Returns `Err(ReadError)` once the queue is closed and empty. This is
    /// terminal and never blocks.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::{ClosableQueue, ReadError};
    ///
    /// let queue = ClosableQueue::new(4);
    /// queue.write(1).unwrap();
    /// queue.write(2).unwrap();
    /// queue.close();
    ///
    /// assert_eq!(queue.read(), Ok(1));
    /// assert_eq!(queue.read(), Ok(2));
    /// assert_eq!(queue.read(), Err(ReadError));
    /// ```
    pub fn read(&self) -> Result<T, ReadError> {
        let shared = &*self.shared;

        // Fast path
        match self.try_read() {
            Ok(v) => return Ok(v),
            Err(TryReadError::ClosedAndEmpty) => return Err(ReadError),
            Err(TryReadError::NoDataAvailable) => {}
        }

        // Backoff phase
        let backoff = Backoff::new();
        for _ in 0..shared.snooze_iters {
            backoff.snooze();

            match self.try_read() {
                Ok(v) => return Ok(v),
                Err(TryReadError::ClosedAndEmpty) => return Err(ReadError),
                Err(TryReadError::NoDataAvailable) => {}
            }
        }

        // Park phase
        let mut state = shared.lock();
        state.parked_readers += 1;

        // Registering opens a handoff slot on a zero-capacity queue.
        if shared.writer_should_wake(&state) {
            shared.not_full.notify_one();
        }

        let result = loop {
            if let Some(v) = state.buffer.pop_front() {
                break Ok(v);
            }
            if state.closed {
                break Err(ReadError);
            }
            state = shared.park(&shared.not_empty, state);
        };

        state.parked_readers -= 1;
        shared.publish_count(&state);
        let wake_writer = result.is_ok() && shared.writer_should_wake(&state);
        drop(state);
        if wake_writer {
            shared.not_full.notify_one();
        }
        result
    }

    /// Attempts to read an element without blocking.
    ///
    /// Returns immediately with:
    /// - `Ok(value)` if an element was buffered, even if the queue is closed
    /// - `Err(TryReadError::NoDataAvailable)` if the queue is empty and open
    /// - `Err(TryReadError::ClosedAndEmpty)` if the queue is closed and drained
    ///
    /// On a zero-capacity queue this only succeeds while a handoff to a parked
    /// reader is in flight.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::{ClosableQueue, TryReadError};
    ///
    /// let queue = ClosableQueue::new(4);
    /// assert_eq!(queue.try_read(), Err(TryReadError::NoDataAvailable));
    ///
    /// queue.write(7).unwrap();
    /// queue.close();
    /// assert_eq!(queue.try_read(), Ok(7));
    /// assert_eq!(queue.try_read(), Err(TryReadError::ClosedAndEmpty));
    /// ```
    pub fn try_read(&self) -> Result<T, TryReadError> {
        let shared = &*self.shared;

        let mut state = shared.lock();
        match state.buffer.pop_front() {
            Some(v) => {
                shared.publish_count(&state);
                let wake_writer = shared.writer_should_wake(&state);
                drop(state);
                if wake_writer {
                    shared.not_full.notify_one();
                }
                Ok(v)
            }
            None if state.closed => Err(TryReadError::ClosedAndEmpty),
            None => Err(TryReadError::NoDataAvailable),
        }
    }

    /// Closes the queue.
    ///
    /// Wakes every parked writer (they fail with [`WriteError`]) and every
    /// parked reader (they drain what is left, then see [`ReadError`]).
    /// Calling this again, from any thread, has no further effect.
    ///
    /// # Example
    ///
    /// ```
    /// use nexus_closable::ClosableQueue;
    ///
    /// let queue = ClosableQueue::<u64>::new(4);
    /// queue.close();
    /// queue.close();
    ///
    /// assert!(queue.is_closed());
    /// assert!(!queue.can_write());
    /// ```
    pub fn close(&self) {
        let shared = &*self.shared;

        let mut state = shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        shared.closed.store(true, Ordering::Release);
        debug!(
            remaining = state.buffer.len(),
            parked_readers = state.parked_readers,
            parked_writers = state.parked_writers,
            "queue closed"
        );
        drop(state);

        shared.not_full.notify_all();
        shared.not_empty.notify_all();
    }

    /// Returns the number of buffered elements.
    ///
    /// This is a snapshot: concurrent writes and reads may change it before
    /// the caller looks at the result, so it must not be used to synchronize.
    #[inline]
    pub fn count(&self) -> usize {
        self.shared.count.load(Ordering::Acquire)
    }

    /// Returns `true` if [`count`](Self::count) is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the capacity fixed at construction.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns `true` if the queue has not been closed.
    ///
    /// Advisory only: a close may race with a following
    /// [`write`](Self::write), which must still handle [`WriteError`].
    #[inline]
    pub fn can_write(&self) -> bool {
        !self.is_closed()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Returns a blocking iterator that ends when the queue is closed and
    /// drained.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { queue: self }
    }

    /// Returns an iterator over the elements available right now.
    ///
    /// Ends at the first empty poll, whether or not the queue is closed.
    pub fn try_iter(&self) -> TryIter<'_, T> {
        TryIter { queue: self }
    }
}

impl<T> Clone for ClosableQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for ClosableQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosableQueue")
            .field("capacity", &self.capacity())
            .field("count", &self.count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
