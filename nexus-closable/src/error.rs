//! Error types for queue operations.

use core::fmt;

/// Error returned by [`ClosableQueue::write`](crate::ClosableQueue::write)
/// when the queue has been closed.
///
/// Contains the value that could not be written, so nothing is dropped
/// silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteError<T>(pub T);

impl<T> WriteError<T> {
    /// Returns the value that could not be written.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for WriteError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot write to closed queue")
    }
}

impl<T: fmt::Debug> std::error::Error for WriteError<T> {}

/// Error returned by [`ClosableQueue::try_write`](crate::ClosableQueue::try_write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryWriteError<T> {
    /// The queue is at capacity but still open.
    ///
    /// For a zero-capacity queue this means no reader is waiting.
    Full(T),

    /// The queue has been closed.
    Closed(T),
}

impl<T> TryWriteError<T> {
    /// Returns the value that could not be written.
    pub fn into_inner(self) -> T {
        match self {
            TryWriteError::Full(v) | TryWriteError::Closed(v) => v,
        }
    }

    /// Returns `true` if this error is the `Full` variant.
    pub fn is_full(&self) -> bool {
        matches!(self, TryWriteError::Full(_))
    }

    /// Returns `true` if this error is the `Closed` variant.
    pub fn is_closed(&self) -> bool {
        matches!(self, TryWriteError::Closed(_))
    }
}

impl<T> From<WriteError<T>> for TryWriteError<T> {
    fn from(err: WriteError<T>) -> Self {
        TryWriteError::Closed(err.0)
    }
}

impl<T> fmt::Display for TryWriteError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryWriteError::Full(_) => write!(f, "queue full"),
            TryWriteError::Closed(_) => write!(f, "cannot write to closed queue"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TryWriteError<T> {}

/// Error returned by [`ClosableQueue::read`](crate::ClosableQueue::read).
///
/// The queue has been closed and every element written before the close has
/// been consumed. This is terminal: all later reads return it as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadError;

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue closed and empty")
    }
}

impl std::error::Error for ReadError {}

/// Error returned by [`ClosableQueue::try_read`](crate::ClosableQueue::try_read).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryReadError {
    /// The queue is empty but still open. Data may arrive later.
    NoDataAvailable,

    /// The queue has been closed and no elements remain.
    ClosedAndEmpty,
}

impl TryReadError {
    /// Returns `true` if this error is the `NoDataAvailable` variant.
    pub fn is_empty(&self) -> bool {
        matches!(self, TryReadError::NoDataAvailable)
    }

    /// Returns `true` if this error is the `ClosedAndEmpty` variant.
    pub fn is_closed(&self) -> bool {
        matches!(self, TryReadError::ClosedAndEmpty)
    }
}

impl From<ReadError> for TryReadError {
    fn from(_: ReadError) -> Self {
        TryReadError::ClosedAndEmpty
    }
}

impl fmt::Display for TryReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryReadError::NoDataAvailable => write!(f, "no data available"),
            TryReadError::ClosedAndEmpty => write!(f, "queue closed and empty"),
        }
    }
}

impl std::error::Error for TryReadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_error_returns_value() {
        let err = WriteError(String::from("payload"));
        assert_eq!(err.to_string(), "cannot write to closed queue");
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn try_write_error_variants() {
        let full = TryWriteError::Full(1);
        let closed = TryWriteError::Closed(2);

        assert!(full.is_full());
        assert!(!full.is_closed());
        assert!(closed.is_closed());
        assert_eq!(full.to_string(), "queue full");
        assert_eq!(closed.into_inner(), 2);

        let converted: TryWriteError<u8> = WriteError(7).into();
        assert_eq!(converted, TryWriteError::Closed(7));
    }

    #[test]
    fn read_errors_are_distinguishable() {
        assert!(TryReadError::NoDataAvailable.is_empty());
        assert!(TryReadError::ClosedAndEmpty.is_closed());
        assert_ne!(TryReadError::NoDataAvailable, TryReadError::ClosedAndEmpty);
        assert_eq!(TryReadError::from(ReadError), TryReadError::ClosedAndEmpty);
        assert_eq!(ReadError.to_string(), TryReadError::ClosedAndEmpty.to_string());
    }
}
