//! Draining iterators over a [`ClosableQueue`].

use std::iter::FusedIterator;

use crate::queue::ClosableQueue;

/// Blocking iterator returned by [`ClosableQueue::iter`].
///
/// Each call to `next` is a [`read`](ClosableQueue::read). Iteration ends once
/// the queue is closed and drained, which is terminal.
#[derive(Debug)]
pub struct Iter<'a, T> {
    pub(crate) queue: &'a ClosableQueue<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.read().ok()
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Non-blocking iterator returned by [`ClosableQueue::try_iter`].
///
/// Stops at the first empty poll. Calling `next` again later may yield more
/// elements if writers are still active.
#[derive(Debug)]
pub struct TryIter<'a, T> {
    pub(crate) queue: &'a ClosableQueue<T>,
}

impl<T> Iterator for TryIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.try_read().ok()
    }
}

/// Owning blocking iterator, from `ClosableQueue::into_iter`.
#[derive(Debug)]
pub struct IntoIter<T> {
    queue: ClosableQueue<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.read().ok()
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<'a, T> IntoIterator for &'a ClosableQueue<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T> IntoIterator for ClosableQueue<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter { queue: self }
    }
}
