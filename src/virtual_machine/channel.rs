//! Unbounded FIFO channels carrying words between callers and machines.
//!
//! A [`Channel`] is a handle to a shared queue: cloning it yields another
//! handle to the same queue. Wiring one machine's output handle in as another
//! machine's input is how networks are built. Every handle lives on the
//! driving thread, so the queue needs no locking.

use crate::virtual_machine::Word;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Shared single-threaded FIFO of words.
#[derive(Clone, Debug, Default)]
pub struct Channel {
    queue: Rc<RefCell<VecDeque<Word>>>,
}

impl Channel {
    /// Creates a new, empty, unshared channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value. Never blocks.
    pub fn push(&self, value: Word) {
        self.queue.borrow_mut().push_back(value);
    }

    /// Removes and returns the oldest value, if any.
    pub fn pop(&self) -> Option<Word> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns the oldest value without removing it.
    pub fn peek(&self) -> Option<Word> {
        self.queue.borrow().front().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Discards every queued value.
    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }

    /// Removes and returns every queued value, oldest first.
    pub fn drain(&self) -> Vec<Word> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Returns a copy of the queued values, oldest first.
    pub fn snapshot(&self) -> Vec<Word> {
        self.queue.borrow().iter().copied().collect()
    }

    /// Returns whether both handles refer to the same queue.
    pub fn is_shared_with(&self, other: &Channel) -> bool {
        Rc::ptr_eq(&self.queue, &other.queue)
    }
}

impl Extend<Word> for Channel {
    fn extend<I: IntoIterator<Item = Word>>(&mut self, iter: I) {
        self.queue.borrow_mut().extend(iter);
    }
}
