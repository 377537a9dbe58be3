use std::collections::vec_deque;
use std::collections::VecDeque;

use crate::error::{Result, SessionError};

/// Fixed-capacity FIFO of the most recent samples.
///
/// Adding at capacity evicts the oldest sample first. Not synchronized;
/// wrap it in a lock when it has to be shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindow<T> {
    capacity: usize,
    elements: VecDeque<T>,
}

impl<T> SlidingWindow<T> {
    /// # Errors
    /// `SessionError::InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SessionError::InvalidArgument(
                "sliding window capacity must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            elements: VecDeque::with_capacity(capacity),
        })
    }

    pub fn add(&mut self, sample: T) {
        if self.elements.len() >= self.capacity {
            self.elements.pop_front();
        }
        self.elements.push_back(sample);
    }

    pub fn add_all<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = T>,
    {
        for sample in samples {
            self.add(sample);
        }
    }

    /// Oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently added sample.
    pub fn latest(&self) -> Option<&T> {
        self.elements.back()
    }

    pub fn count<P>(&self, mut predicate: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        self.elements.iter().filter(|&sample| predicate(sample)).count()
    }
}

impl<'a, T> IntoIterator for &'a SlidingWindow<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
