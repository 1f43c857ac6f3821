//! Fixed-capacity sample history for timeline rendering.

use std::collections::VecDeque;

/// Number of samples each history keeps.
pub const HISTORY_CAPACITY: usize = 20;

/// Insertion-ordered ring buffer that evicts its oldest sample when full.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    samples: VecDeque<T>,
}

impl<T: Clone> HistoryBuffer<T> {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Append a sample at the tail, evicting from the head past capacity.
    pub fn append(&mut self, sample: T) {
        self.samples.push_back(sample);
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    /// Copy of the samples, oldest first.
    pub fn snapshot_view(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<T: Clone> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
