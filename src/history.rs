//! Bounded in-memory window of the most recent readings

use crate::models::Reading;
use std::collections::VecDeque;

/// FIFO buffer keeping at most `capacity` readings, oldest first
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    inner: VecDeque<Reading>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a reading, evicting the oldest when full. Returns the evicted reading if any.
    pub fn push(&mut self, reading: Reading) -> Option<Reading> {
        let evicted = if self.inner.len() >= self.capacity {
            self.inner.pop_front()
        } else {
            None
        };
        self.inner.push_back(reading);
        evicted
    }

    /// Owned copy of the window in chronological order
    pub fn snapshot(&self) -> Vec<Reading> {
        self.inner.iter().cloned().collect()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.inner.back()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.inner.iter().map(|r| r.price).collect()
    }

    /// Set forecasts, in order, on entries that have none yet.
    ///
    /// A forecast is never replaced once set. Returns the entries that
    /// received one.
    pub fn annotate(&mut self, predictions: &[Option<f64>]) -> Vec<Reading> {
        let mut annotated = Vec::new();
        for (reading, predicted) in self.inner.iter_mut().zip(predictions) {
            if reading.predicted_price.is_none() && predicted.is_some() {
                reading.predicted_price = *predicted;
                annotated.push(reading.clone());
            }
        }
        annotated
    }

    /// Move log row indices up past the data rows removed by compaction
    pub fn shift_rows(&mut self, removed: &[usize]) {
        if removed.is_empty() {
            return;
        }
        for reading in self.inner.iter_mut() {
            if let Some(row) = reading.row {
                reading.row = Some(shifted_row(row, removed));
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Index of `row` once the sorted `removed` rows are gone
pub fn shifted_row(row: usize, removed: &[usize]) -> usize {
    row - removed.partition_point(|&r| r < row)
}
