//! Bounded measurement history
//!
//! Insertion-ordered log of every acquired measurement. When a capacity is
//! set, pushing onto a full log evicts the oldest entry.

use std::collections::VecDeque;
use std::sync::Arc;

use uuid::Uuid;

use crate::measurement::Measurement;

#[derive(Debug, Default)]
pub struct MeasurementHistory {
    entries: VecDeque<Arc<Measurement>>,
    /// 0 = unbounded
    capacity: usize,
}

impl MeasurementHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append, evicting the oldest entry when full
    pub fn push(&mut self, measurement: Arc<Measurement>) {
        if self.capacity > 0 {
            while self.entries.len() >= self.capacity {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(measurement);
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Measurement>> {
        self.entries.iter().find(|m| m.id() == id).cloned()
    }

    /// Most recently appended entry
    pub fn latest(&self) -> Option<Arc<Measurement>> {
        self.entries.back().cloned()
    }

    /// Oldest first
    pub fn list(&self) -> Vec<Arc<Measurement>> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
