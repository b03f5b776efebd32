//! Time-ordered event queues.
//!
//! Two interchangeable backends sit behind [`EventQueue`]: a binary heap and
//! an ordered map. Both pop in strict `(time, sequence)` order in O(log n);
//! which one a kernel uses is a construction-time choice.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use super::Event;

/// Capability contract for the kernel's pending-event structure.
pub trait EventQueue: Default {
    /// Insert a scheduled event.
    fn schedule(&mut self, event: Event);

    /// Remove and return the event with the smallest `(time, sequence)`.
    fn pop_earliest(&mut self) -> Option<Event>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);
}

/// Binary heap backend.
#[derive(Debug, Default)]
pub struct HeapQueue {
    heap: BinaryHeap<Reverse<Event>>,
}

impl EventQueue for HeapQueue {
    fn schedule(&mut self, event: Event) {
        self.heap.push(Reverse(event));
    }

    fn pop_earliest(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
    }
}

/// Ordered map backend keyed by `(time bits, sequence)`.
///
/// Event times are non-negative and finite, so the IEEE-754 bit pattern of
/// the time orders identically to the float itself.
#[derive(Debug, Default)]
pub struct OrderedQueue {
    map: BTreeMap<(u64, u64), Event>,
}

impl EventQueue for OrderedQueue {
    fn schedule(&mut self, event: Event) {
        self.map.insert((event.t.to_bits(), event.seq), event);
    }

    fn pop_earliest(&mut self) -> Option<Event> {
        let key = *self.map.keys().next()?;
        self.map.remove(&key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}
