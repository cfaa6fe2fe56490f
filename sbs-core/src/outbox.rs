//! Bounded queue of emissions whose publish failed.
//!
//! Lives beside the reassembly engine, never inside it: a record leaves the
//! aircraft table the moment it completes, whether or not the bus takes it.
//! With capacity 0 nothing is queued and publishing is fire-and-forget.

use std::collections::VecDeque;

use crate::emit::Emission;

#[derive(Debug, Default)]
pub struct Outbox {
    capacity: usize,
    queue: VecDeque<Emission>,
    /// Emissions lost to overflow (or refused when capacity is 0).
    pub dropped: u64,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Outbox {
            capacity,
            queue: VecDeque::with_capacity(capacity),
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue an emission. When full, the oldest entry is evicted and returned.
    pub fn push(&mut self, emission: Emission) -> Option<Emission> {
        if self.capacity == 0 {
            self.dropped += 1;
            return Some(emission);
        }
        let evicted = if self.queue.len() >= self.capacity {
            self.dropped += 1;
            self.queue.pop_front()
        } else {
            None
        };
        self.queue.push_back(emission);
        evicted
    }

    pub fn pop_front(&mut self) -> Option<Emission> {
        self.queue.pop_front()
    }

    /// Put back an emission that failed again, keeping it first in line.
    pub fn push_front(&mut self, emission: Emission) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.queue.len() >= self.capacity {
            self.queue.pop_back();
            self.dropped += 1;
        }
        self.queue.push_front(emission);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn emission(n: u8) -> Emission {
        Emission {
            topic: format!("Planes/T{n}"),
            payload: vec![n],
        }
    }

    #[test]
    fn test_zero_capacity_drops() {
        let mut outbox = Outbox::new(0);
        assert_eq!(outbox.push(emission(1)), Some(emission(1)));
        assert!(outbox.is_empty());
        assert_eq!(outbox.dropped, 1);
    }

    #[test]
    fn test_fifo_order() {
        let mut outbox = Outbox::new(4);
        outbox.push(emission(1));
        outbox.push(emission(2));
        assert_eq!(outbox.pop_front(), Some(emission(1)));
        assert_eq!(outbox.pop_front(), Some(emission(2)));
        assert_eq!(outbox.pop_front(), None);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut outbox = Outbox::new(2);
        assert_eq!(outbox.capacity(), 2);
        assert!(outbox.push(emission(1)).is_none());
        assert!(outbox.push(emission(2)).is_none());
        assert_eq!(outbox.push(emission(3)), Some(emission(1)));
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.dropped, 1);
        assert_eq!(outbox.pop_front(), Some(emission(2)));
    }

    #[test]
    fn test_push_front_retries_first() {
        let mut outbox = Outbox::new(3);
        outbox.push(emission(1));
        outbox.push(emission(2));
        let head = outbox.pop_front().unwrap();
        outbox.push_front(head);
        assert_eq!(outbox.pop_front(), Some(emission(1)));
    }
}
