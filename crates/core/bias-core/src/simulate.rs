//! Simulated biased binary search
//!
//! The first probe uses [`biased_midpoint`]; after that the simulation does not
//! follow a single key. It expands both halves of every interval breadth-first,
//! covering every probe any key could cause, and hands each probe to an
//! [`AccessObserver`] until the observer has seen enough.

use std::collections::VecDeque;

use crate::constant::BiasConstant;
use crate::midpoint::{biased_midpoint, standard_midpoint};
use crate::tracker::AccessObserver;

/// Default number of pending intervals a simulation may hold
pub const DEFAULT_QUEUE_CAPACITY: usize = 32 * 1024;

/// How a simulation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// The observer asked to stop
    Completed,
    /// Every reachable probe was visited
    Exhausted,
    /// The work list ran out of room; remaining intervals were abandoned
    Truncated,
}

/// Bounded FIFO of inclusive `[low, high]` intervals.
///
/// One queue is owned by one simulation at a time. It can be reused across
/// sequential simulations to avoid reallocating.
#[derive(Debug, Clone)]
pub struct IntervalQueue {
    slots: VecDeque<(i64, i64)>,
    capacity: usize,
}

impl IntervalQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn clear(&mut self) {
        self.slots.clear();
    }

    /// Returns false if the queue is full
    #[inline]
    fn push(&mut self, low: i64, high: i64) -> bool {
        if self.slots.len() >= self.capacity {
            return false;
        }
        self.slots.push_back((low, high));
        true
    }

    #[inline]
    fn pop(&mut self) -> Option<(i64, i64)> {
        self.slots.pop_front()
    }
}

impl Default for IntervalQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Replay every probe a biased search over `[from_index, to_index)` can make.
///
/// Empty or inverted ranges make no accesses.
pub fn simulate_search<O>(
    constant: BiasConstant,
    from_index: i32,
    to_index: i32,
    observer: &mut O,
    queue: &mut IntervalQueue,
) -> SimulationOutcome
where
    O: AccessObserver + ?Sized,
{
    if to_index <= from_index {
        return SimulationOutcome::Exhausted;
    }

    let mid = i64::from(biased_midpoint(constant, from_index, to_index));
    if observer.access(mid) {
        return SimulationOutcome::Completed;
    }

    queue.clear();
    let high = i64::from(to_index) - 1;
    if !queue.push(i64::from(from_index), mid - 1) || !queue.push(mid + 1, high) {
        return SimulationOutcome::Truncated;
    }

    while let Some((low, high)) = queue.pop() {
        if low > high {
            continue;
        }
        let mid = standard_midpoint(low, high);
        if observer.access(mid) {
            return SimulationOutcome::Completed;
        }
        if !queue.push(low, mid - 1) || !queue.push(mid + 1, high) {
            log::trace!("interval queue full after probe {mid}, stopping early");
            return SimulationOutcome::Truncated;
        }
    }
    SimulationOutcome::Exhausted
}
