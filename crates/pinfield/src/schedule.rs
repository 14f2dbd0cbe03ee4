#![forbid(unsafe_code)]

//! Deferred tasks on a virtual clock.
//!
//! All deferred work (delayed secure-entry locks, post-error resets, delayed
//! edits) is queued here with a due time measured from view creation. The
//! view drains due tasks during [`tick`](crate::PinCodeView::tick), on the
//! same single execution context as every other mutation.
//!
//! Tasks carry a snapshot of the state that triggered them. The scheduler
//! never cancels anything; the view validates each snapshot against live
//! state when the task fires and drops stale ones.
//!
//! # Invariants
//!
//! 1. Tasks pop in due order; equal due times pop in scheduling order.
//! 2. A task never pops before its due time.
//! 3. [`clear`](Scheduler::clear) drops every queued task.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

/// A single pending or delayed edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Append these graphemes.
    Insert(String),
    /// Remove the last grapheme.
    Delete,
}

/// Work deferred to a later tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Mask a freshly revealed slot.
    Lock {
        slot: usize,
        token: u64,
        /// Error flag at scheduling time.
        error: bool,
    },
    /// Clear the code after an error.
    Reset {
        /// Error epoch at scheduling time.
        epoch: u64,
    },
    /// Apply an edit accepted while an editing delay is configured.
    ApplyEdit { edit: Edit, generation: u64 },
}

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap yields the earliest task.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered queue of deferred tasks.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to fire at `due`.
    pub fn schedule(&mut self, due: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.queue.push(Scheduled { due, seq, task });
    }

    /// Pop the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        if self.queue.peek()?.due > now {
            return None;
        }
        self.queue.pop().map(|scheduled| scheduled.task)
    }

    /// Due time of the earliest queued task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|scheduled| scheduled.due)
    }

    /// Number of queued tasks, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every queued task.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn reset(epoch: u64) -> Task {
        Task::Reset { epoch }
    }

    #[test]
    fn pops_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(300), reset(3));
        s.schedule(ms(100), reset(1));
        s.schedule(ms(200), reset(2));

        assert_eq!(s.pop_due(ms(1000)), Some(reset(1)));
        assert_eq!(s.pop_due(ms(1000)), Some(reset(2)));
        assert_eq!(s.pop_due(ms(1000)), Some(reset(3)));
        assert_eq!(s.pop_due(ms(1000)), None);
    }

    #[test]
    fn ties_pop_in_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(100), reset(1));
        s.schedule(ms(100), reset(2));
        assert_eq!(s.pop_due(ms(100)), Some(reset(1)));
        assert_eq!(s.pop_due(ms(100)), Some(reset(2)));
    }

    #[test]
    fn not_due_yet() {
        let mut s = Scheduler::new();
        s.schedule(ms(300), reset(1));
        assert_eq!(s.pop_due(ms(299)), None);
        assert_eq!(s.len(), 1);
        assert_eq!(s.next_due(), Some(ms(300)));
        assert_eq!(s.pop_due(ms(300)), Some(reset(1)));
        assert!(s.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Scheduler::new();
        s.schedule(ms(1), reset(1));
        s.schedule(
            ms(2),
            Task::ApplyEdit {
                edit: Edit::Delete,
                generation: 0,
            },
        );
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.next_due(), None);
        assert_eq!(s.pop_due(ms(10)), None);
    }
}
