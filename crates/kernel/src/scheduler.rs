use aethercast_common::EffectId;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A compensating transition that fires after a delay.
///
/// Tasks carry no state snapshot: they act on whatever the state holds when
/// they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "task", content = "effect", rename_all = "snake_case")]
pub enum DeferredTask {
    /// Remove an effect if it is still present.
    ExpireEffect(EffectId),
    /// Halve the accumulated probability shift.
    HalveProbability,
    /// Clamp time speed back into its normal range.
    NormalizeTime,
}

/// A queued task with its absolute due time, as saved with a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTask {
    pub due_ms: u64,
    pub task: DeferredTask,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Scheduled {
    due_ms: u64,
    seq: u64,
    task: DeferredTask,
}

/// Single-threaded timer queue. Tasks due at the same time fire in scheduling order.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue; tasks sharing a due time keep their listed order.
    pub fn from_pending(tasks: impl IntoIterator<Item = PendingTask>) -> Self {
        let mut scheduler = Self::new();
        for t in tasks {
            scheduler.schedule(t.due_ms, t.task);
        }
        scheduler
    }

    /// Queued tasks in firing order.
    pub fn pending(&self) -> Vec<PendingTask> {
        let mut queued: Vec<&Scheduled> = self.queue.iter().map(|Reverse(s)| s).collect();
        queued.sort();
        queued
            .into_iter()
            .map(|s| PendingTask {
                due_ms: s.due_ms,
                task: s.task,
            })
            .collect()
    }

    pub fn schedule(&mut self, due_ms: u64, task: DeferredTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { due_ms, seq, task }));
    }

    /// Pop the earliest task due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DeferredTask> {
        if self.next_due()? > now_ms {
            return None;
        }
        self.queue.pop().map(|Reverse(s)| s.task)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(s)| s.due_ms)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(300, DeferredTask::NormalizeTime);
        s.schedule(100, DeferredTask::HalveProbability);
        assert_eq!(s.pop_due(50), None);
        assert_eq!(s.pop_due(300), Some(DeferredTask::HalveProbability));
        assert_eq!(s.pop_due(300), Some(DeferredTask::NormalizeTime));
        assert!(s.is_empty());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        let id = EffectId::new();
        s.schedule(10, DeferredTask::NormalizeTime);
        s.schedule(10, DeferredTask::ExpireEffect(id));
        s.schedule(10, DeferredTask::HalveProbability);
        assert_eq!(s.pop_due(10), Some(DeferredTask::NormalizeTime));
        assert_eq!(s.pop_due(10), Some(DeferredTask::ExpireEffect(id)));
        assert_eq!(s.pop_due(10), Some(DeferredTask::HalveProbability));
    }

    #[test]
    fn pending_round_trips_firing_order() {
        let mut s = Scheduler::new();
        let id = EffectId::new();
        s.schedule(50, DeferredTask::ExpireEffect(id));
        s.schedule(20, DeferredTask::NormalizeTime);
        s.schedule(50, DeferredTask::HalveProbability);

        let pending = s.pending();
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].task, DeferredTask::NormalizeTime);

        let mut rebuilt = Scheduler::from_pending(pending);
        assert_eq!(rebuilt.pop_due(50), Some(DeferredTask::NormalizeTime));
        assert_eq!(rebuilt.pop_due(50), Some(DeferredTask::ExpireEffect(id)));
        assert_eq!(rebuilt.pop_due(50), Some(DeferredTask::HalveProbability));
    }

    #[test]
    fn next_due_tracks_earliest() {
        let mut s = Scheduler::new();
        assert_eq!(s.next_due(), None);
        s.schedule(40, DeferredTask::NormalizeTime);
        s.schedule(20, DeferredTask::NormalizeTime);
        assert_eq!(s.next_due(), Some(20));
        assert_eq!(s.len(), 2);
    }
}
