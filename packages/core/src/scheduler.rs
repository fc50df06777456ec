//! Deferred work scheduler
//!
//! The designer runs on a single logical thread driven by the host. Work
//! that must wait for the view to settle (item list resync, post-drop focus)
//! is registered here instead of on ad hoc timers.
//!
//! Every task occupies a [`TaskSlot`]. Scheduling into an occupied slot
//! cancels the pending task (cancel-on-supersede), so at most one resync and
//! one focus request can be pending at a time.
//!
//! The host advances the scheduler explicitly:
//!
//! - [`Scheduler::take_due`] returns timer tasks whose delay elapsed and
//!   promotes frame-bound tasks to "awaiting frame"
//! - [`Scheduler::take_frame_tasks`] returns the tasks waiting for the next
//!   animation frame
//!
//! Tasks carry no liveness guarantees of their own; the code running them
//! checks whether the document is still alive.

use std::time::{Duration, Instant};

/// Kind of deferred work, one pending task per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSlot {
    Resync,
    Focus,
}

/// Payload of a deferred task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Resample the flat item list from the realized view
    Resync,
    /// Place the cursor inside the node with this id
    Focus { node_id: String },
}

impl Task {
    pub fn slot(&self) -> TaskSlot {
        match self {
            Task::Resync => TaskSlot::Resync,
            Task::Focus { .. } => TaskSlot::Focus,
        }
    }

    /// Frame-bound tasks run on the animation frame after their delay
    fn needs_frame(&self) -> bool {
        matches!(self, Task::Resync)
    }
}

/// Handle identifying one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Waiting { due: Instant },
    AwaitingFrame,
}

#[derive(Debug, Clone)]
struct Pending {
    token: TaskToken,
    task: Task,
    stage: Stage,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_token: u64,
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run `delay` after `now`, superseding any pending
    /// task in the same slot.
    pub fn schedule(&mut self, task: Task, delay: Duration, now: Instant) -> TaskToken {
        if self.cancel(task.slot()) {
            tracing::debug!("Superseded pending {:?} task", task.slot());
        }
        self.next_token += 1;
        let token = TaskToken(self.next_token);
        self.pending.push(Pending {
            token,
            task,
            stage: Stage::Waiting { due: now + delay },
        });
        token
    }

    /// Cancel the pending task in `slot`; returns whether one existed
    pub fn cancel(&mut self, slot: TaskSlot) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.task.slot() != slot);
        before != self.pending.len()
    }

    pub fn cancel_token(&mut self, token: TaskToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, slot: TaskSlot) -> bool {
        self.pending.iter().any(|p| p.task.slot() == slot)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .iter()
            .filter_map(|p| match p.stage {
                Stage::Waiting { due } => Some(due),
                Stage::AwaitingFrame => None,
            })
            .min()
    }

    /// Whether any task waits for the next animation frame
    pub fn wants_frame(&self) -> bool {
        self.pending
            .iter()
            .any(|p| p.stage == Stage::AwaitingFrame)
    }

    /// Remove and return timer tasks due at `now`. Frame-bound tasks whose
    /// delay elapsed move to the awaiting-frame stage instead.
    pub fn take_due(&mut self, now: Instant) -> Vec<Task> {
        let mut due = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for mut pending in self.pending.drain(..) {
            match pending.stage {
                Stage::Waiting { due: at } if at <= now => {
                    if pending.task.needs_frame() {
                        pending.stage = Stage::AwaitingFrame;
                        remaining.push(pending);
                    } else {
                        due.push(pending.task);
                    }
                }
                _ => remaining.push(pending),
            }
        }
        self.pending = remaining;
        due
    }

    /// Remove and return every task awaiting an animation frame
    pub fn take_frame_tasks(&mut self) -> Vec<Task> {
        let mut ready = Vec::new();
        let mut remaining = Vec::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if pending.stage == Stage::AwaitingFrame {
                ready.push(pending.task);
            } else {
                remaining.push(pending);
            }
        }
        self.pending = remaining;
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(50);

    #[test]
    fn test_resync_waits_for_delay_then_frame() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::Resync, SETTLE, start);

        assert!(scheduler.take_due(start + Duration::from_millis(10)).is_empty());
        assert!(scheduler.take_frame_tasks().is_empty());

        assert!(scheduler.take_due(start + SETTLE).is_empty());
        assert!(scheduler.wants_frame());
        assert_eq!(scheduler.take_frame_tasks(), vec![Task::Resync]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_schedule_supersedes_same_slot() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule(Task::Resync, SETTLE, start);
        scheduler.schedule(Task::Resync, SETTLE, start + Duration::from_millis(30));

        assert_eq!(scheduler.len(), 1);
        assert!(!scheduler.cancel_token(first));

        // the first deadline has passed but only the second task exists
        scheduler.take_due(start + SETTLE);
        assert!(scheduler.take_frame_tasks().is_empty());
        scheduler.take_due(start + Duration::from_millis(80));
        assert_eq!(scheduler.take_frame_tasks(), vec![Task::Resync]);
    }

    #[test]
    fn test_focus_runs_on_timer() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::Resync, SETTLE, start);
        scheduler.schedule(
            Task::Focus {
                node_id: "node-1".to_string(),
            },
            Duration::from_millis(20),
            start,
        );

        assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_millis(20)));
        let due = scheduler.take_due(start + Duration::from_millis(20));
        assert_eq!(
            due,
            vec![Task::Focus {
                node_id: "node-1".to_string()
            }]
        );
        assert!(scheduler.is_pending(TaskSlot::Resync));
    }

    #[test]
    fn test_cancel_all() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::Resync, SETTLE, start);
        scheduler.cancel_all();
        assert!(!scheduler.cancel(TaskSlot::Resync));
        assert!(scheduler.take_due(start + SETTLE).is_empty());
    }
}
