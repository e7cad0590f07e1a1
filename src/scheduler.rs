//! Cooperative tasks.
//!
//! A task is polled once per [`Game::tick`](crate::game::Game::tick) and
//! reports whether it is still running. Suspension is just returning
//! [`TaskStatus::Running`] and picking up again on the next poll.

use std::time::Duration;

use crate::game::PlayerId;

/// Result of polling a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Poll again next tick.
    Running,
    /// Drop the task.
    Done,
}

/// State of an AI player's autoplay loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiAutoplay {
    /// The AI player.
    pub player: PlayerId,
    /// Turn the task was started for.
    pub turn: u32,
    /// Time left before the next move.
    pub wait: Duration,
    /// Restore epoch last seen.
    pub epoch: u64,
}

/// A suspendable sequence driven by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Play one AI move per delay until the turn ends.
    AiAutoplay(AiAutoplay),
    /// Process queued eliminations one acknowledged notice at a time.
    Eliminations,
}

/// Pending tasks in spawn order.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next tick.
    pub fn spawn(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Whether any queued task satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&Task) -> bool) -> bool {
        self.tasks.iter().any(pred)
    }

    /// Drop every task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Take the queue out for polling.
    pub(crate) fn take(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.tasks)
    }

    /// Put polled tasks back ahead of any spawned while they ran.
    pub(crate) fn merge(&mut self, mut polled: Vec<Task>) {
        polled.append(&mut self.tasks);
        self.tasks = polled;
    }

    /// Tasks in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}
