//! Elimination sequencing.
//!
//! Eliminations are processed strictly in the order they were queued. Each
//! one fires [`GameEvent::PlayerEliminated`], releases the player's sectors,
//! checks for a winner and then raises a notice that must be acknowledged
//! before the next queued elimination is looked at.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::game::{Game, GameEvent, PlayerId};
use crate::scheduler::{Task, TaskStatus};
use crate::GameResult;

/// A queued elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Elimination {
    /// Eliminated player.
    pub player: PlayerId,
    /// Player responsible, if any.
    pub eliminator: Option<PlayerId>,
}

/// FIFO of eliminations awaiting processing.
#[derive(Debug, Clone, Default)]
pub struct EliminationQueue {
    queue: VecDeque<Elimination>,
    processed: Vec<PlayerId>,
    notice: Option<Elimination>,
    front_processed: bool,
    running: bool,
}

impl EliminationQueue {
    /// Queue an elimination. Returns `false` if the player is already
    /// queued or was already processed.
    pub fn push(&mut self, elimination: Elimination) -> bool {
        if self.contains(elimination.player) {
            return false;
        }
        self.queue.push_back(elimination);
        true
    }

    /// Whether `player` is queued or already processed.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.processed.contains(&player) || self.queue.iter().any(|e| e.player == player)
    }

    /// Entries not yet dequeued, oldest first. The front stays queued until
    /// its notice is acknowledged.
    pub fn iter(&self) -> impl Iterator<Item = &Elimination> {
        self.queue.iter()
    }

    /// Number of entries not yet dequeued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Notice waiting for acknowledgement.
    #[must_use]
    pub const fn notice(&self) -> Option<Elimination> {
        self.notice
    }

    /// Eliminated players in processing order.
    #[must_use]
    pub fn processed(&self) -> &[PlayerId] {
        &self.processed
    }

    /// Whether the processing loop is active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Drop the front if it has been processed, then peek the next entry.
    fn next(&mut self) -> Option<Elimination> {
        if self.front_processed {
            self.queue.pop_front();
            self.front_processed = false;
        }
        self.queue.front().copied()
    }
}

impl Game {
    /// Queue an elimination and make sure the processing loop runs. The
    /// loop's first step runs immediately.
    pub(super) fn enqueue_elimination(
        &mut self,
        player: PlayerId,
        eliminator: Option<PlayerId>,
    ) -> GameResult<()> {
        if !self.processing {
            return Ok(());
        }
        if !self.eliminations.push(Elimination { player, eliminator }) {
            trace!(player, "elimination already queued");
            return Ok(());
        }
        debug!(player, ?eliminator, "elimination queued");
        if self.eliminations.running {
            return Ok(());
        }

        self.eliminations.running = true;
        if self.step_eliminations()? == TaskStatus::Running {
            self.scheduler.spawn(Task::Eliminations);
        }
        Ok(())
    }

    /// One step of the processing loop.
    pub(super) fn step_eliminations(&mut self) -> GameResult<TaskStatus> {
        if self.eliminations.notice.is_some() {
            return Ok(TaskStatus::Running);
        }
        let Some(next) = self.eliminations.next() else {
            self.eliminations.running = false;
            return Ok(TaskStatus::Done);
        };
        self.eliminations.front_processed = true;
        self.eliminations.processed.push(next.player);

        info!(player = next.player, eliminator = ?next.eliminator, "player eliminated");
        self.emit(GameEvent::PlayerEliminated {
            player: next.player,
            eliminator: next.eliminator,
        })?;
        let released = self.map.release(next.player);
        debug!(player = next.player, sectors = released.len(), "sectors released");

        if let Some(winner) = self.roster.winner(&self.map) {
            self.eliminations.running = false;
            self.declare_winner(winner)?;
            return Ok(TaskStatus::Done);
        }

        self.eliminations.notice = Some(next);
        self.emit(GameEvent::EliminationNotice {
            player: next.player,
            eliminator: next.eliminator,
        })?;
        Ok(TaskStatus::Running)
    }

    /// Dismiss the pending elimination notice. The next queued elimination
    /// is processed on the following tick. Returns `false` if no notice was
    /// pending.
    pub fn acknowledge_notice(&mut self) -> bool {
        self.eliminations.notice.take().is_some()
    }

    /// The pending elimination notice.
    #[must_use]
    pub const fn elimination_notice(&self) -> Option<Elimination> {
        self.eliminations.notice
    }

    /// The elimination queue.
    #[must_use]
    pub const fn eliminations(&self) -> &EliminationQueue {
        &self.eliminations
    }
}
