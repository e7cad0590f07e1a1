//! The turn controller.
//!
//! [`Game`] owns the roster, the map and every effect manager, and is the
//! only thing that mutates them. Events raised while another event is being
//! delivered are queued and delivered afterwards, so a single call to any
//! public operation fully settles before it returns.

use std::collections::VecDeque;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use crate::config::{GameConfig, MapConfig};
use crate::effect::{Effect, EffectCommand, EffectManager, EffectOwner, Stats};
use crate::error::InvalidOperation;
use crate::game::elimination::EliminationQueue;
use crate::game::{
    Color, EventBus, GameEvent, Map, MapLayout, PlayerId, PlayerKind, PlayerManager, Sector,
    SectorId, SubscriptionId, UnitId, UnitTemplate,
};
use crate::scheduler::{AiAutoplay, Scheduler, Task, TaskStatus};
use crate::snapshot::GameSnapshot;
use crate::tournament::generate_layout;
use crate::GameResult;

/// A minigame in progress.
#[derive(Debug, Clone)]
pub struct Diversion {
    /// Player who captured the bonus objective.
    pub player: PlayerId,
    /// State to resume from.
    pub snapshot: GameSnapshot,
}

/// Complete game state and turn sequencing.
#[derive(Debug)]
pub struct Game {
    pub(super) config: GameConfig,
    pub(super) map_seed: u64,
    pub(super) map: Map,
    pub(super) roster: PlayerManager,
    pub(super) current: PlayerId,
    pub(super) turn: u32,
    pub(super) processing: bool,
    pub(super) epoch: u64,
    pub(super) rng: StdRng,
    pub(super) bus: EventBus,
    pub(super) pending: VecDeque<GameEvent>,
    pub(super) pumping: bool,
    pub(super) eliminations: EliminationQueue,
    pub(super) scheduler: Scheduler,
    pub(super) diversion: Option<Diversion>,
    pub(super) minigame_request: Option<PlayerId>,
    pub(super) selected: Option<SectorId>,
    pub(super) winner: Option<PlayerId>,
}

impl Game {
    /// Start a game on a map generated from `config.map`. `seed` drives
    /// every random choice, and the layout too unless the map config pins
    /// its own seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the generated map
    /// cannot host the roster.
    pub fn new(config: GameConfig, seed: u64) -> GameResult<Self> {
        config.validate()?;
        let map_seed = config.map.seed.unwrap_or(seed);
        let layout = generate_layout(&MapConfig {
            seed: Some(map_seed),
            ..config.map
        })?;
        let mut game = Self::assemble(config, &layout, map_seed, seed)?;
        game.setup()?;
        Ok(game)
    }

    /// Start a game on a hand-made layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster is invalid, the layout is malformed, or
    /// it has too few landmarks or no sector eligible for the bonus
    /// objective.
    pub fn with_layout(config: GameConfig, layout: &MapLayout, seed: u64) -> GameResult<Self> {
        let mut game = Self::assemble(config, layout, seed, seed)?;
        game.setup()?;
        Ok(game)
    }

    /// Rebuild a game from a snapshot, regenerating its map from
    /// `config.map` and the seed recorded in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not fit the regenerated map or
    /// roster.
    pub fn from_snapshot(config: GameConfig, snapshot: &GameSnapshot) -> GameResult<Self> {
        let layout = generate_layout(&MapConfig {
            seed: Some(snapshot.map_seed),
            ..config.map
        })?;
        Self::from_snapshot_with_layout(config, &layout, snapshot)
    }

    /// Rebuild a game from a snapshot taken on a hand-made layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not fit the layout or roster.
    pub fn from_snapshot_with_layout(
        config: GameConfig,
        layout: &MapLayout,
        snapshot: &GameSnapshot,
    ) -> GameResult<Self> {
        let rng_seed = snapshot.map_seed.wrapping_add(u64::from(snapshot.turn));
        let mut game = Self::assemble(config, layout, snapshot.map_seed, rng_seed)?;
        game.restore(snapshot)?;
        Ok(game)
    }

    /// Build the roster and map without placing anyone.
    fn assemble(
        config: GameConfig,
        layout: &MapLayout,
        map_seed: u64,
        seed: u64,
    ) -> GameResult<Self> {
        let specs: Vec<(PlayerKind, Color)> =
            config.players.iter().map(|p| (p.kind, p.color)).collect();
        let mut roster = PlayerManager::new();
        roster.initialize(
            &specs,
            UnitTemplate {
                level: config.unit_level,
            },
        )?;
        let mut map = Map::new();
        map.build(layout)?;

        Ok(Self {
            config,
            map_seed,
            map,
            roster,
            current: 0,
            turn: 0,
            processing: true,
            epoch: 0,
            rng: StdRng::seed_from_u64(seed),
            bus: EventBus::default(),
            pending: VecDeque::new(),
            pumping: false,
            eliminations: EliminationQueue::default(),
            scheduler: Scheduler::new(),
            diversion: None,
            minigame_request: None,
            selected: None,
            winner: None,
        })
    }

    /// Place players, allocate the bonus objective and start the first turn.
    fn setup(&mut self) -> GameResult<()> {
        self.assign_starting_sectors()?;
        self.allocate_bonus_objective(true)?;
        self.map.bonus.countdown = self.config.bonus_objective_interval;

        self.current = 0;
        if let Some(first) = self.roster.get_mut(0) {
            first.set_active(true);
        }
        info!(
            players = self.roster.len(),
            sectors = self.map.len(),
            "game initialized"
        );
        self.start_turn()?;
        self.finish_step()
    }

    /// The configuration this game runs with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the map layout was generated from.
    #[must_use]
    pub const fn map_seed(&self) -> u64 {
        self.map_seed
    }

    /// The map.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// The roster.
    #[must_use]
    pub const fn roster(&self) -> &PlayerManager {
        &self.roster
    }

    /// The active player.
    #[must_use]
    pub const fn current_player(&self) -> PlayerId {
        self.current
    }

    /// Turns started so far, counting from zero.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Whether events are still processed; false once the game is won.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.processing
    }

    /// The winner, once decided.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Whether the game has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        !self.processing
    }

    /// Bumped by every restore.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Sector selected by the human player.
    #[must_use]
    pub const fn selected(&self) -> Option<SectorId> {
        self.selected
    }

    /// Player diverted into the minigame, if any.
    #[must_use]
    pub fn diverted(&self) -> Option<PlayerId> {
        self.diversion.as_ref().map(|d| d.player)
    }

    /// Pending cooperative tasks.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Derived stats of a player.
    #[must_use]
    pub fn player_stats(&self, player: PlayerId) -> Option<Stats> {
        self.roster.get(player).map(|p| p.effects().stats())
    }

    /// Effect manager of any owner.
    #[must_use]
    pub fn effects(&self, owner: EffectOwner) -> Option<&EffectManager> {
        match owner {
            EffectOwner::Player(id) => self.roster.get(id).map(|p| p.effects()),
            EffectOwner::Sector(id) => self.map.sector(id).map(Sector::effects),
            EffectOwner::Unit(id) => self.map.unit(id).map(|u| u.effects()),
        }
    }

    pub(super) fn effects_mut(&mut self, owner: EffectOwner) -> GameResult<&mut EffectManager> {
        let manager = match owner {
            EffectOwner::Player(id) => self.roster.get_mut(id).map(|p| p.effects_mut()),
            EffectOwner::Sector(id) => self.map.sector_mut(id).map(Sector::effects_mut),
            EffectOwner::Unit(id) => self.map.unit_mut(id).map(|u| u.effects_mut()),
        };
        manager.ok_or_else(|| {
            match owner {
                EffectOwner::Player(id) => InvalidOperation::UnknownPlayer(id),
                EffectOwner::Sector(id) => InvalidOperation::UnknownSector(id),
                EffectOwner::Unit(id) => InvalidOperation::UnknownUnit(id),
            }
            .into()
        })
    }

    /// Register an observer of every processed event.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(subscriber)
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Whether inbound requests are currently accepted.
    pub(super) fn accepts_input(&self) -> bool {
        self.processing && self.diversion.is_none()
    }

    /// Play a card: attach `effect` to `target`.
    ///
    /// Ignored while a minigame is in progress or after the game has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist or cannot carry this
    /// kind of effect.
    pub fn apply_effect(&mut self, target: EffectOwner, effect: Effect) -> GameResult<()> {
        if !self.accepts_input() {
            return Ok(());
        }
        self.effects_mut(target)?.apply(effect)?;
        self.run_commands()?;
        self.finish_step()
    }

    /// Raise an event. Dropped once the game has ended; queued if another
    /// event is being delivered.
    pub(super) fn emit(&mut self, event: GameEvent) -> GameResult<()> {
        if !self.processing {
            trace!(?event, "event dropped");
            return Ok(());
        }
        self.pending.push_back(event);
        if self.pumping {
            return Ok(());
        }

        self.pumping = true;
        let result = self.pump();
        self.pumping = false;
        if result.is_err() {
            self.pending.clear();
        }
        result
    }

    fn pump(&mut self) -> GameResult<()> {
        while let Some(event) = self.pending.pop_front() {
            self.deliver(&event)?;
        }
        Ok(())
    }

    /// Effect managers first, then the controller's own reactions, then
    /// external subscribers.
    fn deliver(&mut self, event: &GameEvent) -> GameResult<()> {
        self.fan_out(event);
        self.run_commands()?;
        self.react(event)?;
        self.bus.publish(event);
        Ok(())
    }

    fn fan_out(&mut self, event: &GameEvent) {
        for player in self.roster.iter_mut() {
            let id = player.id();
            player.effects_mut().dispatch(Some(id), event);
        }
        for sector in self.map.sectors_mut() {
            let owner = sector.owner();
            sector.effects_mut().dispatch(owner, event);
        }
        for (_, sector) in self.map.unit_sectors_by_spawn() {
            if let Some(unit) = self.map.sector_mut(sector).and_then(Sector::unit_mut) {
                let owner = unit.owner();
                unit.effects_mut().dispatch(owner, event);
            }
        }
    }

    fn collect_commands(&mut self) -> Vec<EffectCommand> {
        let mut commands = Vec::new();
        for player in self.roster.iter_mut() {
            commands.extend(player.effects_mut().take_commands());
        }
        for sector in self.map.sectors_mut() {
            commands.extend(sector.effects_mut().take_commands());
        }
        for (_, sector) in self.map.unit_sectors_by_spawn() {
            if let Some(unit) = self.map.sector_mut(sector).and_then(Sector::unit_mut) {
                commands.extend(unit.effects_mut().take_commands());
            }
        }
        commands
    }

    /// Execute hook commands until none are left.
    pub(super) fn run_commands(&mut self) -> GameResult<()> {
        loop {
            let commands = self.collect_commands();
            if commands.is_empty() {
                return Ok(());
            }
            for command in commands {
                self.execute(command)?;
            }
        }
    }

    pub(super) fn execute(&mut self, command: EffectCommand) -> GameResult<()> {
        trace!(?command, "executing");
        match command {
            EffectCommand::Apply { target, effect } => {
                self.effects_mut(target)?.apply(effect)?;
            }
            EffectCommand::RemoveMatching { target, filter } => {
                self.effects_mut(target)?.remove_matching(filter);
            }
            EffectCommand::AdjustUnitLevel { unit, delta } => {
                let cap = self.level_cap_of_unit(unit);
                let level = self
                    .map
                    .unit_mut(unit)
                    .ok_or(InvalidOperation::UnknownUnit(unit))?
                    .adjust_level(delta, cap)?;
                debug!(unit, delta, level, "unit level adjusted");
            }
            EffectCommand::GrantActions { player, amount } => {
                self.roster
                    .get_mut(player)
                    .ok_or(InvalidOperation::UnknownPlayer(player))?
                    .grant_actions(amount);
            }
            EffectCommand::StartMinigame { player } => {
                self.minigame_request = Some(player);
            }
            EffectCommand::Notify(event) => self.emit(event)?,
        }
        Ok(())
    }

    /// Level cap of a unit's owner.
    pub(super) fn level_cap_of_unit(&self, unit: UnitId) -> i32 {
        self.map
            .unit(unit)
            .and_then(|u| u.owner())
            .and_then(|owner| self.roster.get(owner))
            .map_or(crate::effect::BASE_LEVEL_CAP, |p| p.effects().level_cap())
    }

    /// Controller reactions: elimination checks.
    fn react(&mut self, event: &GameEvent) -> GameResult<()> {
        match *event {
            GameEvent::SectorCaptured {
                old_owner: Some(old),
                new_owner,
                ..
            } if new_owner != Some(old) => {
                if self.map.is_eliminated(old) {
                    self.enqueue_elimination(old, new_owner)?;
                }
            }
            GameEvent::UnitDied {
                owner: Some(owner),
                eliminator,
                ..
            } => {
                if self.map.is_eliminated(owner) {
                    self.enqueue_elimination(owner, eliminator)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Persistent state of the whole game.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            processing: self.processing,
            map: self.map.snapshot(),
            players: self.roster.snapshot(),
            current: self.current,
            turn: self.turn,
            map_seed: self.map_seed,
        }
    }

    /// Overwrite persistent state, leaving tasks and queues alone.
    pub(super) fn restore_state(&mut self, snapshot: &GameSnapshot) -> GameResult<()> {
        if self.roster.get(snapshot.current).is_none() {
            return Err(InvalidOperation::SnapshotMismatch(format!(
                "current player {} is not in the roster",
                snapshot.current
            ))
            .into());
        }
        self.map.restore(&snapshot.map)?;
        self.roster.restore(&snapshot.players)?;
        self.current = snapshot.current;
        self.turn = snapshot.turn;
        self.processing = snapshot.processing;
        for player in self.roster.iter_mut() {
            let active = player.id() == snapshot.current;
            player.set_active(active);
        }
        self.winner = if self.processing {
            None
        } else {
            self.roster.winner(&self.map)
        };
        self.pending.clear();
        self.selected = None;
        self.minigame_request = None;
        self.epoch += 1;
        Ok(())
    }

    /// Replace the live state with a snapshot. Queued eliminations, tasks and
    /// any minigame in progress are discarded; the active player's autoplay
    /// restarts if it is an AI.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not fit this game's map or
    /// roster.
    pub fn restore(&mut self, snapshot: &GameSnapshot) -> GameResult<()> {
        self.restore_state(snapshot)?;
        self.eliminations = EliminationQueue::default();
        self.scheduler.clear();
        self.diversion = None;
        self.ensure_autoplay();
        info!(turn = self.turn, player = self.current, "game restored");
        Ok(())
    }

    /// Spawn the autoplay task for the active player if it is an AI without
    /// one.
    pub(super) fn ensure_autoplay(&mut self) {
        if !self.processing {
            return;
        }
        let Some(player) = self.roster.get(self.current) else {
            return;
        };
        if !player.is_ai() {
            return;
        }
        let (player, turn) = (self.current, self.turn);
        let running = self.scheduler.any(|task| {
            matches!(task, Task::AiAutoplay(a) if a.player == player && a.turn == turn)
        });
        if !running {
            self.scheduler.spawn(Task::AiAutoplay(AiAutoplay {
                player,
                turn,
                wait: self.ai_delay(),
                epoch: self.epoch,
            }));
        }
    }

    pub(super) fn ai_delay(&self) -> Duration {
        Duration::from_millis(self.config.ai_move_delay_ms)
    }

    /// Advance cooperative tasks by `dt`. Nothing runs while a minigame is in
    /// progress.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a task.
    pub fn tick(&mut self, dt: Duration) -> GameResult<()> {
        if self.diversion.is_some() {
            return Ok(());
        }
        let mut tasks = self.scheduler.take();
        let mut outcome = Ok(());
        tasks.retain_mut(|task| {
            if outcome.is_err() {
                return true;
            }
            match self.poll(task, dt) {
                Ok(status) => status == TaskStatus::Running,
                Err(e) => {
                    outcome = Err(e);
                    true
                }
            }
        });
        self.scheduler.merge(tasks);
        outcome?;
        self.finish_step()
    }

    fn poll(&mut self, task: &mut Task, dt: Duration) -> GameResult<TaskStatus> {
        if !self.processing {
            return Ok(TaskStatus::Done);
        }
        if self.minigame_request.is_some() {
            return Ok(TaskStatus::Running);
        }
        match task {
            Task::Eliminations => self.step_eliminations(),
            Task::AiAutoplay(autoplay) => self.poll_autoplay(autoplay, dt),
        }
    }

    /// One autoplay step: at most one move per elapsed delay.
    fn poll_autoplay(&mut self, task: &mut AiAutoplay, dt: Duration) -> GameResult<TaskStatus> {
        if task.epoch != self.epoch {
            task.epoch = self.epoch;
            return Ok(TaskStatus::Running);
        }
        if self.current != task.player || self.turn != task.turn {
            return Ok(TaskStatus::Done);
        }
        if self.eliminations.notice().is_some() {
            return Ok(TaskStatus::Running);
        }

        task.wait = task.wait.saturating_sub(dt);
        if !task.wait.is_zero() {
            return Ok(TaskStatus::Running);
        }
        task.wait = self.ai_delay();

        let remaining = self
            .roster
            .get(task.player)
            .ok_or(InvalidOperation::UnknownPlayer(task.player))?
            .actions_remaining();
        if remaining == 0 {
            self.end_turn()?;
            return Ok(TaskStatus::Done);
        }

        let choice = crate::game::ai::choose_move(
            &self.map,
            &self.roster,
            task.player,
            self.config.ai_strategy,
            &mut self.rng,
        );
        match choice {
            Some((from, to)) => self.move_for(task.player, from, to)?,
            None => {
                debug!(player = task.player, "no legal move, passing action");
                self.consume_action(task.player)?;
            }
        }

        let still_playing =
            self.processing && self.current == task.player && self.turn == task.turn;
        Ok(if still_playing {
            TaskStatus::Running
        } else {
            TaskStatus::Done
        })
    }
}
