//! Turn flow, moves, human input and the bonus minigame.

use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, info};

use crate::effect::{Effect, EffectOwner, Resource};
use crate::error::{ConfigError, InvalidOperation};
use crate::game::combat::{self, Combatant, Victor};
use crate::game::state::Diversion;
use crate::game::{Game, GameEvent, PlayerId, Sector, SectorId, Unit, UnitId};
use crate::GameResult;

impl Game {
    /// Give each player a distinct random landmarked sector.
    pub(super) fn assign_starting_sectors(&mut self) -> GameResult<()> {
        let mut landmarks: Vec<SectorId> = self.map.landmark_sectors().map(Sector::id).collect();
        if landmarks.len() < self.roster.len() {
            return Err(ConfigError::NotEnoughLandmarks {
                players: self.roster.len(),
                landmarks: landmarks.len(),
            }
            .into());
        }
        landmarks.shuffle(&mut self.rng);

        let players: Vec<PlayerId> = self.roster.iter().map(|p| p.id()).collect();
        for (player, sector) in players.into_iter().zip(landmarks) {
            self.capture(sector, player)?;
        }
        Ok(())
    }

    /// Put the bonus objective on a random eligible sector: no landmark, no
    /// owner, no unit, and not the sector that hosted it last. Returns
    /// `false` if nothing was eligible.
    pub(super) fn allocate_bonus_objective(&mut self, initial: bool) -> GameResult<bool> {
        let last = self.map.bonus.last_sector;
        let eligible: Vec<SectorId> = self
            .map
            .sectors()
            .iter()
            .filter(|s| {
                s.landmark().is_none()
                    && s.owner().is_none()
                    && s.unit().is_none()
                    && Some(s.id()) != last
            })
            .map(Sector::id)
            .collect();

        let Some(&sector) = eligible.choose(&mut self.rng) else {
            if initial {
                return Err(ConfigError::NoEligibleSector.into());
            }
            debug!("no sector eligible for the bonus objective");
            return Ok(false);
        };
        self.effects_mut(EffectOwner::Sector(sector))?
            .apply(Effect::BonusObjective)?;
        self.map.bonus.last_sector = Some(sector);
        info!(sector, "bonus objective allocated");
        Ok(true)
    }

    /// Count the bonus objective timer down once per round.
    fn advance_bonus_timer(&mut self) -> GameResult<()> {
        let timer = &mut self.map.bonus;
        timer.countdown = timer.countdown.saturating_sub(1);
        if timer.countdown > 0 {
            return Ok(());
        }
        let active = self.map.sectors().iter().any(Sector::has_bonus_objective);
        if !active && self.allocate_bonus_objective(false)? {
            self.map.bonus.countdown = self.config.bonus_objective_interval;
        }
        Ok(())
    }

    /// Reset the active player's actions, spawn units at their free
    /// landmarks and announce the turn.
    pub(super) fn start_turn(&mut self) -> GameResult<()> {
        let id = self.current;
        let player = self
            .roster
            .get_mut(id)
            .ok_or(InvalidOperation::UnknownPlayer(id))?;
        let actions = player.reset_actions();
        let template = player.template();
        let level_cap = player.effects().level_cap();

        let spawn_at: Vec<SectorId> = self
            .map
            .owned_by(id)
            .filter(|s| s.landmark().is_some() && s.unit().is_none())
            .map(Sector::id)
            .collect();
        for sector in spawn_at {
            let unit = self.map.allocate_unit_id();
            if let Some(slot) = self.map.sector_mut(sector) {
                slot.place_unit(Unit::new(unit, id, sector, template.level, level_cap));
            }
            debug!(unit, sector, owner = id, "unit spawned");
            self.emit(GameEvent::UnitSpawned {
                unit,
                sector,
                owner: id,
            })?;
        }

        info!(turn = self.turn, player = id, actions, "turn started");
        self.emit(GameEvent::TurnStarted { player: id })?;
        self.ensure_autoplay();
        Ok(())
    }

    /// Spend one of `player`'s actions, ending their turn when none are
    /// left.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperation::NoActionsRemaining`] if the budget is
    /// already spent.
    pub(super) fn consume_action(&mut self, player: PlayerId) -> GameResult<()> {
        let remaining = self
            .roster
            .get_mut(player)
            .ok_or(InvalidOperation::UnknownPlayer(player))?
            .spend_action()
            .ok_or(InvalidOperation::NoActionsRemaining(player))?;
        self.emit(GameEvent::ActionPerformed { player, remaining })?;

        let left = self
            .roster
            .get(player)
            .map_or(0, |p| p.actions_remaining());
        if left == 0 && self.processing && self.current == player {
            self.end_turn()?;
        }
        Ok(())
    }

    /// Close the active player's turn and start the next one.
    pub(super) fn end_turn(&mut self) -> GameResult<()> {
        let previous = self.current;
        self.selected = None;
        self.emit(GameEvent::TurnEnded { player: previous })?;
        if !self.processing {
            return Ok(());
        }
        if let Some(winner) = self.roster.winner(&self.map) {
            return self.declare_winner(winner);
        }

        self.roster.to_next_player(&mut self.current, &self.map)?;
        self.turn += 1;
        if self.current <= previous {
            self.advance_bonus_timer()?;
        }
        self.start_turn()
    }

    /// End the game in favour of `winner`. The announcement is the last
    /// event processed.
    pub(super) fn declare_winner(&mut self, winner: PlayerId) -> GameResult<()> {
        self.winner = Some(winner);
        info!(winner, turn = self.turn, "game won");
        self.emit(GameEvent::GameWon { winner })?;
        self.processing = false;
        self.selected = None;
        Ok(())
    }

    /// Move the active player's unit from `from` to `to`.
    ///
    /// Ignored while a minigame is in progress or after the game has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the move is illegal: no actions left, no own unit
    /// at `from`, the unit cannot move, or `to` is out of reach.
    pub fn attempt_move(&mut self, from: SectorId, to: SectorId) -> GameResult<()> {
        if !self.accepts_input() {
            return Ok(());
        }
        self.move_for(self.current, from, to)?;
        self.finish_step()
    }

    /// Validate and perform one move. Every move costs one action.
    pub(super) fn move_for(&mut self, player: PlayerId, from: SectorId, to: SectorId) -> GameResult<()> {
        let mover = self
            .roster
            .get(player)
            .ok_or(InvalidOperation::UnknownPlayer(player))?;
        if mover.actions_remaining() == 0 {
            return Err(InvalidOperation::NoActionsRemaining(player).into());
        }
        let range = mover.effects().move_range();

        let unit = self
            .map
            .sector(from)
            .ok_or(InvalidOperation::UnknownSector(from))?
            .unit()
            .filter(|u| u.owner() == Some(player))
            .ok_or(InvalidOperation::NotOwnUnit {
                sector: from,
                player,
            })?;
        if !unit.can_move() {
            return Err(InvalidOperation::UnitCannotMove(unit.id()).into());
        }
        if !self.map.reachable(from, range).contains(&to) {
            return Err(InvalidOperation::Unreachable { from, to }.into());
        }

        let occupant = self
            .map
            .sector(to)
            .and_then(Sector::unit)
            .map(|u| (u.id(), u.owner()));
        match occupant {
            None => self.advance(player, from, to)?,
            Some((_, owner)) if owner == Some(player) => self.swap(from, to)?,
            Some((defender, _)) => self.fight(player, from, to, defender)?,
        }
        self.consume_action(player)?;

        if self.processing && self.current == player && self.map.is_eliminated(player) {
            self.end_turn()?;
        }
        Ok(())
    }

    /// Move a unit into an unoccupied sector, capturing it.
    fn advance(&mut self, player: PlayerId, from: SectorId, to: SectorId) -> GameResult<()> {
        let unit = self
            .map
            .sector_mut(from)
            .and_then(Sector::take_unit)
            .ok_or(InvalidOperation::NotOwnUnit {
                sector: from,
                player,
            })?;
        let id = unit.id();
        self.map
            .sector_mut(to)
            .ok_or(InvalidOperation::UnknownSector(to))?
            .place_unit(unit);
        debug!(unit = id, from, to, "unit moved");
        self.emit(GameEvent::UnitMoved { unit: id, from, to })?;
        self.capture(to, player)
    }

    /// Exchange two friendly units.
    fn swap(&mut self, from: SectorId, to: SectorId) -> GameResult<()> {
        let a = self.map.sector_mut(from).and_then(Sector::take_unit);
        let b = self.map.sector_mut(to).and_then(Sector::take_unit);
        let (Some(a), Some(b)) = (a, b) else {
            return Err(InvalidOperation::UnknownSector(to).into());
        };
        let (a_id, b_id) = (a.id(), b.id());
        if let Some(sector) = self.map.sector_mut(to) {
            sector.place_unit(a);
        }
        if let Some(sector) = self.map.sector_mut(from) {
            sector.place_unit(b);
        }
        debug!(from, to, "units swapped");
        self.emit(GameEvent::UnitMoved {
            unit: a_id,
            from,
            to,
        })?;
        self.emit(GameEvent::UnitMoved {
            unit: b_id,
            from: to,
            to: from,
        })
    }

    /// Resolve an attack on an enemy unit.
    fn fight(&mut self, player: PlayerId, from: SectorId, to: SectorId, defender: UnitId) -> GameResult<()> {
        let attacker = self
            .map
            .sector(from)
            .and_then(Sector::unit)
            .ok_or(InvalidOperation::UnknownSector(from))?;
        let target = self
            .map
            .unit(defender)
            .ok_or(InvalidOperation::UnknownUnit(defender))?;
        let attacker_id = attacker.id();
        let defender_owner = target.owner();
        let attack = Combatant::of(attacker, self.roster.get(player));
        let defence = Combatant::of(target, defender_owner.and_then(|o| self.roster.get(o)));

        let outcome = combat::resolve(attack, defence, &mut self.rng);
        debug!(
            attacker = attacker_id,
            defender,
            diff = outcome.diff,
            roll = outcome.roll,
            contested = outcome.contested,
            victor = ?outcome.victor,
            damage = outcome.damage,
            "combat resolved"
        );

        match outcome.victor {
            Victor::Attacker => {
                let dead = self
                    .map
                    .unit_mut(defender)
                    .ok_or(InvalidOperation::UnknownUnit(defender))?
                    .take_damage(outcome.damage)?;
                if dead {
                    self.destroy_unit(defender, Some(player))?;
                    self.advance(player, from, to)
                } else {
                    self.emit(GameEvent::UnitAttacked {
                        unit: defender,
                        sector: to,
                        attacker: player,
                        damage: outcome.damage,
                    })
                }
            }
            Victor::Defender => self.destroy_unit(attacker_id, defender_owner),
        }
    }

    /// Take a unit off the map and destroy it.
    pub(super) fn destroy_unit(&mut self, unit: UnitId, eliminator: Option<PlayerId>) -> GameResult<()> {
        let sector = self
            .map
            .find_unit(unit)
            .ok_or(InvalidOperation::UnknownUnit(unit))?;
        let mut dead = self
            .map
            .sector_mut(sector)
            .and_then(Sector::take_unit)
            .ok_or(InvalidOperation::UnknownUnit(unit))?;
        let owner = dead.owner();
        dead.destroy()?;
        debug!(unit, sector, ?owner, ?eliminator, "unit destroyed");
        for command in dead.effects_mut().take_commands() {
            self.execute(command)?;
        }
        self.emit(GameEvent::UnitDied {
            unit,
            owner,
            sector,
            eliminator,
        })
    }

    /// Hand `sector` to `player`.
    pub(super) fn capture(&mut self, sector: SectorId, player: PlayerId) -> GameResult<()> {
        let old = self
            .map
            .sector_mut(sector)
            .ok_or(InvalidOperation::UnknownSector(sector))?
            .set_owner(Some(player));
        if old == Some(player) {
            return Ok(());
        }
        info!(sector, old_owner = ?old, new_owner = player, "sector captured");
        self.emit(GameEvent::SectorCaptured {
            sector,
            old_owner: old,
            new_owner: Some(player),
        })
    }

    /// Human input: select an own unit, move the selected unit, or
    /// deselect.
    ///
    /// Ignored on AI turns, while a minigame is in progress, and after the
    /// game has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if `sector` does not exist or the resulting move is
    /// illegal.
    pub fn sector_clicked(&mut self, sector: SectorId) -> GameResult<()> {
        if !self.accepts_input() || self.roster.get(self.current).is_none_or(|p| p.is_ai()) {
            return Ok(());
        }
        let player = self.current;
        let own_unit = self
            .map
            .sector(sector)
            .ok_or(InvalidOperation::UnknownSector(sector))?
            .unit()
            .is_some_and(|u| u.owner() == Some(player));

        match self.selected {
            None => {
                if own_unit {
                    self.selected = Some(sector);
                }
            }
            Some(from) if from == sector => self.selected = None,
            Some(from) => {
                self.selected = None;
                let range = self
                    .roster
                    .get(player)
                    .map_or(0, |p| p.effects().move_range());
                if self.map.reachable(from, range).contains(&sector) {
                    self.move_for(player, from, sector)?;
                } else if own_unit {
                    self.selected = Some(sector);
                }
            }
        }
        self.finish_step()
    }

    /// Human input: end the turn before the action budget is spent.
    ///
    /// Ignored on AI turns, while a minigame is in progress, and after the
    /// game has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if advancing to the next player fails.
    pub fn end_turn_now(&mut self) -> GameResult<()> {
        if !self.accepts_input() || self.roster.get(self.current).is_none_or(|p| p.is_ai()) {
            return Ok(());
        }
        self.end_turn()?;
        self.finish_step()
    }

    /// Divert into the minigame if a bonus objective was captured during
    /// the step that just finished.
    pub(super) fn finish_step(&mut self) -> GameResult<()> {
        if !self.processing || self.diversion.is_some() {
            self.minigame_request = None;
            return Ok(());
        }
        let Some(player) = self.minigame_request.take() else {
            return Ok(());
        };
        self.diversion = Some(Diversion {
            player,
            snapshot: self.snapshot(),
        });
        info!(player, "diverted into minigame");
        self.emit(GameEvent::MinigameRequested { player })
    }

    /// Resume after the minigame: restore the state saved at diversion,
    /// grant `reward` to the player who captured the objective and reset
    /// the bonus objective timer.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOperation::NotDiverted`] if no minigame is in
    /// progress.
    pub fn complete_minigame(&mut self, reward: Resource) -> GameResult<()> {
        let Diversion { player, snapshot } =
            self.diversion.take().ok_or(InvalidOperation::NotDiverted)?;
        self.restore_state(&snapshot)?;

        let amount = self.config.minigame_reward;
        self.effects_mut(EffectOwner::Player(player))?
            .apply(Effect::MinigameReward {
                resource: reward,
                amount,
            })?;
        self.run_commands()?;
        self.map.bonus.countdown = self.config.bonus_objective_interval;
        info!(player, ?reward, "minigame completed");
        self.emit(GameEvent::MinigameCompleted { player, reward })?;
        self.ensure_autoplay();
        self.finish_step()
    }
}
