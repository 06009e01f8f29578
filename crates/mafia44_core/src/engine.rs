//! Stage advancement engine.
//!
//! Every request for a room may call into the engine. Deriving the next
//! snapshot is idempotent: once it exists, repeated calls change nothing.
//! Moving the stage counter is gated separately by [`Game::is_stage_ready`].

use crate::action::{Action, MoveError};
use crate::cards::{PLAYERS, Role, Seat, is_player_card};
use crate::events::GameEvent;
use crate::game::Game;
use crate::history::Snapshot;
use crate::invariants::{GameInvariants, InvariantSet};
use crate::rules::{check_action, is_action_required, selected_cards_to_action};
use crate::stage::Stage;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, instrument, warn};

impl Game {
    /// Derives the snapshot for the stage after the current one, if it can
    /// be derived yet.
    ///
    /// - Already derived: nothing happens.
    /// - Milkman dealt to a seat (or copied by Copy): its reveal is recorded
    ///   first, since the Milkman has no choice to make.
    /// - No move required: the cards carry over unchanged.
    /// - Move recorded: the cards carry over with its swap applied. At the
    ///   Copy stage the copied role is fixed first.
    /// - Otherwise the game waits for a move.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn try_create_next_state(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        let stage = self.stage;
        let Some(next) = stage.next() else {
            debug!("Final stage has no successor");
            return Vec::new();
        };
        if self.history.get(next).is_some() {
            debug!(%next, "Next snapshot already exists");
            return Vec::new();
        }

        let mut events = Vec::new();
        events.extend(self.force_milkman_reveal());

        let Some(current) = self.history.get(stage) else {
            warn!("Current stage has no snapshot");
            return events;
        };

        let cards = if !is_action_required(self, stage) {
            debug!("No move required, carrying cards over");
            current.cards().clone()
        } else if let Some(action) = current.action() {
            let cards = action.apply(current.cards());
            if stage == Stage::Copy
                && let Some(role) = action
                    .cards_to_show()
                    .first()
                    .and_then(|idx| current.cards().get(*idx))
            {
                info!(%role, "Copy takes on role");
                self.copied_role = Some(role);
                events.push(GameEvent::RoleCopied { role });
            }
            cards
        } else {
            debug!("Waiting for a move");
            return events;
        };

        if self.history.append(Snapshot::new(next, now, cards.clone())) {
            info!(%next, "Snapshot appended");
            events.push(GameEvent::SnapshotAppended {
                stage: next,
                timestamp: now,
                cards,
            });
        }

        if cfg!(debug_assertions)
            && let Err(violations) = GameInvariants::check_all(self)
        {
            warn!(?violations, "Invariants violated after advancement");
            debug_assert!(violations.is_empty(), "{violations:?}");
        }

        events
    }

    /// Records the Milkman's reveal when the current stage is the Milkman's
    /// and nobody has recorded anything yet.
    fn force_milkman_reveal(&mut self) -> Option<GameEvent> {
        let stage = self.stage;
        let acting = match stage {
            Stage::Milkman => Role::Milkman,
            Stage::MilkmanCopy if self.copied_role == Some(Role::Milkman) => Role::Copy,
            _ => return None,
        };
        let idx = self.roles.position_of(acting).filter(|idx| is_player_card(*idx))?;
        let snapshot = self.history.get_mut(stage)?;
        if snapshot.action().is_some() {
            return None;
        }
        let action = Action::show(vec![idx]);
        info!(idx, "Revealing Milkman");
        snapshot.set_action(action.clone());
        Some(GameEvent::ActionRecorded { stage, action })
    }

    /// Decides whether the stage counter may move on.
    ///
    /// Shooting is ready once every seat has shot. Any other stage (except
    /// Finished, which never moves) is ready once its successor snapshot
    /// exists, every seat has read it, and at least `min_move_time` passed
    /// since the last read.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn is_stage_ready(&self, min_move_time: TimeDelta, now: DateTime<Utc>) -> bool {
        match self.stage {
            Stage::Finished => false,
            Stage::Shooting => {
                let ready = self.shots.iter().all(Option::is_some);
                debug!(ready, "Shooting readiness");
                ready
            }
            stage => {
                let Some(next) = stage.next() else {
                    return false;
                };
                if self.history.get(next).is_none() {
                    debug!("Next snapshot not derived yet");
                    return false;
                }
                let Some(current) = self.history.get(stage) else {
                    return false;
                };
                if current.reads().len() < PLAYERS {
                    debug!(reads = current.reads().len(), "Waiting for acknowledgements");
                    return false;
                }
                let Some(last_read) = current.last_read() else {
                    return false;
                };
                let elapsed = now - last_read;
                let ready = elapsed >= min_move_time;
                debug!(elapsed_ms = elapsed.num_milliseconds(), ready, "Read quorum reached");
                ready
            }
        }
    }

    /// Moves to the next stage and tries to derive the snapshot after it.
    ///
    /// Callers check [`Game::is_stage_ready`] first; see
    /// [`Game::advance_if_ready`].
    #[instrument(skip(self), fields(stage = %self.stage))]
    fn advance_stage(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        let Some(next) = self.stage.next() else {
            return Vec::new();
        };
        self.stage = next;
        info!(stage = %next, "Stage advanced");
        let mut events = vec![GameEvent::StageAdvanced { stage: next }];
        events.extend(self.try_create_next_state(now));
        events
    }

    /// Advances one stage if the stage-ready gate passes.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn advance_if_ready(&mut self, min_move_time: TimeDelta, now: DateTime<Utc>) -> Vec<GameEvent> {
        if self.is_stage_ready(min_move_time, now) {
            self.advance_stage(now)
        } else {
            Vec::new()
        }
    }

    /// Records that a seat has read the current stage. A second read by the
    /// same seat keeps the first timestamp.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn mark_read(&mut self, seat: Seat, now: DateTime<Utc>) -> Option<GameEvent> {
        let stage = self.stage;
        let snapshot = self.history.get_mut(stage)?;
        if !snapshot.mark_read(seat, now) {
            return None;
        }
        debug!(seat, "Stage read");
        Some(GameEvent::StageRead {
            stage,
            seat,
            timestamp: now,
        })
    }

    /// One stage poll: derive what can be derived, advance if ready, then
    /// acknowledge the (possibly new) current stage for `seat`.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn poll(&mut self, seat: Seat, min_move_time: TimeDelta, now: DateTime<Utc>) -> Vec<GameEvent> {
        let mut events = self.try_create_next_state(now);
        events.extend(self.advance_if_ready(min_move_time, now));
        events.extend(self.mark_read(seat, now));
        events
    }

    /// Validates and records a move for the current stage.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the move is illegal or a move is already
    /// recorded for this stage.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn record_action(&mut self, seat: Seat, action: Action) -> Result<GameEvent, MoveError> {
        check_action(self, seat, &action)?;
        let stage = self.stage;
        let snapshot = self
            .history
            .get_mut(stage)
            .ok_or(MoveError::IllegalMove(stage))?;
        if snapshot.action().is_some() {
            warn!(seat, "Move already recorded");
            return Err(MoveError::AlreadyRecorded(stage));
        }
        snapshot.set_action(action.clone());
        info!(seat, ?action, "Move recorded");
        Ok(GameEvent::ActionRecorded { stage, action })
    }

    /// Translates a selection, records it, and derives the next snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the selection does not form a legal move.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn submit_selection(
        &mut self,
        seat: Seat,
        selected: &[usize],
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, MoveError> {
        let action = selected_cards_to_action(self, seat, selected)?;
        let mut events = vec![self.record_action(seat, action)?];
        events.extend(self.try_create_next_state(now));
        Ok(events)
    }
}
