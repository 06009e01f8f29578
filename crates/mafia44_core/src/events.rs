//! Domain events emitted by every state change.
//!
//! Storage persists a game by appending exactly these, in order.

use crate::action::Action;
use crate::cards::{Cards, Role, Seat};
use crate::game::Game;
use crate::history::Snapshot;
use crate::invariants::InvariantViolation;
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// A change to one game's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A snapshot for a new stage was derived.
    SnapshotAppended {
        /// Stage of the new snapshot.
        stage: Stage,
        /// Creation time.
        timestamp: DateTime<Utc>,
        /// Card array of the new snapshot.
        cards: Cards,
    },
    /// A move was recorded against a snapshot.
    ActionRecorded {
        /// Stage of the snapshot carrying the move.
        stage: Stage,
        /// The move.
        action: Action,
    },
    /// A seat acknowledged a snapshot.
    StageRead {
        /// Stage read.
        stage: Stage,
        /// Reading seat.
        seat: Seat,
        /// Read time.
        timestamp: DateTime<Utc>,
    },
    /// The current stage moved forward.
    StageAdvanced {
        /// The new current stage.
        stage: Stage,
    },
    /// Copy saw a role and will act as it.
    RoleCopied {
        /// The role seen.
        role: Role,
    },
    /// A seat accused a card.
    CardShot {
        /// Accusing seat.
        shooter: Seat,
        /// Accused position.
        target: usize,
    },
}

impl Game {
    /// Replays one event onto this game.
    ///
    /// Replay trusts the decisions the events record; it only refuses
    /// events that contradict the game's current shape, such as a snapshot
    /// out of order or a second move for one stage.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] naming the contradiction. The game
    /// is left unchanged.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn apply(&mut self, event: &GameEvent) -> Result<(), InvariantViolation> {
        let result = match event {
            GameEvent::SnapshotAppended {
                stage,
                timestamp,
                cards,
            } => self
                .history
                .append(Snapshot::new(*stage, *timestamp, cards.clone()))
                .then_some(())
                .ok_or("Snapshot does not follow the latest stage"),
            GameEvent::ActionRecorded { stage, action } => match self.history.get_mut(*stage) {
                Some(snapshot) if snapshot.action().is_none() => {
                    snapshot.set_action(action.clone());
                    Ok(())
                }
                Some(_) => Err("Stage already has a move"),
                None => Err("Move for a stage without snapshot"),
            },
            GameEvent::StageRead {
                stage,
                seat,
                timestamp,
            } => self
                .history
                .get_mut(*stage)
                .map(|snapshot| snapshot.mark_read(*seat, *timestamp))
                .filter(|marked| *marked)
                .map(|_| ())
                .ok_or("Read of an unknown stage or repeated read"),
            GameEvent::StageAdvanced { stage } => {
                if self.stage.next() == Some(*stage) {
                    self.stage = *stage;
                    Ok(())
                } else {
                    Err("Stage advanced out of order")
                }
            }
            GameEvent::RoleCopied { role } => {
                if self.copied_role.is_none() {
                    self.copied_role = Some(*role);
                    Ok(())
                } else {
                    Err("Copied role set twice")
                }
            }
            GameEvent::CardShot { shooter, target } => match self.shots.get_mut(*shooter) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(*target);
                    Ok(())
                }
                Some(_) => Err("Seat shot twice"),
                None => Err("Shot by an unknown seat"),
            },
        };
        result.map_err(|description| {
            warn!(?event, description, "Event does not apply");
            InvariantViolation::new(description)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_replay_reproduces_game() {
        let start = Utc::now();
        let mut live = Game::new(Cards::ordered(), start);
        let mut replica = live.clone();
        let mut events = Vec::new();
        for seat in 0..4 {
            events.extend(live.poll(seat, TimeDelta::zero(), start));
        }
        events.extend(live.poll(0, TimeDelta::zero(), start));
        events.extend(live.submit_selection(0, &[9], start).unwrap());
        assert_eq!(live.stage(), Stage::Copy);

        for event in &events {
            replica.apply(event).unwrap();
        }
        assert_eq!(replica, live);
    }

    #[test]
    fn test_second_move_does_not_apply() {
        let now = Utc::now();
        let mut game = Game::new(Cards::ordered(), now);
        let event = GameEvent::ActionRecorded {
            stage: Stage::Beginning,
            action: Action::show(vec![0]),
        };
        game.apply(&event).unwrap();
        assert!(game.apply(&event).is_err());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(GameEvent::CardShot {
            shooter: 1,
            target: 6,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "event": "card_shot", "shooter": 1, "target": 6 })
        );
    }
}
