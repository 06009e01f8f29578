//! The accusation (shooting) phase.
//!
//! Every seat accuses exactly one card held by another seat. Accusations are
//! collected simultaneously; the stage is ready once all four are in.

use crate::action::MoveError;
use crate::cards::{Seat, is_player_card, owner_of};
use crate::events::GameEvent;
use crate::game::Game;
use crate::stage::Stage;
use tracing::{info, instrument, warn};

impl Game {
    /// Checks whether `seat` may accuse the card at `target`.
    ///
    /// # Errors
    ///
    /// - [`MoveError::NotShooting`] outside the Shooting stage
    /// - [`MoveError::ShotOutOfRange`] if no seat holds `target`
    /// - [`MoveError::ShootOwnCard`] if `seat` holds `target`
    /// - [`MoveError::AlreadyShot`] if `seat` already accused
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn can_shoot(&self, seat: Seat, target: usize) -> Result<(), MoveError> {
        if self.stage != Stage::Shooting {
            return Err(MoveError::NotShooting);
        }
        if !is_player_card(target) {
            return Err(MoveError::ShotOutOfRange(target));
        }
        if owner_of(target) == Some(seat) {
            return Err(MoveError::ShootOwnCard(seat));
        }
        match self.shots.get(seat) {
            Some(None) => Ok(()),
            Some(Some(_)) => Err(MoveError::AlreadyShot(seat)),
            None => Err(MoveError::StageNotAccessible {
                seat,
                stage: self.stage,
            }),
        }
    }

    /// Records an accusation. An earlier accusation is never overwritten.
    ///
    /// # Errors
    ///
    /// See [`Game::can_shoot`].
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn shoot(&mut self, seat: Seat, target: usize) -> Result<GameEvent, MoveError> {
        self.can_shoot(seat, target).inspect_err(|e| {
            warn!(seat, target, error = %e, "Accusation rejected");
        })?;
        if let Some(slot) = self.shots.get_mut(seat) {
            *slot = Some(target);
        }
        info!(seat, target, "Card shot");
        Ok(GameEvent::CardShot {
            shooter: seat,
            target,
        })
    }
}
