//! The game aggregate: current stage, copied role, history and accusations.

use crate::cards::{Cards, PLAYERS, Role, Seat};
use crate::history::{History, Snapshot};
use crate::invariants::{GameInvariants, InvariantSet, InvariantViolation};
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, instrument, warn};

/// One game session, owned by one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub(crate) stage: Stage,
    pub(crate) roles: Cards,
    pub(crate) copied_role: Option<Role>,
    pub(crate) history: History,
    pub(crate) shots: [Option<usize>; PLAYERS],
}

impl Game {
    /// Starts a game from a given deal.
    #[instrument(skip(cards))]
    pub fn new(cards: Cards, now: DateTime<Utc>) -> Self {
        info!(cards = ?cards.roles(), "Dealing new game");
        Self {
            stage: Stage::Beginning,
            roles: cards.clone(),
            copied_role: None,
            history: History::new(cards, now),
            shots: [None; PLAYERS],
        }
    }

    /// Starts a game from a fresh shuffle.
    #[instrument(skip(rng))]
    pub fn deal<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Self {
        Self::new(Cards::shuffled(rng), now)
    }

    /// Rebuilds a stored game.
    ///
    /// # Errors
    ///
    /// Returns every violated invariant if the stored parts do not form a
    /// reachable game.
    #[instrument(skip(snapshots))]
    pub fn restore(
        stage: Stage,
        copied_role: Option<Role>,
        snapshots: Vec<Snapshot>,
        shots: [Option<usize>; PLAYERS],
    ) -> Result<Self, Vec<InvariantViolation>> {
        let history = History::from_snapshots(snapshots);
        let roles = history
            .first()
            .filter(|s| s.stage() == Stage::Beginning)
            .map(|s| s.cards().clone())
            .ok_or_else(|| vec![InvariantViolation::new("History starts with the opening deal")])?;
        let game = Self {
            stage,
            roles,
            copied_role,
            history,
            shots,
        };
        GameInvariants::check_all(&game).inspect_err(|violations| {
            warn!(?violations, "Stored game violates invariants");
        })?;
        Ok(game)
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Role seen by Copy, once the Copy stage has resolved.
    pub fn copied_role(&self) -> Option<Role> {
        self.copied_role
    }

    /// Every reached snapshot.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Accused position per seat.
    pub fn shots(&self) -> &[Option<usize>; PLAYERS] {
        &self.shots
    }

    /// The opening deal. Roles act as dealt, whatever swaps follow.
    pub fn roles(&self) -> &Cards {
        &self.roles
    }

    /// Snapshot of the current stage.
    pub fn current(&self) -> Option<&Snapshot> {
        self.history.get(self.stage)
    }

    /// Roles dealt to a seat.
    pub fn seat_roles(&self, seat: Seat) -> &[Role] {
        self.roles().seat_roles(seat)
    }

    /// True once the game reached [`Stage::Finished`].
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Finished
    }
}
