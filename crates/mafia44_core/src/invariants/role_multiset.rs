//! Role multiset invariant: every snapshot holds each role exactly once.

use super::Invariant;
use crate::game::Game;

/// Invariant: swaps only permute cards.
///
/// The dealt cards and every snapshot's cards contain each of the eleven
/// roles exactly once.
pub struct RoleMultisetInvariant;

impl Invariant<Game> for RoleMultisetInvariant {
    fn holds(game: &Game) -> bool {
        game.roles().is_full_deck() && game.history().iter().all(|s| s.cards().is_full_deck())
    }

    fn description() -> &'static str {
        "Every snapshot holds each role exactly once"
    }
}
