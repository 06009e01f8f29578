//! Contiguous history invariant: one snapshot per visited stage, in order.

use super::Invariant;
use crate::game::Game;

/// Invariant: the history is a gap-free prefix of the stage order.
///
/// Snapshot `i` belongs to stage `i`, the current stage has a snapshot, and
/// at most the one stage after the current stage has been derived ahead.
pub struct ContiguousHistoryInvariant;

impl Invariant<Game> for ContiguousHistoryInvariant {
    fn holds(game: &Game) -> bool {
        let ordered = game
            .history()
            .iter()
            .enumerate()
            .all(|(i, s)| s.stage().index() == i);
        let current = game.stage().index();
        let len = game.history().len();
        ordered && len > current && len <= current + 2
    }

    fn description() -> &'static str {
        "History holds one snapshot per stage up to at most one past the current stage"
    }
}
