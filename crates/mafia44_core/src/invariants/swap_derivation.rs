//! Swap derivation invariant: each snapshot follows from the one before.

use super::Invariant;
use crate::game::Game;

/// Invariant: snapshot `i + 1` is snapshot `i` with its recorded swap
/// applied, or an unchanged copy when nothing was swapped.
pub struct SwapDerivationInvariant;

impl Invariant<Game> for SwapDerivationInvariant {
    fn holds(game: &Game) -> bool {
        let snapshots: Vec<_> = game.history().iter().collect();
        snapshots.windows(2).all(|pair| {
            let expected = match pair[0].action() {
                Some(action) => action.apply(pair[0].cards()),
                None => pair[0].cards().clone(),
            };
            &expected == pair[1].cards()
        })
    }

    fn description() -> &'static str {
        "Each snapshot equals the previous one with its swap applied"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Cards;
    use crate::history::{History, Snapshot};
    use crate::stage::Stage;
    use chrono::Utc;

    #[test]
    fn test_unrecorded_swap_violates() {
        let mut game = Game::new(Cards::ordered(), Utc::now());
        game.history = History::from_snapshots(vec![
            Snapshot::new(Stage::Beginning, Utc::now(), Cards::ordered()),
            Snapshot::new(Stage::Copy, Utc::now(), Cards::ordered().swapped(2, 9)),
        ]);
        assert!(!SwapDerivationInvariant::holds(&game));
    }

    #[test]
    fn test_pass_through_holds() {
        let mut game = Game::new(Cards::ordered(), Utc::now());
        game.try_create_next_state(Utc::now());
        assert!(SwapDerivationInvariant::holds(&game));
    }
}
