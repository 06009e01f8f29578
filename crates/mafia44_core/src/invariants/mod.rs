//! First-class invariants for Mafia44.
//!
//! Invariants are logical properties that must hold for every reachable
//! game. They are checked after each advancement in debug builds and every
//! time a stored game is restored.

pub mod contiguous_history;
pub mod role_multiset;
pub mod swap_derivation;

pub use contiguous_history::ContiguousHistoryInvariant;
pub use role_multiset::RoleMultisetInvariant;
pub use swap_derivation::SwapDerivationInvariant;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for triples, the shape of [`GameInvariants`].
pub trait InvariantSet<S> {
    /// Checks all invariants in the set.
    ///
    /// Returns Ok(()) if all invariants hold, or Err with a list of
    /// violations if any invariant fails.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

/// Records a violation of `I` unless it holds.
fn check<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        violations.push(InvariantViolation::new(I::description()));
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        check::<S, I1>(state, &mut violations);
        check::<S, I2>(state, &mut violations);
        check::<S, I3>(state, &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Every game invariant as a composable set.
pub type GameInvariants = (
    RoleMultisetInvariant,
    ContiguousHistoryInvariant,
    SwapDerivationInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Cards;
    use crate::game::Game;
    use crate::history::Snapshot;
    use crate::stage::Stage;
    use chrono::Utc;

    #[test]
    fn test_fresh_game_holds() {
        let game = Game::new(Cards::ordered(), Utc::now());
        assert!(GameInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_violations_are_collected() {
        let mut game = Game::new(Cards::ordered(), Utc::now());
        // A Seer snapshot right after Beginning, with cards nobody swapped.
        game.history = crate::history::History::from_snapshots(vec![
            Snapshot::new(Stage::Beginning, Utc::now(), Cards::ordered()),
            Snapshot::new(Stage::Seer, Utc::now(), Cards::ordered().swapped(0, 8)),
        ]);
        let violations = GameInvariants::check_all(&game).unwrap_err();
        assert_eq!(violations.len(), 2);
    }
}
