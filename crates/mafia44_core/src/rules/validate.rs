//! Move validation: the per-stage legality table.

use super::applicability::{accessible_stages, acting_index};
use crate::action::{Action, MoveError};
use crate::cards::{Role, Seat, TOTAL_CARDS, is_discard_card, is_player_card, owner_of};
use crate::game::Game;
use crate::stage::Stage;
use tracing::{debug, instrument, warn};

/// Position predicates relative to the acting seat.
struct Perspective<'a> {
    game: &'a Game,
    seat: Seat,
}

impl Perspective<'_> {
    fn own(&self, idx: usize) -> bool {
        owner_of(idx) == Some(self.seat)
    }

    fn other(&self, idx: usize) -> bool {
        is_player_card(idx) && !self.own(idx)
    }

    fn discard(&self, idx: usize) -> bool {
        is_discard_card(idx)
    }

    fn dealt(&self, idx: usize) -> Option<Role> {
        self.game.roles().get(idx)
    }
}

/// Checks a proposed move for the current stage and seat.
///
/// Rejects stages the seat holds no role for, references outside the card
/// array, and any shape the stage's rule does not allow.
///
/// # Errors
///
/// Returns the first [`MoveError`] found. Nothing is recorded either way.
#[instrument(skip(game, action), fields(stage = %game.stage(), ?action))]
pub fn check_action(game: &Game, seat: Seat, action: &Action) -> Result<(), MoveError> {
    let stage = game.stage();
    if !accessible_stages(game, seat).contains(&stage) {
        warn!(seat, %stage, "Stage not accessible to seat");
        return Err(MoveError::StageNotAccessible { seat, stage });
    }

    if let Some(swap) = action.swap()
        && swap.a() == swap.b()
    {
        return Err(MoveError::SwapSameCard(swap.a()));
    }
    if let Some(idx) = action.indices().find(|idx| *idx >= TOTAL_CARDS) {
        return Err(MoveError::IndexOutOfRange(idx));
    }

    let view = Perspective { game, seat };
    if is_legal_shape(&view, stage, action) {
        debug!(seat, %stage, "Move accepted");
        Ok(())
    } else {
        warn!(seat, %stage, "Move shape rejected");
        Err(MoveError::IllegalMove(stage))
    }
}

/// The legality table, one rule per stage.
fn is_legal_shape(view: &Perspective<'_>, stage: Stage, action: &Action) -> bool {
    let shown = action.cards_to_show();
    let swapped = action.swapped_cards();
    let acting = acting_index(view.game, stage);
    let acting_role = stage.acting_card();

    match stage {
        Stage::Beginning | Stage::Brothers | Stage::Shooting | Stage::Finished => false,
        Stage::Copy => {
            shown.len() == 1 && view.dealt(shown[0]) != Some(Role::Copy) && !action.is_swap()
        }
        Stage::Thief | Stage::ThiefCopy => {
            shown.len() == 1
                && view.other(shown[0])
                && action.is_swap()
                && swapped.contains(&shown[0])
                && acting.is_some_and(|idx| swapped.contains(&idx))
        }
        Stage::Seer | Stage::SeerCopy => {
            let one_other = shown.len() == 1 && view.other(shown[0]);
            let two_discards = shown.len() == 2 && shown.iter().all(|idx| view.discard(*idx));
            (one_other || two_discards)
                && shown.iter().all(|idx| view.dealt(*idx) != acting_role)
                && !action.is_swap()
        }
        Stage::Brawler | Stage::BrawlerCopy => {
            shown.is_empty() && action.is_swap() && swapped.iter().all(|idx| view.other(*idx))
        }
        Stage::Drunkard | Stage::DrunkardCopy => {
            shown.is_empty()
                && action.is_swap()
                && swapped.iter().any(|idx| view.discard(*idx))
                && swapped.iter().any(|idx| view.dealt(*idx) == acting_role)
        }
        Stage::Witch | Stage::WitchCopy => {
            shown.is_empty()
                && action.is_swap()
                && swapped.iter().any(|idx| view.discard(*idx))
                && swapped.iter().any(|idx| view.other(*idx))
        }
        Stage::Milkman | Stage::MilkmanCopy => {
            shown.len() == 1 && view.dealt(shown[0]) == acting_role && !action.is_swap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Cards;
    use chrono::Utc;

    /// Seat 0: Copy, Thief. Seat 1: Brothers1, Brothers2. Seat 2: Seer,
    /// Brawler. Seat 3: Drunkard, Witch. Discard: Milkman, Mafia, Suicide.
    fn at_stage(stage: Stage) -> Game {
        let mut game = Game::new(Cards::ordered(), Utc::now());
        game.stage = stage;
        game
    }

    fn swap(show: Vec<usize>, a: usize, b: usize) -> Action {
        Action::new(show, Some(a), Some(b)).unwrap()
    }

    #[test]
    fn test_seat_without_role_is_rejected() {
        let game = at_stage(Stage::Thief);
        let err = check_action(&game, 2, &swap(vec![4], 4, 1)).unwrap_err();
        assert_eq!(err, MoveError::StageNotAccessible { seat: 2, stage: Stage::Thief });
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let game = at_stage(Stage::Seer);
        let err = check_action(&game, 2, &Action::show(vec![11])).unwrap_err();
        assert_eq!(err, MoveError::IndexOutOfRange(11));
    }

    #[test]
    fn test_copy_cannot_look_at_copy() {
        let game = at_stage(Stage::Copy);
        assert!(check_action(&game, 0, &Action::show(vec![0])).is_err());
        assert!(check_action(&game, 0, &Action::show(vec![4])).is_ok());
        assert!(check_action(&game, 0, &Action::show(vec![9])).is_ok());
        assert!(check_action(&game, 0, &swap(vec![4], 4, 0)).is_err());
    }

    #[test]
    fn test_thief_must_take_what_it_sees() {
        let game = at_stage(Stage::Thief);
        assert!(check_action(&game, 0, &swap(vec![4], 4, 1)).is_ok());
        assert!(check_action(&game, 0, &swap(vec![4], 5, 1)).is_err());
        assert!(check_action(&game, 0, &swap(vec![8], 8, 1)).is_err());
        assert!(check_action(&game, 0, &Action::show(vec![1])).is_err());
        assert!(check_action(&game, 0, &Action::show(vec![4])).is_err());
    }

    #[test]
    fn test_seer_sees_one_other_or_two_discards() {
        let game = at_stage(Stage::Seer);
        assert!(check_action(&game, 2, &Action::show(vec![0])).is_ok());
        assert!(check_action(&game, 2, &Action::show(vec![8, 10])).is_ok());
        assert!(check_action(&game, 2, &Action::show(vec![5])).is_err());
        assert!(check_action(&game, 2, &Action::show(vec![0, 1])).is_err());
        assert!(check_action(&game, 2, &Action::show(vec![8])).is_err());
        assert!(check_action(&game, 2, &swap(vec![0], 0, 8)).is_err());
    }

    #[test]
    fn test_brawler_swaps_two_other_seats() {
        let game = at_stage(Stage::Brawler);
        assert!(check_action(&game, 2, &swap(vec![], 0, 7)).is_ok());
        assert!(check_action(&game, 2, &swap(vec![], 0, 4)).is_err());
        assert!(check_action(&game, 2, &swap(vec![], 0, 8)).is_err());
        assert!(check_action(&game, 2, &swap(vec![0], 0, 7)).is_err());
    }

    #[test]
    fn test_drunkard_swaps_itself_with_discard() {
        let game = at_stage(Stage::Drunkard);
        assert!(check_action(&game, 3, &swap(vec![], 9, 6)).is_ok());
        assert!(check_action(&game, 3, &swap(vec![], 9, 7)).is_err());
        assert!(check_action(&game, 3, &swap(vec![], 0, 6)).is_err());
    }

    #[test]
    fn test_witch_swaps_discard_into_other_seat() {
        let game = at_stage(Stage::Witch);
        assert!(check_action(&game, 3, &swap(vec![], 10, 2)).is_ok());
        assert!(check_action(&game, 3, &swap(vec![], 10, 6)).is_err());
        assert!(check_action(&game, 3, &swap(vec![], 2, 4)).is_err());
    }

    #[test]
    fn test_copy_stage_acts_with_copy_card() {
        let mut game = at_stage(Stage::DrunkardCopy);
        game.copied_role = Some(Role::Drunkard);
        assert!(check_action(&game, 0, &swap(vec![], 8, 0)).is_ok());
        assert!(check_action(&game, 0, &swap(vec![], 8, 6)).is_err());
        assert!(check_action(&game, 3, &swap(vec![], 8, 6)).is_err());
    }

    #[test]
    fn test_brothers_and_structural_stages_take_no_move() {
        for stage in [Stage::Beginning, Stage::Brothers, Stage::Shooting] {
            let game = at_stage(stage);
            let err = check_action(&game, 1, &Action::show(vec![0])).unwrap_err();
            assert_eq!(err, MoveError::IllegalMove(stage));
        }
    }
}
