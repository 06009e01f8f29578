//! Translation of raw card selections into stage-shaped moves.

use super::applicability::{accessible_stages, acting_index};
use super::validate::check_action;
use crate::action::{Action, MoveError};
use crate::cards::Seat;
use crate::game::Game;
use crate::stage::Stage;
use tracing::{instrument, warn};

/// Builds the move a seat means by selecting `selected` at the current
/// stage, then validates it.
///
/// Thief and Drunkard swap their first selection with their own dealt
/// card; Brawler and Witch swap their two selections; Copy and Seer only
/// look. Milkman never selects: its reveal is forced by the engine.
///
/// # Errors
///
/// Returns [`MoveError::StageNotAccessible`] for a seat that cannot act at
/// the current stage, whatever it selected, so the error never depends on
/// where the acting card lies. Otherwise returns [`MoveError`] if the stage
/// takes no selection, the selection has the wrong size, or the resulting
/// move fails [`check_action`].
#[instrument(skip(game), fields(stage = %game.stage()))]
pub fn selected_cards_to_action(
    game: &Game,
    seat: Seat,
    selected: &[usize],
) -> Result<Action, MoveError> {
    let stage = game.stage();
    if !accessible_stages(game, seat).contains(&stage) {
        warn!(seat, %stage, "Selection from a seat that cannot act");
        return Err(MoveError::StageNotAccessible { seat, stage });
    }
    let action = match stage {
        Stage::Beginning
        | Stage::Brothers
        | Stage::Milkman
        | Stage::MilkmanCopy
        | Stage::Shooting
        | Stage::Finished => {
            warn!(seat, %stage, "Selection at a stage that takes none");
            return Err(MoveError::NoSelection(stage));
        }
        Stage::Copy | Stage::Seer | Stage::SeerCopy => Action::show(selected.to_vec()),
        Stage::Thief | Stage::ThiefCopy => {
            let [target] = exactly::<1>(stage, selected)?;
            let own = own_card(game, seat, stage)?;
            Action::new(vec![target], Some(target), Some(own))?
        }
        Stage::Brawler | Stage::BrawlerCopy | Stage::Witch | Stage::WitchCopy => {
            let [a, b] = exactly::<2>(stage, selected)?;
            Action::new(Vec::new(), Some(a), Some(b))?
        }
        Stage::Drunkard | Stage::DrunkardCopy => {
            let [target] = exactly::<1>(stage, selected)?;
            let own = own_card(game, seat, stage)?;
            Action::new(Vec::new(), Some(target), Some(own))?
        }
    };
    check_action(game, seat, &action)?;
    Ok(action)
}

fn exactly<const N: usize>(stage: Stage, selected: &[usize]) -> Result<[usize; N], MoveError> {
    selected
        .try_into()
        .map_err(|_| MoveError::WrongSelectionCount {
            stage,
            expected: N,
            got: selected.len(),
        })
}

/// The acting card's dealt position; a stage whose card is undealt has no
/// actor, so nobody may select there.
fn own_card(game: &Game, seat: Seat, stage: Stage) -> Result<usize, MoveError> {
    acting_index(game, stage).ok_or(MoveError::StageNotAccessible { seat, stage })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Cards, PLAYERS, Role, TOTAL_CARDS};
    use chrono::Utc;

    /// Seat 0: Copy, Thief. Seat 1: Brothers1, Brothers2. Seat 2: Seer,
    /// Brawler. Seat 3: Drunkard, Witch. Discard: Milkman, Mafia, Suicide.
    fn at_stage(stage: Stage) -> Game {
        let mut game = Game::new(Cards::ordered(), Utc::now());
        game.stage = stage;
        game
    }

    #[test]
    fn test_thief_selection_swaps_with_thief() {
        let game = at_stage(Stage::Thief);
        let action = selected_cards_to_action(&game, 0, &[6]).unwrap();
        assert_eq!(action.cards_to_show(), &[6]);
        assert_eq!(action.swapped_cards(), vec![6, 1]);
    }

    #[test]
    fn test_non_holder_gets_one_error_for_every_selection() {
        for (stage, holder) in [
            (Stage::Thief, 0),
            (Stage::Drunkard, 3),
            (Stage::ThiefCopy, 0),
            (Stage::DrunkardCopy, 0),
        ] {
            let mut game = at_stage(stage);
            game.copied_role = stage.imitated_role();
            let outsider = (holder + 2) % PLAYERS;
            let expected = MoveError::StageNotAccessible {
                seat: outsider,
                stage,
            };
            for idx in 0..=TOTAL_CARDS {
                assert_eq!(
                    selected_cards_to_action(&game, outsider, &[idx]).unwrap_err(),
                    expected,
                    "selection [{}] at {}",
                    idx,
                    stage
                );
            }
            assert_eq!(
                selected_cards_to_action(&game, outsider, &[]).unwrap_err(),
                expected
            );
        }
    }

    #[test]
    fn test_thief_needs_one_selection() {
        let game = at_stage(Stage::Thief);
        let err = selected_cards_to_action(&game, 0, &[]).unwrap_err();
        assert_eq!(
            err,
            MoveError::WrongSelectionCount { stage: Stage::Thief, expected: 1, got: 0 }
        );
    }

    #[test]
    fn test_drunkard_selecting_itself_is_rejected() {
        let game = at_stage(Stage::Drunkard);
        let err = selected_cards_to_action(&game, 3, &[6]).unwrap_err();
        assert_eq!(err, MoveError::SwapSameCard(6));
    }

    #[test]
    fn test_drunkard_selection_swaps_with_drunkard() {
        let game = at_stage(Stage::Drunkard);
        let action = selected_cards_to_action(&game, 3, &[10]).unwrap();
        assert!(action.cards_to_show().is_empty());
        assert_eq!(action.swapped_cards(), vec![10, 6]);
    }

    #[test]
    fn test_witch_takes_two_selections() {
        let game = at_stage(Stage::Witch);
        assert!(selected_cards_to_action(&game, 3, &[8]).is_err());
        let action = selected_cards_to_action(&game, 3, &[8, 0]).unwrap();
        assert_eq!(action.swapped_cards(), vec![8, 0]);
    }

    #[test]
    fn test_milkman_takes_no_selection() {
        let mut cards: Vec<Role> = Cards::ordered().roles().to_vec();
        cards.swap(8, 1);
        let mut game = Game::new(Cards::from_roles(cards).unwrap(), Utc::now());
        game.stage = Stage::Milkman;
        let err = selected_cards_to_action(&game, 0, &[1]).unwrap_err();
        assert_eq!(err, MoveError::NoSelection(Stage::Milkman));
    }

    #[test]
    fn test_seer_empty_selection_is_rejected() {
        let game = at_stage(Stage::Seer);
        assert_eq!(
            selected_cards_to_action(&game, 2, &[]).unwrap_err(),
            MoveError::IllegalMove(Stage::Seer)
        );
    }
}
