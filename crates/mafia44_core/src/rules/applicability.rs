//! Which stages wait for input, and who may provide it.

use crate::cards::{Role, Seat, is_player_card};
use crate::game::Game;
use crate::stage::Stage;
use tracing::{debug, instrument};

/// Decides whether the game waits for a move at `stage` or passes
/// through it.
///
/// A role-bound stage waits only if some seat was dealt that role. A copy
/// stage waits only if Copy saw the matching role.
#[instrument(skip(game), fields(copied_role = ?game.copied_role()))]
pub fn is_action_required(game: &Game, stage: Stage) -> bool {
    if stage.is_structural() {
        return false;
    }
    if let Some(role) = stage.bound_role() {
        let required = game.roles().is_dealt(role);
        debug!(%stage, %role, required, "Role-bound stage");
        return required;
    }
    game.copied_role()
        .and_then(Stage::for_copied_role)
        .is_some_and(|copy_stage| copy_stage == stage)
}

/// Stages at which a seat may act, in stage order.
///
/// Beginning, one stage per dealt role, the copy stage unlocked by Copy,
/// and Shooting.
#[instrument(skip(game))]
pub fn accessible_stages(game: &Game, seat: Seat) -> Vec<Stage> {
    let roles = game.seat_roles(seat);
    let mut stages = vec![Stage::Beginning];
    stages.extend(roles.iter().copied().filter_map(Stage::for_role));
    if roles.contains(&Role::Copy)
        && let Some(copy_stage) = game.copied_role().and_then(Stage::for_copied_role)
    {
        stages.push(copy_stage);
    }
    stages.push(Stage::Shooting);
    stages.sort();
    stages.dedup();
    stages
}

/// Dealt position of the card acting at `stage`: the stage's role, or
/// Copy at a copy stage. `None` when nobody acts or the card is undealt.
#[instrument(skip(game))]
pub fn acting_index(game: &Game, stage: Stage) -> Option<usize> {
    stage
        .acting_card()
        .and_then(|role| game.roles().position_of(role))
        .filter(|idx| is_player_card(*idx))
}
