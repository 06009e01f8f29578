//! Per-seat projections: what a seat is allowed to see of each stage.
//!
//! While the game runs, a seat sees its own deal at Beginning, the
//! Brothers' seats at Brothers, every accusation at Shooting, and at any
//! other stage exactly what the recorded move revealed. Once the game is
//! finished everything is revealed to everyone. The two Brothers cards
//! always appear under one [`PublicRole::Brothers`] label.

use crate::cards::{Cards, PLAYERS, PublicRole, Role, Seat, seat_positions};
use crate::game::Game;
use crate::history::Snapshot;
use crate::rules::accessible_stages;
use crate::stage::Stage;
use derive_getters::Getters;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// What one seat may see of one stage. Absent parts are omitted when
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Getters)]
pub struct StageView {
    /// Card array with unrevealed positions set to `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    cards_to_show: Option<Vec<Option<PublicRole>>>,
    /// Positions swapped at this stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    swap: Option<[usize; 2]>,
    /// Seats holding a Brothers card.
    #[serde(skip_serializing_if = "Option::is_none")]
    players_to_show: Option<Vec<Seat>>,
    /// Accused position per seat.
    #[serde(skip_serializing_if = "Option::is_none")]
    cards_shot: Option<[Option<usize>; PLAYERS]>,
}

/// A seat's view of the whole game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "history", rename_all = "snake_case")]
pub enum Projection {
    /// Each accessible stage, `None` until reached or when nothing is visible.
    InProgress(BTreeMap<Stage, Option<StageView>>),
    /// Every stage, fully revealed.
    Finished(BTreeMap<Stage, StageView>),
}

fn reveal(cards: &Cards, visible: impl Fn(usize) -> bool) -> Vec<Option<PublicRole>> {
    cards
        .roles()
        .iter()
        .enumerate()
        .map(|(idx, role)| visible(idx).then(|| role.public()))
        .collect()
}

/// Seats holding a Brothers card, counting Copy when it copied a Brother.
fn brothers_seats(game: &Game) -> Vec<Seat> {
    let copied_brother = game.copied_role().is_some_and(Role::is_brothers);
    (0..PLAYERS)
        .filter(|seat| {
            game.seat_roles(*seat)
                .iter()
                .any(|role| role.is_brothers() || (copied_brother && *role == Role::Copy))
        })
        .collect()
}

/// What the move recorded at `snapshot` revealed, `None` without a move.
fn recorded_view(snapshot: &Snapshot) -> Option<StageView> {
    let action = snapshot.action()?;
    Some(StageView {
        cards_to_show: Some(reveal(snapshot.cards(), |idx| {
            action.cards_to_show().contains(&idx)
        })),
        swap: action.swap().map(|swap| swap.pair()),
        ..StageView::default()
    })
}

/// What `seat` may see of `stage` while the game runs.
///
/// `None` if the stage was not reached or revealed nothing to anyone.
#[instrument(skip(game))]
pub fn stage_view(game: &Game, stage: Stage, seat: Seat) -> Option<StageView> {
    let snapshot = game.history().get(stage)?;
    match stage {
        Stage::Beginning => {
            let own = seat_positions(seat);
            Some(StageView {
                cards_to_show: Some(reveal(game.roles(), |idx| own.contains(&idx))),
                ..StageView::default()
            })
        }
        Stage::Brothers => Some(StageView {
            players_to_show: Some(brothers_seats(game)),
            ..StageView::default()
        }),
        Stage::Shooting => Some(StageView {
            cards_shot: Some(*game.shots()),
            ..StageView::default()
        }),
        _ => recorded_view(snapshot),
    }
}

/// Every stage `seat` can act at, with its view once reached.
#[instrument(skip(game))]
pub fn player_history(game: &Game, seat: Seat) -> BTreeMap<Stage, Option<StageView>> {
    accessible_stages(game, seat)
        .into_iter()
        .map(|stage| {
            let view = if stage <= game.stage() {
                stage_view(game, stage, seat)
            } else {
                None
            };
            (stage, view)
        })
        .collect()
}

/// The fully revealed history of a game.
///
/// Stages without a move, and stages whose move swapped cards, show their
/// whole card array. Finished shows the final array.
#[instrument(skip(game))]
pub fn full_history(game: &Game) -> BTreeMap<Stage, StageView> {
    let mut history = BTreeMap::new();
    for snapshot in game.history().iter() {
        let stage = snapshot.stage();
        if stage == Stage::Finished {
            history.insert(
                stage,
                StageView {
                    cards_to_show: Some(reveal(snapshot.cards(), |_| true)),
                    ..StageView::default()
                },
            );
            break;
        }
        let mut view = match stage {
            Stage::Beginning => StageView::default(),
            Stage::Brothers => StageView {
                players_to_show: Some(brothers_seats(game)),
                ..StageView::default()
            },
            Stage::Shooting => StageView {
                cards_shot: Some(*game.shots()),
                ..StageView::default()
            },
            _ => recorded_view(snapshot).unwrap_or_default(),
        };
        if snapshot.action().is_none_or(|action| action.is_swap()) {
            view.cards_to_show = Some(reveal(snapshot.cards(), |_| true));
        }
        history.insert(stage, view);
    }
    history
}

/// A seat's view: its own history while the game runs, everything after.
#[instrument(skip(game))]
pub fn projection(game: &Game, seat: Seat) -> Projection {
    if game.is_finished() {
        debug!("Game finished, revealing everything");
        Projection::Finished(full_history(game))
    } else {
        Projection::InProgress(player_history(game, seat))
    }
}
