//! Database rows and their conversions to core types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use mafia44_core::{Action, Cards, Seat, Snapshot, Stage};
use std::collections::BTreeMap;
use tracing::instrument;

use crate::db::{DbError, schema};

/// Converts a stored integer column to an index.
#[track_caller]
pub(crate) fn to_index(value: i32) -> Result<usize, DbError> {
    usize::try_from(value).map_err(|_| DbError::new(format!("Negative index {} in storage", value)))
}

/// Converts an index to an integer column.
#[track_caller]
pub(crate) fn to_column(value: usize) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|_| DbError::new(format!("Index {} does not fit a column", value)))
}

/// Converts a stored stage number to a [`Stage`].
#[track_caller]
pub(crate) fn to_stage(value: i32) -> Result<Stage, DbError> {
    u8::try_from(value)
        .map_err(|_| DbError::new(format!("Stage {} out of range", value)))?
        .try_into()
        .map_err(DbError::new)
}

/// Room database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::rooms)]
pub struct RoomRow {
    id: i32,
    name: String,
    creator: String,
    min_move_time: i32,
    created_at: NaiveDateTime,
}

/// Insertable room.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::rooms)]
pub struct NewRoom {
    name: String,
    creator: String,
    min_move_time: i32,
}

/// Room membership database model.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::room_players)]
#[diesel(belongs_to(RoomRow, foreign_key = room_id))]
pub struct RoomPlayerRow {
    id: i32,
    room_id: i32,
    player_id: String,
    joined_at: NaiveDateTime,
}

/// Insertable room membership.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::room_players)]
pub struct NewRoomPlayer {
    room_id: i32,
    player_id: String,
}

/// Game session database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRow {
    id: i32,
    room_id: i32,
    stage: i32,
    copied_role: Option<String>,
}

/// Insertable game session.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    room_id: i32,
    stage: i32,
    copied_role: Option<String>,
}

/// Snapshot database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_states)]
pub struct GameStateRow {
    id: i32,
    game_id: i32,
    stage: i32,
    created_at: NaiveDateTime,
    cards: String,
}

impl GameStateRow {
    /// Rebuilds the core snapshot from this row plus its move and reads.
    #[instrument(skip(self, action, reads), fields(state_id = self.id, stage = self.stage))]
    pub fn to_snapshot(
        &self,
        action: Option<&ActionRow>,
        reads: &[StageReadRow],
    ) -> Result<Snapshot, DbError> {
        let cards: Cards = serde_json::from_str(&self.cards)?;
        let action = action.map(ActionRow::to_action).transpose()?;
        let reads = reads
            .iter()
            .map(|read| -> Result<_, DbError> { Ok((to_index(read.seat)?, read.read_at.and_utc())) })
            .collect::<Result<BTreeMap<Seat, _>, DbError>>()?;
        Ok(Snapshot::restore(
            to_stage(self.stage)?,
            self.created_at.and_utc(),
            cards,
            action,
            reads,
        ))
    }
}

/// Insertable snapshot.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::game_states)]
pub struct NewGameState {
    game_id: i32,
    stage: i32,
    created_at: NaiveDateTime,
    cards: String,
}

/// Recorded move database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::actions)]
pub struct ActionRow {
    id: i32,
    state_id: i32,
    cards_to_show: String,
    swap_card_a: Option<i32>,
    swap_card_b: Option<i32>,
}

impl ActionRow {
    /// Rebuilds the core move.
    #[instrument(skip(self), fields(action_id = self.id))]
    pub fn to_action(&self) -> Result<Action, DbError> {
        let shown: Vec<usize> = serde_json::from_str(&self.cards_to_show)?;
        let a = self.swap_card_a.map(to_index).transpose()?;
        let b = self.swap_card_b.map(to_index).transpose()?;
        Action::new(shown, a, b).map_err(|e| DbError::new(format!("Stored move is malformed: {}", e)))
    }
}

/// Insertable move.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::actions)]
pub struct NewAction {
    state_id: i32,
    cards_to_show: String,
    swap_card_a: Option<i32>,
    swap_card_b: Option<i32>,
}

impl NewAction {
    /// Row for `action`, recorded against the snapshot `state_id`.
    #[instrument(skip(action))]
    pub fn from_action(state_id: i32, action: &Action) -> Result<Self, DbError> {
        let swap = action.swap().map(|swap| swap.pair());
        Ok(Self {
            state_id,
            cards_to_show: serde_json::to_string(action.cards_to_show())?,
            swap_card_a: swap.map(|[a, _]| to_column(a)).transpose()?,
            swap_card_b: swap.map(|[_, b]| to_column(b)).transpose()?,
        })
    }
}

/// Stage acknowledgement database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::stage_reads)]
pub struct StageReadRow {
    id: i32,
    state_id: i32,
    seat: i32,
    read_at: NaiveDateTime,
}

/// Insertable stage acknowledgement.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::stage_reads)]
pub struct NewStageRead {
    state_id: i32,
    seat: i32,
    read_at: NaiveDateTime,
}

/// Accusation database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::card_shots)]
pub struct CardShotRow {
    id: i32,
    game_id: i32,
    shooter: i32,
    target: i32,
}

/// Insertable accusation.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::card_shots)]
pub struct NewCardShot {
    game_id: i32,
    shooter: i32,
    target: i32,
}
