//! Diesel-backed [`GameStore`].

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use mafia44_core::{Game, GameEvent, PLAYERS, Role, Snapshot, Stage};
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, DbErrorKind};
use crate::db::models::{
    ActionRow, CardShotRow, GameRow, GameStateRow, NewAction, NewCardShot, NewGame, NewGameState,
    NewRoom, NewRoomPlayer, NewStageRead, RoomPlayerRow, RoomRow, StageReadRow, to_column,
    to_index, to_stage,
};
use crate::db::schema;
use crate::room::{Room, RoomId};
use crate::store::GameStore;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite [`GameStore`]. Opens one connection per call.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
}

impl SqliteStore {
    /// Creates a store for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.is_empty() {
            return Err(DbError::with_kind(DbErrorKind::Connection, "Database path is empty"));
        }
        info!(path = %db_path, "Creating SqliteStore");
        Ok(Self { db_path })
    }

    /// Applies any pending embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or a migration
    /// fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::with_kind(DbErrorKind::Migration, e.to_string()))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| {
                DbError::with_kind(
                    DbErrorKind::Connection,
                    format!("Failed to open '{}': {}", self.db_path, e),
                )
            })?;
        diesel::sql_query("PRAGMA busy_timeout = 5000").execute(&mut conn)?;
        Ok(conn)
    }

    fn load_room(conn: &mut SqliteConnection, row: RoomRow) -> Result<Room, DbError> {
        let players = RoomPlayerRow::belonging_to(&row)
            .select(RoomPlayerRow::as_select())
            .order(schema::room_players::id.asc())
            .load(conn)?
            .into_iter()
            .map(|player| player.player_id().clone())
            .collect();
        let started = schema::games::table
            .filter(schema::games::room_id.eq(row.id()))
            .count()
            .get_result::<i64>(conn)?
            > 0;
        Ok(Room::new(
            *row.id(),
            row.name().clone(),
            row.creator().clone(),
            i64::from(*row.min_move_time()),
            players,
            started,
        ))
    }

    fn game_row(conn: &mut SqliteConnection, room_id: RoomId) -> Result<Option<GameRow>, DbError> {
        Ok(schema::games::table
            .filter(schema::games::room_id.eq(room_id))
            .select(GameRow::as_select())
            .first(conn)
            .optional()?)
    }

    fn state_id(conn: &mut SqliteConnection, game_id: i32, stage: Stage) -> Result<i32, DbError> {
        Ok(schema::game_states::table
            .filter(schema::game_states::game_id.eq(game_id))
            .filter(schema::game_states::stage.eq(i32::from(u8::from(stage))))
            .select(schema::game_states::id)
            .first(conn)?)
    }

    fn insert_snapshot(
        conn: &mut SqliteConnection,
        game_id: i32,
        snapshot: &Snapshot,
    ) -> Result<i32, DbError> {
        let row = NewGameState::new(
            game_id,
            i32::from(u8::from(snapshot.stage())),
            snapshot.timestamp().naive_utc(),
            serde_json::to_string(snapshot.cards())?,
        );
        Ok(diesel::insert_into(schema::game_states::table)
            .values(&row)
            .returning(schema::game_states::id)
            .get_result(conn)?)
    }

    fn insert_read(
        conn: &mut SqliteConnection,
        state_id: i32,
        seat: usize,
        at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        diesel::insert_into(schema::stage_reads::table)
            .values(&NewStageRead::new(state_id, to_column(seat)?, at.naive_utc()))
            .execute(conn)?;
        Ok(())
    }

    fn insert_shot(
        conn: &mut SqliteConnection,
        game_id: i32,
        shooter: usize,
        target: usize,
    ) -> Result<(), DbError> {
        diesel::insert_into(schema::card_shots::table)
            .values(&NewCardShot::new(game_id, to_column(shooter)?, to_column(target)?))
            .execute(conn)?;
        Ok(())
    }

    fn apply_event(
        conn: &mut SqliteConnection,
        game_id: i32,
        event: &GameEvent,
    ) -> Result<(), DbError> {
        match event {
            GameEvent::SnapshotAppended {
                stage,
                timestamp,
                cards,
            } => {
                Self::insert_snapshot(conn, game_id, &Snapshot::new(*stage, *timestamp, cards.clone()))?;
            }
            GameEvent::ActionRecorded { stage, action } => {
                let state_id = Self::state_id(conn, game_id, *stage)?;
                diesel::insert_into(schema::actions::table)
                    .values(&NewAction::from_action(state_id, action)?)
                    .execute(conn)?;
            }
            GameEvent::StageRead {
                stage,
                seat,
                timestamp,
            } => {
                let state_id = Self::state_id(conn, game_id, *stage)?;
                Self::insert_read(conn, state_id, *seat, *timestamp)?;
            }
            GameEvent::StageAdvanced { stage } => {
                diesel::update(schema::games::table.find(game_id))
                    .set(schema::games::stage.eq(i32::from(u8::from(*stage))))
                    .execute(conn)?;
            }
            GameEvent::RoleCopied { role } => {
                diesel::update(schema::games::table.find(game_id))
                    .set(schema::games::copied_role.eq(Some(role.to_string())))
                    .execute(conn)?;
            }
            GameEvent::CardShot { shooter, target } => {
                Self::insert_shot(conn, game_id, *shooter, *target)?;
            }
        }
        Ok(())
    }
}

impl GameStore for SqliteStore {
    #[instrument(skip(self))]
    fn create_room(
        &self,
        name: &str,
        creator: &str,
        min_move_time: i64,
    ) -> Result<Option<Room>, DbError> {
        let min_move_time = i32::try_from(min_move_time)
            .map_err(|_| DbError::new(format!("Minimum move time {} too large", min_move_time)))?;
        let mut conn = self.connection()?;
        let created = conn.transaction::<_, DieselError, _>(|conn| {
            let row = diesel::insert_into(schema::rooms::table)
                .values(&NewRoom::new(name.to_string(), creator.to_string(), min_move_time))
                .returning(RoomRow::as_returning())
                .get_result(conn)?;
            diesel::insert_into(schema::room_players::table)
                .values(&NewRoomPlayer::new(*row.id(), creator.to_string()))
                .execute(conn)?;
            Ok(row)
        });
        let row = match created {
            Ok(row) => row,
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                debug!("Room name taken");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        info!(room_id = row.id(), "Room created");
        Self::load_room(&mut conn, row).map(Some)
    }

    #[instrument(skip(self))]
    fn rooms(&self) -> Result<Vec<Room>, DbError> {
        let mut conn = self.connection()?;
        let rows = schema::rooms::table
            .order(schema::rooms::id.asc())
            .select(RoomRow::as_select())
            .load(&mut conn)?;
        let rooms = rows
            .into_iter()
            .map(|row| Self::load_room(&mut conn, row))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = rooms.len(), "Rooms loaded");
        Ok(rooms)
    }

    #[instrument(skip(self))]
    fn room(&self, room_id: RoomId) -> Result<Option<Room>, DbError> {
        let mut conn = self.connection()?;
        let row = schema::rooms::table
            .find(room_id)
            .select(RoomRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(|row| Self::load_room(&mut conn, row)).transpose()
    }

    #[instrument(skip(self))]
    fn add_player(&self, room_id: RoomId, player: &str) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        diesel::insert_into(schema::room_players::table)
            .values(&NewRoomPlayer::new(room_id, player.to_string()))
            .execute(&mut conn)?;
        info!("Player seated");
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove_player(&self, room_id: RoomId, player: &str) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let removed = diesel::delete(
            schema::room_players::table
                .filter(schema::room_players::room_id.eq(room_id))
                .filter(schema::room_players::player_id.eq(player)),
        )
        .execute(&mut conn)?;
        debug!(removed, "Player removed");
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_room(&self, room_id: RoomId) -> Result<(), DbError> {
        use schema::{actions, card_shots, game_states, games, room_players, rooms, stage_reads};

        let mut conn = self.connection()?;
        conn.transaction::<_, DieselError, _>(|conn| {
            let game_ids: Vec<i32> = games::table
                .filter(games::room_id.eq(room_id))
                .select(games::id)
                .load(conn)?;
            let state_ids: Vec<i32> = game_states::table
                .filter(game_states::game_id.eq_any(&game_ids))
                .select(game_states::id)
                .load(conn)?;
            diesel::delete(stage_reads::table.filter(stage_reads::state_id.eq_any(&state_ids)))
                .execute(conn)?;
            diesel::delete(actions::table.filter(actions::state_id.eq_any(&state_ids)))
                .execute(conn)?;
            diesel::delete(game_states::table.filter(game_states::game_id.eq_any(&game_ids)))
                .execute(conn)?;
            diesel::delete(card_shots::table.filter(card_shots::game_id.eq_any(&game_ids)))
                .execute(conn)?;
            diesel::delete(games::table.filter(games::room_id.eq(room_id))).execute(conn)?;
            diesel::delete(room_players::table.filter(room_players::room_id.eq(room_id)))
                .execute(conn)?;
            diesel::delete(rooms::table.find(room_id)).execute(conn)?;
            Ok(())
        })?;
        info!("Room deleted");
        Ok(())
    }

    #[instrument(skip(self, game))]
    fn insert_game(&self, room_id: RoomId, game: &Game) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        conn.transaction::<_, DbError, _>(|conn| {
            let row = NewGame::new(
                room_id,
                i32::from(u8::from(game.stage())),
                game.copied_role().map(|role| role.to_string()),
            );
            let game_id: i32 = diesel::insert_into(schema::games::table)
                .values(&row)
                .returning(schema::games::id)
                .get_result(conn)?;
            for snapshot in game.history().iter() {
                let state_id = Self::insert_snapshot(conn, game_id, snapshot)?;
                if let Some(action) = snapshot.action() {
                    diesel::insert_into(schema::actions::table)
                        .values(&NewAction::from_action(state_id, action)?)
                        .execute(conn)?;
                }
                for (seat, at) in snapshot.reads() {
                    Self::insert_read(conn, state_id, *seat, *at)?;
                }
            }
            for (shooter, target) in game.shots().iter().enumerate() {
                if let Some(target) = target {
                    Self::insert_shot(conn, game_id, shooter, *target)?;
                }
            }
            info!(game_id, "Game stored");
            Ok(())
        })
    }

    #[instrument(skip(self))]
    fn game(&self, room_id: RoomId) -> Result<Option<Game>, DbError> {
        let mut conn = self.connection()?;
        let Some(row) = Self::game_row(&mut conn, room_id)? else {
            debug!("Room has no game");
            return Ok(None);
        };

        let states = schema::game_states::table
            .filter(schema::game_states::game_id.eq(row.id()))
            .order(schema::game_states::stage.asc())
            .select(GameStateRow::as_select())
            .load(&mut conn)?;
        let state_ids: Vec<i32> = states.iter().map(|s| *s.id()).collect();
        let actions = schema::actions::table
            .filter(schema::actions::state_id.eq_any(&state_ids))
            .select(ActionRow::as_select())
            .load(&mut conn)?;
        let reads = schema::stage_reads::table
            .filter(schema::stage_reads::state_id.eq_any(&state_ids))
            .select(StageReadRow::as_select())
            .load(&mut conn)?;
        let shot_rows = schema::card_shots::table
            .filter(schema::card_shots::game_id.eq(row.id()))
            .select(CardShotRow::as_select())
            .load(&mut conn)?;

        let snapshots = states
            .iter()
            .map(|state| {
                let action = actions.iter().find(|a| a.state_id() == state.id());
                let state_reads: Vec<StageReadRow> = reads
                    .iter()
                    .filter(|r| r.state_id() == state.id())
                    .cloned()
                    .collect();
                state.to_snapshot(action, &state_reads)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut shots = [None; PLAYERS];
        for shot in &shot_rows {
            let slot = shots
                .get_mut(to_index(*shot.shooter())?)
                .ok_or_else(|| DbError::new(format!("Shooter {} out of range", shot.shooter())))?;
            *slot = Some(to_index(*shot.target())?);
        }

        let copied_role = row
            .copied_role()
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(|e| DbError::new(format!("Stored role is unknown: {}", e)))?;

        let game = Game::restore(to_stage(*row.stage())?, copied_role, snapshots, shots).map_err(
            |violations| {
                warn!(?violations, "Stored game is inconsistent");
                DbError::new(format!("Stored game violates {} invariant(s)", violations.len()))
            },
        )?;
        debug!(stage = %game.stage(), "Game loaded");
        Ok(Some(game))
    }

    #[instrument(skip(self, events), fields(count = events.len()))]
    fn append_events(&self, room_id: RoomId, events: &[GameEvent]) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection()?;
        conn.transaction::<_, DbError, _>(|conn| {
            let game = Self::game_row(conn, room_id)?
                .ok_or_else(|| DbError::new(format!("Room {} has no game", room_id)))?;
            for event in events {
                Self::apply_event(conn, *game.id(), event)?;
            }
            Ok(())
        })?;
        debug!("Events appended");
        Ok(())
    }
}
