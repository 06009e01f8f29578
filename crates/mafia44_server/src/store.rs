//! Storage seam for rooms and games.
//!
//! The service talks to storage only through [`GameStore`]. Games are
//! persisted by appending the [`GameEvent`]s the core emits, so a store
//! never re-derives a game decision.

use crate::db::DbError;
use crate::room::{PlayerId, Room, RoomId};
use mafia44_core::{Game, GameEvent};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Persistence for the room directory and its games.
///
/// Callers serialize access per room; a store only has to keep each call
/// atomic.
pub trait GameStore: Send + Sync {
    /// Creates a room with its creator seated. Returns `None` if the name is
    /// taken.
    fn create_room(
        &self,
        name: &str,
        creator: &str,
        min_move_time: i64,
    ) -> Result<Option<Room>, DbError>;

    /// Every room, oldest first.
    fn rooms(&self) -> Result<Vec<Room>, DbError>;

    /// One room, if it exists.
    fn room(&self, room_id: RoomId) -> Result<Option<Room>, DbError>;

    /// Seats a player at the next free seat.
    fn add_player(&self, room_id: RoomId, player: &str) -> Result<(), DbError>;

    /// Removes a player; later joiners move up one seat.
    fn remove_player(&self, room_id: RoomId, player: &str) -> Result<(), DbError>;

    /// Removes a room together with its game and history.
    fn delete_room(&self, room_id: RoomId) -> Result<(), DbError>;

    /// Stores a freshly dealt game.
    fn insert_game(&self, room_id: RoomId, game: &Game) -> Result<(), DbError>;

    /// Loads a room's game, if started.
    fn game(&self, room_id: RoomId) -> Result<Option<Game>, DbError>;

    /// Appends events to a room's game, all or nothing.
    fn append_events(&self, room_id: RoomId, events: &[GameEvent]) -> Result<(), DbError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: RoomId,
    rooms: BTreeMap<RoomId, (String, PlayerId, i64, Vec<PlayerId>)>,
    games: BTreeMap<RoomId, Game>,
}

impl MemoryState {
    fn room(&self, room_id: RoomId) -> Option<Room> {
        self.rooms
            .get(&room_id)
            .map(|(name, creator, min_move_time, players)| {
                Room::new(
                    room_id,
                    name.clone(),
                    creator.clone(),
                    *min_move_time,
                    players.clone(),
                    self.games.contains_key(&room_id),
                )
            })
    }
}

/// In-memory [`GameStore`], for tests and throwaway servers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameStore for MemoryStore {
    #[instrument(skip(self))]
    fn create_room(
        &self,
        name: &str,
        creator: &str,
        min_move_time: i64,
    ) -> Result<Option<Room>, DbError> {
        let mut state = self.state();
        if state.rooms.values().any(|(existing, ..)| existing == name) {
            debug!("Room name taken");
            return Ok(None);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.rooms.insert(
            id,
            (
                name.to_string(),
                creator.to_string(),
                min_move_time,
                vec![creator.to_string()],
            ),
        );
        info!(room_id = id, "Room created");
        Ok(state.room(id))
    }

    #[instrument(skip(self))]
    fn rooms(&self) -> Result<Vec<Room>, DbError> {
        let state = self.state();
        Ok(state.rooms.keys().filter_map(|id| state.room(*id)).collect())
    }

    #[instrument(skip(self))]
    fn room(&self, room_id: RoomId) -> Result<Option<Room>, DbError> {
        Ok(self.state().room(room_id))
    }

    #[instrument(skip(self))]
    fn add_player(&self, room_id: RoomId, player: &str) -> Result<(), DbError> {
        let mut state = self.state();
        let (.., players) = state
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| DbError::new(format!("Room {} not found", room_id)))?;
        if players.iter().any(|p| p == player) {
            return Err(DbError::new(format!("{} already in room {}", player, room_id)));
        }
        players.push(player.to_string());
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove_player(&self, room_id: RoomId, player: &str) -> Result<(), DbError> {
        let mut state = self.state();
        let (.., players) = state
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| DbError::new(format!("Room {} not found", room_id)))?;
        players.retain(|p| p != player);
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete_room(&self, room_id: RoomId) -> Result<(), DbError> {
        let mut state = self.state();
        state.games.remove(&room_id);
        state.rooms.remove(&room_id);
        Ok(())
    }

    #[instrument(skip(self, game))]
    fn insert_game(&self, room_id: RoomId, game: &Game) -> Result<(), DbError> {
        let mut state = self.state();
        if !state.rooms.contains_key(&room_id) {
            return Err(DbError::new(format!("Room {} not found", room_id)));
        }
        if state.games.contains_key(&room_id) {
            return Err(DbError::new(format!("Room {} already has a game", room_id)));
        }
        state.games.insert(room_id, game.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    fn game(&self, room_id: RoomId) -> Result<Option<Game>, DbError> {
        Ok(self.state().games.get(&room_id).cloned())
    }

    #[instrument(skip(self, events), fields(count = events.len()))]
    fn append_events(&self, room_id: RoomId, events: &[GameEvent]) -> Result<(), DbError> {
        let mut state = self.state();
        let stored = state
            .games
            .get_mut(&room_id)
            .ok_or_else(|| DbError::new(format!("Room {} has no game", room_id)))?;
        let mut game = stored.clone();
        for event in events {
            game.apply(event).map_err(|violation| {
                warn!(%violation, "Rejecting event batch");
                DbError::new(format!("Event does not apply: {}", violation))
            })?;
        }
        *stored = game;
        debug!("Events appended");
        Ok(())
    }
}
