//! The game service: rooms and games behind one per-room lock.
//!
//! Every operation on an existing room takes that room's lock, checks its
//! preconditions in order (room exists, game started, caller seated), runs
//! the core, and appends the resulting events to storage before releasing
//! the lock.

use crate::clock::Clock;
use crate::error::GameError;
use crate::locks::{RoomGuard, RoomLocks};
use crate::room::{MAX_MIN_MOVE_TIME, Room, RoomId};
use crate::store::GameStore;
use mafia44_core::{Game, GameEvent, PLAYERS, Projection, Seat, Stage, projection};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A started game with the caller's seat, loaded under the room lock.
struct Seated {
    room: Room,
    game: Game,
    seat: Seat,
}

/// Room directory and game operations over a [`GameStore`].
#[derive(Debug)]
pub struct GameService<S, C> {
    store: S,
    clock: C,
    locks: RoomLocks,
    default_min_move_time: i64,
}

impl<S: GameStore, C: Clock> GameService<S, C> {
    /// Creates a service. Rooms created without their own minimum move time
    /// use `default_min_move_time` seconds.
    #[instrument(skip(store, clock))]
    pub fn new(store: S, clock: C, default_min_move_time: i64) -> Self {
        info!("Creating game service");
        Self {
            store,
            clock,
            locks: RoomLocks::new(),
            default_min_move_time,
        }
    }

    /// Wraps the service for sharing across request handlers.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The clock driving the stage-ready gate.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn existing_room(&self, _guard: &RoomGuard, room_id: RoomId) -> Result<Room, GameError> {
        self.store.room(room_id)?.ok_or_else(|| {
            warn!(room_id, "Room not found");
            GameError::RoomNotFound
        })
    }

    /// Loads the room, its game and the caller's seat, in that order of
    /// precondition.
    fn seated(&self, guard: &RoomGuard, player: &str) -> Result<Seated, GameError> {
        let room = self.existing_room(guard, guard.room_id())?;
        let game = self
            .store
            .game(guard.room_id())?
            .ok_or(GameError::GameNotStarted)?;
        let seat = room.seat_of(player).ok_or_else(|| {
            warn!(player, "Player not seated in room");
            GameError::UserNotInRoom
        })?;
        Ok(Seated { room, game, seat })
    }

    fn persist(&self, guard: &RoomGuard, events: &[GameEvent]) -> Result<(), GameError> {
        if !events.is_empty() {
            self.store.append_events(guard.room_id(), events)?;
        }
        Ok(())
    }

    /// Creates a room and seats its creator at seat 0.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidMinMoveTime`] if the delay is negative or too
    /// large, [`GameError::RoomAlreadyExists`] if the name is taken.
    #[instrument(skip(self))]
    pub fn create_room(
        &self,
        player: &str,
        name: &str,
        min_move_time: Option<i64>,
    ) -> Result<Room, GameError> {
        let min_move_time = min_move_time.unwrap_or(self.default_min_move_time);
        if !(0..=MAX_MIN_MOVE_TIME).contains(&min_move_time) {
            warn!(min_move_time, "Minimum move time out of range");
            return Err(GameError::InvalidMinMoveTime(min_move_time));
        }
        let room = self
            .store
            .create_room(name, player, min_move_time)?
            .ok_or_else(|| {
                warn!("Room name taken");
                GameError::RoomAlreadyExists
            })?;
        info!(room_id = room.id(), "Room created");
        Ok(room)
    }

    /// Every room.
    ///
    /// # Errors
    ///
    /// [`GameError::Storage`] on storage failure.
    #[instrument(skip(self))]
    pub fn list_rooms(&self) -> Result<Vec<Room>, GameError> {
        Ok(self.store.rooms()?)
    }

    /// Seats a player at the next free seat.
    ///
    /// # Errors
    ///
    /// [`GameError::RoomNotFound`], [`GameError::UserAlreadyInRoom`] or
    /// [`GameError::RoomFull`].
    #[instrument(skip(self))]
    pub fn join_room(&self, player: &str, room_id: RoomId) -> Result<Room, GameError> {
        self.locks.with_room(room_id, |guard| {
            let room = self.existing_room(guard, room_id)?;
            if room.is_member(player) {
                return Err(GameError::UserAlreadyInRoom);
            }
            if room.is_full() {
                warn!("Room is full");
                return Err(GameError::RoomFull);
            }
            self.store.add_player(room_id, player)?;
            info!("Player joined room");
            self.existing_room(guard, room_id)
        })
    }

    /// Removes a player from a room that has not started its game.
    ///
    /// # Errors
    ///
    /// [`GameError::RoomNotFound`], [`GameError::UserNotInRoom`],
    /// [`GameError::CreatorCannotLeaveRoom`] or
    /// [`GameError::GameAlreadyStarted`].
    #[instrument(skip(self))]
    pub fn leave_room(&self, player: &str, room_id: RoomId) -> Result<(), GameError> {
        self.locks.with_room(room_id, |guard| {
            let room = self.existing_room(guard, room_id)?;
            if !room.is_member(player) {
                return Err(GameError::UserNotInRoom);
            }
            if room.is_creator(player) {
                return Err(GameError::CreatorCannotLeaveRoom);
            }
            if *room.is_game_started() {
                return Err(GameError::GameAlreadyStarted);
            }
            self.store.remove_player(room_id, player)?;
            info!("Player left room");
            Ok(())
        })
    }

    /// Deletes a room with its game and history.
    ///
    /// # Errors
    ///
    /// [`GameError::RoomNotFound`] or [`GameError::UserNotCreator`].
    #[instrument(skip(self))]
    pub fn delete_room(&self, player: &str, room_id: RoomId) -> Result<(), GameError> {
        self.locks.with_room(room_id, |guard| {
            let room = self.existing_room(guard, room_id)?;
            if !room.is_creator(player) {
                return Err(GameError::UserNotCreator);
            }
            self.store.delete_room(room_id)?;
            self.locks.forget(guard);
            info!("Room deleted");
            Ok(())
        })
    }

    /// Deals a new game for a full room.
    ///
    /// # Errors
    ///
    /// [`GameError::RoomNotFound`], [`GameError::UserNotInRoom`],
    /// [`GameError::UserNotCreator`], [`GameError::GameAlreadyStarted`] or
    /// [`GameError::NotEnoughPlayers`].
    #[instrument(skip(self))]
    pub fn start_game(&self, player: &str, room_id: RoomId) -> Result<(), GameError> {
        self.locks.with_room(room_id, |guard| {
            let room = self.existing_room(guard, room_id)?;
            if !room.is_member(player) {
                return Err(GameError::UserNotInRoom);
            }
            if !room.is_creator(player) {
                return Err(GameError::UserNotCreator);
            }
            if *room.is_game_started() {
                return Err(GameError::GameAlreadyStarted);
            }
            if room.players().len() != PLAYERS {
                warn!(players = room.players().len(), "Room is not full");
                return Err(GameError::NotEnoughPlayers);
            }
            let game = Game::deal(&mut rand::thread_rng(), self.clock.now());
            self.store.insert_game(room_id, &game)?;
            info!("Game started");
            Ok(())
        })
    }

    /// Polls the caller's current stage: derives what can be derived,
    /// advances if the stage is ready, and records the caller's read.
    ///
    /// # Errors
    ///
    /// [`GameError::RoomNotFound`], [`GameError::GameNotStarted`] or
    /// [`GameError::UserNotInRoom`].
    #[instrument(skip(self))]
    pub fn get_game_stage(&self, player: &str, room_id: RoomId) -> Result<Stage, GameError> {
        self.locks.with_room(room_id, |guard| {
            let Seated {
                room,
                mut game,
                seat,
            } = self.seated(guard, player)?;
            let events = game.poll(seat, room.min_move_delay(), self.clock.now());
            self.persist(guard, &events)?;
            debug!(seat, stage = %game.stage(), events = events.len(), "Stage polled");
            Ok(game.stage())
        })
    }

    /// Records the caller's selection as the current stage's move.
    ///
    /// # Errors
    ///
    /// The precondition errors of [`GameService::get_game_stage`], or
    /// [`GameError::InvalidSelectedCards`] if the selection is not a legal
    /// move for the caller.
    #[instrument(skip(self))]
    pub fn submit_action(
        &self,
        player: &str,
        room_id: RoomId,
        selected_cards: &[usize],
    ) -> Result<(), GameError> {
        self.locks.with_room(room_id, |guard| {
            let Seated { mut game, seat, .. } = self.seated(guard, player)?;
            let events = game
                .submit_selection(seat, selected_cards, self.clock.now())
                .inspect_err(|e| warn!(seat, error = %e, "Move rejected"))?;
            self.persist(guard, &events)?;
            info!(seat, "Action recorded");
            Ok(())
        })
    }

    /// Records the caller's accusation.
    ///
    /// # Errors
    ///
    /// The precondition errors of [`GameService::get_game_stage`], or
    /// [`GameError::InvalidSelectedCards`] if the accusation is illegal.
    #[instrument(skip(self))]
    pub fn shoot_card(
        &self,
        player: &str,
        room_id: RoomId,
        card_position: usize,
    ) -> Result<(), GameError> {
        self.locks.with_room(room_id, |guard| {
            let Seated { mut game, seat, .. } = self.seated(guard, player)?;
            let event = game.shoot(seat, card_position)?;
            self.persist(guard, &[event])?;
            info!(seat, card_position, "Shot recorded");
            Ok(())
        })
    }

    /// The caller's view of the game's history.
    ///
    /// # Errors
    ///
    /// The precondition errors of [`GameService::get_game_stage`].
    #[instrument(skip(self))]
    pub fn get_history(&self, player: &str, room_id: RoomId) -> Result<Projection, GameError> {
        self.locks.with_room(room_id, |guard| {
            let Seated { game, seat, .. } = self.seated(guard, player)?;
            Ok(projection(&game, seat))
        })
    }
}
