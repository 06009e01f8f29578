//! Rooms: named tables of up to four players, one game each.

use chrono::TimeDelta;
use derive_getters::Getters;
use derive_new::new;
use mafia44_core::{PLAYERS, Seat};
use serde::Serialize;

/// Room identifier, assigned by storage.
pub type RoomId = i32;

/// Player identity, issued by the authentication layer.
pub type PlayerId = String;

/// Default minimum seconds between the last stage read and advancing.
pub const DEFAULT_MIN_MOVE_TIME: i64 = 5;

/// Largest minimum move time a room accepts, in seconds.
pub const MAX_MIN_MOVE_TIME: i64 = i32::MAX as i64;

/// A room as the directory lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct Room {
    id: RoomId,
    name: String,
    creator: PlayerId,
    min_move_time: i64,
    /// Members in join order; a member's index is their seat.
    players: Vec<PlayerId>,
    is_game_started: bool,
}

impl Room {
    /// Seat of a member, by join order.
    pub fn seat_of(&self, player: &str) -> Option<Seat> {
        self.players.iter().position(|p| p == player)
    }

    /// True if `player` joined this room.
    pub fn is_member(&self, player: &str) -> bool {
        self.seat_of(player).is_some()
    }

    /// True if `player` created this room.
    pub fn is_creator(&self, player: &str) -> bool {
        self.creator == player
    }

    /// True once every seat is taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= PLAYERS
    }

    /// The stage-ready delay as a duration. Values beyond what a duration
    /// holds saturate at the largest one.
    pub fn min_move_delay(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.min_move_time).unwrap_or(TimeDelta::MAX)
    }
}
