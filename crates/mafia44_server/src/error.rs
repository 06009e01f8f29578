//! Service error types.

use crate::db::DbError;
use axum::http::StatusCode;
use derive_more::{Display, Error, From};
use mafia44_core::MoveError;

/// Why a room or game request was refused.
#[derive(Debug, Display, Error, From)]
pub enum GameError {
    /// No room with that id.
    #[display("Room not found")]
    RoomNotFound,
    /// A room with that name exists.
    #[display("Room already exists")]
    RoomAlreadyExists,
    /// The player already joined the room.
    #[display("User already in room")]
    UserAlreadyInRoom,
    /// Only the creator may do this.
    #[display("User is not the creator of the room")]
    UserNotCreator,
    /// The creator must delete the room instead.
    #[display("Creator cannot leave the room")]
    CreatorCannotLeaveRoom,
    /// All four seats are taken.
    #[display("Room is full")]
    RoomFull,
    /// The room's game was already dealt.
    #[display("Game has already started")]
    GameAlreadyStarted,
    /// The room has no game yet.
    #[display("Game has not started")]
    GameNotStarted,
    /// A game needs every seat taken.
    #[display("Game needs exactly four players")]
    NotEnoughPlayers,
    /// The player is not seated in the room.
    #[display("User not in room")]
    UserNotInRoom,
    /// A room's minimum move time must be a non-negative number of seconds
    /// that fits storage.
    #[display("Invalid minimum move time: {}", _0)]
    InvalidMinMoveTime(#[error(not(source))] i64),
    /// The move or accusation was rejected.
    #[display("Invalid selected cards: {}", _0)]
    #[from]
    InvalidSelectedCards(MoveError),
    /// Storage failed.
    #[display("{}", _0)]
    #[from]
    Storage(DbError),
}

impl GameError {
    /// HTTP status reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RoomNotFound => StatusCode::NOT_FOUND,
            Self::RoomAlreadyExists | Self::GameAlreadyStarted => StatusCode::CONFLICT,
            Self::UserNotCreator | Self::RoomFull | Self::UserNotInRoom => StatusCode::FORBIDDEN,
            Self::UserAlreadyInRoom
            | Self::CreatorCannotLeaveRoom
            | Self::GameNotStarted
            | Self::NotEnoughPlayers
            | Self::InvalidMinMoveTime(_)
            | Self::InvalidSelectedCards(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GameError::RoomNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(GameError::RoomAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(GameError::RoomFull.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            GameError::InvalidMinMoveTime(-1).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GameError::from(MoveError::NotShooting).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_move_error_is_described() {
        let err = GameError::from(MoveError::AlreadyShot(2));
        assert_eq!(err.to_string(), "Invalid selected cards: Seat 2 has already shot");
    }
}
