//! Mafia44 server: rooms, persistence and the JSON API around
//! [`mafia44_core`].
//!
//! # Architecture
//!
//! - **Room directory**: named rooms of up to four seated players
//! - **Locks**: one mutex per room, so a room's requests run one at a time
//! - **Store**: [`GameStore`] with an in-memory and a SQLite implementation
//! - **Service**: [`GameService`], the operations clients call
//! - **HTTP**: an axum [`Router`](axum::Router) exposing the service as JSON

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
mod clock;
mod config;
pub mod db;
mod error;
pub mod http;
mod locks;
mod room;
mod service;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ServerConfig};
pub use db::{DbError, DbErrorKind, MIGRATIONS, SqliteStore};
pub use error::GameError;
pub use http::{ApiError, PLAYER_HEADER, router};
pub use locks::{RoomGuard, RoomLocks};
pub use room::{DEFAULT_MIN_MOVE_TIME, MAX_MIN_MOVE_TIME, PlayerId, Room, RoomId};
pub use service::GameService;
pub use store::{GameStore, MemoryStore};
