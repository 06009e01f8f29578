//! Mafia44 game logic - a four-seat hidden-role card game.
//!
//! This crate holds the server-authoritative state machine and nothing
//! else: no storage, no transport.
//!
//! # Architecture
//!
//! - **Cards**: the fixed 11-role deck and the seat-major card array
//! - **Stage**: the total order of game phases and the role-to-stage tables
//! - **History**: append-only snapshots of the card array, one per stage
//! - **Rules**: which moves are legal at which stage, for which seat
//! - **Engine**: when a stage is complete and how the next snapshot is derived
//! - **Projection**: what each seat is allowed to see
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use mafia44_core::{Game, Stage};
//!
//! let mut game = Game::deal(&mut rand::thread_rng(), Utc::now());
//! assert_eq!(game.stage(), Stage::Beginning);
//!
//! // Nothing is bound to Beginning, so the next snapshot appears at once.
//! game.try_create_next_state(Utc::now());
//! assert!(game.history().get(Stage::Copy).is_some());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod accusation;
mod action;
mod cards;
mod engine;
mod events;
mod game;
mod history;
pub mod invariants;
mod projection;
pub mod rules;
mod stage;

pub use action::{Action, MoveError, Swap};
pub use cards::{
    CARDS_IN_DISCARD, CARDS_PER_PLAYER, Cards, DeckError, PLAYER_CARDS, PLAYERS, PublicRole, Role,
    Seat, TOTAL_CARDS, is_discard_card, is_player_card, owner_of, seat_positions,
};
pub use events::GameEvent;
pub use game::Game;
pub use history::{History, Snapshot};
pub use invariants::{GameInvariants, Invariant, InvariantSet, InvariantViolation};
pub use projection::{Projection, StageView, full_history, player_history, projection, stage_view};
pub use rules::{accessible_stages, acting_index, check_action, is_action_required, selected_cards_to_action};
pub use stage::Stage;
