//! Game rules for Mafia44.
//!
//! Pure functions over a [`Game`](crate::Game): which stages wait for a
//! move, which seat may act where, and which move shapes are legal. Rules
//! are kept apart from the engine so they can be checked without mutating
//! anything.

pub mod applicability;
pub mod selection;
pub mod validate;

pub use applicability::{accessible_stages, acting_index, is_action_required};
pub use selection::selected_cards_to_action;
pub use validate::check_action;
