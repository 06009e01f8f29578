//! The deck: eleven role cards, each dealt exactly once per game.
//!
//! Positions `[0, PLAYER_CARDS)` belong to seats, two per seat in seat-major
//! order. The remaining three positions form the undealt discard pool.

use derive_more::{Display, Error};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use strum::IntoEnumIterator;
use tracing::{instrument, warn};

/// Number of seats at a table.
pub const PLAYERS: usize = 4;

/// Cards dealt face down to each seat.
pub const CARDS_PER_PLAYER: usize = 2;

/// Cards left undealt in the middle of the table.
pub const CARDS_IN_DISCARD: usize = 3;

/// Number of positions owned by seats.
pub const PLAYER_CARDS: usize = PLAYERS * CARDS_PER_PLAYER;

/// Length of every card array.
pub const TOTAL_CARDS: usize = PLAYER_CARDS + CARDS_IN_DISCARD;

/// A 0-based player slot, assigned by join order within a room.
pub type Seat = usize;

/// A role card. The deck holds each variant exactly once.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Looks at one card and acts as that role later in the night.
    Copy,
    /// Looks at another seat's card and takes it.
    Thief,
    /// First of the two Brothers.
    #[serde(rename = "brothers_1")]
    #[strum(serialize = "brothers_1")]
    Brothers1,
    /// Second of the two Brothers.
    #[serde(rename = "brothers_2")]
    #[strum(serialize = "brothers_2")]
    Brothers2,
    /// Looks at one seat's card or two discards.
    Seer,
    /// Swaps two cards owned by other seats.
    Brawler,
    /// Swaps its own card with a discard, unseen.
    Drunkard,
    /// Swaps a discard with another seat's card.
    Witch,
    /// Has its own card revealed to everyone.
    Milkman,
    /// Mafia.
    Mafia,
    /// Suicide.
    Suicide,
}

impl Role {
    /// Returns true for either Brothers variant.
    pub fn is_brothers(self) -> bool {
        matches!(self, Role::Brothers1 | Role::Brothers2)
    }

    /// Returns the label shown to players.
    ///
    /// The two Brothers collapse into one label so a reveal never tells
    /// which of the pair was seen.
    pub fn public(self) -> PublicRole {
        match self {
            Role::Copy => PublicRole::Copy,
            Role::Thief => PublicRole::Thief,
            Role::Brothers1 | Role::Brothers2 => PublicRole::Brothers,
            Role::Seer => PublicRole::Seer,
            Role::Brawler => PublicRole::Brawler,
            Role::Drunkard => PublicRole::Drunkard,
            Role::Witch => PublicRole::Witch,
            Role::Milkman => PublicRole::Milkman,
            Role::Mafia => PublicRole::Mafia,
            Role::Suicide => PublicRole::Suicide,
        }
    }
}

/// A role as players are allowed to see it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublicRole {
    /// Copy.
    Copy,
    /// Thief.
    Thief,
    /// Either Brothers card.
    Brothers,
    /// Seer.
    Seer,
    /// Brawler.
    Brawler,
    /// Drunkard.
    Drunkard,
    /// Witch.
    Witch,
    /// Milkman.
    Milkman,
    /// Mafia.
    Mafia,
    /// Suicide.
    Suicide,
}

/// Returns true if the position is owned by some seat.
pub fn is_player_card(idx: usize) -> bool {
    idx < PLAYER_CARDS
}

/// Returns true if the position is in the discard pool.
pub fn is_discard_card(idx: usize) -> bool {
    (PLAYER_CARDS..TOTAL_CARDS).contains(&idx)
}

/// Returns the seat owning a position, or `None` for the discard pool.
pub fn owner_of(idx: usize) -> Option<Seat> {
    is_player_card(idx).then_some(idx / CARDS_PER_PLAYER)
}

/// Positions owned by a seat.
pub fn seat_positions(seat: Seat) -> Range<usize> {
    seat * CARDS_PER_PLAYER..(seat + 1) * CARDS_PER_PLAYER
}

/// Errors raised when a card array is not a permutation of the deck.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum DeckError {
    /// Wrong number of cards.
    #[display("Expected {} cards, got {}", TOTAL_CARDS, _0)]
    WrongLength(#[error(not(source))] usize),
    /// A role appears more than once.
    #[display("Role {} appears more than once", _0)]
    DuplicateRole(#[error(not(source))] Role),
}

/// A full card array: every role exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct Cards([Role; TOTAL_CARDS]);

impl Cards {
    /// The deck in declaration order.
    #[instrument]
    pub fn ordered() -> Self {
        let mut roles = [Role::Copy; TOTAL_CARDS];
        for (slot, role) in roles.iter_mut().zip(Role::iter()) {
            *slot = role;
        }
        Self(roles)
    }

    /// A freshly shuffled deal.
    #[instrument(skip(rng))]
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = Self::ordered();
        cards.0.shuffle(rng);
        cards
    }

    /// Builds a card array, rejecting anything that is not a permutation
    /// of the deck.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError`] on a wrong length or a repeated role.
    #[instrument]
    pub fn from_roles(roles: Vec<Role>) -> Result<Self, DeckError> {
        let len = roles.len();
        let roles: [Role; TOTAL_CARDS] = roles
            .try_into()
            .map_err(|_| DeckError::WrongLength(len))?;
        for (i, role) in roles.iter().enumerate() {
            if roles[..i].contains(role) {
                return Err(DeckError::DuplicateRole(*role));
            }
        }
        Ok(Self(roles))
    }

    /// Role at a position.
    pub fn get(&self, idx: usize) -> Option<Role> {
        self.0.get(idx).copied()
    }

    /// All positions in order.
    pub fn roles(&self) -> &[Role; TOTAL_CARDS] {
        &self.0
    }

    /// Position holding a role.
    pub fn position_of(&self, role: Role) -> Option<usize> {
        self.0.iter().position(|r| *r == role)
    }

    /// True if some seat holds the role, false if it lies in the discard pool.
    pub fn is_dealt(&self, role: Role) -> bool {
        self.position_of(role).is_some_and(is_player_card)
    }

    /// The two roles held by a seat.
    pub fn seat_roles(&self, seat: Seat) -> &[Role] {
        let range = seat_positions(seat);
        if range.end > PLAYER_CARDS {
            return &[];
        }
        &self.0[range]
    }

    /// A copy of this array with two positions exchanged. Positions outside
    /// the array leave it unchanged.
    #[instrument(skip(self))]
    pub fn swapped(&self, a: usize, b: usize) -> Self {
        let mut cards = self.clone();
        if a < TOTAL_CARDS && b < TOTAL_CARDS {
            cards.0.swap(a, b);
        } else {
            warn!(a, b, "Swap outside the card array ignored");
        }
        cards
    }

    /// True if every role of the deck appears exactly once.
    pub fn is_full_deck(&self) -> bool {
        Role::iter().all(|role| self.0.iter().filter(|r| **r == role).count() == 1)
    }
}

impl TryFrom<Vec<Role>> for Cards {
    type Error = DeckError;

    fn try_from(roles: Vec<Role>) -> Result<Self, Self::Error> {
        Self::from_roles(roles)
    }
}

impl From<Cards> for Vec<Role> {
    fn from(cards: Cards) -> Self {
        cards.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_deck_has_eleven_distinct_roles() {
        assert_eq!(Role::iter().count(), TOTAL_CARDS);
        assert!(Cards::ordered().is_full_deck());
    }

    #[test]
    fn test_shuffle_keeps_every_role_once() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(Cards::shuffled(&mut rng).is_full_deck());
        }
    }

    #[test]
    fn test_from_roles_rejects_duplicates() {
        let mut roles: Vec<Role> = Role::iter().collect();
        roles[1] = Role::Copy;
        assert_eq!(
            Cards::from_roles(roles),
            Err(DeckError::DuplicateRole(Role::Copy))
        );
    }

    #[test]
    fn test_from_roles_rejects_short_array() {
        let roles: Vec<Role> = Role::iter().take(10).collect();
        assert_eq!(Cards::from_roles(roles), Err(DeckError::WrongLength(10)));
    }

    #[test]
    fn test_swap_twice_is_identity() {
        let cards = Cards::shuffled(&mut StdRng::seed_from_u64(3));
        assert_eq!(cards.swapped(2, 9).swapped(2, 9), cards);
        assert_ne!(cards.swapped(2, 9), cards);
    }

    #[test]
    fn test_position_helpers() {
        assert_eq!(owner_of(0), Some(0));
        assert_eq!(owner_of(7), Some(3));
        assert_eq!(owner_of(8), None);
        assert!(is_discard_card(10));
        assert!(!is_discard_card(11));
        assert_eq!(seat_positions(2), 4..6);
    }

    #[test]
    fn test_brothers_share_public_label() {
        assert_eq!(Role::Brothers1.public(), Role::Brothers2.public());
        assert_eq!(Role::Brothers1.to_string(), "brothers_1");
        assert_eq!(PublicRole::Brothers.to_string(), "brothers");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Role::Brothers2).unwrap();
        assert_eq!(json, "\"brothers_2\"");
        let role: Role = serde_json::from_str("\"milkman\"").unwrap();
        assert_eq!(role, Role::Milkman);
    }
}
