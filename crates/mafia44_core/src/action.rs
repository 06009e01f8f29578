//! First-class move types.
//!
//! A move is a domain event recorded against one snapshot: a set of
//! revealed positions, a swap, or both.

use crate::cards::{Cards, Seat};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Two distinct positions exchanged by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Swap {
    a: usize,
    b: usize,
}

impl Swap {
    /// Creates a swap between two distinct positions.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::SwapSameCard`] when `a == b`.
    #[instrument]
    pub fn new(a: usize, b: usize) -> Result<Self, MoveError> {
        if a == b {
            return Err(MoveError::SwapSameCard(a));
        }
        Ok(Self { a, b })
    }

    /// First position.
    pub fn a(&self) -> usize {
        self.a
    }

    /// Second position.
    pub fn b(&self) -> usize {
        self.b
    }

    /// Both positions.
    pub fn pair(&self) -> [usize; 2] {
        [self.a, self.b]
    }

    /// True if the swap touches the position.
    pub fn contains(&self, idx: usize) -> bool {
        self.a == idx || self.b == idx
    }
}

/// A move recorded against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    cards_to_show: Vec<usize>,
    swap: Option<Swap>,
}

impl Action {
    /// Creates a move from its stored shape.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::HalfSwap`] if exactly one swap position is given
    /// and [`MoveError::SwapSameCard`] if both are equal.
    #[instrument]
    pub fn new(
        cards_to_show: Vec<usize>,
        swap_card_a: Option<usize>,
        swap_card_b: Option<usize>,
    ) -> Result<Self, MoveError> {
        let swap = match (swap_card_a, swap_card_b) {
            (None, None) => None,
            (Some(a), Some(b)) => Some(Swap::new(a, b)?),
            _ => return Err(MoveError::HalfSwap),
        };
        Ok(Self {
            cards_to_show,
            swap,
        })
    }

    /// A pure reveal.
    #[instrument]
    pub fn show(cards_to_show: Vec<usize>) -> Self {
        Self {
            cards_to_show,
            swap: None,
        }
    }

    /// Revealed positions, in selection order.
    pub fn cards_to_show(&self) -> &[usize] {
        &self.cards_to_show
    }

    /// The swap, if any.
    pub fn swap(&self) -> Option<Swap> {
        self.swap
    }

    /// True if the move exchanges two cards.
    pub fn is_swap(&self) -> bool {
        self.swap.is_some()
    }

    /// Swapped positions, empty without a swap.
    pub fn swapped_cards(&self) -> Vec<usize> {
        self.swap.map(|s| s.pair().to_vec()).unwrap_or_default()
    }

    /// Every position the move refers to.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.cards_to_show
            .iter()
            .copied()
            .chain(self.swap.into_iter().flat_map(|s| s.pair()))
    }

    /// The card array after this move; identity for a pure reveal.
    #[instrument(skip(cards))]
    pub fn apply(&self, cards: &Cards) -> Cards {
        match self.swap {
            Some(swap) => cards.swapped(swap.a, swap.b),
            None => cards.clone(),
        }
    }
}

/// Why a move or an accusation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Only one of the two swap positions was given.
    #[display("Swap needs both cards or neither")]
    HalfSwap,

    /// Both swap positions are the same card.
    #[display("Cannot swap card {} with itself", _0)]
    SwapSameCard(usize),

    /// A position outside the card array.
    #[display("Card index {} is out of range", _0)]
    IndexOutOfRange(usize),

    /// The seat holds no role acting at the current stage.
    #[display("Seat {} cannot act at stage {}", seat, stage)]
    StageNotAccessible {
        /// Acting seat.
        seat: Seat,
        /// Current stage.
        stage: Stage,
    },

    /// The move shape is not legal for the stage.
    #[display("Move is not legal at stage {}", _0)]
    IllegalMove(Stage),

    /// No card selection is accepted at the stage.
    #[display("No cards can be selected at stage {}", _0)]
    NoSelection(Stage),

    /// Wrong number of selected cards.
    #[display("Stage {} takes {} selected card(s), got {}", stage, expected, got)]
    WrongSelectionCount {
        /// Current stage.
        stage: Stage,
        /// Cards the stage takes.
        expected: usize,
        /// Cards submitted.
        got: usize,
    },

    /// A move was already recorded for the current stage.
    #[display("A move was already recorded at stage {}", _0)]
    AlreadyRecorded(Stage),

    /// Accusations are only taken while shooting.
    #[display("Cards can only be shot during the shooting stage")]
    NotShooting,

    /// Accusation target is not a seat's card.
    #[display("Card {} is not held by any player", _0)]
    ShotOutOfRange(usize),

    /// A seat tried to accuse its own card.
    #[display("Seat {} cannot shoot its own card", _0)]
    ShootOwnCard(Seat),

    /// A seat tried to accuse twice.
    #[display("Seat {} has already shot", _0)]
    AlreadyShot(Seat),
}

impl std::error::Error for MoveError {}
