//! The stage graph: a fixed total order of game phases.
//!
//! Every role that acts at night owns one stage. A second, "copy" stage
//! follows each of them and belongs to whoever holds the Copy card, once
//! Copy has seen that role.

use crate::cards::Role;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::instrument;

/// One step in the fixed order of game phases.
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
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Cards dealt; each seat looks at its own two cards.
    Beginning,
    /// Copy looks at one card.
    Copy,
    /// Thief steals.
    Thief,
    /// Copy acting as Thief.
    ThiefCopy,
    /// Brothers learn each other.
    Brothers,
    /// Seer looks.
    Seer,
    /// Copy acting as Seer.
    SeerCopy,
    /// Brawler swaps two other cards.
    Brawler,
    /// Copy acting as Brawler.
    BrawlerCopy,
    /// Drunkard swaps with the discard pool.
    Drunkard,
    /// Copy acting as Drunkard.
    DrunkardCopy,
    /// Witch swaps a discard into another seat.
    Witch,
    /// Copy acting as Witch.
    WitchCopy,
    /// Milkman is revealed.
    Milkman,
    /// Copy acting as Milkman.
    MilkmanCopy,
    /// Every seat accuses one card.
    Shooting,
    /// Game over.
    Finished,
}

impl Stage {
    /// Position of the stage in the order (`Beginning` is 0).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Looks a stage up by its position in the order.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::iter().nth(index)
    }

    /// The stage after this one, `None` after `Finished`.
    #[instrument]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// The stage at which a dealt role acts.
    ///
    /// Both Brothers map to [`Stage::Brothers`]. Mafia and Suicide never act.
    #[instrument]
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::Copy => Some(Stage::Copy),
            Role::Thief => Some(Stage::Thief),
            Role::Brothers1 | Role::Brothers2 => Some(Stage::Brothers),
            Role::Seer => Some(Stage::Seer),
            Role::Brawler => Some(Stage::Brawler),
            Role::Drunkard => Some(Stage::Drunkard),
            Role::Witch => Some(Stage::Witch),
            Role::Milkman => Some(Stage::Milkman),
            Role::Mafia | Role::Suicide => None,
        }
    }

    /// The stage at which Copy acts after having seen `role`.
    ///
    /// A copied Brother joins the Brothers stage. Copying Copy, Mafia or
    /// Suicide unlocks nothing.
    #[instrument]
    pub fn for_copied_role(role: Role) -> Option<Self> {
        match role {
            Role::Thief => Some(Stage::ThiefCopy),
            Role::Brothers1 | Role::Brothers2 => Some(Stage::Brothers),
            Role::Seer => Some(Stage::SeerCopy),
            Role::Brawler => Some(Stage::BrawlerCopy),
            Role::Drunkard => Some(Stage::DrunkardCopy),
            Role::Witch => Some(Stage::WitchCopy),
            Role::Milkman => Some(Stage::MilkmanCopy),
            Role::Copy | Role::Mafia | Role::Suicide => None,
        }
    }

    /// The role whose own card acts at this stage.
    ///
    /// `None` for structural stages (Beginning, Brothers, Shooting, Finished)
    /// and for copy stages.
    pub fn bound_role(self) -> Option<Role> {
        match self {
            Stage::Copy => Some(Role::Copy),
            Stage::Thief => Some(Role::Thief),
            Stage::Seer => Some(Role::Seer),
            Stage::Brawler => Some(Role::Brawler),
            Stage::Drunkard => Some(Role::Drunkard),
            Stage::Witch => Some(Role::Witch),
            Stage::Milkman => Some(Role::Milkman),
            _ => None,
        }
    }

    /// The role imitated at a copy stage, `None` elsewhere.
    pub fn imitated_role(self) -> Option<Role> {
        match self {
            Stage::ThiefCopy => Some(Role::Thief),
            Stage::SeerCopy => Some(Role::Seer),
            Stage::BrawlerCopy => Some(Role::Brawler),
            Stage::DrunkardCopy => Some(Role::Drunkard),
            Stage::WitchCopy => Some(Role::Witch),
            Stage::MilkmanCopy => Some(Role::Milkman),
            _ => None,
        }
    }

    /// The card that physically acts at this stage: the stage's own role,
    /// or the Copy card at a copy stage.
    pub fn acting_card(self) -> Option<Role> {
        if self.imitated_role().is_some() {
            Some(Role::Copy)
        } else {
            self.bound_role()
        }
    }

    /// True for the stages where Copy imitates another role.
    pub fn is_copy_stage(self) -> bool {
        self.imitated_role().is_some()
    }

    /// True for stages that never wait for a move.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Stage::Beginning | Stage::Brothers | Stage::Shooting | Stage::Finished
        )
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> Self {
        stage as u8
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::from_index(value as usize).ok_or_else(|| format!("Unknown stage {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_total() {
        let stages: Vec<Stage> = Stage::iter().collect();
        assert_eq!(stages.len(), 17);
        assert_eq!(stages[0], Stage::Beginning);
        assert_eq!(stages[16], Stage::Finished);
        for (i, stage) in stages.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn test_next_walks_the_graph() {
        assert_eq!(Stage::Beginning.next(), Some(Stage::Copy));
        assert_eq!(Stage::Copy.next(), Some(Stage::Thief));
        assert_eq!(Stage::MilkmanCopy.next(), Some(Stage::Shooting));
        assert_eq!(Stage::Shooting.next(), Some(Stage::Finished));
        assert_eq!(Stage::Finished.next(), None);
    }

    #[test]
    fn test_every_bound_stage_maps_back_to_its_role() {
        for stage in Stage::iter() {
            if let Some(role) = stage.bound_role() {
                assert_eq!(Stage::for_role(role), Some(stage));
            }
            if let Some(role) = stage.imitated_role() {
                assert_eq!(Stage::for_copied_role(role), Some(stage));
            }
        }
    }

    #[test]
    fn test_copy_stage_acts_with_copy_card() {
        assert_eq!(Stage::WitchCopy.acting_card(), Some(Role::Copy));
        assert_eq!(Stage::Witch.acting_card(), Some(Role::Witch));
        assert_eq!(Stage::Brothers.acting_card(), None);
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Stage::Seer).unwrap(), "5");
        let stage: Stage = serde_json::from_str("15").unwrap();
        assert_eq!(stage, Stage::Shooting);
        assert!(serde_json::from_str::<Stage>("17").is_err());
    }
}
