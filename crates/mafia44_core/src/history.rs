//! Append-only snapshot history.

use crate::action::Action;
use crate::cards::{Cards, Seat};
use crate::stage::Stage;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// The card array as it stood at one stage.
///
/// The cards never change once the snapshot exists. A snapshot gains at
/// most one move and one read per seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    stage: Stage,
    timestamp: DateTime<Utc>,
    cards: Cards,
    action: Option<Action>,
    reads: BTreeMap<Seat, DateTime<Utc>>,
}

impl Snapshot {
    /// A snapshot with no move and no reads.
    pub fn new(stage: Stage, timestamp: DateTime<Utc>, cards: Cards) -> Self {
        Self {
            stage,
            timestamp,
            cards,
            action: None,
            reads: BTreeMap::new(),
        }
    }

    /// Rebuilds a stored snapshot.
    pub fn restore(
        stage: Stage,
        timestamp: DateTime<Utc>,
        cards: Cards,
        action: Option<Action>,
        reads: BTreeMap<Seat, DateTime<Utc>>,
    ) -> Self {
        Self {
            stage,
            timestamp,
            cards,
            action,
            reads,
        }
    }

    /// Stage this snapshot belongs to.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Creation time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Cards after every move up to and including the previous stage.
    pub fn cards(&self) -> &Cards {
        &self.cards
    }

    /// The recorded move, if any.
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Read time per acknowledging seat.
    pub fn reads(&self) -> &BTreeMap<Seat, DateTime<Utc>> {
        &self.reads
    }

    /// Time of the most recent acknowledgement.
    pub fn last_read(&self) -> Option<DateTime<Utc>> {
        self.reads.values().max().copied()
    }

    pub(crate) fn set_action(&mut self, action: Action) {
        self.action = Some(action);
    }

    /// Records a read; returns false if the seat had already read.
    pub(crate) fn mark_read(&mut self, seat: Seat, at: DateTime<Utc>) -> bool {
        if self.reads.contains_key(&seat) {
            return false;
        }
        self.reads.insert(seat, at);
        true
    }
}

/// Every snapshot a game has reached, indexed by stage.
///
/// Stages are visited in order and each visited stage gets a snapshot, so
/// the snapshot for stage `s` sits at index `s.index()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    /// A history holding only the opening deal.
    #[instrument(skip(cards))]
    pub fn new(cards: Cards, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshots: vec![Snapshot::new(Stage::Beginning, timestamp, cards)],
        }
    }

    /// Rebuilds a stored history; ordering is the caller's concern and is
    /// verified by the game invariants.
    pub fn from_snapshots(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by_key(|s| s.stage);
        Self { snapshots }
    }

    /// Snapshot for a stage, if reached.
    pub fn get(&self, stage: Stage) -> Option<&Snapshot> {
        self.snapshots
            .get(stage.index())
            .filter(|s| s.stage == stage)
    }

    pub(crate) fn get_mut(&mut self, stage: Stage) -> Option<&mut Snapshot> {
        self.snapshots
            .get_mut(stage.index())
            .filter(|s| s.stage == stage)
    }

    /// The snapshot dealt at Beginning.
    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Snapshots in stage order.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True before the opening deal exists.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Appends the snapshot for the next stage.
    ///
    /// Returns false, leaving the history untouched, if the snapshot's stage
    /// is not the one directly after the latest.
    pub(crate) fn append(&mut self, snapshot: Snapshot) -> bool {
        let expected = self
            .latest()
            .and_then(|s| s.stage.next())
            .unwrap_or(Stage::Beginning);
        if snapshot.stage != expected {
            debug!(stage = %snapshot.stage, expected = %expected, "Refusing out-of-order snapshot");
            return false;
        }
        self.snapshots.push(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_only_in_order() {
        let now = Utc::now();
        let mut history = History::new(Cards::ordered(), now);
        assert!(!history.append(Snapshot::new(Stage::Thief, now, Cards::ordered())));
        assert!(history.append(Snapshot::new(Stage::Copy, now, Cards::ordered())));
        assert!(!history.append(Snapshot::new(Stage::Copy, now, Cards::ordered())));
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(Stage::Copy).map(Snapshot::stage), Some(Stage::Copy));
        assert!(history.get(Stage::Thief).is_none());
    }

    #[test]
    fn test_reads_are_unique_per_seat() {
        let now = Utc::now();
        let mut snapshot = Snapshot::new(Stage::Beginning, now, Cards::ordered());
        assert!(snapshot.mark_read(1, now));
        assert!(!snapshot.mark_read(1, now + chrono::TimeDelta::seconds(3)));
        assert_eq!(snapshot.reads().len(), 1);
        assert_eq!(snapshot.last_read(), Some(now));
    }
}
