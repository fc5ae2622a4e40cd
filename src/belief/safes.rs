//! Safe-opening ledger.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::CharacterId;

/// What the client knows about the safes on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeLedger {
    opened: BTreeSet<u32>,
    /// Safe index to the number of combinations known at the failed attempt.
    tried: BTreeMap<u32, usize>,
    combinations: BTreeSet<u32>,
    combination_sources: BTreeSet<CharacterId>,
}

impl SafeLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a safe opened by one of my characters.
    pub fn mark_opened(&mut self, index: u32) {
        self.tried.remove(&index);
        self.opened.insert(index);
    }

    /// Records a failed attempt with the combinations known right now.
    pub fn mark_tried(&mut self, index: u32) {
        if self.opened.contains(&index) {
            return;
        }
        self.tried.insert(index, self.combinations.len());
    }

    /// Merges combinations delivered with a snapshot. Returns the number of
    /// newly learned combinations.
    pub fn learn_combinations(&mut self, combinations: impl IntoIterator<Item = u32>) -> usize {
        let before = self.combinations.len();
        self.combinations.extend(combinations);
        self.combinations.len() - before
    }

    /// Records a character a combination was learned from.
    pub fn note_source(&mut self, id: CharacterId) {
        self.combination_sources.insert(id);
    }

    /// Safes this client opened.
    #[must_use]
    pub fn opened(&self) -> &BTreeSet<u32> {
        &self.opened
    }

    /// Failed attempts by safe, with the number of known combinations at the time.
    #[must_use]
    pub fn tried(&self) -> &BTreeMap<u32, usize> {
        &self.tried
    }

    /// Combinations this client knows.
    #[must_use]
    pub fn combinations(&self) -> &BTreeSet<u32> {
        &self.combinations
    }

    /// Characters that gave away a secret to this client.
    #[must_use]
    pub fn combination_sources(&self) -> &BTreeSet<CharacterId> {
        &self.combination_sources
    }

    /// Returns true if this client opened the safe.
    #[must_use]
    pub fn is_opened(&self, index: u32) -> bool {
        self.opened.contains(&index)
    }

    /// Returns true if a failed safe may open now: it has not been opened and
    /// more combinations are known than at the last failed attempt.
    #[must_use]
    pub fn is_worth_retrying(&self, index: u32) -> bool {
        if self.opened.contains(&index) {
            return false;
        }
        self.tried
            .get(&index)
            .map_or(true, |known| self.combinations.len() > *known)
    }

    /// Safes of `total` not yet opened by me.
    #[must_use]
    pub fn unopened_count(&self, total: usize) -> usize {
        total.saturating_sub(self.opened.len())
    }
}
