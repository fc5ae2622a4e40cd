//! Per-turn bookkeeping for the detection gadget.

use crate::id::CharacterId;

/// What one character did during its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSummary {
    /// Character whose turn ended.
    pub owner: CharacterId,
    /// The owner performed at least one operation of its own.
    pub acted: bool,
    /// The owner threw the moledie during the turn.
    pub shed: bool,
}

/// Tracks the current turn owner across operation batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnTracker {
    current: Option<TurnSummary>,
}

impl TurnTracker {
    /// Creates a tracker with no turn in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation by `actor`.
    ///
    /// Returns the summary of the previous turn when the turn passed to a
    /// different character.
    pub fn begin(&mut self, actor: CharacterId) -> Option<TurnSummary> {
        if self.current.is_some_and(|turn| turn.owner == actor) {
            return None;
        }
        self.current.replace(TurnSummary {
            owner: actor,
            acted: false,
            shed: false,
        })
    }

    /// Records that the current owner performed an operation.
    pub fn note_action(&mut self) {
        if let Some(turn) = self.current.as_mut() {
            turn.acted = true;
        }
    }

    /// Records that the current owner threw the moledie.
    pub fn note_shed(&mut self) {
        if let Some(turn) = self.current.as_mut() {
            turn.shed = true;
        }
    }

    /// Owner of the turn in progress.
    #[must_use]
    pub fn owner(&self) -> Option<CharacterId> {
        self.current.map(|turn| turn.owner)
    }

    /// Forgets the turn in progress.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
