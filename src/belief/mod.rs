//! Belief tracking.
//!
//! The [`BeliefStore`] holds certain and uncertain knowledge about hidden
//! facts. Evidence enters through its mutation operations and leaves only
//! through [`BeliefStore::reconcile`].

mod hypothesis;
mod reconcile;
mod safes;
mod store;

pub use hypothesis::Hypotheses;
pub use safes::SafeLedger;
pub use store::{
    BeliefStore, FactionSlot, Hypothesis, HypothesisOutcome, ItemDestination, ItemSlot,
    PropertyKnowledge, TamperSubject,
};
