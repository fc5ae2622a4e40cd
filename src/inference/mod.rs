//! Operation interpretation.
//!
//! Observed game operations are evidence. The [`Interpreter`] dispatches on
//! the operation kind and feeds the resulting facts and hypotheses into a
//! [`BeliefStore`](crate::belief::BeliefStore).

mod gadget_rules;
mod interpreter;
mod turn;

pub use gadget_rules::{Disposition, GadgetUse};
pub use interpreter::{InterpretCtx, Interpreter};
pub use turn::{TurnSummary, TurnTracker};
