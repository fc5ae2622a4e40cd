//! # spyclient - client runtime for a hidden-identity spy game
//!
//! spyclient speaks the game's JSON protocol on behalf of a player, an AI or a
//! spectator, and keeps a belief model of everything the server does not
//! disclose: which characters belong to which side, who holds which gadget,
//! which cocktails are poisoned and which roulette tables are inverted.
//!
//! ## Core Concepts
//!
//! - **Session**: the protocol state machine. Gates outbound requests by state
//!   and role, validates their payloads, and applies inbound messages.
//! - **Belief store**: certain facts plus weighted hypotheses for factions and
//!   gadget holders, with probability queries over them.
//! - **Interpreter**: turns the operations reported in each game status into
//!   belief updates.
//! - **Reconciliation**: writes certain beliefs back into every snapshot the
//!   server sends.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spyclient::{ChannelTransport, Endpoint, RoleEnum, Session};
//!
//! let (notify_tx, notify_rx) = crossbeam_channel::unbounded();
//! let (transport, outbound) = ChannelTransport::pair();
//!
//! let mut session = Session::new(notify_tx);
//! session.connect(Endpoint::new("localhost", 7007), transport)?;
//! session.send_hello("ada", RoleEnum::Player)?;
//!
//! // The driver forwards `outbound` frames to the socket and feeds replies back:
//! session.on_receive(&reply);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Domain types
pub mod board;
pub mod character;
pub mod config;
pub mod error;
pub mod gadget;
pub mod id;
pub mod operation;

// Knowledge and inference
pub mod belief;
pub mod inference;

// Protocol and session
pub mod callback;
pub mod model;
pub mod protocol;
pub mod transport;

pub use belief::{BeliefStore, FactionSlot, Hypothesis, HypothesisOutcome, ItemDestination, ItemSlot, TamperSubject};
pub use board::{Field, FieldMap, FieldStateEnum, Point, Scenario, State};
pub use callback::{Callback, Notification};
pub use character::{Character, CharacterInformation, Faction, FactionEnum, PropertyEnum};
pub use config::{InferenceWeights, MatchConfig, SessionConfig};
pub use error::{
    BeliefError, BeliefResult, ClientError, ClientResult, ConfigError, ProtocolError, TransportError,
    ValidationError,
};
pub use gadget::{Gadget, GadgetEnum};
pub use id::{CharacterId, PlayerId, SessionId};
pub use inference::{InterpretCtx, Interpreter};
pub use model::{ClientInfo, GameInfo, Model};
pub use operation::Operation;
pub use protocol::{
    EquipmentMap, ItemChoice, Message, MessageContainer, MetaInformationKey, ProtocolState, RequestKind,
    RoleEnum, Session,
};
pub use transport::{ChannelTransport, Endpoint, Transport};
