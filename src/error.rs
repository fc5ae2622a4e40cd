//! Error types for spyclient.
//!
//! All errors are strongly typed using thiserror. Nothing in the core is
//! fatal to a session: every failure is a value the caller can branch on.

use std::path::PathBuf;

use thiserror::Error;

use crate::character::Faction;
use crate::gadget::GadgetEnum;
use crate::id::{CharacterId, PlayerId, SessionId};
use crate::protocol::{ProtocolState, RequestKind};

/// Payload validation failures for outbound requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required value was empty or absent.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A string value is longer than the protocol allows.
    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Name of the offending field.
        field: String,
        /// Maximum accepted length in characters.
        max_length: usize,
    },

    /// Item choice names a character the server did not offer.
    #[error("Character {id} was not offered")]
    CharacterNotOffered {
        /// The rejected character.
        id: CharacterId,
    },

    /// Item choice names a gadget the server did not offer.
    #[error("Gadget {gadget} was not offered")]
    GadgetNotOffered {
        /// The rejected gadget.
        gadget: GadgetEnum,
    },

    /// Equipment names a character outside the chosen team.
    #[error("Character {id} is not one of the chosen characters")]
    CharacterNotChosen {
        /// The rejected character.
        id: CharacterId,
    },

    /// Equipment names a gadget that was never chosen.
    #[error("Gadget {gadget} is not one of the chosen gadgets")]
    GadgetNotChosen {
        /// The rejected gadget.
        gadget: GadgetEnum,
    },

    /// Equipment assigns the same gadget to two characters.
    #[error("Gadget {gadget} is assigned more than once")]
    GadgetAssignedTwice {
        /// The duplicated gadget.
        gadget: GadgetEnum,
    },

    /// The operation is not for the character whose turn was requested.
    #[error("Operation names character {actual}, but the active character is {expected:?}")]
    NotActiveCharacter {
        /// Character the server asked to act, if any.
        expected: Option<CharacterId>,
        /// Character named by the operation.
        actual: CharacterId,
    },

    /// Only character operations may be sent; the rest are server-side.
    #[error("Operation of type {kind} cannot be requested by a client")]
    OperationNotRequestable {
        /// Wire name of the operation type.
        kind: String,
    },

    /// Players may not read the neutral faction or the opponent's secrets.
    #[error("Meta information key {key} is not available to this client")]
    MetaKeyNotPermitted {
        /// Wire name of the refused key.
        key: String,
    },

    /// The server paused the game and only it may resume.
    #[error("Game pause is enforced by the server")]
    PauseServerEnforced,

    /// The last statistics message did not announce a replay.
    #[error("No replay is available")]
    ReplayUnavailable,

    /// Players may not label characters with their own side.
    #[error("Faction {faction:?} cannot be assigned by this client")]
    FactionNotAssignable {
        /// The refused faction.
        faction: crate::character::FactionEnum,
    },
}

/// Protocol violations: a request or message does not fit the current state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// The request is not legal in the current protocol state.
    #[error("Request {request} is not permitted in state {state}")]
    StateNotPermitted {
        /// The refused request.
        request: RequestKind,
        /// State the session was in.
        state: ProtocolState,
    },

    /// The request is reserved for players and AIs.
    #[error("Request {request} is not permitted for role {role}")]
    RoleNotPermitted {
        /// The refused request.
        request: RequestKind,
        /// Role of this client.
        role: crate::protocol::RoleEnum,
    },

    /// Player or session id is needed but has not been assigned.
    #[error("Client identity is not known yet")]
    IdentityUnknown,

    /// Inbound message addressed to another player.
    #[error("Message addressed to player {actual}, expected {expected}")]
    WrongPlayer {
        /// This client's id.
        expected: PlayerId,
        /// Id carried by the message.
        actual: PlayerId,
    },

    /// Inbound message addressed to another session.
    #[error("Message addressed to session {actual}, expected {expected}")]
    WrongSession {
        /// The established session.
        expected: SessionId,
        /// Session carried by the message.
        actual: SessionId,
    },

    /// Inbound text is not a valid message envelope.
    #[error("Message could not be decoded: {reason}")]
    Undecodable {
        /// Decoder error text.
        reason: String,
    },

    /// Inbound message is valid but not accepted in the current state.
    #[error("Message {message} is not expected in state {state}")]
    UnexpectedInState {
        /// Wire type of the message.
        message: String,
        /// State the session was in.
        state: ProtocolState,
    },
}

/// Belief store failures. All are recoverable: the store is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeliefError {
    /// The character was not part of the match setup.
    #[error("Character not tracked: {0}")]
    UnknownCharacter(CharacterId),

    /// The gadget is not tracked or was already consumed.
    #[error("Gadget not tracked: {0}")]
    UnknownGadget(GadgetEnum),

    /// The move is not an edge of the item location graph.
    #[error("Illegal item move for {gadget}: {from} -> {to}")]
    IllegalItemMove {
        /// The gadget being moved.
        gadget: GadgetEnum,
        /// Current location kind.
        from: &'static str,
        /// Requested location kind.
        to: &'static str,
    },

    /// The character is already certain with a different faction.
    #[error("Character {id} is already resolved as {current}, not {requested}")]
    FactionConflict {
        /// The character.
        id: CharacterId,
        /// Faction it is resolved as.
        current: Faction,
        /// Faction the caller tried to resolve.
        requested: Faction,
    },

    /// Certainty samples must lie in `[0, 1]`.
    #[error("Certainty value {value} is out of range [0.0, 1.0]")]
    CertaintyOutOfRange {
        /// The rejected sample.
        value: f64,
    },
}

/// Transport errors reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// No transport is attached, or it was closed.
    #[error("Not connected")]
    NotConnected,

    /// The transport refused the frame.
    #[error("Failed to send message: {message}")]
    SendFailed {
        /// Transport error text.
        message: String,
    },

    /// The outbound message could not be encoded.
    #[error("Failed to serialize message: {message}")]
    SerializationFailed {
        /// Encoder error text.
        message: String,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration document.
    #[error("Malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A probability setting lies outside `[0, 1]`.
    #[error("Configuration value '{field}' = {value} is out of range [0.0, 1.0]")]
    ProbabilityOutOfRange {
        /// Wire name of the setting.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Top-level error type for spyclient.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request payload was rejected before sending.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Request or message does not fit the protocol state.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Belief store refused an update.
    #[error("Belief error: {0}")]
    Belief(#[from] BeliefError),

    /// The transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a protocol error.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns true if this is a belief store error.
    #[must_use]
    pub const fn is_belief(&self) -> bool {
        matches!(self, Self::Belief(_))
    }

    /// Returns true if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if retrying the same call later may succeed.
    ///
    /// Transport failures can clear after a reconnect, and a request refused
    /// in the current state may become legal once the server advances it.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Belief(_) | Self::Config(_) => false,
            Self::Protocol(e) => matches!(e, ProtocolError::StateNotPermitted { .. }),
            Self::Transport(_) => true,
        }
    }
}

/// Result type alias for spyclient operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for belief store operations.
pub type BeliefResult<T> = Result<T, BeliefError>;
