//! Protocol states and the fixed transition table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::message::{Message, RoleEnum};

/// Where the client stands in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolState {
    /// No transport attached.
    #[default]
    NotConnected,
    /// Transport attached, handshake not sent.
    Connected,
    /// Handshake sent, waiting for the reply.
    SentHello,
    /// Handshake accepted, waiting for the match.
    Welcomed,
    /// Choosing items from the server's offers.
    ItemChoice,
    /// Assigning the chosen gadgets to the chosen characters.
    EquipmentChoice,
    /// Match running, waiting for the next request.
    InMatch,
    /// One of this client's characters must act.
    MatchActive,
    /// Match paused.
    Paused,
    /// Match ended.
    MatchOver,
    /// Connection lost mid-match; waiting to rejoin.
    Reconnecting,
}

impl ProtocolState {
    /// States between match start and match end. A lost connection in one of
    /// these is worth recovering.
    #[must_use]
    pub const fn is_mid_match(self) -> bool {
        matches!(
            self,
            Self::ItemChoice | Self::EquipmentChoice | Self::InMatch | Self::MatchActive | Self::Paused
        )
    }

    /// States from the handshake reply up to and including match end.
    #[must_use]
    pub const fn is_welcomed(self) -> bool {
        matches!(
            self,
            Self::Welcomed
                | Self::ItemChoice
                | Self::EquipmentChoice
                | Self::InMatch
                | Self::MatchActive
                | Self::Paused
                | Self::MatchOver
        )
    }

    /// States in which the match itself is running.
    #[must_use]
    pub const fn is_in_game(self) -> bool {
        matches!(self, Self::InMatch | Self::MatchActive | Self::Paused | Self::MatchOver)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::Connected => "CONNECTED",
            Self::SentHello => "SENT_HELLO",
            Self::Welcomed => "WELCOMED",
            Self::ItemChoice => "ITEM_CHOICE",
            Self::EquipmentChoice => "EQUIPMENT_CHOICE",
            Self::InMatch => "IN_MATCH",
            Self::MatchActive => "MATCH_ACTIVE",
            Self::Paused => "PAUSED",
            Self::MatchOver => "MATCH_OVER",
            Self::Reconnecting => "RECONNECTING",
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outbound request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Attaching a transport.
    Connect,
    /// Changing the name or role before the handshake.
    SetIdentity,
    /// Handshake.
    Hello,
    /// Rejoining a match.
    Reconnect,
    /// Picking one offered item.
    ItemChoice,
    /// Sending the equipment.
    EquipmentChoice,
    /// Sending a character operation.
    GameOperation,
    /// Leaving the match.
    GameLeave,
    /// Pausing or resuming.
    RequestGamePause,
    /// Requesting meta information.
    RequestMetaInformation,
    /// Requesting a replay.
    RequestReplay,
}

impl RequestKind {
    /// Returns true if the request may be sent in `state`.
    ///
    /// Pause requests are further narrowed by their flag.
    #[must_use]
    pub const fn permits(self, state: ProtocolState) -> bool {
        use ProtocolState as S;
        match self {
            Self::Connect => matches!(state, S::NotConnected | S::Connected | S::Reconnecting | S::MatchOver),
            Self::SetIdentity => matches!(state, S::NotConnected | S::Connected),
            Self::Hello => matches!(state, S::Connected),
            Self::Reconnect => matches!(state, S::Reconnecting),
            Self::ItemChoice => matches!(state, S::ItemChoice),
            Self::EquipmentChoice => matches!(state, S::EquipmentChoice),
            Self::GameOperation => matches!(state, S::MatchActive),
            Self::GameLeave => state.is_welcomed() && !matches!(state, S::MatchOver),
            Self::RequestGamePause => matches!(state, S::InMatch | S::MatchActive | S::Paused),
            Self::RequestMetaInformation => state.is_welcomed(),
            Self::RequestReplay => matches!(state, S::MatchOver),
        }
    }

    /// Returns true if spectators may not send this request.
    #[must_use]
    pub const fn requires_player(self) -> bool {
        matches!(
            self,
            Self::Reconnect
                | Self::ItemChoice
                | Self::EquipmentChoice
                | Self::GameOperation
                | Self::RequestGamePause
        )
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::SetIdentity => "SET_IDENTITY",
            Self::Hello => "HELLO",
            Self::Reconnect => "RECONNECT",
            Self::ItemChoice => "ITEM_CHOICE",
            Self::EquipmentChoice => "EQUIPMENT_CHOICE",
            Self::GameOperation => "GAME_OPERATION",
            Self::GameLeave => "GAME_LEAVE",
            Self::RequestGamePause => "REQUEST_GAME_PAUSE",
            Self::RequestMetaInformation => "REQUEST_META_INFORMATION",
            Self::RequestReplay => "REQUEST_REPLAY",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Next state after accepting `message` in `current`.
///
/// `before_pause` is the state the match was in when it was paused.
/// Returns `None` when the message is not accepted in `current`; this
/// includes every client-to-server message kind.
#[must_use]
pub fn next_state(
    current: ProtocolState,
    message: &Message,
    role: RoleEnum,
    before_pause: Option<ProtocolState>,
) -> Option<ProtocolState> {
    use ProtocolState as S;

    if current == S::NotConnected {
        return None;
    }

    let next = match (message, current) {
        (Message::HelloReply { .. }, S::SentHello) => S::Welcomed,

        (Message::GameStarted { .. }, S::Welcomed) => {
            if role == RoleEnum::Spectator {
                S::InMatch
            } else {
                S::ItemChoice
            }
        }
        (Message::GameStarted { .. }, S::Reconnecting) => S::InMatch,

        (Message::RequestItemChoice { .. }, S::ItemChoice) => S::ItemChoice,
        (Message::RequestEquipmentChoice { .. }, S::ItemChoice) => S::EquipmentChoice,

        (
            Message::GameStatus { is_game_over, .. },
            S::EquipmentChoice | S::InMatch | S::MatchActive | S::Reconnecting,
        ) => {
            if *is_game_over {
                S::MatchOver
            } else {
                S::InMatch
            }
        }
        (Message::GameStatus { is_game_over, .. }, S::Paused) => {
            if *is_game_over {
                S::MatchOver
            } else {
                S::Paused
            }
        }

        (Message::RequestGameOperation { .. }, S::InMatch | S::MatchActive) => S::MatchActive,

        (Message::GamePause { game_paused: true, .. }, S::InMatch | S::MatchActive) => S::Paused,
        (Message::GamePause { game_paused: false, .. }, S::Paused) => before_pause.unwrap_or(S::InMatch),

        (Message::Statistics { .. }, S::InMatch | S::MatchActive | S::Paused | S::MatchOver) => S::MatchOver,

        (Message::GameLeft { .. }, state) if state.is_welcomed() => S::MatchOver,

        (Message::MetaInformation { .. } | Message::Strike { .. } | Message::Error { .. }, state) => state,

        (Message::Replay(_), S::MatchOver) => S::MatchOver,

        _ => return None,
    };
    Some(next)
}
