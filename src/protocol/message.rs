//! Wire messages exchanged with the game server.
//!
//! Every message travels inside a [`MessageContainer`] that carries the
//! addressing fields (`playerId`, `sessionId`), a creation timestamp and an
//! optional debug string. The payload is flattened next to them and tagged by
//! its `type` field.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Scenario, State};
use crate::character::CharacterInformation;
use crate::config::MatchConfig;
use crate::error::{ProtocolError, TransportError};
use crate::gadget::GadgetEnum;
use crate::id::{CharacterId, PlayerId, SessionId};
use crate::operation::Operation;

/// Role a client announces in its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleEnum {
    /// Human player.
    #[default]
    Player,
    /// Computer player.
    Ai,
    /// Watches the match without playing.
    Spectator,
}

impl fmt::Display for RoleEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player => "PLAYER",
            Self::Ai => "AI",
            Self::Spectator => "SPECTATOR",
        })
    }
}

/// Error categories reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorTypeEnum {
    /// The handshake name is taken.
    NameNotAvailable,
    /// The server already runs a match.
    AlreadyServing,
    /// Reconnect named an unknown session.
    SessionDoesNotExist,
    /// The message is not valid in the server's state.
    IllegalMessage,
    /// The client was disqualified by strikes.
    TooManyStrikes,
    /// Any other failure.
    General,
}

/// How a match was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VictoryEnum {
    /// More intelligence points.
    VictoryByIp,
    /// Gave the diamond collar to the cat.
    VictoryByCollar,
    /// Tie broken by cocktails drunk.
    VictoryByDrinking,
    /// Tie broken by cocktails spilled.
    VictoryBySpilling,
    /// Tie broken by damage dealt.
    VictoryByHp,
    /// Tie broken at random.
    VictoryByRandomness,
    /// Opponent was disqualified.
    VictoryByKick,
    /// Opponent left the match.
    VictoryByLeave,
}

/// Keys accepted by a meta information request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetaInformationKey {
    /// Number of spectators.
    #[serde(rename = "Spectator.Count")]
    SpectatorCount,
    /// Names of the spectators.
    #[serde(rename = "Spectator.Members")]
    SpectatorMembers,
    /// Level layout.
    #[serde(rename = "Configuration.Scenario")]
    ConfigurationScenario,
    /// Match rules.
    #[serde(rename = "Configuration.MatchConfig")]
    ConfigurationMatchConfig,
    /// Character descriptions.
    #[serde(rename = "Configuration.CharacterInformation")]
    ConfigurationCharacterInformation,
    /// Characters of player one.
    #[serde(rename = "Faction.Player1")]
    FactionPlayer1,
    /// Characters of player two.
    #[serde(rename = "Faction.Player2")]
    FactionPlayer2,
    /// NPCs.
    #[serde(rename = "Faction.Neutral")]
    FactionNeutral,
    /// Gadgets chosen by player one.
    #[serde(rename = "Gadgets.Player1")]
    GadgetsPlayer1,
    /// Gadgets chosen by player two.
    #[serde(rename = "Gadgets.Player2")]
    GadgetsPlayer2,
}

impl MetaInformationKey {
    /// Wire name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpectatorCount => "Spectator.Count",
            Self::SpectatorMembers => "Spectator.Members",
            Self::ConfigurationScenario => "Configuration.Scenario",
            Self::ConfigurationMatchConfig => "Configuration.MatchConfig",
            Self::ConfigurationCharacterInformation => "Configuration.CharacterInformation",
            Self::FactionPlayer1 => "Faction.Player1",
            Self::FactionPlayer2 => "Faction.Player2",
            Self::FactionNeutral => "Faction.Neutral",
            Self::GadgetsPlayer1 => "Gadgets.Player1",
            Self::GadgetsPlayer2 => "Gadgets.Player2",
        }
    }
}

impl fmt::Display for MetaInformationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the end-of-match statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsEntry {
    /// Short name of the statistic.
    pub title: String,
    /// Longer explanation.
    pub description: String,
    /// Value for player one.
    pub value_player1: String,
    /// Value for player two.
    pub value_player2: String,
}

/// End-of-match statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    /// Rows in server order.
    pub entries: Vec<StatisticsEntry>,
}

/// Recorded match offered for download after the match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayInfo {
    /// Session the match ran in.
    pub session_id: Option<SessionId>,
    /// Start time as sent by the server.
    pub game_start: String,
    /// End time as sent by the server.
    pub game_end: String,
    /// Id of player one.
    pub player_one_id: Option<PlayerId>,
    /// Id of player two.
    pub player_two_id: Option<PlayerId>,
    /// Name of player one.
    pub player_one_name: String,
    /// Name of player two.
    pub player_two_name: String,
    /// Rounds played.
    pub rounds: u32,
    /// Level layout.
    pub level: Scenario,
    /// Match rules.
    pub settings: MatchConfig,
    /// Every character of the match.
    pub character_settings: Vec<CharacterInformation>,
    /// Every message of the match, undecoded.
    pub messages: Vec<serde_json::Value>,
}

/// A single pick during the item choice phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemChoice {
    /// An offered character.
    Character(CharacterId),
    /// An offered gadget.
    Gadget(GadgetEnum),
}

/// Gadgets assigned to each chosen character.
pub type EquipmentMap = BTreeMap<CharacterId, BTreeSet<GadgetEnum>>;

/// All message payloads, client-to-server and server-to-client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    // Client to server.
    /// Handshake.
    #[serde(rename_all = "camelCase")]
    Hello {
        /// Name to play under.
        name: String,
        /// Announced role.
        role: RoleEnum,
    },

    /// Rejoins the match named by the envelope's ids.
    Reconnect,

    /// One pick from the current offers. Exactly one field is set.
    #[serde(rename_all = "camelCase")]
    ItemChoice {
        /// Picked character.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chosen_character: Option<CharacterId>,
        /// Picked gadget.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chosen_gadget: Option<GadgetEnum>,
    },

    /// Assignment of chosen gadgets to chosen characters.
    #[serde(rename_all = "camelCase")]
    EquipmentChoice {
        /// Gadgets per character.
        equipment: EquipmentMap,
    },

    /// Action of the active character.
    #[serde(rename_all = "camelCase")]
    GameOperation {
        /// The requested operation.
        operation: Operation,
    },

    /// Leaves the match.
    GameLeave,

    /// Pause or resume request.
    #[serde(rename_all = "camelCase")]
    RequestGamePause {
        /// `true` to pause, `false` to resume.
        game_pause: bool,
    },

    /// Meta information request.
    #[serde(rename_all = "camelCase")]
    RequestMetaInformation {
        /// Requested keys.
        keys: Vec<MetaInformationKey>,
    },

    /// Replay request.
    RequestReplay,

    // Server to client.
    /// Handshake accepted. The ids travel in the envelope.
    #[serde(rename_all = "camelCase")]
    HelloReply {
        /// Level layout.
        #[serde(default)]
        level: Scenario,
        /// Match rules.
        #[serde(default)]
        settings: MatchConfig,
        /// Every character of the match.
        #[serde(default)]
        character_settings: Vec<CharacterInformation>,
    },

    /// Both players are present and the match begins.
    #[serde(rename_all = "camelCase")]
    GameStarted {
        /// Id of player one.
        #[serde(default)]
        player_one_id: Option<PlayerId>,
        /// Id of player two.
        #[serde(default)]
        player_two_id: Option<PlayerId>,
        /// Name of player one.
        #[serde(default)]
        player_one_name: String,
        /// Name of player two.
        #[serde(default)]
        player_two_name: String,
    },

    /// Offers for the next item pick.
    #[serde(rename_all = "camelCase")]
    RequestItemChoice {
        /// Offered characters.
        #[serde(default)]
        offered_character_ids: Vec<CharacterId>,
        /// Offered gadgets.
        #[serde(default)]
        offered_gadgets: Vec<GadgetEnum>,
    },

    /// Item choice is over; equipment must be assigned.
    #[serde(rename_all = "camelCase")]
    RequestEquipmentChoice {
        /// Characters this client picked.
        #[serde(default)]
        chosen_character_ids: Vec<CharacterId>,
        /// Gadgets this client picked.
        #[serde(default)]
        chosen_gadgets: Vec<GadgetEnum>,
    },

    /// Operations since the last status and the resulting snapshot.
    #[serde(rename_all = "camelCase")]
    GameStatus {
        /// Character whose turn it is.
        #[serde(default)]
        active_character_id: Option<CharacterId>,
        /// Operations in the order they happened.
        #[serde(default)]
        operations: Vec<Operation>,
        /// Snapshot after the operations.
        state: State,
        /// Whether the match ended.
        #[serde(default)]
        is_game_over: bool,
    },

    /// One of this client's characters must act.
    #[serde(rename_all = "camelCase")]
    RequestGameOperation {
        /// The character to act.
        character_id: CharacterId,
    },

    /// Final statistics and the winner.
    #[serde(rename_all = "camelCase")]
    Statistics {
        /// Statistics table.
        #[serde(default)]
        statistics: Statistics,
        /// Winning player.
        #[serde(default)]
        winner: Option<PlayerId>,
        /// How the match was decided.
        reason: VictoryEnum,
        /// Whether a replay can be requested.
        #[serde(default)]
        has_replay: bool,
    },

    /// A player left.
    #[serde(rename_all = "camelCase")]
    GameLeft {
        /// The player that left.
        left_user_id: PlayerId,
    },

    /// Match paused or resumed.
    #[serde(rename_all = "camelCase")]
    GamePause {
        /// Whether the match is now paused.
        game_paused: bool,
        /// Whether the server imposed the pause.
        #[serde(default)]
        server_enforced: bool,
    },

    /// Answer to a meta information request.
    #[serde(rename_all = "camelCase")]
    MetaInformation {
        /// Values by key.
        #[serde(default)]
        information: BTreeMap<MetaInformationKey, serde_json::Value>,
    },

    /// Penalty for a rule violation.
    #[serde(rename_all = "camelCase")]
    Strike {
        /// Strikes so far.
        strike_nr: u32,
        /// Strikes allowed.
        strike_max: u32,
        /// What was violated.
        #[serde(default)]
        reason: String,
    },

    /// Server-side failure.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Failure category.
        reason: ErrorTypeEnum,
    },

    /// Recorded match.
    Replay(ReplayInfo),
}

impl Message {
    /// Wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "HELLO",
            Self::Reconnect => "RECONNECT",
            Self::ItemChoice { .. } => "ITEM_CHOICE",
            Self::EquipmentChoice { .. } => "EQUIPMENT_CHOICE",
            Self::GameOperation { .. } => "GAME_OPERATION",
            Self::GameLeave => "GAME_LEAVE",
            Self::RequestGamePause { .. } => "REQUEST_GAME_PAUSE",
            Self::RequestMetaInformation { .. } => "REQUEST_META_INFORMATION",
            Self::RequestReplay => "REQUEST_REPLAY",
            Self::HelloReply { .. } => "HELLO_REPLY",
            Self::GameStarted { .. } => "GAME_STARTED",
            Self::RequestItemChoice { .. } => "REQUEST_ITEM_CHOICE",
            Self::RequestEquipmentChoice { .. } => "REQUEST_EQUIPMENT_CHOICE",
            Self::GameStatus { .. } => "GAME_STATUS",
            Self::RequestGameOperation { .. } => "REQUEST_GAME_OPERATION",
            Self::Statistics { .. } => "STATISTICS",
            Self::GameLeft { .. } => "GAME_LEFT",
            Self::GamePause { .. } => "GAME_PAUSE",
            Self::MetaInformation { .. } => "META_INFORMATION",
            Self::Strike { .. } => "STRIKE",
            Self::Error { .. } => "ERROR",
            Self::Replay(_) => "REPLAY",
        }
    }

    /// Builds the payload for an item pick.
    #[must_use]
    pub const fn item_choice(choice: ItemChoice) -> Self {
        match choice {
            ItemChoice::Character(id) => Self::ItemChoice {
                chosen_character: Some(id),
                chosen_gadget: None,
            },
            ItemChoice::Gadget(gadget) => Self::ItemChoice {
                chosen_character: None,
                chosen_gadget: Some(gadget),
            },
        }
    }
}

/// Envelope around every message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContainer {
    /// Sender or addressee, once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,

    /// Session the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    /// When the message was created.
    #[serde(default = "Utc::now")]
    pub creation_date: DateTime<Utc>,

    /// Free text for humans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_message: Option<String>,

    /// The payload.
    #[serde(flatten)]
    pub message: Message,
}

impl MessageContainer {
    /// Wraps `message` with no addressing.
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self {
            player_id: None,
            session_id: None,
            creation_date: Utc::now(),
            debug_message: None,
            message,
        }
    }

    /// Sets the player id.
    #[must_use]
    pub fn with_player_id(mut self, player_id: Option<PlayerId>) -> Self {
        self.player_id = player_id;
        self
    }

    /// Sets the session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Attaches a debug text.
    #[must_use]
    pub fn with_debug_message(mut self, debug_message: impl Into<String>) -> Self {
        self.debug_message = Some(debug_message.into());
        self
    }
}

/// Serialize a container to its wire form.
pub fn to_json(container: &MessageContainer) -> Result<String, TransportError> {
    serde_json::to_string(container).map_err(|e| TransportError::SerializationFailed {
        message: format!("serialize {}: {e}", container.message.kind()),
    })
}

/// Deserialize a container from its wire form.
pub fn from_json(raw: &str) -> Result<MessageContainer, ProtocolError> {
    serde_json::from_str::<MessageContainer>(raw).map_err(|e| ProtocolError::Undecodable {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_wire_shape() {
        let container = MessageContainer::new(Message::Hello {
            name: "ada".to_string(),
            role: RoleEnum::Player,
        });
        let json = to_json(&container).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "HELLO");
        assert_eq!(value["name"], "ada");
        assert_eq!(value["role"], "PLAYER");
        assert!(value.get("playerId").is_none());
    }

    #[test]
    fn test_decode_addressed_message() {
        let player = PlayerId::new();
        let character = CharacterId::new();
        let raw = format!(
            r#"{{"type":"REQUEST_GAME_OPERATION","playerId":"{player}","characterId":"{character}","debugMessage":"turn"}}"#
        );
        let container = from_json(&raw).unwrap();
        assert_eq!(container.player_id, Some(player));
        assert_eq!(container.debug_message.as_deref(), Some("turn"));
        assert_eq!(
            container.message,
            Message::RequestGameOperation {
                character_id: character
            }
        );
    }

    #[test]
    fn test_decode_unit_and_meta_messages() {
        let container = from_json(r#"{"type":"GAME_LEAVE"}"#).unwrap();
        assert_eq!(container.message, Message::GameLeave);

        let container = from_json(
            r#"{"type":"META_INFORMATION","information":{"Spectator.Count":3,"Faction.Neutral":[]}}"#,
        )
        .unwrap();
        let Message::MetaInformation { information } = container.message else {
            panic!("expected meta information");
        };
        assert_eq!(information[&MetaInformationKey::SpectatorCount], serde_json::json!(3));
        assert!(information.contains_key(&MetaInformationKey::FactionNeutral));
    }

    #[test]
    fn test_item_choice_payload() {
        let id = CharacterId::new();
        let json = to_json(&MessageContainer::new(Message::item_choice(ItemChoice::Character(id)))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "ITEM_CHOICE");
        assert_eq!(value["chosenCharacter"], id.to_string());
        assert!(value.get("chosenGadget").is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(from_json("not json"), Err(ProtocolError::Undecodable { .. })));
        assert!(matches!(
            from_json(r#"{"type":"NO_SUCH_MESSAGE"}"#),
            Err(ProtocolError::Undecodable { .. })
        ));
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let msg = Message::Strike {
            strike_nr: 1,
            strike_max: 3,
            reason: String::new(),
        };
        let json = serde_json::to_value(MessageContainer::new(msg.clone())).unwrap();
        assert_eq!(json["type"], msg.kind());
    }
}
