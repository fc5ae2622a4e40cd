//! Client-side model of the session and the running match.

use std::collections::{BTreeMap, HashMap};

use crate::belief::BeliefStore;
use crate::board::{Scenario, State};
use crate::character::CharacterInformation;
use crate::config::MatchConfig;
use crate::gadget::GadgetEnum;
use crate::id::{CharacterId, PlayerId, SessionId};
use crate::inference::Interpreter;
use crate::operation::Operation;
use crate::protocol::{
    EquipmentMap, ErrorTypeEnum, MetaInformationKey, ReplayInfo, RoleEnum, Statistics, VictoryEnum,
};

/// Who this client is and what the server last told it about the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    /// Player id assigned by the server.
    pub id: Option<PlayerId>,
    /// Name sent with the handshake.
    pub name: String,
    /// Role sent with the handshake.
    pub role: RoleEnum,
    /// Session assigned by the server.
    pub session_id: Option<SessionId>,

    /// Id of player one.
    pub player_one_id: Option<PlayerId>,
    /// Id of player two.
    pub player_two_id: Option<PlayerId>,
    /// Name of player one.
    pub player_one_name: String,
    /// Name of player two.
    pub player_two_name: String,

    /// Character whose turn the server last requested.
    pub active_character: Option<CharacterId>,
    /// Player that left the match, if any.
    pub left_user_id: Option<PlayerId>,

    /// Whether the game is paused.
    pub game_paused: bool,
    /// Whether the server paused the game itself.
    pub server_enforced: bool,

    /// Strikes received so far.
    pub strike_nr: u32,
    /// Strikes allowed before disqualification.
    pub strike_max: u32,
    /// Reason given with the last strike.
    pub strike_reason: String,

    /// Last error reported by the server.
    pub error_reason: Option<ErrorTypeEnum>,
    /// Meta information received so far.
    pub information: BTreeMap<MetaInformationKey, serde_json::Value>,
    /// Debug text of the last accepted message.
    pub debug_message: Option<String>,
}

impl ClientInfo {
    /// Whether this client plays as player one, once the match has started.
    ///
    /// `None` for spectators and before the player ids are known.
    #[must_use]
    pub fn am_i_player1(&self) -> Option<bool> {
        if self.role == RoleEnum::Spectator {
            return None;
        }
        let id = self.id?;
        if self.player_one_id == Some(id) {
            Some(true)
        } else if self.player_two_id == Some(id) {
            Some(false)
        } else {
            None
        }
    }
}

/// What the client knows about the match itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameInfo {
    /// Level layout.
    pub level: Scenario,
    /// Match rules.
    pub settings: MatchConfig,
    /// Every character of the match.
    pub character_settings: Vec<CharacterInformation>,

    /// Characters offered in the current item choice.
    pub offered_characters: Vec<CharacterId>,
    /// Gadgets offered in the current item choice.
    pub offered_gadgets: Vec<GadgetEnum>,
    /// Characters this client chose.
    pub chosen_characters: Vec<CharacterId>,
    /// Gadgets this client chose.
    pub chosen_gadgets: Vec<GadgetEnum>,
    /// Equipment sent by this client.
    pub equipment: EquipmentMap,

    /// Operations reported with the latest game status.
    pub operations: Vec<Operation>,
    /// Latest snapshot, enriched with everything the belief store knows.
    pub state: State,
    /// Whether the last status ended the match.
    pub is_game_over: bool,
    /// Character that acted last.
    pub last_active_character: Option<CharacterId>,

    /// Outcome of the latest operation by one of this client's characters.
    pub last_op_successful: Option<bool>,
    /// Latest observation result and the observed character.
    pub is_enemy: Option<(bool, CharacterId)>,

    /// Match statistics.
    pub statistics: Option<Statistics>,
    /// Winning player.
    pub winner: Option<PlayerId>,
    /// Why the winner won.
    pub winning_reason: Option<VictoryEnum>,
    /// Whether the server offers a replay.
    pub has_replay: bool,
    /// Replay, once received.
    pub replay: Option<ReplayInfo>,
}

impl GameInfo {
    /// Display names by character id.
    #[must_use]
    pub fn character_names(&self) -> HashMap<CharacterId, String> {
        self.character_settings
            .iter()
            .map(|c| (c.character_id, c.name.clone()))
            .collect()
    }

    /// Records the outcome of the latest own operation in `operations`.
    ///
    /// Both fields keep their previous value when none of the operations was
    /// performed by one of `mine`.
    pub fn record_own_outcome(&mut self, operations: &[Operation], belief: &BeliefStore, state: &State) {
        let own = operations
            .iter()
            .rev()
            .find(|op| op.character_id().is_some_and(|id| belief.is_mine(id)));
        let Some(op) = own else {
            return;
        };

        self.last_op_successful = Some(op.is_successful());
        if let Operation::PropertyAction {
            is_enemy: Some(is_enemy),
            target,
            ..
        } = op
        {
            if let Some(observed) = state.character_at(*target) {
                self.is_enemy = Some((*is_enemy, observed.character_id));
            }
        }
    }
}

/// Everything a session knows. Discarded as a whole on reset.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Identity and session facts.
    pub client: ClientInfo,
    /// Match facts.
    pub game: GameInfo,
    /// Inferred hidden facts.
    pub belief: BeliefStore,
    /// Turn state of the operation interpreter.
    pub interpreter: Interpreter,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears everything except the client's chosen name and role.
    pub fn reset(&mut self) {
        let name = std::mem::take(&mut self.client.name);
        let role = self.client.role;
        *self = Self::default();
        self.client.name = name;
        self.client.role = role;
    }
}
