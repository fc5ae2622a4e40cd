//! The client session.
//!
//! A [`Session`] owns the protocol state, the client model and the outbound
//! transport. Requests are gated by state and role and validated before
//! anything is sent. Inbound frames are decoded, checked against the
//! addressing fields and the transition table, applied to the model, and
//! answered with exactly one [`Notification`].

use tracing::{debug, info, warn};

use crate::belief::{BeliefStore, ItemDestination};
use crate::board::{Point, State};
use crate::callback::{Callback, Notification};
use crate::character::{Faction, FactionEnum};
use crate::config::SessionConfig;
use crate::error::{ClientResult, ProtocolError, TransportError, ValidationError};
use crate::gadget::GadgetEnum;
use crate::id::{CharacterId, PlayerId, SessionId};
use crate::inference::InterpretCtx;
use crate::model::{ClientInfo, GameInfo, Model};
use crate::operation::Operation;
use crate::protocol::message::{
    self, EquipmentMap, ItemChoice, Message, MessageContainer, MetaInformationKey, RoleEnum,
};
use crate::protocol::state::{next_state, ProtocolState, RequestKind};
use crate::protocol::validation;
use crate::transport::{Endpoint, Transport};

/// One client connection to a game server.
pub struct Session<C: Callback> {
    transport: Option<Box<dyn Transport>>,
    endpoint: Option<Endpoint>,
    state: ProtocolState,
    before_pause: Option<ProtocolState>,
    model: Model,
    config: SessionConfig,
    callback: C,
}

impl<C: Callback> Session<C> {
    /// Creates a disconnected session with default settings.
    #[must_use]
    pub fn new(callback: C) -> Self {
        Self::with_config(callback, SessionConfig::default())
    }

    /// Creates a disconnected session with explicit settings.
    #[must_use]
    pub fn with_config(callback: C, config: SessionConfig) -> Self {
        Self {
            transport: None,
            endpoint: None,
            state: ProtocolState::NotConnected,
            before_pause: None,
            model: Model::new(),
            config,
            callback,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current protocol state.
    #[must_use]
    pub const fn state(&self) -> ProtocolState {
        self.state
    }

    /// Everything the session knows.
    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Identity and session facts.
    #[must_use]
    pub const fn client(&self) -> &ClientInfo {
        &self.model.client
    }

    /// Match facts, including the reconciled snapshot.
    #[must_use]
    pub const fn game(&self) -> &GameInfo {
        &self.model.game
    }

    /// Inferred hidden facts.
    #[must_use]
    pub const fn belief(&self) -> &BeliefStore {
        &self.model.belief
    }

    /// Endpoint of the current or last connection.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Settings the session was created with.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The notification sink.
    #[must_use]
    pub const fn callback(&self) -> &C {
        &self.callback
    }

    /// Mutable access to the notification sink.
    pub fn callback_mut(&mut self) -> &mut C {
        &mut self.callback
    }

    /// Returns true while a transport is attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether this client plays as player one. `None` for spectators and
    /// before the match has started.
    #[must_use]
    pub fn am_i_player1(&self) -> Option<bool> {
        self.model.client.am_i_player1()
    }

    /// The wire faction this client reasons from.
    ///
    /// Spectators take player one's perspective. Players get `Invalid` until
    /// they know their side.
    #[must_use]
    pub fn my_faction(&self) -> FactionEnum {
        if self.model.client.role == RoleEnum::Spectator {
            return FactionEnum::Player1;
        }
        match self.am_i_player1() {
            Some(true) => FactionEnum::Player1,
            Some(false) => FactionEnum::Player2,
            None => FactionEnum::Invalid,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Probability that `id` belongs to the wire `faction`, from this client's perspective.
    ///
    /// `None` when nothing is known about the character.
    #[must_use]
    pub fn query_faction_probability(&self, id: CharacterId, faction: FactionEnum) -> Option<f64> {
        self.model
            .belief
            .query_faction_probability(id, faction, self.my_faction())
    }

    /// Probability that `id` carries `gadget`.
    #[must_use]
    pub fn query_item_probability(&self, id: CharacterId, gadget: GadgetEnum) -> Option<f64> {
        self.model.belief.query_item_probability(id, gadget)
    }

    /// Safe index of the safe at `p` in the latest snapshot.
    #[must_use]
    pub fn safe_pos_to_index(&self, p: Point) -> Option<u32> {
        BeliefStore::safe_pos_to_index(&self.model.game.state, p)
    }

    /// Human-readable line for an operation, using character names.
    #[must_use]
    pub fn describe_operation(&self, operation: &Operation) -> String {
        operation.describe(&self.model.game.character_names())
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Attaches a transport to `endpoint`.
    ///
    /// Connecting to a different endpoint discards the model. Reconnecting to
    /// the same endpoint from `Reconnecting` keeps it, so a `Reconnect`
    /// request can follow.
    pub fn connect(&mut self, endpoint: Endpoint, transport: impl Transport + 'static) -> ClientResult<()> {
        self.require(RequestKind::Connect)?;

        let same_endpoint = self.endpoint.as_ref() == Some(&endpoint);
        if let Some(mut old) = self.transport.take() {
            old.close();
        }
        if !same_endpoint {
            self.model.reset();
            self.before_pause = None;
        }

        let next = if same_endpoint && self.state == ProtocolState::Reconnecting {
            ProtocolState::Reconnecting
        } else {
            ProtocolState::Connected
        };
        info!(%endpoint, reset = !same_endpoint, "connected");
        self.transport = Some(Box::new(transport));
        self.endpoint = Some(endpoint);
        self.transition(next);
        Ok(())
    }

    /// Closes the transport and discards the model.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        info!(state = %self.state, "disconnected");
        self.reset();
    }

    /// Reports that the driver lost the connection.
    ///
    /// A player in the middle of a match, or already reconnecting to one,
    /// moves to `Reconnecting` and keeps its model. Every other session is
    /// reset.
    pub fn on_connection_lost(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }

        let recoverable = (self.state.is_mid_match() || self.state == ProtocolState::Reconnecting)
            && self.model.client.id.is_some()
            && self.model.client.role != RoleEnum::Spectator;
        if recoverable {
            warn!(state = %self.state, "connection lost, awaiting reconnect");
            self.transition(ProtocolState::Reconnecting);
        } else {
            warn!(state = %self.state, "connection lost, session reset");
            self.reset();
        }
        self.callback.notify(Notification::ConnectionLost);
    }

    /// Rejoins a match after the client process restarted.
    ///
    /// Seeds the identity the server assigned before the crash and sends a
    /// `Reconnect` request.
    pub fn reconnect_after_crash(
        &mut self,
        endpoint: Endpoint,
        transport: impl Transport + 'static,
        player_id: PlayerId,
        session_id: SessionId,
        role: RoleEnum,
    ) -> ClientResult<()> {
        self.require(RequestKind::Connect)?;
        if role == RoleEnum::Spectator {
            return Err(ProtocolError::RoleNotPermitted {
                request: RequestKind::Reconnect,
                role,
            }
            .into());
        }

        self.connect(endpoint, transport)?;
        self.model.client.id = Some(player_id);
        self.model.client.session_id = Some(session_id);
        self.model.client.role = role;
        self.transition(ProtocolState::Reconnecting);
        self.send_reconnect()
    }

    /// Sets the name sent with the next handshake.
    ///
    /// # Errors
    ///
    /// Fails after the handshake, or when `name` is empty or too long.
    pub fn set_name(&mut self, name: impl Into<String>) -> ClientResult<()> {
        self.require(RequestKind::SetIdentity)?;
        let name = name.into();
        validation::validate_name(&name)?;
        self.model.client.name = name;
        Ok(())
    }

    /// Sets the role sent with the next handshake.
    pub fn set_role(&mut self, role: RoleEnum) -> ClientResult<()> {
        self.require(RequestKind::SetIdentity)?;
        self.model.client.role = role;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Sends the handshake and moves to `SentHello`.
    ///
    /// # Errors
    ///
    /// Fails unless connected and not yet welcomed, or when `name` is invalid.
    pub fn send_hello(&mut self, name: impl Into<String>, role: RoleEnum) -> ClientResult<()> {
        self.require(RequestKind::Hello)?;
        let name = name.into();
        validation::validate_name(&name)?;

        self.send(Message::Hello {
            name: name.clone(),
            role,
        })?;
        self.model.client.name = name;
        self.model.client.role = role;
        self.transition(ProtocolState::SentHello);
        Ok(())
    }

    /// Asks the server to rejoin the match this client was playing.
    ///
    /// # Errors
    ///
    /// Fails outside `Reconnecting`, for spectators, or when the player or session id is unknown.
    pub fn send_reconnect(&mut self) -> ClientResult<()> {
        self.require(RequestKind::Reconnect)?;
        if self.model.client.id.is_none() || self.model.client.session_id.is_none() {
            return Err(ProtocolError::IdentityUnknown.into());
        }
        self.send(Message::Reconnect)
    }

    /// Picks one offered character or gadget. The offers are cleared once sent.
    pub fn send_item_choice(&mut self, choice: ItemChoice) -> ClientResult<()> {
        self.require(RequestKind::ItemChoice)?;
        let game = &self.model.game;
        validation::validate_item_choice(choice, &game.offered_characters, &game.offered_gadgets)?;

        self.send(Message::item_choice(choice))?;
        self.model.game.offered_characters.clear();
        self.model.game.offered_gadgets.clear();
        Ok(())
    }

    /// Sends the equipment assignment and records the own team.
    ///
    /// All chosen characters become certainly mine, every assigned gadget is
    /// owned by its character, and the team is marked complete.
    pub fn send_equipment_choice(&mut self, equipment: EquipmentMap) -> ClientResult<()> {
        self.require(RequestKind::EquipmentChoice)?;
        let game = &self.model.game;
        validation::validate_equipment(&equipment, &game.chosen_characters, &game.chosen_gadgets)?;

        self.send(Message::EquipmentChoice {
            equipment: equipment.clone(),
        })?;
        self.record_equipment(equipment);
        Ok(())
    }

    /// Sends an operation for the active character and yields the turn.
    pub fn send_game_operation(&mut self, operation: Operation) -> ClientResult<()> {
        self.require(RequestKind::GameOperation)?;
        validation::validate_operation(&operation, self.model.client.active_character)?;

        self.send(Message::GameOperation { operation })?;
        self.transition(ProtocolState::InMatch);
        Ok(())
    }

    /// Leaves the match.
    pub fn send_game_leave(&mut self) -> ClientResult<()> {
        self.require(RequestKind::GameLeave)?;
        self.send(Message::GameLeave)
    }

    /// Requests pausing (`true`) or resuming (`false`) the match.
    pub fn send_request_game_pause(&mut self, game_pause: bool) -> ClientResult<()> {
        self.require(RequestKind::RequestGamePause)?;
        let permitted = if game_pause {
            matches!(self.state, ProtocolState::InMatch | ProtocolState::MatchActive)
        } else {
            self.state == ProtocolState::Paused
        };
        if !permitted {
            return Err(ProtocolError::StateNotPermitted {
                request: RequestKind::RequestGamePause,
                state: self.state,
            }
            .into());
        }
        if !game_pause && self.model.client.server_enforced {
            return Err(ValidationError::PauseServerEnforced.into());
        }
        self.send(Message::RequestGamePause { game_pause })
    }

    /// Requests meta information. Players are limited to keys about their own side and the match.
    pub fn send_request_meta_information(&mut self, keys: Vec<MetaInformationKey>) -> ClientResult<()> {
        self.require(RequestKind::RequestMetaInformation)?;
        validation::validate_meta_keys(&keys, self.model.client.role, self.am_i_player1())?;
        self.send(Message::RequestMetaInformation { keys })
    }

    /// Requests the replay announced with the statistics.
    pub fn send_request_replay(&mut self) -> ClientResult<()> {
        self.require(RequestKind::RequestReplay)?;
        if !self.model.game.has_replay {
            return Err(ValidationError::ReplayUnavailable.into());
        }
        self.send(Message::RequestReplay)
    }

    /// Declares a character's faction from outside knowledge.
    ///
    /// Players may assign the opponent's faction or the neutral one, never
    /// their own. Spectators may assign any faction.
    pub fn set_faction(&mut self, id: CharacterId, faction: FactionEnum) -> ClientResult<()> {
        let me = self.my_faction();
        if faction == FactionEnum::Invalid {
            return Err(ValidationError::FactionNotAssignable { faction }.into());
        }
        if self.model.client.role != RoleEnum::Spectator {
            if me == FactionEnum::Invalid {
                return Err(ProtocolError::IdentityUnknown.into());
            }
            if faction == me {
                return Err(ValidationError::FactionNotAssignable { faction }.into());
            }
        }
        let relative =
            Faction::from_wire(faction, me).ok_or(ValidationError::FactionNotAssignable { faction })?;
        self.model.belief.resolve_faction(id, relative)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Processes one inbound frame.
    ///
    /// Accepted messages update the model, advance the state and deliver
    /// their notification. Rejected ones leave everything untouched and
    /// deliver [`Notification::WrongDestination`].
    pub fn on_receive(&mut self, raw: &str) {
        match self.accept(raw) {
            Ok(notification) => self.callback.notify(notification),
            Err(err) => {
                warn!(state = %self.state, error = %err, "inbound message rejected");
                self.callback.notify(Notification::WrongDestination {
                    reason: err.to_string(),
                });
            }
        }
    }

    fn accept(&mut self, raw: &str) -> Result<Notification, ProtocolError> {
        let container = message::from_json(raw)?;
        self.check_addressing(&container)?;

        let kind = container.message.kind();
        let next = next_state(
            self.state,
            &container.message,
            self.model.client.role,
            self.before_pause,
        )
        .ok_or_else(|| ProtocolError::UnexpectedInState {
            message: kind.to_string(),
            state: self.state,
        })?;

        if matches!(container.message, Message::HelloReply { .. })
            && (container.player_id.is_none() || container.session_id.is_none())
        {
            return Err(ProtocolError::Undecodable {
                reason: format!("{kind} without playerId or sessionId"),
            });
        }

        let MessageContainer {
            player_id,
            session_id,
            debug_message,
            message,
            ..
        } = container;
        let notification = self.apply(message, player_id, session_id)?;
        self.model.client.debug_message = debug_message;
        debug!(message = kind, "inbound message applied");
        self.transition(next);
        Ok(notification)
    }

    fn check_addressing(&self, container: &MessageContainer) -> Result<(), ProtocolError> {
        if let (Some(expected), Some(actual)) = (self.model.client.id, container.player_id) {
            if expected != actual {
                return Err(ProtocolError::WrongPlayer { expected, actual });
            }
        }
        if let (Some(expected), Some(actual)) = (self.model.client.session_id, container.session_id) {
            if expected != actual {
                return Err(ProtocolError::WrongSession { expected, actual });
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        message: Message,
        player_id: Option<PlayerId>,
        session_id: Option<SessionId>,
    ) -> Result<Notification, ProtocolError> {
        let notification = match message {
            Message::HelloReply {
                level,
                settings,
                character_settings,
            } => {
                if let Err(err) = settings.validate() {
                    warn!(error = %err, "server settings out of range");
                }
                info!(
                    player = ?player_id,
                    session = ?session_id,
                    characters = character_settings.len(),
                    "handshake acknowledged"
                );
                self.model.client.id = player_id;
                self.model.client.session_id = session_id;
                self.model.belief = BeliefStore::seeded(&character_settings);
                self.model.interpreter.reset();

                let game = &mut self.model.game;
                game.level = level;
                game.settings = settings;
                game.character_settings = character_settings;
                Notification::HelloReply
            }
            Message::GameStarted {
                player_one_id,
                player_two_id,
                player_one_name,
                player_two_name,
            } => {
                let client = &mut self.model.client;
                client.player_one_id = player_one_id;
                client.player_two_id = player_two_id;
                client.player_one_name = player_one_name;
                client.player_two_name = player_two_name;
                Notification::GameStarted
            }
            Message::RequestItemChoice {
                offered_character_ids,
                offered_gadgets,
            } => {
                self.model.game.offered_characters = offered_character_ids;
                self.model.game.offered_gadgets = offered_gadgets;
                Notification::RequestItemChoice
            }
            Message::RequestEquipmentChoice {
                chosen_character_ids,
                chosen_gadgets,
            } => {
                let game = &mut self.model.game;
                game.chosen_characters = chosen_character_ids;
                game.chosen_gadgets = chosen_gadgets;
                game.offered_characters.clear();
                game.offered_gadgets.clear();
                Notification::RequestEquipmentChoice
            }
            Message::GameStatus {
                active_character_id,
                operations,
                state,
                is_game_over,
            } => {
                self.absorb_status(active_character_id, operations, state, is_game_over);
                Notification::GameStatus
            }
            Message::RequestGameOperation { character_id } => {
                self.model.client.active_character = Some(character_id);
                Notification::RequestGameOperation
            }
            Message::Statistics {
                statistics,
                winner,
                reason,
                has_replay,
            } => {
                info!(winner = ?winner, reason = ?reason, has_replay, "match decided");
                let game = &mut self.model.game;
                game.statistics = Some(statistics);
                game.winner = winner;
                game.winning_reason = Some(reason);
                game.has_replay = has_replay;
                game.is_game_over = true;
                Notification::Statistics
            }
            Message::GameLeft { left_user_id } => {
                self.model.client.left_user_id = Some(left_user_id);
                Notification::GameLeft
            }
            Message::GamePause {
                game_paused,
                server_enforced,
            } => {
                self.model.client.game_paused = game_paused;
                self.model.client.server_enforced = server_enforced;
                Notification::GamePause
            }
            Message::MetaInformation { information } => {
                let me = self.my_faction();
                for (key, value) in &information {
                    self.absorb_faction_key(*key, value, me);
                }
                self.model.client.information.extend(information);
                Notification::MetaInformation
            }
            Message::Strike {
                strike_nr,
                strike_max,
                reason,
            } => {
                warn!(strike_nr, strike_max, %reason, "strike received");
                let client = &mut self.model.client;
                client.strike_nr = strike_nr;
                client.strike_max = strike_max;
                client.strike_reason = reason;
                Notification::Strike
            }
            Message::Error { reason } => {
                warn!(reason = ?reason, "server reported an error");
                self.model.client.error_reason = Some(reason);
                Notification::Error
            }
            Message::Replay(replay) => {
                self.model.game.replay = Some(replay);
                Notification::Replay
            }
            outbound @ (Message::Hello { .. }
            | Message::Reconnect
            | Message::ItemChoice { .. }
            | Message::EquipmentChoice { .. }
            | Message::GameOperation { .. }
            | Message::GameLeave
            | Message::RequestGamePause { .. }
            | Message::RequestMetaInformation { .. }
            | Message::RequestReplay) => {
                return Err(ProtocolError::UnexpectedInState {
                    message: outbound.kind().to_string(),
                    state: self.state,
                });
            }
        };
        Ok(notification)
    }

    /// Interprets a status update and stores the enriched snapshot.
    fn absorb_status(
        &mut self,
        active_character: Option<CharacterId>,
        operations: Vec<Operation>,
        state: State,
        is_game_over: bool,
    ) {
        let me = self.my_faction();
        let Model {
            game,
            belief,
            interpreter,
            ..
        } = &mut self.model;

        let ctx = InterpretCtx {
            previous: &game.state,
            current: &state,
            config: &game.settings,
            weights: &self.config.inference,
        };
        interpreter.apply(belief, &ctx, &operations);
        belief.observe(&state, me);
        game.record_own_outcome(&operations, belief, &state);

        let mut enriched = state;
        let before = enriched.fingerprint();
        belief.reconcile(&mut enriched, me);
        debug!(
            round = enriched.current_round,
            operations = operations.len(),
            enriched = before != enriched.fingerprint(),
            "game status absorbed"
        );

        game.state = enriched;
        game.operations = operations;
        game.is_game_over = is_game_over;
        game.last_active_character = active_character;
    }

    /// Applies a disclosed faction list to the belief store.
    fn absorb_faction_key(&mut self, key: MetaInformationKey, value: &serde_json::Value, me: FactionEnum) {
        let wire = match key {
            MetaInformationKey::FactionPlayer1 => FactionEnum::Player1,
            MetaInformationKey::FactionPlayer2 => FactionEnum::Player2,
            MetaInformationKey::FactionNeutral => FactionEnum::Neutral,
            _ => return,
        };
        let Some(faction) = Faction::from_wire(wire, me) else {
            return;
        };
        let ids: Vec<CharacterId> = match serde_json::from_value(value.clone()) {
            Ok(ids) => ids,
            Err(err) => {
                debug!(%key, error = %err, "faction list not decodable");
                return;
            }
        };

        let belief = &mut self.model.belief;
        for id in ids {
            if let Err(err) = belief.resolve_faction(id, faction) {
                debug!(%key, error = %err, "disclosed faction not applied");
            }
        }
        if faction == Faction::Mine {
            belief.mark_team_complete();
        }
    }

    fn record_equipment(&mut self, equipment: EquipmentMap) {
        let Model { game, belief, .. } = &mut self.model;
        for id in &game.chosen_characters {
            if let Err(err) = belief.resolve_faction(*id, Faction::Mine) {
                debug!(error = %err, "chosen character not recorded");
            }
        }
        for (id, gadgets) in &equipment {
            for gadget in gadgets.iter().filter(|g| g.is_tracked()) {
                if let Err(err) = belief.move_item(*gadget, ItemDestination::Character(*id)) {
                    debug!(error = %err, "equipped gadget not recorded");
                }
            }
        }
        belief.mark_team_complete();
        game.equipment = equipment;
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require(&self, request: RequestKind) -> Result<(), ProtocolError> {
        if !request.permits(self.state) {
            debug!(%request, state = %self.state, "request refused in state");
            return Err(ProtocolError::StateNotPermitted {
                request,
                state: self.state,
            });
        }
        let role = self.model.client.role;
        if request.requires_player() && role == RoleEnum::Spectator {
            debug!(%request, %role, "request refused for role");
            return Err(ProtocolError::RoleNotPermitted { request, role });
        }
        Ok(())
    }

    fn send(&mut self, message: Message) -> ClientResult<()> {
        let container = MessageContainer::new(message)
            .with_player_id(self.model.client.id)
            .with_session_id(self.model.client.session_id);
        let raw = message::to_json(&container)?;
        let transport = self.transport.as_mut().ok_or(TransportError::NotConnected)?;
        transport.send(&raw)?;
        debug!(message = container.message.kind(), state = %self.state, "request sent");
        Ok(())
    }

    fn transition(&mut self, next: ProtocolState) {
        if next == self.state {
            return;
        }
        if next == ProtocolState::Paused {
            self.before_pause = Some(self.state);
        } else if self.state == ProtocolState::Paused {
            self.before_pause = None;
        }
        info!(from = %self.state, to = %next, "protocol state changed");
        self.state = next;
    }

    fn reset(&mut self) {
        self.model.reset();
        self.endpoint = None;
        self.before_pause = None;
        self.transition(ProtocolState::NotConnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;
    use crossbeam_channel::Receiver;

    fn connected(role: RoleEnum) -> (Session<Vec<Notification>>, Receiver<String>) {
        let mut session = Session::new(Vec::new());
        let (transport, rx) = ChannelTransport::pair();
        session.connect(Endpoint::new("localhost", 7007), transport).unwrap();
        session.set_role(role).unwrap();
        (session, rx)
    }

    fn frame(value: &serde_json::Value) -> String {
        value.to_string()
    }

    #[test]
    fn test_hello_requires_connection() {
        let mut session = Session::new(Vec::new());
        let err = session.send_hello("ada", RoleEnum::Player).unwrap_err();
        assert!(err.is_protocol());
        assert_eq!(session.state(), ProtocolState::NotConnected);
    }

    #[test]
    fn test_hello_validates_name() {
        let (mut session, rx) = connected(RoleEnum::Player);
        assert!(session.send_hello("  ", RoleEnum::Player).unwrap_err().is_validation());
        assert!(rx.try_recv().is_err());
        assert_eq!(session.state(), ProtocolState::Connected);

        session.send_hello("ada", RoleEnum::Player).unwrap();
        assert_eq!(session.state(), ProtocolState::SentHello);
        let sent: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(sent["type"], "HELLO");
        assert_eq!(session.client().name, "ada");
    }

    #[test]
    fn test_hello_reply_without_identity_is_rejected() {
        let (mut session, _rx) = connected(RoleEnum::Player);
        session.send_hello("ada", RoleEnum::Player).unwrap();
        session.on_receive(&frame(&serde_json::json!({ "type": "HELLO_REPLY" })));
        assert_eq!(session.state(), ProtocolState::SentHello);
        assert!(matches!(
            session.callback().last(),
            Some(Notification::WrongDestination { .. })
        ));
    }

    #[test]
    fn test_set_identity_only_before_handshake() {
        let (mut session, _rx) = connected(RoleEnum::Player);
        session.set_name("bob").unwrap();
        session.send_hello("ada", RoleEnum::Ai).unwrap();
        assert!(session.set_role(RoleEnum::Spectator).unwrap_err().is_protocol());
        assert_eq!(session.client().role, RoleEnum::Ai);
    }

    #[test]
    fn test_connect_to_other_endpoint_resets_model() {
        let (mut session, _rx) = connected(RoleEnum::Player);
        session.model.client.id = Some(PlayerId::new());

        let (transport, _rx2) = ChannelTransport::pair();
        session.connect(Endpoint::new("localhost", 7007), transport).unwrap();
        assert!(session.client().id.is_some());

        let (transport, _rx3) = ChannelTransport::pair();
        session.connect(Endpoint::new("example.org", 7007), transport).unwrap();
        assert!(session.client().id.is_none());
        assert_eq!(session.state(), ProtocolState::Connected);
    }

    #[test]
    fn test_disconnect_resets_everything() {
        let (mut session, _rx) = connected(RoleEnum::Player);
        session.send_hello("ada", RoleEnum::Player).unwrap();
        session.disconnect();
        assert_eq!(session.state(), ProtocolState::NotConnected);
        assert!(!session.is_connected());
        assert!(session.endpoint().is_none());
        assert!(session.send_game_leave().unwrap_err().is_protocol());
    }

    #[test]
    fn test_set_faction_rules() {
        let (mut session, _rx) = connected(RoleEnum::Player);
        let id = CharacterId::new();
        assert!(session.set_faction(id, FactionEnum::Player2).unwrap_err().is_protocol());
        assert!(session.set_faction(id, FactionEnum::Invalid).unwrap_err().is_validation());

        session.set_role(RoleEnum::Spectator).unwrap();
        // untracked characters are a belief error
        assert!(session.set_faction(id, FactionEnum::Neutral).unwrap_err().is_belief());
    }
}
