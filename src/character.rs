//! Characters, factions and hidden properties.
//!
//! The server addresses factions absolutely (`PLAYER1`, `PLAYER2`, `NEUTRAL`),
//! while the belief store reasons relative to the local client (mine, enemy,
//! NPC). [`Faction`] bridges the two.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Point;
use crate::gadget::{Gadget, GadgetEnum};
use crate::id::CharacterId;

/// Faction as transmitted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactionEnum {
    /// First player's side.
    Player1,
    /// Second player's side.
    Player2,
    /// Server-controlled NPCs.
    Neutral,
    /// Unknown or not disclosed.
    Invalid,
}

impl FactionEnum {
    /// The other player's faction. `Neutral` and `Invalid` have no opponent.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
            Self::Neutral | Self::Invalid => Self::Invalid,
        }
    }

    /// Returns true for `Player1` and `Player2`.
    #[must_use]
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player1 | Self::Player2)
    }
}

impl Default for FactionEnum {
    fn default() -> Self {
        Self::Invalid
    }
}

/// Faction relative to the local client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// Agent controlled by this client.
    Mine,
    /// Agent controlled by the opponent.
    Enemy,
    /// Neutral character controlled by the server.
    Npc,
}

impl Faction {
    /// All factions, in a stable order.
    pub const ALL: [Self; 3] = [Self::Mine, Self::Enemy, Self::Npc];

    /// Maps a wire faction into the client's perspective.
    ///
    /// Returns `None` for `Invalid`, or when `me` is not a player faction and
    /// `faction` names a player.
    #[must_use]
    pub fn from_wire(faction: FactionEnum, me: FactionEnum) -> Option<Self> {
        match faction {
            FactionEnum::Neutral => Some(Self::Npc),
            FactionEnum::Invalid => None,
            _ if !me.is_player() => None,
            player if player == me => Some(Self::Mine),
            _ => Some(Self::Enemy),
        }
    }

    /// Maps this faction back onto the wire from the perspective of `me`.
    #[must_use]
    pub const fn to_wire(self, me: FactionEnum) -> FactionEnum {
        match self {
            Self::Mine => me,
            Self::Enemy => me.opponent(),
            Self::Npc => FactionEnum::Neutral,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mine => write!(f, "mine"),
            Self::Enemy => write!(f, "enemy"),
            Self::Npc => write!(f, "npc"),
        }
    }
}

/// Hidden character properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyEnum {
    /// Extra movement point.
    Nimbleness,
    /// One movement point less.
    Sluggishness,
    /// Cannot move more than one field.
    Ponderousness,
    /// Extra movement point while not sluggish.
    Spryness,
    /// Extra action point.
    Agility,
    /// Rerolls failed chance checks.
    LuckyDevil,
    /// Rerolls successful chance checks.
    Jinx,
    /// Wet, blocks some gadget effects until dried.
    ClammyClothes,
    /// Permanently wet.
    ConstantClammyClothes,
    /// Halves cocktail damage.
    RobustStomach,
    /// Halves received damage.
    Toughness,
    /// Better odds at seducing.
    BabeMagnet,
    /// May redirect an action to a bystander.
    HoneyTrap,
    /// Can destroy roulette tables.
    BangAndBurn,
    /// Can use wiretaps and cocktails on the opponent.
    FlapsAndSeals,
    /// Better odds when spying.
    Tradecraft,
    /// Can observe whether a character is an enemy.
    Observation,
}

/// Gender of a character, as delivered with the character settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderEnum {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Diverse.
    Diverse,
}

/// Static character description delivered with the handshake reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterInformation {
    /// Stable id of the character.
    pub character_id: CharacterId,
    /// Display name.
    pub name: String,

    /// Gender, if the server disclosed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<GenderEnum>,

    /// Properties the character starts with.
    #[serde(default)]
    pub features: BTreeSet<PropertyEnum>,
}

impl CharacterInformation {
    /// Creates a description with no gender or features.
    #[must_use]
    pub fn new(character_id: CharacterId, name: impl Into<String>) -> Self {
        Self {
            character_id,
            name: name.into(),
            gender: None,
            features: BTreeSet::new(),
        }
    }
}

/// A character as seen in a game status snapshot.
///
/// For characters of other factions the server leaves `faction` as `Invalid`
/// and omits hidden properties and gadgets; the belief store fills them in
/// during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Stable id of the character.
    pub character_id: CharacterId,
    /// Display name.
    pub name: String,

    /// Board position, absent while the character is off the board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Point>,

    /// Movement points left this turn.
    #[serde(default)]
    pub mp: u32,
    /// Action points left this turn.
    #[serde(default)]
    pub ap: u32,
    /// Health points.
    #[serde(default)]
    pub hp: u32,
    /// Intelligence points.
    #[serde(default)]
    pub ip: u32,
    /// Casino chips.
    #[serde(default)]
    pub chips: u32,

    /// Known properties.
    #[serde(default)]
    pub properties: BTreeSet<PropertyEnum>,

    /// Wire faction, `Invalid` when hidden.
    #[serde(default)]
    pub faction: FactionEnum,

    /// Gadgets carried, as far as known.
    #[serde(default)]
    pub gadgets: Vec<Gadget>,
}

impl Character {
    /// Creates a character with empty stats at `coordinates`.
    #[must_use]
    pub fn new(character_id: CharacterId, name: impl Into<String>, coordinates: Option<Point>) -> Self {
        Self {
            character_id,
            name: name.into(),
            coordinates,
            mp: 0,
            ap: 0,
            hp: 100,
            ip: 0,
            chips: 0,
            properties: BTreeSet::new(),
            faction: FactionEnum::Invalid,
            gadgets: Vec::new(),
        }
    }

    /// Returns the carried gadget of the given kind, if any.
    #[must_use]
    pub fn gadget(&self, kind: GadgetEnum) -> Option<&Gadget> {
        self.gadgets.iter().find(|g| g.gadget == kind)
    }

    /// Mutable variant of [`Character::gadget`].
    pub fn gadget_mut(&mut self, kind: GadgetEnum) -> Option<&mut Gadget> {
        self.gadgets.iter_mut().find(|g| g.gadget == kind)
    }

    /// Returns true if the character carries a gadget of the given kind.
    #[must_use]
    pub fn has_gadget(&self, kind: GadgetEnum) -> bool {
        self.gadget(kind).is_some()
    }
}
