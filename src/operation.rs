//! Game operations reported by the server.
//!
//! Operations form a closed set. Consumers match on [`Operation`]
//! exhaustively, so adding a kind is a compile error everywhere it is not yet
//! handled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::Point;
use crate::character::PropertyEnum;
use crate::gadget::GadgetEnum;
use crate::id::CharacterId;

/// One operation, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// A character used a gadget.
    #[serde(rename_all = "camelCase")]
    GadgetAction {
        /// Acting character.
        character_id: CharacterId,
        /// Whether the action succeeded.
        successful: bool,
        /// Target field.
        target: Point,
        /// The gadget used.
        gadget: GadgetEnum,
    },

    /// A character spied on a person or a safe.
    #[serde(rename_all = "camelCase")]
    SpyAction {
        /// Acting character.
        character_id: CharacterId,
        /// Whether a secret or the safe was obtained.
        successful: bool,
        /// Spied field.
        target: Point,
    },

    /// A character bet chips at a roulette table.
    #[serde(rename_all = "camelCase")]
    GambleAction {
        /// Acting character.
        character_id: CharacterId,
        /// Whether the bet won.
        successful: bool,
        /// Roulette table.
        target: Point,
        /// Chips at stake.
        stake: u32,
    },

    /// A character used one of its properties.
    #[serde(rename_all = "camelCase")]
    PropertyAction {
        /// Acting character.
        character_id: CharacterId,
        /// Whether the action succeeded.
        successful: bool,
        /// Target field.
        target: Point,
        /// The property used.
        used_property: PropertyEnum,
        /// Observation result, when the server discloses it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_enemy: Option<bool>,
    },

    /// A character moved one field.
    #[serde(rename_all = "camelCase")]
    Movement {
        /// Moving character.
        character_id: CharacterId,
        /// Whether the move happened.
        successful: bool,
        /// Destination field.
        target: Point,
        /// Origin field.
        from: Point,
    },

    /// A character at zero health was carried off the board.
    #[serde(rename_all = "camelCase")]
    Exfiltration {
        /// Removed character.
        character_id: CharacterId,
        /// Always true in practice.
        successful: bool,
        /// Field the character is moved to.
        target: Point,
        /// Field the character left.
        from: Point,
    },

    /// A character ended its turn early.
    #[serde(rename_all = "camelCase")]
    Retire {
        /// Retiring character.
        character_id: CharacterId,
        /// Always true in practice.
        successful: bool,
        /// Position of the character.
        target: Point,
    },

    /// The white cat moved.
    CatAction {
        /// New position of the cat.
        target: Point,
    },

    /// The janitor moved and removed whoever stood there.
    JanitorAction {
        /// New position of the janitor.
        target: Point,
    },
}

impl Operation {
    /// The acting character, or `None` for cat and janitor moves.
    #[must_use]
    pub const fn character_id(&self) -> Option<CharacterId> {
        match self {
            Self::GadgetAction { character_id, .. }
            | Self::SpyAction { character_id, .. }
            | Self::GambleAction { character_id, .. }
            | Self::PropertyAction { character_id, .. }
            | Self::Movement { character_id, .. }
            | Self::Exfiltration { character_id, .. }
            | Self::Retire { character_id, .. } => Some(*character_id),
            Self::CatAction { .. } | Self::JanitorAction { .. } => None,
        }
    }

    /// Target field of the operation.
    #[must_use]
    pub const fn target(&self) -> Point {
        match self {
            Self::GadgetAction { target, .. }
            | Self::SpyAction { target, .. }
            | Self::GambleAction { target, .. }
            | Self::PropertyAction { target, .. }
            | Self::Movement { target, .. }
            | Self::Exfiltration { target, .. }
            | Self::Retire { target, .. }
            | Self::CatAction { target }
            | Self::JanitorAction { target } => *target,
        }
    }

    /// Whether the operation succeeded. Environment moves always succeed.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        match self {
            Self::GadgetAction { successful, .. }
            | Self::SpyAction { successful, .. }
            | Self::GambleAction { successful, .. }
            | Self::PropertyAction { successful, .. }
            | Self::Movement { successful, .. }
            | Self::Exfiltration { successful, .. }
            | Self::Retire { successful, .. } => *successful,
            Self::CatAction { .. } | Self::JanitorAction { .. } => true,
        }
    }

    /// Returns true for operations a character performs.
    #[must_use]
    pub const fn is_character_operation(&self) -> bool {
        self.character_id().is_some()
    }

    /// Returns true for operations a client may request in its turn.
    ///
    /// Exfiltration is performed by the server on a character's behalf.
    #[must_use]
    pub const fn is_requestable(&self) -> bool {
        !matches!(
            self,
            Self::Exfiltration { .. } | Self::CatAction { .. } | Self::JanitorAction { .. }
        )
    }

    /// Wire name of the operation kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::GadgetAction { .. } => "GADGET_ACTION",
            Self::SpyAction { .. } => "SPY_ACTION",
            Self::GambleAction { .. } => "GAMBLE_ACTION",
            Self::PropertyAction { .. } => "PROPERTY_ACTION",
            Self::Movement { .. } => "MOVEMENT",
            Self::Exfiltration { .. } => "EXFILTRATION",
            Self::Retire { .. } => "RETIRE",
            Self::CatAction { .. } => "CAT_ACTION",
            Self::JanitorAction { .. } => "JANITOR_ACTION",
        }
    }

    /// Renders a one-line description for logs and UIs.
    ///
    /// `names` maps character ids to display names; unknown actors are shown
    /// by id.
    #[must_use]
    pub fn describe(&self, names: &HashMap<CharacterId, String>) -> String {
        let actor = self.character_id().map(|id| {
            names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.to_string())
        });
        let actor = actor.unwrap_or_default();

        match self {
            Self::GadgetAction { gadget, target, .. } => {
                format!("Gadget op. {gadget} by {actor} on {target}")
            }
            Self::SpyAction { target, .. } => format!("Spy op. by {actor} on {target}"),
            Self::GambleAction { stake, target, .. } => {
                format!("Gamble op. by {actor}, bet {stake} chips on {target}")
            }
            Self::PropertyAction {
                used_property,
                target,
                ..
            } => {
                let property = format!("{used_property:?}").to_lowercase();
                format!("Property op. {property} by {actor} on {target}")
            }
            Self::Movement { from, target, .. } => {
                format!("Movement op. by {actor} from {from} to {target}")
            }
            Self::Exfiltration { from, target, .. } => {
                format!("{actor} was exfiltrated from {from} to {target}")
            }
            Self::Retire { target, .. } => format!("{actor} retired on {target}"),
            Self::CatAction { target } => format!("Cat op. on {target}"),
            Self::JanitorAction { target } => format!("Janitor op. on {target}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_wire_format() {
        let id = CharacterId::new();
        let json = format!(
            r#"{{"type":"GADGET_ACTION","characterId":"{id}","successful":true,"target":{{"x":2,"y":3}},"gadget":"GRAPPLE"}}"#
        );
        let op: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(
            op,
            Operation::GadgetAction {
                character_id: id,
                successful: true,
                target: Point::new(2, 3),
                gadget: GadgetEnum::Grapple,
            }
        );

        let cat: Operation = serde_json::from_str(r#"{"type":"CAT_ACTION","target":{"x":1,"y":1}}"#).unwrap();
        assert_eq!(cat.character_id(), None);
        assert!(cat.is_successful());
    }

    #[test]
    fn test_property_action_is_enemy_optional() {
        let id = CharacterId::new();
        let json = format!(
            r#"{{"type":"PROPERTY_ACTION","characterId":"{id}","successful":true,"target":{{"x":0,"y":0}},"usedProperty":"OBSERVATION","isEnemy":false}}"#
        );
        let op: Operation = serde_json::from_str(&json).unwrap();
        assert!(matches!(op, Operation::PropertyAction { is_enemy: Some(false), .. }));
    }

    #[test]
    fn test_requestable() {
        let id = CharacterId::new();
        let spy = Operation::SpyAction {
            character_id: id,
            successful: false,
            target: Point::new(1, 1),
        };
        assert!(spy.is_requestable());
        assert!(!Operation::JanitorAction { target: Point::new(0, 0) }.is_requestable());
        assert!(!Operation::Exfiltration {
            character_id: id,
            successful: true,
            target: Point::new(0, 0),
            from: Point::new(1, 0),
        }
        .is_requestable());
    }

    #[test]
    fn test_describe_uses_names() {
        let id = CharacterId::new();
        let names = HashMap::from([(id, "Ada".to_string())]);
        let op = Operation::Movement {
            character_id: id,
            successful: true,
            target: Point::new(2, 2),
            from: Point::new(1, 2),
        };
        assert_eq!(op.describe(&names), "Movement op. by Ada from x=1 y=2 to x=2 y=2");

        let stranger = Operation::Retire {
            character_id: CharacterId::nil(),
            successful: true,
            target: Point::new(0, 0),
        };
        assert!(stranger.describe(&names).starts_with("00000000-"));
    }
}
