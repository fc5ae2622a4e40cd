//! Outbound payload validation.
//!
//! Every request is validated against the client model before it is
//! serialized, so a request that fails here never reaches the transport.

use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::gadget::GadgetEnum;
use crate::id::CharacterId;
use crate::operation::Operation;
use crate::protocol::message::{EquipmentMap, ItemChoice, MetaInformationKey, RoleEnum};

/// Upper bound for the player name sent in the handshake.
pub const MAX_NAME_LEN: usize = 64;

/// Validate a non-empty trimmed string field.
fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    if v.len() > MAX_NAME_LEN {
        return Err(ValidationError::FieldTooLong {
            field: field.to_string(),
            max_length: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates the handshake name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    validate_non_empty("name", name)
}

/// Validates an item pick against the current offer.
pub fn validate_item_choice(
    choice: ItemChoice,
    offered_characters: &[CharacterId],
    offered_gadgets: &[GadgetEnum],
) -> Result<(), ValidationError> {
    match choice {
        ItemChoice::Character(id) if !offered_characters.contains(&id) => {
            Err(ValidationError::CharacterNotOffered { id })
        }
        ItemChoice::Gadget(gadget) if !offered_gadgets.contains(&gadget) => {
            Err(ValidationError::GadgetNotOffered { gadget })
        }
        _ => Ok(()),
    }
}

/// Validates an equipment assignment against the chosen items.
///
/// Every key must be a chosen character, every gadget a chosen gadget, and no
/// gadget may be handed to two characters.
pub fn validate_equipment(
    equipment: &EquipmentMap,
    chosen_characters: &[CharacterId],
    chosen_gadgets: &[GadgetEnum],
) -> Result<(), ValidationError> {
    let mut assigned = BTreeSet::new();
    for (id, gadgets) in equipment {
        if !chosen_characters.contains(id) {
            return Err(ValidationError::CharacterNotChosen { id: *id });
        }
        for gadget in gadgets {
            if !chosen_gadgets.contains(gadget) {
                return Err(ValidationError::GadgetNotChosen { gadget: *gadget });
            }
            if !assigned.insert(*gadget) {
                return Err(ValidationError::GadgetAssignedTwice { gadget: *gadget });
            }
        }
    }
    Ok(())
}

/// Validates an operation about to be requested for the active character.
pub fn validate_operation(operation: &Operation, active: Option<CharacterId>) -> Result<(), ValidationError> {
    if !operation.is_requestable() {
        return Err(ValidationError::OperationNotRequestable {
            kind: operation.kind().to_string(),
        });
    }
    let Some(actual) = operation.character_id() else {
        return Err(ValidationError::OperationNotRequestable {
            kind: operation.kind().to_string(),
        });
    };
    if active != Some(actual) {
        return Err(ValidationError::NotActiveCharacter {
            expected: active,
            actual,
        });
    }
    Ok(())
}

/// Validates meta information keys for a client of `role`.
///
/// `am_i_player1` is `None` until the match has started. Spectators may ask for
/// everything. Players never see the neutral faction or the opponent's
/// faction and gadgets, and see no faction or gadget key before they know
/// which side they are on.
pub fn validate_meta_keys(
    keys: &[MetaInformationKey],
    role: RoleEnum,
    am_i_player1: Option<bool>,
) -> Result<(), ValidationError> {
    if keys.is_empty() {
        return Err(ValidationError::MissingField {
            field: "keys".to_string(),
        });
    }
    if role == RoleEnum::Spectator {
        return Ok(());
    }

    for key in keys {
        use MetaInformationKey as K;
        let permitted = match key {
            K::SpectatorCount
            | K::SpectatorMembers
            | K::ConfigurationScenario
            | K::ConfigurationMatchConfig
            | K::ConfigurationCharacterInformation => true,
            K::FactionNeutral => false,
            K::FactionPlayer1 | K::GadgetsPlayer1 => am_i_player1 == Some(true),
            K::FactionPlayer2 | K::GadgetsPlayer2 => am_i_player1 == Some(false),
        };
        if !permitted {
            return Err(ValidationError::MetaKeyNotPermitted {
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Point;

    #[test]
    fn test_name_validation() {
        assert!(validate_name("ada").is_ok());
        assert!(matches!(
            validate_name("   "),
            Err(ValidationError::MissingField { .. })
        ));
        assert!(matches!(
            validate_name(&"x".repeat(MAX_NAME_LEN + 1)),
            Err(ValidationError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn test_item_choice_must_be_offered() {
        let offered = CharacterId::new();
        let chars = [offered];
        let gadgets = [GadgetEnum::Jetpack];

        assert!(validate_item_choice(ItemChoice::Character(offered), &chars, &gadgets).is_ok());
        assert!(validate_item_choice(ItemChoice::Gadget(GadgetEnum::Jetpack), &chars, &gadgets).is_ok());
        assert!(matches!(
            validate_item_choice(ItemChoice::Character(CharacterId::new()), &chars, &gadgets),
            Err(ValidationError::CharacterNotOffered { .. })
        ));
        assert_eq!(
            validate_item_choice(ItemChoice::Gadget(GadgetEnum::FogTin), &chars, &gadgets),
            Err(ValidationError::GadgetNotOffered {
                gadget: GadgetEnum::FogTin
            })
        );
    }

    #[test]
    fn test_equipment_rules() {
        let a = CharacterId::new();
        let b = CharacterId::new();
        let chars = [a, b];
        let gadgets = [GadgetEnum::Jetpack, GadgetEnum::Grapple];

        let mut equipment = EquipmentMap::new();
        equipment.insert(a, BTreeSet::from([GadgetEnum::Jetpack]));
        equipment.insert(b, BTreeSet::from([GadgetEnum::Grapple]));
        assert!(validate_equipment(&equipment, &chars, &gadgets).is_ok());

        equipment.insert(b, BTreeSet::from([GadgetEnum::Jetpack]));
        assert_eq!(
            validate_equipment(&equipment, &chars, &gadgets),
            Err(ValidationError::GadgetAssignedTwice {
                gadget: GadgetEnum::Jetpack
            })
        );

        let mut equipment = EquipmentMap::new();
        equipment.insert(a, BTreeSet::from([GadgetEnum::Nugget]));
        assert!(matches!(
            validate_equipment(&equipment, &chars, &gadgets),
            Err(ValidationError::GadgetNotChosen { .. })
        ));

        let stranger = CharacterId::new();
        let mut equipment = EquipmentMap::new();
        equipment.insert(stranger, BTreeSet::new());
        assert_eq!(
            validate_equipment(&equipment, &chars, &gadgets),
            Err(ValidationError::CharacterNotChosen { id: stranger })
        );
    }

    #[test]
    fn test_operation_must_name_active_character() {
        let active = CharacterId::new();
        let op = Operation::Retire {
            character_id: active,
            successful: true,
            target: Point::new(0, 0),
        };
        assert!(validate_operation(&op, Some(active)).is_ok());
        assert!(matches!(
            validate_operation(&op, None),
            Err(ValidationError::NotActiveCharacter { expected: None, .. })
        ));

        let cat = Operation::CatAction {
            target: Point::new(1, 1),
        };
        assert!(matches!(
            validate_operation(&cat, Some(active)),
            Err(ValidationError::OperationNotRequestable { .. })
        ));
    }

    #[test]
    fn test_meta_key_permissions() {
        use MetaInformationKey as K;
        assert!(validate_meta_keys(&[], RoleEnum::Spectator, None).is_err());
        assert!(validate_meta_keys(&[K::FactionNeutral], RoleEnum::Spectator, None).is_ok());

        let p = RoleEnum::Player;
        assert!(validate_meta_keys(&[K::SpectatorCount], p, None).is_ok());
        assert!(validate_meta_keys(&[K::FactionNeutral], p, Some(true)).is_err());
        assert!(validate_meta_keys(&[K::FactionPlayer1, K::GadgetsPlayer1], p, Some(true)).is_ok());
        assert!(validate_meta_keys(&[K::GadgetsPlayer2], p, Some(true)).is_err());
        assert!(validate_meta_keys(&[K::FactionPlayer2], RoleEnum::Ai, Some(false)).is_ok());
        assert!(validate_meta_keys(&[K::FactionPlayer1], p, None).is_err());
    }
}
