//! Gadget kinds and carried gadget instances.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every gadget kind in the game.
///
/// Apart from cocktails, each kind exists at most once per match, so the
/// belief store keys its item records directly on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GadgetEnum {
    /// Dries clammy clothes.
    Hairdryer,
    /// Thrown detection device.
    Moledie,
    /// Inverts a roulette table.
    TechnicolourPrism,
    /// Thrown hat, deflected by the magnetic watch.
    BowlerBlade,
    /// Protects against the bowler blade.
    MagneticWatch,
    /// Poisons a cocktail.
    PoisonPills,
    /// Destroys a cocktail at range.
    LaserCompact,
    /// Rocket fired at a wall or character.
    RocketPen,
    /// Knocks out an adjacent character.
    GasGloss,
    /// Multi-use ranged attack.
    MothballPouch,
    /// Covers fields in fog.
    FogTin,
    /// Pulls a gadget to its user.
    Grapple,
    /// Eavesdrops on a character's IP.
    WiretapWithEarplugs,
    /// Prize of a safe, used on the cat.
    DiamondCollar,
    /// Flies its user to a free field.
    Jetpack,
    /// Reveals whether a character is an enemy when refused.
    ChickenFeed,
    /// Recruits an NPC.
    Nugget,
    /// Swaps IP with another character.
    MirrorOfWilderness,
    /// Hides its holder's allegiance from observation.
    PocketLitter,
    /// Drinkable or pourable cocktail.
    Cocktail,
}

impl GadgetEnum {
    /// Gadget kinds tracked individually by the belief store.
    pub const TRACKED: [Self; 19] = [
        Self::Hairdryer,
        Self::Moledie,
        Self::TechnicolourPrism,
        Self::BowlerBlade,
        Self::MagneticWatch,
        Self::PoisonPills,
        Self::LaserCompact,
        Self::RocketPen,
        Self::GasGloss,
        Self::MothballPouch,
        Self::FogTin,
        Self::Grapple,
        Self::WiretapWithEarplugs,
        Self::DiamondCollar,
        Self::Jetpack,
        Self::ChickenFeed,
        Self::Nugget,
        Self::MirrorOfWilderness,
        Self::PocketLitter,
    ];

    /// Number of uses a multi-use gadget starts with.
    ///
    /// `None` for gadgets without a use counter.
    #[must_use]
    pub const fn initial_usages(self) -> Option<u32> {
        match self {
            Self::PoisonPills | Self::MothballPouch => Some(5),
            _ => None,
        }
    }

    /// Returns true if this kind is tracked individually.
    #[must_use]
    pub const fn is_tracked(self) -> bool {
        !matches!(self, Self::Cocktail)
    }
}

impl fmt::Display for GadgetEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hairdryer => "hairdryer",
            Self::Moledie => "moledie",
            Self::TechnicolourPrism => "technicolour prism",
            Self::BowlerBlade => "bowler blade",
            Self::MagneticWatch => "magnetic watch",
            Self::PoisonPills => "poison pills",
            Self::LaserCompact => "laser compact",
            Self::RocketPen => "rocket pen",
            Self::GasGloss => "gas gloss",
            Self::MothballPouch => "mothball pouch",
            Self::FogTin => "fog tin",
            Self::Grapple => "grapple",
            Self::WiretapWithEarplugs => "wiretap with earplugs",
            Self::DiamondCollar => "diamond collar",
            Self::Jetpack => "jetpack",
            Self::ChickenFeed => "chicken feed",
            Self::Nugget => "nugget",
            Self::MirrorOfWilderness => "mirror of wilderness",
            Self::PocketLitter => "pocket litter",
            Self::Cocktail => "cocktail",
        };
        f.write_str(name)
    }
}

/// A gadget instance carried by a character or lying on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gadget {
    /// Kind of gadget.
    pub gadget: GadgetEnum,

    /// Uses left, for multi-use gadgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usages: Option<u32>,

    /// Only meaningful for cocktails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_poisoned: Option<bool>,
}

impl Gadget {
    /// Creates a fresh gadget with its initial use counter.
    #[must_use]
    pub fn new(gadget: GadgetEnum) -> Self {
        Self {
            gadget,
            usages: gadget.initial_usages(),
            is_poisoned: None,
        }
    }

    /// Creates an untampered cocktail.
    #[must_use]
    pub fn cocktail() -> Self {
        Self {
            gadget: GadgetEnum::Cocktail,
            usages: None,
            is_poisoned: Some(false),
        }
    }

    /// Returns true for a cocktail known to be poisoned.
    #[must_use]
    pub fn is_poisoned_cocktail(&self) -> bool {
        self.gadget == GadgetEnum::Cocktail && self.is_poisoned == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_excludes_cocktail() {
        assert!(!GadgetEnum::TRACKED.contains(&GadgetEnum::Cocktail));
        assert!(GadgetEnum::TRACKED.iter().all(|g| g.is_tracked()));
    }

    #[test]
    fn test_initial_usages() {
        assert_eq!(Gadget::new(GadgetEnum::PoisonPills).usages, Some(5));
        assert_eq!(Gadget::new(GadgetEnum::Grapple).usages, None);
    }

    #[test]
    fn test_gadget_wire_format() {
        let json = serde_json::to_string(&Gadget::new(GadgetEnum::WiretapWithEarplugs)).unwrap();
        assert_eq!(json, r#"{"gadget":"WIRETAP_WITH_EARPLUGS"}"#);

        let cocktail: Gadget =
            serde_json::from_str(r#"{"gadget":"COCKTAIL","isPoisoned":true}"#).unwrap();
        assert!(cocktail.is_poisoned_cocktail());
    }
}
