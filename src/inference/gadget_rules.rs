//! Per-gadget inference rules.
//!
//! Every gadget action is handled in three steps: the actor is attributed
//! the gadget, the gadget's effect updates the store, and the gadget is
//! disposed of.

use tracing::{debug, trace};

use crate::belief::{BeliefStore, Hypothesis, ItemDestination, TamperSubject};
use crate::board::{FieldStateEnum, Point};
use crate::character::{Faction, PropertyEnum};
use crate::error::BeliefResult;
use crate::gadget::GadgetEnum;
use crate::id::CharacterId;
use crate::inference::interpreter::InterpretCtx;

/// What happens to a gadget after use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Remains with the actor.
    Stays,
    /// Leaves the game.
    Consumed,
    /// One use is spent; the gadget leaves the game at zero.
    Spend,
    /// Lands on the floor.
    Floor(Option<Point>),
    /// Passes to another character.
    Transfer(CharacterId),
}

/// One observed gadget action.
#[derive(Debug, Clone, Copy)]
pub struct GadgetUse {
    /// Character that used the gadget.
    pub actor: CharacterId,
    /// The gadget used.
    pub gadget: GadgetEnum,
    /// Target field.
    pub target: Point,
    /// Whether the server reported success.
    pub successful: bool,
}

/// Applies attribution, effect and disposition for one gadget action.
pub fn apply(store: &mut BeliefStore, ctx: &InterpretCtx<'_>, action: GadgetUse) -> BeliefResult<()> {
    let GadgetUse { actor, gadget, .. } = action;

    if gadget.is_tracked() && store.holder_of(gadget) != Some(actor) {
        if let Err(err) = store.move_item(gadget, ItemDestination::Character(actor)) {
            debug!(%gadget, error = %err, "gadget user not attributable");
        }
    }

    if store.is_tracked(actor) && !store.is_mine(actor) {
        store.record_hypothesis(
            Hypothesis::Faction {
                character: actor,
                faction: Faction::Enemy,
            },
            ctx.weights.foreign_gadget_enemy,
        )?;
    }

    let disposition = effect(store, ctx, action)?;
    trace!(%gadget, ?disposition, "gadget rule applied");
    dispose(store, gadget, disposition)
}

fn effect(store: &mut BeliefStore, ctx: &InterpretCtx<'_>, action: GadgetUse) -> BeliefResult<Disposition> {
    let GadgetUse {
        actor,
        gadget,
        target,
        successful,
    } = action;
    let victim = ctx.character_at(target);

    let disposition = match gadget {
        GadgetEnum::Hairdryer => {
            if let (true, Some(victim)) = (successful, victim) {
                store.learn_property(victim, PropertyEnum::ClammyClothes, false)?;
            }
            Disposition::Stays
        }
        GadgetEnum::Moledie => match victim {
            Some(victim) if victim != actor => Disposition::Transfer(victim),
            _ => Disposition::Floor(Some(target)),
        },
        GadgetEnum::TechnicolourPrism => {
            if successful {
                store.toggle_inverted(target);
            }
            Disposition::Consumed
        }
        GadgetEnum::BowlerBlade => {
            if let Some(victim) = victim {
                let watch = Hypothesis::Holder {
                    gadget: GadgetEnum::MagneticWatch,
                    character: victim,
                };
                if successful {
                    store.record_hypothesis(watch, 0.0)?;
                } else {
                    let hit = ctx.config.bowler_blade_hit_chance;
                    store.record_hypothesis(watch, 1.0 / (2.0 - hit))?;
                }
            }
            Disposition::Floor(None)
        }
        GadgetEnum::MagneticWatch | GadgetEnum::PocketLitter => Disposition::Stays,
        GadgetEnum::PoisonPills => {
            if successful {
                let subject = match victim {
                    Some(victim) => TamperSubject::Character(victim),
                    None => TamperSubject::Field(target),
                };
                store.tamper(subject);
            }
            Disposition::Spend
        }
        GadgetEnum::LaserCompact => {
            if successful {
                store.untamper(TamperSubject::Field(target));
                if let Some(victim) = victim {
                    store.untamper(TamperSubject::Character(victim));
                }
            }
            Disposition::Stays
        }
        GadgetEnum::RocketPen
        | GadgetEnum::GasGloss
        | GadgetEnum::FogTin
        | GadgetEnum::Jetpack
        | GadgetEnum::DiamondCollar => Disposition::Consumed,
        GadgetEnum::MothballPouch => Disposition::Spend,
        GadgetEnum::Grapple => {
            if successful {
                grapple(store, ctx, actor, target)?;
            }
            Disposition::Stays
        }
        GadgetEnum::WiretapWithEarplugs | GadgetEnum::MirrorOfWilderness => Disposition::Stays,
        GadgetEnum::ChickenFeed => {
            if let (true, Some(victim)) = (successful, victim) {
                if store.is_mine(actor) {
                    settle(store, victim, Faction::Enemy);
                }
            }
            Disposition::Consumed
        }
        GadgetEnum::Nugget => return nugget(store, actor, victim, successful),
        GadgetEnum::Cocktail => {
            cocktail(store, ctx, actor, target, victim, successful)?;
            Disposition::Stays
        }
    };
    Ok(disposition)
}

fn grapple(store: &mut BeliefStore, ctx: &InterpretCtx<'_>, actor: CharacterId, target: Point) -> BeliefResult<()> {
    let Some(field) = ctx.previous.field(target) else {
        return Ok(());
    };
    if let Some(pulled) = &field.gadget {
        if pulled.gadget.is_tracked() {
            store.move_item(pulled.gadget, ItemDestination::Character(actor))?;
        } else if pulled.gadget == GadgetEnum::Cocktail {
            store.move_tamper(TamperSubject::Field(target), TamperSubject::Character(actor));
        }
    }
    Ok(())
}

/// Nuggets recruit NPCs. A rejected nugget stays with the character that
/// refused it, which proves that character is an agent of the other side.
fn nugget(
    store: &mut BeliefStore,
    actor: CharacterId,
    victim: Option<CharacterId>,
    successful: bool,
) -> BeliefResult<Disposition> {
    let Some(victim) = victim else {
        return Ok(Disposition::Stays);
    };
    let mine = store.is_mine(actor);
    match (mine, successful) {
        (true, true) => {
            store.reassign_faction(victim, Faction::Mine)?;
            Ok(Disposition::Consumed)
        }
        (true, false) => {
            settle(store, victim, Faction::Enemy);
            Ok(Disposition::Transfer(victim))
        }
        (false, true) => {
            store.reassign_faction(victim, Faction::Enemy)?;
            Ok(Disposition::Consumed)
        }
        (false, false) => Ok(Disposition::Transfer(victim)),
    }
}

fn cocktail(
    store: &mut BeliefStore,
    ctx: &InterpretCtx<'_>,
    actor: CharacterId,
    target: Point,
    victim: Option<CharacterId>,
    successful: bool,
) -> BeliefResult<()> {
    let on_bar_table = ctx
        .previous
        .field(target)
        .is_some_and(|f| f.state == FieldStateEnum::BarTable);

    if on_bar_table {
        store.move_tamper(TamperSubject::Field(target), TamperSubject::Character(actor));
    } else if ctx.position_of(actor) == Some(target) || victim == Some(actor) {
        // drinking
        store.untamper(TamperSubject::Character(actor));
    } else if let Some(victim) = victim {
        store.untamper(TamperSubject::Character(actor));
        if successful {
            store.learn_property(victim, PropertyEnum::ClammyClothes, true)?;
        }
    }
    Ok(())
}

/// Resolves a victim's faction, logging instead of failing on conflicts.
fn settle(store: &mut BeliefStore, id: CharacterId, faction: Faction) {
    if let Err(err) = store.resolve_faction(id, faction) {
        debug!(character = %id, error = %err, "faction evidence contradicts belief");
    }
}

fn dispose(store: &mut BeliefStore, gadget: GadgetEnum, disposition: Disposition) -> BeliefResult<()> {
    if !gadget.is_tracked() {
        return Ok(());
    }
    match disposition {
        Disposition::Stays => Ok(()),
        Disposition::Consumed => store.consume_item(gadget),
        Disposition::Spend => store.use_item(gadget).map(|_| ()),
        Disposition::Floor(at) => store.move_item(gadget, ItemDestination::Floor(at)),
        Disposition::Transfer(to) => store.move_item(gadget, ItemDestination::Character(to)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::ItemSlot;
    use crate::board::{FieldMap, Scenario, State};
    use crate::character::{Character, CharacterInformation};
    use crate::config::{InferenceWeights, MatchConfig};
    use crate::gadget::Gadget;

    struct Fixture {
        store: BeliefStore,
        state: State,
        config: MatchConfig,
        weights: InferenceWeights,
        me: CharacterId,
        other: CharacterId,
    }

    impl Fixture {
        fn new() -> Self {
            let infos = vec![
                CharacterInformation::new(CharacterId::new(), "me"),
                CharacterInformation::new(CharacterId::new(), "other"),
            ];
            let me = infos[0].character_id;
            let other = infos[1].character_id;
            let mut store = BeliefStore::seeded(&infos);
            store.resolve_faction(me, Faction::Mine).unwrap();

            use FieldStateEnum::{BarTable, Free, RouletteTable};
            let scenario = Scenario {
                scenario: vec![vec![Free, Free, BarTable, RouletteTable]],
            };
            let mut state = State {
                map: FieldMap::from_scenario(&scenario),
                ..State::default()
            };
            state.characters.push(Character::new(me, "me", Some(Point::new(0, 0))));
            state.characters.push(Character::new(other, "other", Some(Point::new(1, 0))));

            Self {
                store,
                state,
                config: MatchConfig::default(),
                weights: InferenceWeights::default(),
                me,
                other,
            }
        }

        fn run(&mut self, actor: CharacterId, gadget: GadgetEnum, target: Point, successful: bool) {
            let ctx = InterpretCtx {
                previous: &self.state,
                current: &self.state,
                config: &self.config,
                weights: &self.weights,
            };
            apply(
                &mut self.store,
                &ctx,
                GadgetUse {
                    actor,
                    gadget,
                    target,
                    successful,
                },
            )
            .unwrap();
        }
    }

    #[test]
    fn test_use_attributes_gadget() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::WiretapWithEarplugs, Point::new(1, 0), true);
        assert_eq!(f.store.holder_of(GadgetEnum::WiretapWithEarplugs), Some(f.me));
    }

    #[test]
    fn test_foreign_user_is_suspected_enemy() {
        let mut f = Fixture::new();
        f.run(f.other, GadgetEnum::MirrorOfWilderness, Point::new(0, 0), false);
        let p = f.store.faction_probability(f.other, Faction::Enemy).unwrap();
        assert!((p - f.weights.foreign_gadget_enemy).abs() < 1e-9);
    }

    #[test]
    fn test_consumables_leave_the_game() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::RocketPen, Point::new(1, 0), true);
        assert_eq!(f.store.item_location(GadgetEnum::RocketPen), None);
    }

    #[test]
    fn test_prism_inverts_table() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::TechnicolourPrism, Point::new(3, 0), true);
        assert!(f.store.is_inverted(Point::new(3, 0)));
        assert_eq!(f.store.item_location(GadgetEnum::TechnicolourPrism), None);
    }

    #[test]
    fn test_moledie_transfers_to_victim() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::Moledie, Point::new(1, 0), true);
        assert_eq!(f.store.holder_of(GadgetEnum::Moledie), Some(f.other));

        f.run(f.other, GadgetEnum::Moledie, Point::new(2, 0), true);
        assert_eq!(
            f.store.item_location(GadgetEnum::Moledie),
            Some(&ItemSlot::Floor(Some(Point::new(2, 0))))
        );
    }

    #[test]
    fn test_bowler_blade_miss_suggests_watch() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::BowlerBlade, Point::new(1, 0), false);
        let p = f
            .store
            .query_item_probability(f.other, GadgetEnum::MagneticWatch)
            .unwrap();
        assert!((p - 1.0 / 1.5).abs() < 1e-9);
        assert!(f.store.is_on_floor(GadgetEnum::BowlerBlade));
    }

    #[test]
    fn test_bowler_blade_hit_rules_out_watch_only() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::BowlerBlade, Point::new(1, 0), true);
        assert_eq!(
            f.store.query_item_probability(f.other, GadgetEnum::MagneticWatch),
            Some(0.0)
        );
        // the only other character is not credited with the watch
        assert_eq!(f.store.holder_of(GadgetEnum::MagneticWatch), None);
        assert!(matches!(
            f.store.item_location(GadgetEnum::MagneticWatch),
            Some(ItemSlot::Unresolved(_))
        ));
    }

    #[test]
    fn test_poison_pills_tamper_and_spend() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::PoisonPills, Point::new(2, 0), true);
        assert!(f.store.is_tampered(TamperSubject::Field(Point::new(2, 0))));
        assert_eq!(f.store.usages(GadgetEnum::PoisonPills), Some(4));

        f.run(f.me, GadgetEnum::LaserCompact, Point::new(2, 0), true);
        assert!(!f.store.is_tampered(TamperSubject::Field(Point::new(2, 0))));
    }

    #[test]
    fn test_grapple_pulls_floor_gadget() {
        let mut f = Fixture::new();
        f.state.map.get_mut(Point::new(1, 0)).unwrap().gadget = Some(Gadget::new(GadgetEnum::FogTin));
        f.store.place_on_floor(GadgetEnum::FogTin, Point::new(1, 0)).unwrap();
        f.run(f.me, GadgetEnum::Grapple, Point::new(1, 0), true);
        assert_eq!(f.store.holder_of(GadgetEnum::FogTin), Some(f.me));
    }

    #[test]
    fn test_nugget_outcomes() {
        let mut f = Fixture::new();
        f.store.resolve_faction(f.other, Faction::Npc).unwrap();
        f.run(f.me, GadgetEnum::Nugget, Point::new(1, 0), true);
        assert!(f.store.is_mine(f.other));
        assert_eq!(f.store.item_location(GadgetEnum::Nugget), None);
    }

    #[test]
    fn test_rejected_nugget_reveals_enemy() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::Nugget, Point::new(1, 0), false);
        assert_eq!(f.store.faction_of(f.other), Some(Faction::Enemy));
        assert_eq!(f.store.holder_of(GadgetEnum::Nugget), Some(f.other));
    }

    #[test]
    fn test_cocktail_pickup_and_drink() {
        let mut f = Fixture::new();
        let table = Point::new(2, 0);
        f.store.tamper(TamperSubject::Field(table));

        f.run(f.me, GadgetEnum::Cocktail, table, true);
        assert!(f.store.is_tampered(TamperSubject::Character(f.me)));

        f.run(f.me, GadgetEnum::Cocktail, Point::new(0, 0), true);
        assert!(f.store.tampered().is_empty());
    }

    #[test]
    fn test_cocktail_pour_wets_victim() {
        let mut f = Fixture::new();
        f.run(f.me, GadgetEnum::Cocktail, Point::new(1, 0), true);
        assert_eq!(
            f.store.has_property(f.other, PropertyEnum::ClammyClothes),
            Some(true)
        );

        f.run(f.me, GadgetEnum::Hairdryer, Point::new(1, 0), true);
        assert_eq!(
            f.store.has_property(f.other, PropertyEnum::ClammyClothes),
            Some(false)
        );
    }
}
