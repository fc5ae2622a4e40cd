use std::collections::BTreeSet;

use spyclient::belief::{BeliefStore, Hypothesis, HypothesisOutcome, ItemDestination, ItemSlot, TamperSubject};
use spyclient::{
    Character, CharacterId, CharacterInformation, Faction, FactionEnum, FieldMap, FieldStateEnum, GadgetEnum,
    InferenceWeights, InterpretCtx, Interpreter, MatchConfig, Operation, Point, PropertyEnum, Scenario, State,
};

fn seeded(n: usize) -> (BeliefStore, Vec<CharacterId>) {
    let infos: Vec<_> = (0..n)
        .map(|i| CharacterInformation::new(CharacterId::new(), format!("agent{i}")))
        .collect();
    let ids = infos.iter().map(|c| c.character_id).collect();
    (BeliefStore::seeded(&infos), ids)
}

fn board(ids: &[CharacterId]) -> State {
    use FieldStateEnum::{BarTable, Free, RouletteTable, Safe};
    let scenario = Scenario {
        scenario: vec![
            vec![Free; ids.len()],
            vec![Safe, Safe, BarTable, RouletteTable],
        ],
    };
    let mut state = State {
        map: FieldMap::from_scenario(&scenario),
        ..State::default()
    };
    for (x, id) in ids.iter().enumerate() {
        let p = Point::new(i32::try_from(x).unwrap(), 0);
        state.characters.push(Character::new(*id, format!("agent{x}"), Some(p)));
    }
    state
}

/// Every tracked character sits in exactly one of mine, enemy, NPC or unknown.
fn assert_factions_disjoint(store: &BeliefStore, ids: &[CharacterId]) {
    let mine = store.my_faction_list();
    let enemy = store.enemy_faction_list();
    let npc = store.npc_faction_list();
    let unknown: BTreeSet<_> = store.unknown_factions().map(|(id, _)| id).collect();

    for id in ids {
        let hits = [&mine, &enemy, &npc, &unknown]
            .iter()
            .filter(|set| set.contains(id))
            .count();
        assert_eq!(hits, 1, "character {id} in {hits} categories");
    }
}

/// Every tracked gadget is owned, on the floor, unresolved, or gone.
fn assert_items_disjoint(store: &BeliefStore) {
    for gadget in GadgetEnum::TRACKED {
        let owned = store.holder_of(gadget).is_some();
        let floor = store.is_on_floor(gadget);
        let unknown = store.unknown_gadgets().any(|(g, _)| g == gadget);
        let present = store.item_location(gadget).is_some();
        assert_eq!(
            usize::from(owned) + usize::from(floor) + usize::from(unknown),
            usize::from(present),
            "{gadget} in more than one category"
        );
    }
}

fn run(store: &mut BeliefStore, previous: &State, current: &State, operations: &[Operation]) {
    let config = MatchConfig::default();
    let weights = InferenceWeights::default();
    let ctx = InterpretCtx {
        previous,
        current,
        config: &config,
        weights: &weights,
    };
    Interpreter::new().apply(store, &ctx, operations);
}

#[test]
fn categories_stay_disjoint_through_a_match() {
    let (mut store, ids) = seeded(6);
    assert_factions_disjoint(&store, &ids);
    assert_items_disjoint(&store);

    store.resolve_faction(ids[0], Faction::Mine).unwrap();
    store.resolve_faction(ids[1], Faction::Mine).unwrap();
    store.mark_team_complete();
    store.move_item(GadgetEnum::Grapple, ItemDestination::Character(ids[0])).unwrap();
    store.move_item(GadgetEnum::FogTin, ItemDestination::Floor(None)).unwrap();
    assert_factions_disjoint(&store, &ids);
    assert_items_disjoint(&store);

    let state = board(&ids);
    let ops = [
        Operation::SpyAction {
            character_id: ids[0],
            successful: true,
            target: Point::new(2, 0),
        },
        Operation::SpyAction {
            character_id: ids[3],
            successful: false,
            target: Point::new(4, 0),
        },
        Operation::GadgetAction {
            character_id: ids[4],
            successful: true,
            target: Point::new(3, 1),
            gadget: GadgetEnum::TechnicolourPrism,
        },
        Operation::Movement {
            character_id: ids[5],
            successful: true,
            target: Point::new(5, 0),
            from: Point::new(4, 0),
        },
    ];
    run(&mut store, &state, &state, &ops);

    assert_factions_disjoint(&store, &ids);
    assert_items_disjoint(&store);
    assert_eq!(store.faction_of(ids[2]), Some(Faction::Npc));
    assert!(store.item_location(GadgetEnum::TechnicolourPrism).is_none());
    assert!(store.is_inverted(Point::new(3, 1)));
}

#[test]
fn estimates_are_bounded_and_exact_after_resolution() {
    let (mut store, ids) = seeded(3);
    let subject = ids[1];
    assert_eq!(store.faction_probability(subject, Faction::Enemy), None);

    for certainty in [0.2, 0.75, 0.5, 0.99] {
        let outcome = store
            .record_hypothesis(
                Hypothesis::Faction {
                    character: subject,
                    faction: Faction::Enemy,
                },
                certainty,
            )
            .unwrap();
        assert_eq!(outcome, HypothesisOutcome::Recorded);
        for faction in Faction::ALL {
            let p = store.faction_probability(subject, faction).unwrap();
            assert!((0.0..=1.0).contains(&p), "{faction}: {p}");
        }
    }

    assert!(store
        .record_hypothesis(
            Hypothesis::Faction {
                character: subject,
                faction: Faction::Npc,
            },
            1.2,
        )
        .is_err());

    store.resolve_faction(subject, Faction::Enemy).unwrap();
    assert_eq!(store.faction_probability(subject, Faction::Enemy), Some(1.0));
    assert_eq!(store.faction_probability(subject, Faction::Npc), Some(0.0));
    assert_eq!(
        store.query_faction_probability(subject, FactionEnum::Player1, FactionEnum::Player2),
        Some(1.0)
    );
    assert_eq!(
        store.record_hypothesis(
            Hypothesis::Faction {
                character: subject,
                faction: Faction::Npc,
            },
            0.3,
        ),
        Ok(HypothesisOutcome::Ignored)
    );
}

#[test]
fn item_probability_follows_location() {
    let (mut store, ids) = seeded(2);
    let gadget = GadgetEnum::MagneticWatch;
    assert_eq!(store.query_item_probability(ids[0], gadget), None);

    store
        .record_hypothesis(
            Hypothesis::Holder {
                gadget,
                character: ids[0],
            },
            0.6,
        )
        .unwrap();
    let p = store.query_item_probability(ids[0], gadget).unwrap();
    assert!((p - 0.6).abs() < 1e-9);

    // the watch may be on the floor, so ruling out one character proves nothing
    let outcome = store
        .record_hypothesis(
            Hypothesis::Holder {
                gadget,
                character: ids[1],
            },
            0.0,
        )
        .unwrap();
    assert_eq!(outcome, HypothesisOutcome::Recorded);
    assert_eq!(store.holder_of(gadget), None);
    // (1 - 0.6) from the first sample, 0.0 from the exclusion
    let p = store.query_item_probability(ids[1], gadget).unwrap();
    assert!((p - 0.2).abs() < 1e-9);

    store.move_item(gadget, ItemDestination::Character(ids[0])).unwrap();
    assert_eq!(store.item_location(gadget), Some(&ItemSlot::Owned(ids[0])));
    assert_eq!(store.query_item_probability(ids[0], gadget), Some(1.0));

    store.move_item(gadget, ItemDestination::Floor(Some(Point::new(0, 0)))).unwrap();
    assert_eq!(store.query_item_probability(ids[0], gadget), Some(0.0));
    store.move_item(gadget, ItemDestination::Character(ids[1])).unwrap();
    assert_eq!(store.query_item_probability(ids[1], gadget), Some(1.0));
    assert_eq!(store.query_item_probability(ids[0], gadget), Some(0.0));
}

#[test]
fn observation_result_settles_faction() {
    let (mut store, ids) = seeded(4);
    store.resolve_faction(ids[0], Faction::Mine).unwrap();
    store.move_item(GadgetEnum::PocketLitter, ItemDestination::Character(ids[3])).unwrap();
    let state = board(&ids);

    let observe = |target: usize, is_enemy: bool| Operation::PropertyAction {
        character_id: ids[0],
        successful: true,
        target: Point::new(i32::try_from(target).unwrap(), 0),
        used_property: PropertyEnum::Observation,
        is_enemy: Some(is_enemy),
    };
    run(&mut store, &state, &state, &[observe(1, true), observe(2, false), observe(3, false)]);

    assert_eq!(store.faction_of(ids[1]), Some(Faction::Enemy));
    assert_eq!(store.faction_of(ids[2]), Some(Faction::Npc));
    // the litter holder may be hiding its allegiance
    assert_eq!(store.faction_of(ids[3]), None);
    assert_eq!(store.has_property(ids[0], PropertyEnum::Observation), Some(true));
}

#[test]
fn reconcile_is_idempotent_on_a_rich_store() {
    let (mut store, ids) = seeded(4);
    store.resolve_faction(ids[0], Faction::Mine).unwrap();
    store.resolve_faction(ids[1], Faction::Enemy).unwrap();
    store.resolve_faction(ids[2], Faction::Npc).unwrap();
    store.move_item(GadgetEnum::MothballPouch, ItemDestination::Character(ids[0])).unwrap();
    store.use_item(GadgetEnum::MothballPouch).unwrap();
    store.learn_property(ids[1], PropertyEnum::Tradecraft, true).unwrap();
    store.tamper(TamperSubject::Character(ids[3]));
    store.toggle_inverted(Point::new(3, 1));

    let mut state = board(&ids);
    store.reconcile(&mut state, FactionEnum::Player2);
    let once = state.clone();
    let digest = state.fingerprint();

    store.reconcile(&mut state, FactionEnum::Player2);
    assert_eq!(state, once);
    assert_eq!(state.fingerprint(), digest);

    assert_eq!(state.characters[0].faction, FactionEnum::Player2);
    assert_eq!(state.characters[1].faction, FactionEnum::Player1);
    assert_eq!(
        state.characters[0]
            .gadget(GadgetEnum::MothballPouch)
            .and_then(|g| g.usages),
        Some(4)
    );
    assert!(state.map.get(Point::new(3, 1)).unwrap().is_inverted);
}

#[test]
fn safe_ledger_tracks_spying_on_safes() {
    let (mut store, ids) = seeded(4);
    store.resolve_faction(ids[0], Faction::Mine).unwrap();
    let mut state = board(&ids);
    state.my_clue_combinations.insert(1);
    store.observe(&state, FactionEnum::Player1);

    assert_eq!(BeliefStore::safe_pos_to_index(&state, Point::new(0, 1)), Some(1));
    assert_eq!(BeliefStore::safe_pos_to_index(&state, Point::new(2, 1)), None);

    let ops = [
        Operation::SpyAction {
            character_id: ids[0],
            successful: true,
            target: Point::new(0, 1),
        },
        Operation::SpyAction {
            character_id: ids[0],
            successful: false,
            target: Point::new(1, 1),
        },
    ];
    run(&mut store, &state, &state, &ops);

    assert!(store.safes().is_opened(1));
    assert_eq!(store.safes().tried().get(&2), Some(&1));
    assert!(!store.safes().is_worth_retrying(2));
    assert_eq!(store.safes().unopened_count(state.map.safe_count()), 1);
}
