//! Operation interpreter.
//!
//! Turns the operations reported with each game status into belief updates.
//! A failing step is logged and skipped; it never aborts the batch.

use tracing::{debug, trace};

use crate::belief::{BeliefStore, Hypothesis, ItemDestination};
use crate::board::{Point, State};
use crate::character::{Faction, PropertyEnum};
use crate::config::{InferenceWeights, MatchConfig};
use crate::error::BeliefResult;
use crate::gadget::GadgetEnum;
use crate::id::CharacterId;
use crate::inference::gadget_rules::{self, GadgetUse};
use crate::inference::turn::{TurnSummary, TurnTracker};
use crate::operation::Operation;

/// Read-only inputs of one interpretation pass.
#[derive(Debug, Clone, Copy)]
pub struct InterpretCtx<'a> {
    /// Snapshot before the operations happened.
    pub previous: &'a State,
    /// Snapshot after the operations happened.
    pub current: &'a State,
    /// Game constants of the match.
    pub config: &'a MatchConfig,
    /// Tunable inference constants.
    pub weights: &'a InferenceWeights,
}

impl InterpretCtx<'_> {
    /// The character standing on `p`, preferring the earlier snapshot.
    #[must_use]
    pub fn character_at(&self, p: Point) -> Option<CharacterId> {
        self.previous
            .character_at(p)
            .or_else(|| self.current.character_at(p))
            .map(|c| c.character_id)
    }

    /// Position of `id` before the operations, falling back to the new snapshot.
    #[must_use]
    pub fn position_of(&self, id: CharacterId) -> Option<Point> {
        self.previous
            .character(id)
            .and_then(|c| c.coordinates)
            .or_else(|| self.current.character(id).and_then(|c| c.coordinates))
    }
}

/// Applies operations to a [`BeliefStore`].
///
/// The interpreter keeps turn state between batches, so one instance should
/// live as long as the match.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    turns: TurnTracker,
}

impl Interpreter {
    /// Creates an interpreter with no turn history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets turn state, e.g. when a new match starts.
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Interprets `operations` in order.
    pub fn apply(&mut self, store: &mut BeliefStore, ctx: &InterpretCtx<'_>, operations: &[Operation]) {
        for op in operations {
            if let Err(err) = self.apply_one(store, ctx, op) {
                debug!(operation = op.kind(), error = %err, "operation skipped");
            }
        }
    }

    fn apply_one(&mut self, store: &mut BeliefStore, ctx: &InterpretCtx<'_>, op: &Operation) -> BeliefResult<()> {
        trace!(operation = op.kind(), "interpreting operation");

        if let Some(actor) = op.character_id() {
            if !matches!(op, Operation::Exfiltration { .. }) {
                if let Some(summary) = self.turns.begin(actor) {
                    let owner = summary.owner;
                    if let Err(err) = close_turn(store, ctx, summary) {
                        debug!(character = %owner, error = %err, "turn handoff evidence skipped");
                    }
                }
                self.turns.note_action();
            }
        }

        match *op {
            Operation::Movement {
                character_id,
                target,
                ..
            } => movement(store, ctx, character_id, target),
            Operation::GadgetAction {
                character_id,
                successful,
                target,
                gadget,
            } => {
                if gadget == GadgetEnum::Moledie {
                    self.turns.note_shed();
                }
                gadget_rules::apply(
                    store,
                    ctx,
                    GadgetUse {
                        actor: character_id,
                        gadget,
                        target,
                        successful,
                    },
                )
            }
            Operation::SpyAction {
                character_id,
                successful,
                target,
            } => match ctx.current.safe_index(target) {
                Some(index) => spy_on_safe(store, ctx, character_id, index, successful),
                None => spy_on_person(store, ctx, character_id, target, successful),
            },
            Operation::PropertyAction {
                character_id,
                successful,
                target,
                used_property,
                is_enemy,
            } => {
                store.learn_property(character_id, used_property, true)?;
                if used_property == PropertyEnum::Observation && successful && store.is_mine(character_id) {
                    if let (Some(is_enemy), Some(observed)) = (is_enemy, ctx.character_at(target)) {
                        observation(store, ctx, observed, is_enemy)?;
                    }
                }
                Ok(())
            }
            Operation::GambleAction { .. }
            | Operation::Exfiltration { .. }
            | Operation::Retire { .. }
            | Operation::CatAction { .. }
            | Operation::JanitorAction { .. } => Ok(()),
        }
    }
}

/// Converts a finished turn into moledie evidence.
fn close_turn(store: &mut BeliefStore, ctx: &InterpretCtx<'_>, turn: TurnSummary) -> BeliefResult<()> {
    let kept = turn.acted
        && !turn.shed
        && store.holder_of(GadgetEnum::Moledie) == Some(turn.owner)
        && !store.is_mine(turn.owner);
    if kept {
        debug!(character = %turn.owner, "kept the moledie for a whole turn");
        store.record_hypothesis(
            Hypothesis::Faction {
                character: turn.owner,
                faction: Faction::Npc,
            },
            ctx.weights.moledie_keep_npc,
        )?;
    }
    Ok(())
}

fn movement(store: &mut BeliefStore, ctx: &InterpretCtx<'_>, mover: CharacterId, target: Point) -> BeliefResult<()> {
    let Some(found) = ctx.previous.field(target).and_then(|f| f.gadget.as_ref()) else {
        return Ok(());
    };
    if !found.gadget.is_tracked() {
        return Ok(());
    }
    trace!(gadget = %found.gadget, character = %mover, "picked up while moving");
    store.move_item(found.gadget, ItemDestination::Character(mover))
}

fn spy_on_person(
    store: &mut BeliefStore,
    ctx: &InterpretCtx<'_>,
    actor: CharacterId,
    target: Point,
    successful: bool,
) -> BeliefResult<()> {
    let Some(spied) = ctx.character_at(target) else {
        return Ok(());
    };

    if store.is_mine(actor) {
        if store.is_mine(spied) {
            return Ok(());
        }
        if successful {
            store.resolve_faction(spied, Faction::Npc)?;
            store.safes_mut().note_source(spied);
        } else {
            // P(fail | npc) = 1 - p and agents never reveal a secret.
            let p = ctx.config.spy_success_chance;
            store.record_hypothesis(
                Hypothesis::Faction {
                    character: spied,
                    faction: Faction::Npc,
                },
                (1.0 - p) / (2.0 - p),
            )?;
        }
        return Ok(());
    }

    store.record_hypothesis(
        Hypothesis::Faction {
            character: actor,
            faction: Faction::Enemy,
        },
        ctx.weights.foreign_spy_enemy,
    )?;
    if successful && !store.is_mine(spied) {
        store.resolve_faction(spied, Faction::Npc)?;
    }
    Ok(())
}

fn spy_on_safe(
    store: &mut BeliefStore,
    ctx: &InterpretCtx<'_>,
    actor: CharacterId,
    index: u32,
    successful: bool,
) -> BeliefResult<()> {
    if store.is_mine(actor) {
        if successful {
            store.safes_mut().mark_opened(index);
        } else {
            store.safes_mut().mark_tried(index);
        }
        return Ok(());
    }
    if !successful {
        return Ok(());
    }

    let unopened = store.safes().unopened_count(ctx.current.map.safe_count());
    if unopened == 0 {
        return Ok(());
    }
    #[allow(clippy::cast_precision_loss)]
    let certainty = 1.0 / unopened as f64;
    store.record_hypothesis(
        Hypothesis::Holder {
            gadget: GadgetEnum::DiamondCollar,
            character: actor,
        },
        certainty,
    )?;
    Ok(())
}

/// An observation reports whether the target is an enemy agent. A pocket
/// litter hides its holder, so "not an enemy" only counts as far as the
/// target is known to lack one.
fn observation(
    store: &mut BeliefStore,
    ctx: &InterpretCtx<'_>,
    observed: CharacterId,
    is_enemy: bool,
) -> BeliefResult<()> {
    if store.is_mine(observed) {
        return Ok(());
    }
    if is_enemy {
        return store.resolve_faction(observed, Faction::Enemy);
    }

    let litter = store
        .query_item_probability(observed, GadgetEnum::PocketLitter)
        .unwrap_or(ctx.weights.unknown_litter);
    if litter <= 0.0 {
        store.resolve_faction(observed, Faction::Npc)
    } else if litter < 1.0 {
        store.record_hypothesis(
            Hypothesis::Faction {
                character: observed,
                faction: Faction::Npc,
            },
            1.0 - litter,
        )?;
        Ok(())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::ItemSlot;
    use crate::board::{FieldMap, FieldStateEnum, Scenario};
    use crate::character::{Character, CharacterInformation};
    use crate::gadget::Gadget;

    struct Match {
        store: BeliefStore,
        previous: State,
        current: State,
        config: MatchConfig,
        weights: InferenceWeights,
        ids: Vec<CharacterId>,
    }

    impl Match {
        /// Four characters on a 4x2 board with a safe at (3, 1); the first is mine.
        fn new() -> Self {
            let infos: Vec<_> = (0..4)
                .map(|i| CharacterInformation::new(CharacterId::new(), format!("c{i}")))
                .collect();
            let ids: Vec<_> = infos.iter().map(|c| c.character_id).collect();
            let mut store = BeliefStore::seeded(&infos);
            store.resolve_faction(ids[0], Faction::Mine).unwrap();

            use FieldStateEnum::{Free, Safe};
            let scenario = Scenario {
                scenario: vec![vec![Free, Free, Free, Free], vec![Free, Free, Free, Safe]],
            };
            let mut state = State {
                map: FieldMap::from_scenario(&scenario),
                ..State::default()
            };
            for (x, id) in ids.iter().enumerate() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let p = Point::new(x as i32, 0);
                state.characters.push(Character::new(*id, "c", Some(p)));
            }

            Self {
                store,
                previous: state.clone(),
                current: state,
                config: MatchConfig::default(),
                weights: InferenceWeights::default(),
                ids,
            }
        }

        fn run(&mut self, interpreter: &mut Interpreter, ops: &[Operation]) {
            let ctx = InterpretCtx {
                previous: &self.previous,
                current: &self.current,
                config: &self.config,
                weights: &self.weights,
            };
            interpreter.apply(&mut self.store, &ctx, ops);
        }
    }

    fn spy(actor: CharacterId, x: i32, y: i32, successful: bool) -> Operation {
        Operation::SpyAction {
            character_id: actor,
            successful,
            target: Point::new(x, y),
        }
    }

    #[test]
    fn test_my_successful_spy_resolves_npc() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        m.run(&mut interpreter, &[spy(m.ids[0], 1, 0, true)]);

        assert_eq!(m.store.faction_of(m.ids[1]), Some(Faction::Npc));
        assert!(m.store.safes().combination_sources().contains(&m.ids[1]));
    }

    #[test]
    fn test_my_failed_spy_weights_npc() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        m.run(&mut interpreter, &[spy(m.ids[0], 2, 0, false)]);

        let p = m.store.faction_probability(m.ids[2], Faction::Npc).unwrap();
        assert!((p - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_foreign_spy_suspects_actor() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        m.run(&mut interpreter, &[spy(m.ids[1], 2, 0, true)]);

        let p = m.store.faction_probability(m.ids[1], Faction::Enemy).unwrap();
        assert!((p - m.weights.foreign_spy_enemy).abs() < 1e-9);
        assert_eq!(m.store.faction_of(m.ids[2]), Some(Faction::Npc));
    }

    #[test]
    fn test_spy_on_safe() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        m.run(&mut interpreter, &[spy(m.ids[0], 3, 1, false)]);
        assert!(m.store.safes().tried().contains_key(&1));

        m.run(&mut interpreter, &[spy(m.ids[0], 3, 1, true)]);
        assert!(m.store.safes().is_opened(1));
    }

    #[test]
    fn test_foreign_safe_opener_suspected_of_collar() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        m.run(&mut interpreter, &[spy(m.ids[3], 3, 1, true)]);

        // a single unopened safe makes the opener the certain holder
        assert_eq!(m.store.holder_of(GadgetEnum::DiamondCollar), Some(m.ids[3]));
    }

    #[test]
    fn test_movement_picks_up_floor_gadget() {
        let mut m = Match::new();
        m.previous.map.get_mut(Point::new(1, 1)).unwrap().gadget = Some(Gadget::new(GadgetEnum::Jetpack));
        let mut interpreter = Interpreter::new();
        m.run(
            &mut interpreter,
            &[Operation::Movement {
                character_id: m.ids[2],
                successful: true,
                target: Point::new(1, 1),
                from: Point::new(2, 0),
            }],
        );
        assert_eq!(m.store.holder_of(GadgetEnum::Jetpack), Some(m.ids[2]));
    }

    #[test]
    fn test_observation() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        let observe = |target: i32, is_enemy| Operation::PropertyAction {
            character_id: m.ids[0],
            successful: true,
            target: Point::new(target, 0),
            used_property: PropertyEnum::Observation,
            is_enemy: Some(is_enemy),
        };
        let ops = [observe(1, true), observe(2, false)];
        m.run(&mut interpreter, &ops);

        assert_eq!(m.store.faction_of(m.ids[1]), Some(Faction::Enemy));
        let p = m.store.faction_probability(m.ids[2], Faction::Npc).unwrap();
        assert!((p - (1.0 - m.weights.unknown_litter)).abs() < 1e-9);
        assert_eq!(m.store.has_property(m.ids[0], PropertyEnum::Observation), Some(true));
    }

    #[test]
    fn test_observation_without_litter_resolves_npc() {
        let mut m = Match::new();
        m.store
            .move_item(GadgetEnum::PocketLitter, ItemDestination::Character(m.ids[1]))
            .unwrap();
        let mut interpreter = Interpreter::new();
        m.run(
            &mut interpreter,
            &[Operation::PropertyAction {
                character_id: m.ids[0],
                successful: true,
                target: Point::new(3, 0),
                used_property: PropertyEnum::Observation,
                is_enemy: Some(false),
            }],
        );
        assert_eq!(m.store.faction_of(m.ids[3]), Some(Faction::Npc));
    }

    #[test]
    fn test_kept_moledie_suggests_npc() {
        let mut m = Match::new();
        m.store
            .move_item(GadgetEnum::Moledie, ItemDestination::Character(m.ids[2]))
            .unwrap();
        let mut interpreter = Interpreter::new();
        let ops = [
            Operation::Retire {
                character_id: m.ids[2],
                successful: true,
                target: Point::new(2, 0),
            },
            Operation::Retire {
                character_id: m.ids[3],
                successful: true,
                target: Point::new(3, 0),
            },
        ];
        m.run(&mut interpreter, &ops);

        let p = m.store.faction_probability(m.ids[2], Faction::Npc).unwrap();
        assert!((p - m.weights.moledie_keep_npc).abs() < 1e-9);
        assert_eq!(m.store.faction_probability(m.ids[3], Faction::Npc), None);
    }

    #[test]
    fn test_rejected_handoff_evidence_keeps_next_operation() {
        let mut m = Match::new();
        m.weights.moledie_keep_npc = 1.5;
        m.store
            .move_item(GadgetEnum::Moledie, ItemDestination::Character(m.ids[2]))
            .unwrap();
        let mut interpreter = Interpreter::new();
        let ops = [
            Operation::Retire {
                character_id: m.ids[2],
                successful: true,
                target: Point::new(2, 0),
            },
            spy(m.ids[3], 1, 0, true),
        ];
        m.run(&mut interpreter, &ops);

        assert_eq!(m.store.faction_probability(m.ids[2], Faction::Npc), None);
        assert_eq!(m.store.faction_of(m.ids[1]), Some(Faction::Npc));
    }

    #[test]
    fn test_thrown_moledie_is_no_evidence() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        let ops = [
            Operation::GadgetAction {
                character_id: m.ids[2],
                successful: true,
                target: Point::new(1, 1),
                gadget: GadgetEnum::Moledie,
            },
            Operation::Retire {
                character_id: m.ids[3],
                successful: true,
                target: Point::new(3, 0),
            },
        ];
        m.run(&mut interpreter, &ops);

        assert!(matches!(
            m.store.item_location(GadgetEnum::Moledie),
            Some(ItemSlot::Floor(_))
        ));
        // only the gadget-use evidence remains
        let p = m.store.faction_probability(m.ids[2], Faction::Npc).unwrap();
        assert!((p - (1.0 - m.weights.foreign_gadget_enemy)).abs() < 1e-9);
    }

    #[test]
    fn test_failing_step_does_not_abort_batch() {
        let mut m = Match::new();
        let mut interpreter = Interpreter::new();
        let ops = [
            spy(CharacterId::new(), 1, 0, true),
            spy(m.ids[0], 2, 0, true),
        ];
        m.run(&mut interpreter, &ops);
        assert_eq!(m.store.faction_of(m.ids[2]), Some(Faction::Npc));
    }
}
