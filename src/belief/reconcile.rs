//! Merging certain belief into an authoritative snapshot.

use tracing::trace;

use crate::belief::store::{BeliefStore, TamperSubject};
use crate::board::{FieldStateEnum, State};
use crate::character::FactionEnum;
use crate::gadget::{Gadget, GadgetEnum};

impl BeliefStore {
    /// Writes every certain fact into `state`.
    ///
    /// Factions, known properties, owned gadgets with their counters, poisoned
    /// cocktails and inverted roulette tables are applied. Unresolved
    /// knowledge is never written. Applying the same store twice yields the
    /// same snapshot.
    pub fn reconcile(&self, state: &mut State, me: FactionEnum) {
        for character in &mut state.characters {
            let id = character.character_id;

            if let Some(faction) = self.faction_of(id) {
                character.faction = faction.to_wire(me);
            }

            if let Some(knowledge) = self.properties_of(id) {
                character.properties.extend(knowledge.present.iter().copied());
                character
                    .properties
                    .retain(|p| !knowledge.absent.contains(p));
            }

            for gadget in self.gadgets_of(id) {
                let usages = self.usages(gadget);
                match character.gadget_mut(gadget) {
                    Some(carried) => {
                        if usages.is_some() {
                            carried.usages = usages;
                        }
                    }
                    None => character.gadgets.push(Gadget {
                        gadget,
                        usages,
                        is_poisoned: None,
                    }),
                }
            }

            if self.is_tampered(TamperSubject::Character(id)) {
                match character.gadget_mut(GadgetEnum::Cocktail) {
                    Some(cocktail) => cocktail.is_poisoned = Some(true),
                    None => character.gadgets.push(Gadget {
                        gadget: GadgetEnum::Cocktail,
                        usages: None,
                        is_poisoned: Some(true),
                    }),
                }
            }
        }

        for subject in self.tampered() {
            let TamperSubject::Field(p) = subject else {
                continue;
            };
            let Some(field) = state.map.get_mut(*p) else {
                continue;
            };
            if let Some(gadget) = field.gadget.as_mut() {
                if gadget.gadget == GadgetEnum::Cocktail {
                    gadget.is_poisoned = Some(true);
                }
            }
        }

        for table in self.inverted_tables() {
            if let Some(field) = state.map.get_mut(*table) {
                if field.state == FieldStateEnum::RouletteTable {
                    field.is_inverted = true;
                }
            }
        }

        trace!(round = state.current_round, "snapshot reconciled");
    }
}
