//! The belief store: everything the client knows or suspects about hidden
//! game facts.
//!
//! Each tracked character has exactly one [`FactionSlot`] and each tracked
//! gadget kind exactly one [`ItemSlot`]. Certain and unresolved knowledge
//! share one map per subject, so a character can never be both certain and
//! unresolved, and a gadget never sits in two categories at once.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::belief::hypothesis::Hypotheses;
use crate::belief::safes::SafeLedger;
use crate::board::{Point, State};
use crate::character::{CharacterInformation, Faction, FactionEnum, PropertyEnum};
use crate::error::{BeliefError, BeliefResult};
use crate::gadget::GadgetEnum;
use crate::id::CharacterId;

/// Faction knowledge about one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactionSlot {
    /// Resolved faction.
    Certain(Faction),
    /// Weighted guesses about the faction.
    Unresolved(Hypotheses<Faction>),
}

/// Location knowledge about one gadget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemSlot {
    /// Carried by this character.
    Owned(CharacterId),
    /// On the floor. The position is `None` when it is not known.
    Floor(Option<Point>),
    /// Weighted guesses about the holder.
    Unresolved(Hypotheses<CharacterId>),
}

impl ItemSlot {
    const fn label(&self) -> &'static str {
        match self {
            Self::Owned(_) => "owned",
            Self::Floor(_) => "floor",
            Self::Unresolved(_) => "unresolved",
        }
    }
}

/// Target category of [`BeliefStore::move_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDestination {
    /// Carried by a character.
    Character(CharacterId),
    /// On the floor, optionally at a known position.
    Floor(Option<Point>),
}

impl ItemDestination {
    const fn label(self) -> &'static str {
        match self {
            Self::Character(_) => "owned",
            Self::Floor(_) => "floor",
        }
    }
}

/// Subject of a tampered (poisoned) cocktail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TamperSubject {
    /// The character carries a poisoned cocktail.
    Character(CharacterId),
    /// A poisoned cocktail stands on this bar table.
    Field(Point),
}

/// A soft claim about a hidden fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hypothesis {
    /// `character` belongs to `faction`.
    Faction {
        /// The character in question.
        character: CharacterId,
        /// Claimed faction.
        faction: Faction,
    },
    /// `character` holds `gadget`.
    Holder {
        /// The gadget in question.
        gadget: GadgetEnum,
        /// Claimed holder.
        character: CharacterId,
    },
}

/// Result of [`BeliefStore::record_hypothesis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HypothesisOutcome {
    /// The sample was appended.
    Recorded,
    /// The sample settled the subject, which is now certain.
    Promoted,
    /// The subject was already resolved; nothing changed.
    Ignored,
}

/// Properties known to be present or absent on one character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyKnowledge {
    /// Properties the character certainly has.
    pub present: BTreeSet<PropertyEnum>,
    /// Properties the character certainly lacks.
    pub absent: BTreeSet<PropertyEnum>,
}

/// Owned knowledge base of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeliefStore {
    factions: BTreeMap<CharacterId, FactionSlot>,
    items: BTreeMap<GadgetEnum, ItemSlot>,
    usages: BTreeMap<GadgetEnum, u32>,
    tampered: BTreeSet<TamperSubject>,
    inverted: BTreeSet<Point>,
    properties: BTreeMap<CharacterId, PropertyKnowledge>,
    safes: SafeLedger,
    team_complete: bool,
}

impl BeliefStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from the handshake reply: one unresolved entry
    /// per character and one per tracked gadget kind.
    #[must_use]
    pub fn seeded(characters: &[CharacterInformation]) -> Self {
        let mut store = Self::default();
        for info in characters {
            store
                .factions
                .insert(info.character_id, FactionSlot::Unresolved(Hypotheses::new()));
            if !info.features.is_empty() {
                store.properties.insert(
                    info.character_id,
                    PropertyKnowledge {
                        present: info.features.clone(),
                        absent: BTreeSet::new(),
                    },
                );
            }
        }
        for gadget in GadgetEnum::TRACKED {
            store.items.insert(gadget, ItemSlot::Unresolved(Hypotheses::new()));
            if let Some(usages) = gadget.initial_usages() {
                store.usages.insert(gadget, usages);
            }
        }
        store
    }

    /// Discards all knowledge.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ------------------------------------------------------------------
    // Factions
    // ------------------------------------------------------------------

    /// Promotes `id` to a certain faction.
    ///
    /// Re-resolving to the same faction is a no-op. Resolving a certain
    /// character to a different faction fails with
    /// [`BeliefError::FactionConflict`]; use [`Self::reassign_faction`] for
    /// genuine allegiance changes.
    pub fn resolve_faction(&mut self, id: CharacterId, faction: Faction) -> BeliefResult<()> {
        let slot = self
            .factions
            .get_mut(&id)
            .ok_or(BeliefError::UnknownCharacter(id))?;
        match slot {
            FactionSlot::Certain(current) if *current == faction => Ok(()),
            FactionSlot::Certain(current) => Err(BeliefError::FactionConflict {
                id,
                current: *current,
                requested: faction,
            }),
            FactionSlot::Unresolved(_) => {
                debug!(character = %id, %faction, "faction resolved");
                *slot = FactionSlot::Certain(faction);
                Ok(())
            }
        }
    }

    /// Changes the faction of a tracked character unconditionally.
    pub fn reassign_faction(&mut self, id: CharacterId, faction: Faction) -> BeliefResult<()> {
        let slot = self
            .factions
            .get_mut(&id)
            .ok_or(BeliefError::UnknownCharacter(id))?;
        debug!(character = %id, %faction, "faction reassigned");
        *slot = FactionSlot::Certain(faction);
        Ok(())
    }

    /// Certain faction of `id`, if resolved.
    #[must_use]
    pub fn faction_of(&self, id: CharacterId) -> Option<Faction> {
        match self.factions.get(&id)? {
            FactionSlot::Certain(f) => Some(*f),
            FactionSlot::Unresolved(_) => None,
        }
    }

    /// Raw faction knowledge about `id`.
    #[must_use]
    pub fn faction_slot(&self, id: CharacterId) -> Option<&FactionSlot> {
        self.factions.get(&id)
    }

    /// Returns true if `id` was part of the match setup.
    #[must_use]
    pub fn is_tracked(&self, id: CharacterId) -> bool {
        self.factions.contains_key(&id)
    }

    /// Returns true if `id` is certainly one of mine.
    #[must_use]
    pub fn is_mine(&self, id: CharacterId) -> bool {
        self.faction_of(id) == Some(Faction::Mine)
    }

    /// Marks my team as fully known. Unresolved characters can no longer be
    /// mine afterwards.
    pub fn mark_team_complete(&mut self) {
        self.team_complete = true;
    }

    /// Whether every character of this client's team is known.
    #[must_use]
    pub const fn is_team_complete(&self) -> bool {
        self.team_complete
    }

    /// Probability that `id` belongs to the wire faction `faction`, seen from
    /// `me`.
    ///
    /// Certain characters yield exactly `1.0` or `0.0`. Unresolved ones yield
    /// the evidence-weighted estimate, and `None` when there is no record, no
    /// sample, or `faction` cannot be mapped from `me`'s perspective.
    #[must_use]
    pub fn query_faction_probability(
        &self,
        id: CharacterId,
        faction: FactionEnum,
        me: FactionEnum,
    ) -> Option<f64> {
        let faction = Faction::from_wire(faction, me)?;
        self.faction_probability(id, faction)
    }

    /// Same as [`Self::query_faction_probability`] with a relative faction.
    #[must_use]
    pub fn faction_probability(&self, id: CharacterId, faction: Faction) -> Option<f64> {
        match self.factions.get(&id)? {
            FactionSlot::Certain(f) => Some(if *f == faction { 1.0 } else { 0.0 }),
            FactionSlot::Unresolved(h) => h.estimate(faction),
        }
    }

    fn faction_list(&self, faction: Faction) -> BTreeSet<CharacterId> {
        self.factions
            .iter()
            .filter(|(_, slot)| matches!(slot, FactionSlot::Certain(f) if *f == faction))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Characters certainly on this client's side.
    #[must_use]
    pub fn my_faction_list(&self) -> BTreeSet<CharacterId> {
        self.faction_list(Faction::Mine)
    }

    /// Characters certainly on the opponent's side.
    #[must_use]
    pub fn enemy_faction_list(&self) -> BTreeSet<CharacterId> {
        self.faction_list(Faction::Enemy)
    }

    /// Characters certainly NPCs.
    #[must_use]
    pub fn npc_faction_list(&self) -> BTreeSet<CharacterId> {
        self.faction_list(Faction::Npc)
    }

    /// Unresolved characters with their hypotheses.
    pub fn unknown_factions(&self) -> impl Iterator<Item = (CharacterId, &Hypotheses<Faction>)> + '_ {
        self.factions.iter().filter_map(|(id, slot)| match slot {
            FactionSlot::Unresolved(h) => Some((*id, h)),
            FactionSlot::Certain(_) => None,
        })
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    /// Moves a gadget across one legal category edge.
    ///
    /// Legal: unresolved to owned or floor, floor to owned, owned to another
    /// owner or to the floor. Everything else fails and leaves the store
    /// unchanged.
    pub fn move_item(&mut self, gadget: GadgetEnum, destination: ItemDestination) -> BeliefResult<()> {
        if let ItemDestination::Character(id) = destination {
            if !self.factions.contains_key(&id) {
                return Err(BeliefError::UnknownCharacter(id));
            }
        }
        let slot = self
            .items
            .get_mut(&gadget)
            .ok_or(BeliefError::UnknownGadget(gadget))?;

        let legal = matches!(
            (&*slot, destination),
            (ItemSlot::Unresolved(_), _)
                | (ItemSlot::Floor(_), ItemDestination::Character(_))
                | (ItemSlot::Owned(_), _)
        );
        if !legal {
            return Err(BeliefError::IllegalItemMove {
                gadget,
                from: slot.label(),
                to: destination.label(),
            });
        }

        *slot = match destination {
            ItemDestination::Character(id) => ItemSlot::Owned(id),
            ItemDestination::Floor(at) => ItemSlot::Floor(at),
        };
        debug!(%gadget, to = destination.label(), "item moved");
        Ok(())
    }

    /// Updates the floor position of a gadget already known to be on the floor.
    pub fn place_on_floor(&mut self, gadget: GadgetEnum, at: Point) -> BeliefResult<()> {
        match self.items.get_mut(&gadget) {
            Some(ItemSlot::Floor(pos)) => {
                *pos = Some(at);
                Ok(())
            }
            Some(_) => self.move_item(gadget, ItemDestination::Floor(Some(at))),
            None => Err(BeliefError::UnknownGadget(gadget)),
        }
    }

    /// Removes a gadget instance from the game.
    pub fn consume_item(&mut self, gadget: GadgetEnum) -> BeliefResult<()> {
        self.items
            .remove(&gadget)
            .ok_or(BeliefError::UnknownGadget(gadget))?;
        self.usages.remove(&gadget);
        debug!(%gadget, "item consumed");
        Ok(())
    }

    /// Spends one use of a gadget.
    ///
    /// Gadgets without a counter are consumed. Returns the remaining uses;
    /// the instance is removed when they reach zero.
    pub fn use_item(&mut self, gadget: GadgetEnum) -> BeliefResult<u32> {
        if !self.items.contains_key(&gadget) {
            return Err(BeliefError::UnknownGadget(gadget));
        }
        let remaining = match self.usages.get_mut(&gadget) {
            Some(usages) => {
                *usages = usages.saturating_sub(1);
                *usages
            }
            None => 0,
        };
        if remaining == 0 {
            self.consume_item(gadget)?;
        }
        Ok(remaining)
    }

    /// Overrides the use counter of a tracked gadget.
    pub fn set_usages(&mut self, gadget: GadgetEnum, usages: u32) -> BeliefResult<()> {
        if !self.items.contains_key(&gadget) {
            return Err(BeliefError::UnknownGadget(gadget));
        }
        self.usages.insert(gadget, usages);
        Ok(())
    }

    /// Remaining uses of a multi-use gadget, if known.
    #[must_use]
    pub fn usages(&self, gadget: GadgetEnum) -> Option<u32> {
        self.usages.get(&gadget).copied()
    }

    /// Current category of a gadget, or `None` once it left the game.
    #[must_use]
    pub fn item_location(&self, gadget: GadgetEnum) -> Option<&ItemSlot> {
        self.items.get(&gadget)
    }

    /// Certain holder of a gadget.
    #[must_use]
    pub fn holder_of(&self, gadget: GadgetEnum) -> Option<CharacterId> {
        match self.items.get(&gadget)? {
            ItemSlot::Owned(id) => Some(*id),
            ItemSlot::Floor(_) | ItemSlot::Unresolved(_) => None,
        }
    }

    /// Gadgets `id` certainly holds.
    #[must_use]
    pub fn gadgets_of(&self, id: CharacterId) -> Vec<GadgetEnum> {
        self.items
            .iter()
            .filter(|(_, slot)| matches!(slot, ItemSlot::Owned(owner) if *owner == id))
            .map(|(g, _)| *g)
            .collect()
    }

    /// Returns true if `gadget` certainly lies on the floor.
    #[must_use]
    pub fn is_on_floor(&self, gadget: GadgetEnum) -> bool {
        matches!(self.items.get(&gadget), Some(ItemSlot::Floor(_)))
    }

    /// Probability that `id` holds `gadget`.
    ///
    /// Owned gadgets yield exactly `1.0` or `0.0`, floor gadgets `0.0`.
    #[must_use]
    pub fn query_item_probability(&self, id: CharacterId, gadget: GadgetEnum) -> Option<f64> {
        match self.items.get(&gadget)? {
            ItemSlot::Owned(owner) => Some(if *owner == id { 1.0 } else { 0.0 }),
            ItemSlot::Floor(_) => Some(0.0),
            ItemSlot::Unresolved(h) => h.estimate(id),
        }
    }

    /// Gadgets whose location is unresolved, with their holder hypotheses.
    pub fn unknown_gadgets(
        &self,
    ) -> impl Iterator<Item = (GadgetEnum, &Hypotheses<CharacterId>)> + '_ {
        self.items.iter().filter_map(|(g, slot)| match slot {
            ItemSlot::Unresolved(h) => Some((*g, h)),
            ItemSlot::Owned(_) | ItemSlot::Floor(_) => None,
        })
    }

    // ------------------------------------------------------------------
    // Hypotheses
    // ------------------------------------------------------------------

    /// Appends a certainty sample to an unresolved subject.
    ///
    /// A sample of `1.0` promotes the value. A sample of `0.0` excludes it.
    /// For factions, excluding all but one faction promotes the remaining
    /// one. Holders are never promoted by exclusion, since an unresolved
    /// gadget may lie on the floor or be out of the match entirely.
    /// Samples about resolved subjects are ignored.
    pub fn record_hypothesis(
        &mut self,
        hypothesis: Hypothesis,
        certainty: f64,
    ) -> BeliefResult<HypothesisOutcome> {
        if !(0.0..=1.0).contains(&certainty) {
            return Err(BeliefError::CertaintyOutOfRange { value: certainty });
        }
        match hypothesis {
            Hypothesis::Faction { character, faction } => {
                self.record_faction(character, faction, certainty)
            }
            Hypothesis::Holder { gadget, character } => {
                self.record_holder(gadget, character, certainty)
            }
        }
    }

    fn record_faction(
        &mut self,
        id: CharacterId,
        faction: Faction,
        certainty: f64,
    ) -> BeliefResult<HypothesisOutcome> {
        let team_complete = self.team_complete;
        let slot = self
            .factions
            .get_mut(&id)
            .ok_or(BeliefError::UnknownCharacter(id))?;
        let FactionSlot::Unresolved(h) = &mut *slot else {
            return Ok(HypothesisOutcome::Ignored);
        };

        if certainty >= 1.0 {
            debug!(character = %id, %faction, "faction promoted by certain evidence");
            *slot = FactionSlot::Certain(faction);
            return Ok(HypothesisOutcome::Promoted);
        }

        h.push(faction, certainty);
        if certainty <= 0.0 {
            let remaining: Vec<Faction> = Faction::ALL
                .into_iter()
                .filter(|f| !h.is_excluded(*f))
                .filter(|f| !(team_complete && *f == Faction::Mine))
                .collect();
            if let [only] = remaining[..] {
                debug!(character = %id, faction = %only, "faction promoted by exclusion");
                *slot = FactionSlot::Certain(only);
                return Ok(HypothesisOutcome::Promoted);
            }
        }
        Ok(HypothesisOutcome::Recorded)
    }

    fn record_holder(
        &mut self,
        gadget: GadgetEnum,
        id: CharacterId,
        certainty: f64,
    ) -> BeliefResult<HypothesisOutcome> {
        if !self.factions.contains_key(&id) {
            return Err(BeliefError::UnknownCharacter(id));
        }
        let slot = self
            .items
            .get_mut(&gadget)
            .ok_or(BeliefError::UnknownGadget(gadget))?;
        let ItemSlot::Unresolved(h) = &mut *slot else {
            return Ok(HypothesisOutcome::Ignored);
        };

        if certainty >= 1.0 {
            debug!(%gadget, character = %id, "holder promoted by certain evidence");
            *slot = ItemSlot::Owned(id);
            return Ok(HypothesisOutcome::Promoted);
        }

        h.push(id, certainty);
        Ok(HypothesisOutcome::Recorded)
    }

    // ------------------------------------------------------------------
    // Properties, tamper records, inverted tables
    // ------------------------------------------------------------------

    /// Records that `id` certainly has (or lacks) `property`.
    pub fn learn_property(&mut self, id: CharacterId, property: PropertyEnum, present: bool) -> BeliefResult<()> {
        if !self.factions.contains_key(&id) {
            return Err(BeliefError::UnknownCharacter(id));
        }
        let knowledge = self.properties.entry(id).or_default();
        if present {
            knowledge.absent.remove(&property);
            knowledge.present.insert(property);
        } else {
            knowledge.present.remove(&property);
            knowledge.absent.insert(property);
        }
        Ok(())
    }

    /// `Some(true)` if present, `Some(false)` if absent, `None` if unknown.
    #[must_use]
    pub fn has_property(&self, id: CharacterId, property: PropertyEnum) -> Option<bool> {
        let knowledge = self.properties.get(&id)?;
        if knowledge.present.contains(&property) {
            Some(true)
        } else if knowledge.absent.contains(&property) {
            Some(false)
        } else {
            None
        }
    }

    /// Property knowledge about `id`.
    #[must_use]
    pub fn properties_of(&self, id: CharacterId) -> Option<&PropertyKnowledge> {
        self.properties.get(&id)
    }

    /// Records a poisoned cocktail.
    pub fn tamper(&mut self, subject: TamperSubject) {
        self.tampered.insert(subject);
    }

    /// Clears a tamper record. Returns true if one existed.
    pub fn untamper(&mut self, subject: TamperSubject) -> bool {
        self.tampered.remove(&subject)
    }

    /// Moves a tamper record, e.g. when a poisoned cocktail is picked up.
    pub fn move_tamper(&mut self, from: TamperSubject, to: TamperSubject) {
        if self.tampered.remove(&from) {
            self.tampered.insert(to);
        }
    }

    /// Returns true if the subject holds or is a poisoned cocktail.
    #[must_use]
    pub fn is_tampered(&self, subject: TamperSubject) -> bool {
        self.tampered.contains(&subject)
    }

    /// Every tamper record.
    #[must_use]
    pub fn tampered(&self) -> &BTreeSet<TamperSubject> {
        &self.tampered
    }

    /// Flips the secret inversion of a roulette table.
    pub fn toggle_inverted(&mut self, table: Point) {
        if !self.inverted.remove(&table) {
            self.inverted.insert(table);
        }
    }

    /// Returns true if the roulette table is known to be inverted.
    #[must_use]
    pub fn is_inverted(&self, table: Point) -> bool {
        self.inverted.contains(&table)
    }

    /// Every table known to be inverted.
    #[must_use]
    pub fn inverted_tables(&self) -> &BTreeSet<Point> {
        &self.inverted
    }

    // ------------------------------------------------------------------
    // Safes
    // ------------------------------------------------------------------

    /// Safe knowledge.
    #[must_use]
    pub fn safes(&self) -> &SafeLedger {
        &self.safes
    }

    /// Mutable safe knowledge.
    pub fn safes_mut(&mut self) -> &mut SafeLedger {
        &mut self.safes
    }

    /// Safe index of the field at `p` in `state`.
    #[must_use]
    pub fn safe_pos_to_index(state: &State, p: Point) -> Option<u32> {
        state.safe_index(p)
    }

    // ------------------------------------------------------------------
    // Snapshot observation
    // ------------------------------------------------------------------

    /// Absorbs facts the server disclosed in a snapshot.
    ///
    /// Characters with a wire faction are resolved, visible gadgets are
    /// attributed with their counters, gadgets lying on fields are placed on
    /// the floor, and learned safe combinations are merged.
    pub fn observe(&mut self, state: &State, me: FactionEnum) {
        for character in &state.characters {
            let id = character.character_id;
            if !self.factions.contains_key(&id) {
                continue;
            }
            if let Some(faction) = Faction::from_wire(character.faction, me) {
                if let Err(err) = self.resolve_faction(id, faction) {
                    debug!(error = %err, "snapshot faction disagrees with belief");
                }
            }
            for gadget in &character.gadgets {
                if !gadget.gadget.is_tracked() || self.holder_of(gadget.gadget) == Some(id) {
                    continue;
                }
                if let Err(err) = self.move_item(gadget.gadget, ItemDestination::Character(id)) {
                    debug!(error = %err, "visible gadget not attributable");
                }
            }
            for gadget in &character.gadgets {
                if let Some(usages) = gadget.usages {
                    if self.items.contains_key(&gadget.gadget) {
                        self.usages.insert(gadget.gadget, usages);
                    }
                }
            }
        }

        for (p, field) in state.map.iter() {
            let Some(gadget) = &field.gadget else {
                continue;
            };
            if gadget.gadget.is_tracked() {
                if let Err(err) = self.place_on_floor(gadget.gadget, p) {
                    debug!(error = %err, "floor gadget not attributable");
                }
            }
        }

        self.safes
            .learn_combinations(state.my_clue_combinations.iter().copied());
    }
}
