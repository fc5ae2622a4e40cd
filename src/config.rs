//! Match rules and tunable inference constants.
//!
//! [`MatchConfig`] is delivered by the server with the handshake reply and is
//! consumed read-only. [`InferenceWeights`] and [`SessionConfig`] belong to
//! the client and are chosen when the session is created.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Static game constants for one match.
///
/// Probabilities are in `[0.0, 1.0]`. Missing fields fall back to the
/// standard rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchConfig {
    /// Range of the moledie throw.
    pub moledie_range: u32,
    /// Range of the bowler blade.
    pub bowler_blade_range: u32,
    /// Chance that a bowler blade hits.
    pub bowler_blade_hit_chance: f64,
    /// Damage of a bowler blade hit.
    pub bowler_blade_damage: u32,
    /// Chance that the laser compact hits a cocktail.
    pub laser_compact_hit_chance: f64,
    /// Damage of the rocket pen.
    pub rocket_pen_damage: u32,
    /// Damage of the gas gloss.
    pub gas_gloss_damage: u32,
    /// Range of the mothball pouch.
    pub mothball_pouch_range: u32,
    /// Damage of a mothball.
    pub mothball_pouch_damage: u32,
    /// Range of the fog tin.
    pub fog_tin_range: u32,
    /// Range of the grapple.
    pub grapple_range: u32,
    /// Chance that the grapple catches a gadget.
    pub grapple_hit_chance: f64,
    /// Chance that a wiretap breaks.
    pub wiretap_with_earplugs_fail_chance: f64,
    /// Chance that the mirror of wilderness swaps IP.
    pub mirror_swap_chance: f64,
    /// Chance of dodging a poured cocktail.
    pub cocktail_dodge_chance: f64,
    /// Health restored by a cocktail.
    pub cocktail_hp: u32,
    /// Chance that spying on an NPC yields a secret.
    pub spy_success_chance: f64,
    /// Chance that a babysitter action succeeds.
    pub babysitter_success_chance: f64,
    /// Chance that the honey trap redirects an action.
    pub honey_trap_success_chance: f64,
    /// Chance that an observation succeeds.
    pub observation_success_chance: f64,
    /// IP granted per chip at the end.
    pub chips_to_ip_factor: u32,
    /// IP granted per secret.
    pub secret_to_ip_factor: u32,
    /// Minimum roulette stake.
    pub min_chips_roulette: u32,
    /// Maximum roulette stake.
    pub max_chips_roulette: u32,
    /// Rounds before the janitor appears.
    pub round_limit: u32,
    /// Seconds per turn phase.
    pub turn_phase_limit: u32,
    /// IP for catching the cat with the diamond collar.
    pub cat_ip: u32,
    /// Strikes before disqualification.
    pub strike_maximum: u32,
    /// Seconds a game may stay paused.
    pub pause_limit: u32,
    /// Seconds a disconnected player has to reconnect.
    pub reconnect_limit: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            moledie_range: 3,
            bowler_blade_range: 3,
            bowler_blade_hit_chance: 0.5,
            bowler_blade_damage: 20,
            laser_compact_hit_chance: 0.5,
            rocket_pen_damage: 20,
            gas_gloss_damage: 15,
            mothball_pouch_range: 3,
            mothball_pouch_damage: 10,
            fog_tin_range: 3,
            grapple_range: 3,
            grapple_hit_chance: 0.5,
            wiretap_with_earplugs_fail_chance: 0.1,
            mirror_swap_chance: 0.5,
            cocktail_dodge_chance: 0.3,
            cocktail_hp: 15,
            spy_success_chance: 0.5,
            babysitter_success_chance: 0.5,
            honey_trap_success_chance: 0.5,
            observation_success_chance: 0.5,
            chips_to_ip_factor: 10,
            secret_to_ip_factor: 5,
            min_chips_roulette: 1,
            max_chips_roulette: 10,
            round_limit: 20,
            turn_phase_limit: 30,
            cat_ip: 10,
            strike_maximum: 3,
            pause_limit: 60,
            reconnect_limit: 60,
        }
    }
}

impl MatchConfig {
    /// Parses a configuration from JSON and checks every probability.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks that every probability lies in `[0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("bowlerBladeHitChance", self.bowler_blade_hit_chance),
            ("laserCompactHitChance", self.laser_compact_hit_chance),
            ("grappleHitChance", self.grapple_hit_chance),
            ("wiretapWithEarplugsFailChance", self.wiretap_with_earplugs_fail_chance),
            ("mirrorSwapChance", self.mirror_swap_chance),
            ("cocktailDodgeChance", self.cocktail_dodge_chance),
            ("spySuccessChance", self.spy_success_chance),
            ("babysitterSuccessChance", self.babysitter_success_chance),
            ("honeyTrapSuccessChance", self.honey_trap_success_chance),
            ("observationSuccessChance", self.observation_success_chance),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Certainty values the interpreter records for soft evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceWeights {
    /// A character outside my team spying on a person is probably an enemy agent.
    pub foreign_spy_enemy: f64,

    /// Chance a character holds the pocket litter when nothing is known.
    pub unknown_litter: f64,

    /// A character that held the moledie for a whole turn without throwing
    /// it is probably an NPC.
    pub moledie_keep_npc: f64,

    /// A character outside my team using a gadget is probably an enemy agent.
    pub foreign_gadget_enemy: f64,
}

impl Default for InferenceWeights {
    fn default() -> Self {
        Self {
            foreign_spy_enemy: 0.75,
            unknown_litter: 0.5,
            moledie_keep_npc: 0.6,
            foreign_gadget_enemy: 0.6,
        }
    }
}

/// Per-session client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Constants used when interpreting operations.
    pub inference: InferenceWeights,
}

impl SessionConfig {
    /// Replaces the inference weights.
    #[must_use]
    pub fn with_inference(mut self, inference: InferenceWeights) -> Self {
        self.inference = inference;
        self
    }
}
