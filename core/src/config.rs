//! Read-only engine configuration supplied once at construction.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// What an expired toxin deposit leaves behind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToxinResidue {
    /// The tile becomes empty.
    #[default]
    Empty,
    /// The tile becomes a dead cell of the placing colony.
    Dead,
}

/// Decay pass tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayTuning {
    /// Death probability of a freshly grown cell.
    pub base_death_chance: f32,
    /// Added to the death probability for every cycle of age.
    pub age_death_increment: f32,
    /// Cells at or beyond this age always die.
    pub max_age: u32,
}

impl Default for DecayTuning {
    fn default() -> Self {
        Self {
            base_death_chance: 0.02,
            age_death_increment: 0.004,
            max_age: 40,
        }
    }
}

/// Engine-wide parameters shared by every system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of cycles a freshly placed toxin survives before bonuses.
    pub toxin_base_duration: u32,
    /// Residue left by expired toxins.
    pub toxin_residue: ToxinResidue,
    /// Size of the candidate pool vectoring picks from when every origin is blocked.
    pub vectoring_fallback_pool: usize,
    /// Decay pass tuning.
    pub decay: DecayTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            toxin_base_duration: 4,
            toxin_residue: ToxinResidue::Empty,
            vectoring_fallback_pool: 3,
            decay: DecayTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Rejects zero lengths and probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.toxin_base_duration == 0 {
            return Err(EngineError::InvalidLength {
                what: "toxin_base_duration",
            });
        }
        if self.vectoring_fallback_pool == 0 {
            return Err(EngineError::InvalidLength {
                what: "vectoring_fallback_pool",
            });
        }
        if self.decay.max_age == 0 {
            return Err(EngineError::InvalidLength {
                what: "decay.max_age",
            });
        }
        check_probability("decay.base_death_chance", self.decay.base_death_chance)?;
        check_probability("decay.age_death_increment", self.decay.age_death_increment)
    }
}

pub(crate) fn check_probability(what: &'static str, value: f32) -> Result<(), EngineError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidProbability { what, value })
    }
}
