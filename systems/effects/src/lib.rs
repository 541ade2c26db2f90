#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reference effect coordinator built from mutation levels and mycovariants.
//!
//! Balance data lives in an immutable [`MutationCatalog`] that is constructed
//! once and shared by every colony. The [`EffectTable`] folds each colony's
//! levels and abilities into the modifiers the growth systems query.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sporefront_core::{
    BoardSize, DiagonalDirection, EffectCoordinator, EngineError, GrowthModifiers,
    InfiltrationChances, PlayerId, TileCoord,
};
use thiserror::Error;

mod catalog;
mod colony;

pub use catalog::{MutationCatalog, MutationDefinition, MutationId, MutationKind, Prerequisite};
pub use colony::{Colony, Mycovariant};

/// Failures raised while building or progressing colonies.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EffectsError {
    /// The mutation id does not exist in the catalog.
    #[error("mutation {0} is not defined")]
    UnknownMutation(MutationId),
    /// The mutation is already at its highest level.
    #[error("mutation {mutation} is already at its cap of {max_level}")]
    LevelCapReached {
        /// Mutation that was upgraded.
        mutation: MutationId,
        /// Level cap of the mutation.
        max_level: u8,
    },
    /// A prerequisite has not reached its required level.
    #[error("mutation {mutation} requires {required} at level {level}")]
    MissingPrerequisite {
        /// Mutation that was upgraded.
        mutation: MutationId,
        /// Mutation that must be levelled first.
        required: MutationId,
        /// Level the prerequisite must reach.
        level: u8,
    },
    /// A prerequisite points at itself or a later definition.
    #[error("mutation {mutation} lists {required} as a prerequisite out of order")]
    InvalidPrerequisite {
        /// Mutation carrying the prerequisite.
        mutation: MutationId,
        /// Offending prerequisite.
        required: MutationId,
    },
    /// A definition carries unusable balance values.
    #[error("mutation {mutation} is malformed: {reason}")]
    InvalidDefinition {
        /// Offending mutation.
        mutation: MutationId,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A mycovariant carries parameters the systems would reject.
    #[error("mycovariant {mycovariant} is malformed: {reason}")]
    InvalidMycovariant {
        /// Kind of the offending mycovariant.
        mycovariant: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The colony was registered twice.
    #[error("colony {0} is already registered")]
    DuplicateColony(PlayerId),
    /// The colony has no record.
    #[error("colony {0} is not registered")]
    UnknownColony(PlayerId),
    /// A baseline probability fell outside `[0, 1]`.
    #[error("{what} must lie within [0, 1], got {value}")]
    InvalidProbability {
        /// Name of the offending probability.
        what: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Baseline chances and the mutation catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Orthogonal growth chance of a colony without upgrades.
    pub base_growth_chance: f32,
    /// Diagonal multiplier of a colony without upgrades.
    pub base_diagonal_multiplier: f32,
    /// Mutation definitions.
    pub catalog: MutationCatalog,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            base_growth_chance: 0.1,
            base_diagonal_multiplier: 1.0,
            catalog: MutationCatalog::standard(),
        }
    }
}

impl BalanceConfig {
    /// Rejects out-of-range baselines and malformed catalogs.
    pub fn validate(&self) -> Result<(), EffectsError> {
        if !(0.0..=1.0).contains(&self.base_growth_chance) {
            return Err(EffectsError::InvalidProbability {
                what: "base_growth_chance",
                value: self.base_growth_chance,
            });
        }
        if self.base_diagonal_multiplier < 0.0 {
            return Err(EffectsError::InvalidProbability {
                what: "base_diagonal_multiplier",
                value: self.base_diagonal_multiplier,
            });
        }
        self.catalog.validate()
    }
}

/// Effect coordinator backed by registered colonies.
#[derive(Clone, Debug)]
pub struct EffectTable {
    balance: BalanceConfig,
    colonies: BTreeMap<PlayerId, Colony>,
}

impl EffectTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(balance: BalanceConfig) -> Self {
        Self {
            balance,
            colonies: BTreeMap::new(),
        }
    }

    /// Balance shared by every colony.
    #[must_use]
    pub fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    /// Registers a colony with every mutation at level zero.
    pub fn register(&mut self, id: PlayerId) -> Result<&mut Colony, EffectsError> {
        if self.colonies.contains_key(&id) {
            return Err(EffectsError::DuplicateColony(id));
        }
        let colony = Colony::new(id, &self.balance.catalog);
        Ok(self.colonies.entry(id).or_insert(colony))
    }

    /// Colony registered under `id`.
    pub fn colony(&self, id: PlayerId) -> Result<&Colony, EffectsError> {
        self.colonies.get(&id).ok_or(EffectsError::UnknownColony(id))
    }

    /// Mutable colony registered under `id`.
    pub fn colony_mut(&mut self, id: PlayerId) -> Result<&mut Colony, EffectsError> {
        self.colonies
            .get_mut(&id)
            .ok_or(EffectsError::UnknownColony(id))
    }

    /// Identifiers of every registered colony.
    pub fn colony_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.colonies.keys().copied()
    }

    /// Raises a colony's mutation by one level.
    pub fn upgrade(&mut self, id: PlayerId, mutation: MutationId) -> Result<u8, EffectsError> {
        let colony = self
            .colonies
            .get_mut(&id)
            .ok_or(EffectsError::UnknownColony(id))?;
        colony.upgrade(&self.balance.catalog, mutation)
    }

    /// Counts down every colony's temporary abilities.
    pub fn end_round(&mut self) {
        for colony in self.colonies.values_mut() {
            colony.end_round();
        }
    }

    fn lookup(&self, owner: PlayerId) -> Result<&Colony, EngineError> {
        self.colonies
            .get(&owner)
            .ok_or(EngineError::UnknownOwner(owner))
    }

    /// Sums `level * effect` over every mutation matching `kind`.
    fn total<F>(&self, colony: &Colony, matches: F) -> f32
    where
        F: Fn(&MutationKind) -> bool,
    {
        self.balance
            .catalog
            .iter()
            .filter(|(_, definition)| matches(&definition.kind))
            .map(|(id, definition)| f32::from(colony.level(id)) * definition.effect_per_level)
            .sum()
    }

    fn at_cap<F>(&self, colony: &Colony, matches: F) -> bool
    where
        F: Fn(&MutationKind) -> bool,
    {
        self.balance.catalog.iter().any(|(id, definition)| {
            matches(&definition.kind) && colony.level(id) >= definition.max_level
        })
    }
}

fn probability(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

impl EffectCoordinator for EffectTable {
    fn growth_modifiers(&self, owner: PlayerId) -> Result<GrowthModifiers, EngineError> {
        let colony = self.lookup(owner)?;
        let bonus = self.total(colony, |kind| matches!(kind, MutationKind::HyphalGrowth));
        Ok(GrowthModifiers {
            base_chance: probability(self.balance.base_growth_chance + bonus),
            surge_bonus: colony.surge_bonus(),
        })
    }

    fn diagonal_multiplier(&self, owner: PlayerId) -> Result<f32, EngineError> {
        let colony = self.lookup(owner)?;
        let affinity = self.total(colony, |kind| matches!(kind, MutationKind::DiagonalAffinity));
        Ok(self.balance.base_diagonal_multiplier * (1.0 + affinity))
    }

    fn diagonal_chance(
        &self,
        owner: PlayerId,
        direction: DiagonalDirection,
    ) -> Result<f32, EngineError> {
        let colony = self.lookup(owner)?;
        let chance = self.total(colony, |kind| {
            matches!(kind, MutationKind::TendrilReach { direction: reach } if *reach == direction)
        });
        Ok(probability(chance))
    }

    fn creep_chance(&self, owner: PlayerId) -> Result<f32, EngineError> {
        let colony = self.lookup(owner)?;
        Ok(probability(self.total(colony, |kind| {
            matches!(kind, MutationKind::CreepingMold)
        })))
    }

    fn creeps_onto_toxin(&self, owner: PlayerId) -> Result<bool, EngineError> {
        let colony = self.lookup(owner)?;
        Ok(self.at_cap(colony, |kind| matches!(kind, MutationKind::CreepingMold)))
    }

    fn reclaim_chance(&self, owner: PlayerId) -> Result<f32, EngineError> {
        let colony = self.lookup(owner)?;
        Ok(probability(self.total(colony, |kind| {
            matches!(kind, MutationKind::Reclamation)
        })))
    }

    fn infiltration_chances(&self, owner: PlayerId) -> Result<InfiltrationChances, EngineError> {
        let colony = self.lookup(owner)?;
        let (first, cascade) = self
            .balance
            .catalog
            .iter()
            .filter(|(_, definition)| {
                matches!(definition.kind, MutationKind::NecrohyphalInfiltration)
            })
            .fold((0.0, 0.0), |(first, cascade), (id, definition)| {
                let level = f32::from(colony.level(id));
                (
                    first + level * definition.effect_per_level,
                    cascade + level * definition.secondary_per_level,
                )
            });
        Ok(InfiltrationChances {
            first: probability(first),
            cascade: probability(cascade),
        })
    }

    fn edge_multiplier(
        &self,
        owner: PlayerId,
        tile: TileCoord,
        board: BoardSize,
    ) -> Result<f32, EngineError> {
        let colony = self.lookup(owner)?;
        match colony.perimeter() {
            Some((multiplier, edge_distance)) if board.distance_to_edge(tile) < edge_distance => {
                Ok(multiplier)
            }
            _ => Ok(1.0),
        }
    }

    fn toxin_duration_bonus(&self, owner: PlayerId) -> Result<u32, EngineError> {
        let colony = self.lookup(owner)?;
        let bonus = self.total(colony, |kind| matches!(kind, MutationKind::ToxinPotency));
        Ok(bonus.max(0.0).floor() as u32)
    }

    fn advance_age(&self, owner: PlayerId, age: u32) -> u32 {
        let next = age.saturating_add(1);
        let Ok(colony) = self.lookup(owner) else {
            debug_assert!(false, "advance_age queried for unregistered colony {owner}");
            return next;
        };
        let resets = self.balance.catalog.iter().any(|(id, definition)| {
            matches!(definition.kind, MutationKind::AgeReset { threshold } if next >= threshold)
                && colony.level(id) > 0
        });
        if resets {
            0
        } else {
            next
        }
    }
}
