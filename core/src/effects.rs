//! Per-colony modifier surface consulted by the systems.

use std::collections::BTreeSet;

use crate::{BoardSize, DiagonalDirection, EngineError, PlayerId, TileCoord};

/// Orthogonal growth probabilities for a colony.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrowthModifiers {
    /// Probability of growing into an orthogonal neighbour.
    pub base_chance: f32,
    /// Temporary additive surge probability stacked after the base chance.
    pub surge_bonus: f32,
}

/// Probabilities driving necrohyphal infiltration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InfiltrationChances {
    /// Probability of taking the first adjacent foreign dead cell.
    pub first: f32,
    /// Probability of each further step along the cascade.
    pub cascade: f32,
}

/// Supplies per-colony modifiers to the systems.
///
/// Every query fails with [`EngineError::UnknownOwner`] when the colony has no
/// record; systems propagate that error and abort the operation.
pub trait EffectCoordinator {
    /// Base orthogonal chance and any active surge bonus.
    fn growth_modifiers(&self, owner: PlayerId) -> Result<GrowthModifiers, EngineError>;

    /// Multiplier applied to every diagonal growth chance.
    fn diagonal_multiplier(&self, owner: PlayerId) -> Result<f32, EngineError>;

    /// Unscaled growth chance toward one diagonal direction.
    fn diagonal_chance(
        &self,
        owner: PlayerId,
        direction: DiagonalDirection,
    ) -> Result<f32, EngineError>;

    /// Probability of relocating into the first failed growth target.
    fn creep_chance(&self, owner: PlayerId) -> Result<f32, EngineError>;

    /// Whether creeping has matured enough to target toxin tiles.
    fn creeps_onto_toxin(&self, owner: PlayerId) -> Result<bool, EngineError>;

    /// Probability of restoring an adjacent dead cell of the same colony.
    fn reclaim_chance(&self, owner: PlayerId) -> Result<f32, EngineError>;

    /// Infiltration probabilities.
    fn infiltration_chances(&self, owner: PlayerId) -> Result<InfiltrationChances, EngineError>;

    /// Growth multiplier applied to a source tile near the board boundary.
    fn edge_multiplier(
        &self,
        owner: PlayerId,
        tile: TileCoord,
        board: BoardSize,
    ) -> Result<f32, EngineError>;

    /// Extra cycles added to toxins placed by the colony.
    fn toxin_duration_bonus(&self, owner: PlayerId) -> Result<u32, EngineError>;

    /// Age of a living cell after one more cycle.
    fn advance_age(&self, _owner: PlayerId, age: u32) -> u32 {
        age.saturating_add(1)
    }
}

/// Coordinator that grants every registered colony identical modifiers.
#[derive(Clone, Debug)]
pub struct UniformEffects {
    owners: BTreeSet<PlayerId>,
    /// Orthogonal growth chance.
    pub base_chance: f32,
    /// Surge bonus stacked after the base chance; zero disables surge.
    pub surge_bonus: f32,
    /// Multiplier applied to diagonal chances.
    pub diagonal_multiplier: f32,
    /// Diagonal chances indexed by [`DiagonalDirection::index`].
    pub diagonal_chances: [f32; 4],
    /// Creeping move probability.
    pub creep_chance: f32,
    /// Whether creeping may target toxin tiles.
    pub creeps_onto_toxin: bool,
    /// Reclaim probability.
    pub reclaim_chance: f32,
    /// Infiltration probabilities.
    pub infiltration: InfiltrationChances,
    /// Multiplier applied near the board edge.
    pub edge_multiplier: f32,
    /// Width of the perimeter band the edge multiplier applies to.
    pub edge_distance: u32,
    /// Extra toxin lifetime.
    pub toxin_duration_bonus: u32,
}

impl UniformEffects {
    /// Registers the colonies and starts with every modifier disabled.
    #[must_use]
    pub fn new(owners: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
            base_chance: 0.0,
            surge_bonus: 0.0,
            diagonal_multiplier: 1.0,
            diagonal_chances: [0.0; 4],
            creep_chance: 0.0,
            creeps_onto_toxin: false,
            reclaim_chance: 0.0,
            infiltration: InfiltrationChances::default(),
            edge_multiplier: 1.0,
            edge_distance: 0,
            toxin_duration_bonus: 0,
        }
    }

    fn known(&self, owner: PlayerId) -> Result<(), EngineError> {
        if self.owners.contains(&owner) {
            Ok(())
        } else {
            Err(EngineError::UnknownOwner(owner))
        }
    }
}

impl EffectCoordinator for UniformEffects {
    fn growth_modifiers(&self, owner: PlayerId) -> Result<GrowthModifiers, EngineError> {
        self.known(owner)?;
        Ok(GrowthModifiers {
            base_chance: self.base_chance,
            surge_bonus: self.surge_bonus,
        })
    }

    fn diagonal_multiplier(&self, owner: PlayerId) -> Result<f32, EngineError> {
        self.known(owner)?;
        Ok(self.diagonal_multiplier)
    }

    fn diagonal_chance(
        &self,
        owner: PlayerId,
        direction: DiagonalDirection,
    ) -> Result<f32, EngineError> {
        self.known(owner)?;
        Ok(self.diagonal_chances[direction.index()])
    }

    fn creep_chance(&self, owner: PlayerId) -> Result<f32, EngineError> {
        self.known(owner)?;
        Ok(self.creep_chance)
    }

    fn creeps_onto_toxin(&self, owner: PlayerId) -> Result<bool, EngineError> {
        self.known(owner)?;
        Ok(self.creeps_onto_toxin)
    }

    fn reclaim_chance(&self, owner: PlayerId) -> Result<f32, EngineError> {
        self.known(owner)?;
        Ok(self.reclaim_chance)
    }

    fn infiltration_chances(&self, owner: PlayerId) -> Result<InfiltrationChances, EngineError> {
        self.known(owner)?;
        Ok(self.infiltration)
    }

    fn edge_multiplier(
        &self,
        owner: PlayerId,
        tile: TileCoord,
        board: BoardSize,
    ) -> Result<f32, EngineError> {
        self.known(owner)?;
        if board.distance_to_edge(tile) < self.edge_distance {
            Ok(self.edge_multiplier)
        } else {
            Ok(1.0)
        }
    }

    fn toxin_duration_bonus(&self, owner: PlayerId) -> Result<u32, EngineError> {
        self.known(owner)?;
        Ok(self.toxin_duration_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::{EffectCoordinator, UniformEffects};
    use crate::{BoardSize, EngineError, PlayerId, TileCoord};

    #[test]
    fn unknown_owner_is_rejected() {
        let effects = UniformEffects::new([PlayerId::new(1)]);
        assert_eq!(
            effects.creep_chance(PlayerId::new(2)),
            Err(EngineError::UnknownOwner(PlayerId::new(2)))
        );
    }

    #[test]
    fn edge_multiplier_only_applies_inside_perimeter_band() {
        let owner = PlayerId::new(1);
        let mut effects = UniformEffects::new([owner]);
        effects.edge_multiplier = 2.0;
        effects.edge_distance = 2;
        let board = BoardSize::new(9, 9).expect("valid size");

        let on_edge = effects
            .edge_multiplier(owner, TileCoord::new(0, 4), board)
            .expect("known owner");
        let inner_ring = effects
            .edge_multiplier(owner, TileCoord::new(1, 4), board)
            .expect("known owner");
        let interior = effects
            .edge_multiplier(owner, TileCoord::new(4, 4), board)
            .expect("known owner");

        assert!((on_edge - 2.0).abs() < f32::EPSILON);
        assert!((inner_ring - 2.0).abs() < f32::EPSILON);
        assert!((interior - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn default_age_policy_increments() {
        let effects = UniformEffects::new([PlayerId::new(1)]);
        assert_eq!(effects.advance_age(PlayerId::new(1), 4), 5);
    }
}
