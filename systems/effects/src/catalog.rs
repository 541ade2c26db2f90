//! Immutable mutation definitions stored in an index-addressed arena.

use std::fmt;

use serde::{Deserialize, Serialize};
use sporefront_core::DiagonalDirection;

use crate::EffectsError;

/// Index of a mutation inside its [`MutationCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(u16);

impl MutationId {
    /// Creates a mutation identifier from its arena index.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Position of the mutation within the catalog.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Modifier a mutation contributes once levelled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MutationKind {
    /// Raises the orthogonal growth chance by `effect_per_level` per level.
    HyphalGrowth,
    /// Grants growth toward one diagonal by `effect_per_level` per level.
    TendrilReach {
        /// Diagonal the tendril reaches toward.
        direction: DiagonalDirection,
    },
    /// Scales every diagonal chance by `1 + effect_per_level * level`.
    DiagonalAffinity,
    /// Creeping move chance; at the level cap creeping may target toxins.
    CreepingMold,
    /// Chance of restoring an adjacent dead cell of the same colony.
    Reclamation,
    /// First infiltration chance per level, with `secondary_per_level` for cascades.
    NecrohyphalInfiltration,
    /// Extra toxin lifetime in whole cycles per level.
    ToxinPotency,
    /// Living cells reaching `threshold` age restart at zero.
    AgeReset {
        /// Age at which the reset triggers.
        threshold: u32,
    },
}

/// Level requirement on another mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    /// Required mutation.
    pub mutation: MutationId,
    /// Minimum level of the required mutation.
    pub level: u8,
}

/// Balance data for a single mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationDefinition {
    /// Stable lookup name.
    pub name: String,
    /// Modifier granted by the mutation.
    #[serde(flatten)]
    pub kind: MutationKind,
    /// Highest purchasable level.
    pub max_level: u8,
    /// Primary effect added per level.
    pub effect_per_level: f32,
    /// Secondary effect added per level, when the kind uses one.
    #[serde(default)]
    pub secondary_per_level: f32,
    /// Mutations that must be levelled first.
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

/// Arena of mutation definitions.
///
/// Prerequisites always point at lower indices so chains can be walked
/// without cycles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationCatalog {
    mutations: Vec<MutationDefinition>,
}

impl MutationCatalog {
    /// Builds a catalog, rejecting prerequisites that do not point backwards.
    pub fn new(mutations: Vec<MutationDefinition>) -> Result<Self, EffectsError> {
        let catalog = Self { mutations };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks that every prerequisite references an earlier definition and
    /// that every per-level effect is non-negative.
    pub fn validate(&self) -> Result<(), EffectsError> {
        for (id, definition) in self.iter() {
            if definition.max_level == 0 {
                return Err(EffectsError::InvalidDefinition {
                    mutation: id,
                    reason: "max_level must be greater than zero",
                });
            }
            if definition.effect_per_level < 0.0 || definition.secondary_per_level < 0.0 {
                return Err(EffectsError::InvalidDefinition {
                    mutation: id,
                    reason: "per-level effects must not be negative",
                });
            }
            for prerequisite in &definition.prerequisites {
                if prerequisite.mutation >= id {
                    return Err(EffectsError::InvalidPrerequisite {
                        mutation: id,
                        required: prerequisite.mutation,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the catalog holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Definition stored under `id`.
    pub fn get(&self, id: MutationId) -> Result<&MutationDefinition, EffectsError> {
        self.mutations
            .get(id.index())
            .ok_or(EffectsError::UnknownMutation(id))
    }

    /// Looks a mutation up by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<MutationId> {
        self.iter()
            .find(|(_, definition)| definition.name == name)
            .map(|(id, _)| id)
    }

    /// Every definition paired with its identifier.
    pub fn iter(&self) -> impl Iterator<Item = (MutationId, &MutationDefinition)> {
        self.mutations
            .iter()
            .enumerate()
            .map(|(index, definition)| (MutationId::new(index as u16), definition))
    }

    /// Default balance shipped with the engine.
    #[must_use]
    pub fn standard() -> Self {
        let growth = MutationId::new(0);
        let reclamation = MutationId::new(6);
        let mut mutations = vec![
            definition("hyphal_growth", MutationKind::HyphalGrowth, 10, 0.02, &[]),
        ];
        for (direction, name) in [
            (DiagonalDirection::NorthEast, "tendril_northeast"),
            (DiagonalDirection::SouthEast, "tendril_southeast"),
            (DiagonalDirection::SouthWest, "tendril_southwest"),
            (DiagonalDirection::NorthWest, "tendril_northwest"),
        ] {
            mutations.push(definition(
                name,
                MutationKind::TendrilReach { direction },
                5,
                0.01,
                &[(growth, 2)],
            ));
        }
        mutations.push(definition(
            "diagonal_affinity",
            MutationKind::DiagonalAffinity,
            5,
            0.1,
            &[(growth, 3)],
        ));
        mutations.push(definition(
            "reclamation",
            MutationKind::Reclamation,
            5,
            0.04,
            &[],
        ));
        mutations.push(definition(
            "creeping_mold",
            MutationKind::CreepingMold,
            4,
            0.05,
            &[(growth, 3)],
        ));
        let mut infiltration = definition(
            "necrohyphal_infiltration",
            MutationKind::NecrohyphalInfiltration,
            3,
            0.05,
            &[(reclamation, 2)],
        );
        infiltration.secondary_per_level = 0.1;
        mutations.push(infiltration);
        mutations.push(definition(
            "toxin_potency",
            MutationKind::ToxinPotency,
            3,
            1.0,
            &[],
        ));
        mutations.push(definition(
            "chronoreset",
            MutationKind::AgeReset { threshold: 20 },
            1,
            0.0,
            &[(growth, 5)],
        ));

        Self { mutations }
    }
}

impl Default for MutationCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn definition(
    name: &str,
    kind: MutationKind,
    max_level: u8,
    effect_per_level: f32,
    prerequisites: &[(MutationId, u8)],
) -> MutationDefinition {
    MutationDefinition {
        name: name.to_owned(),
        kind,
        max_level,
        effect_per_level,
        secondary_per_level: 0.0,
        prerequisites: prerequisites
            .iter()
            .map(|&(mutation, level)| Prerequisite { mutation, level })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_well_formed() {
        let catalog = MutationCatalog::standard();
        assert_eq!(catalog.validate(), Ok(()));
        assert_eq!(catalog.find("hyphal_growth"), Some(MutationId::new(0)));
        assert_eq!(catalog.find("reclamation"), Some(MutationId::new(6)));
        assert_eq!(catalog.find("missing"), None);
    }

    #[test]
    fn forward_prerequisites_are_rejected() {
        let first = MutationDefinition {
            name: "first".to_owned(),
            kind: MutationKind::HyphalGrowth,
            max_level: 1,
            effect_per_level: 0.1,
            secondary_per_level: 0.0,
            prerequisites: vec![Prerequisite {
                mutation: MutationId::new(1),
                level: 1,
            }],
        };
        let second = MutationDefinition {
            name: "second".to_owned(),
            prerequisites: Vec::new(),
            ..first.clone()
        };

        assert_eq!(
            MutationCatalog::new(vec![first, second]),
            Err(EffectsError::InvalidPrerequisite {
                mutation: MutationId::new(0),
                required: MutationId::new(1),
            })
        );
    }

    #[test]
    fn catalog_parses_from_toml() {
        let catalog: MutationCatalog = toml::from_str(
            r#"
            [[mutations]]
            name = "growth"
            kind = "hyphal_growth"
            max_level = 3
            effect_per_level = 0.1

            [[mutations]]
            name = "reach"
            kind = "tendril_reach"
            direction = "NorthEast"
            max_level = 2
            effect_per_level = 0.05
            prerequisites = [{ mutation = 0, level = 1 }]
            "#,
        )
        .expect("parse catalog");

        assert_eq!(catalog.validate(), Ok(()));
        let reach = catalog.get(MutationId::new(1)).expect("defined");
        assert_eq!(
            reach.kind,
            MutationKind::TendrilReach {
                direction: DiagonalDirection::NorthEast
            }
        );
        assert_eq!(reach.prerequisites[0].mutation, MutationId::new(0));
    }
}
