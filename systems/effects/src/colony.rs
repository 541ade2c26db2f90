//! Per-colony progression: mutation levels and owned mycovariants.

use serde::{Deserialize, Serialize};
use sporefront_core::PlayerId;

use crate::catalog::{MutationCatalog, MutationId};
use crate::EffectsError;

/// Special ability owned by a colony.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Mycovariant {
    /// Temporary additive growth bonus stacked after the base chance.
    HyphalSurge {
        /// Additive probability granted to every growth target.
        bonus: f32,
        /// Rounds left before the surge lapses.
        rounds_remaining: u32,
    },
    /// Growth multiplier for cells close to the board boundary.
    PerimeterProliferator {
        /// Multiplier applied to every growth chance near the edge.
        multiplier: f32,
        /// Cells closer than this many tiles to the edge qualify.
        edge_distance: u32,
    },
    /// One-shot line of living cells followed by toxins.
    JettingMycelium {
        /// Living segment length.
        living_length: u32,
        /// Toxin segment length.
        toxin_length: u32,
        /// Whether the ability has fired.
        used: bool,
    },
    /// One-shot line of living cells cut toward the board center.
    SurgicalVectoring {
        /// Maximum path length.
        max_length: u32,
        /// Whether the ability has fired.
        used: bool,
    },
    /// One-shot hardening of living cells into permanently resistant ones.
    MycelialBastion {
        /// Living cells hardened when the ability fires.
        cells: u32,
        /// Whether the ability has fired.
        used: bool,
    },
}

impl Mycovariant {
    /// Short name used in error reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::HyphalSurge { .. } => "hyphal_surge",
            Self::PerimeterProliferator { .. } => "perimeter_proliferator",
            Self::JettingMycelium { .. } => "jetting_mycelium",
            Self::SurgicalVectoring { .. } => "surgical_vectoring",
            Self::MycelialBastion { .. } => "mycelial_bastion",
        }
    }

    /// Rejects parameters the systems would refuse once the ability fires.
    pub fn validate(&self) -> Result<(), EffectsError> {
        let invalid = |reason| EffectsError::InvalidMycovariant {
            mycovariant: self.name(),
            reason,
        };
        match *self {
            Self::HyphalSurge { bonus, .. } => {
                if !(0.0..=1.0).contains(&bonus) {
                    return Err(invalid("bonus must lie within [0, 1]"));
                }
            }
            Self::PerimeterProliferator { multiplier, .. } => {
                if !multiplier.is_finite() || multiplier < 0.0 {
                    return Err(invalid("multiplier must be finite and non-negative"));
                }
            }
            Self::JettingMycelium {
                living_length,
                toxin_length,
                ..
            } => {
                if living_length == 0 || toxin_length == 0 {
                    return Err(invalid("segment lengths must be greater than zero"));
                }
            }
            Self::SurgicalVectoring { max_length, .. } => {
                if max_length == 0 {
                    return Err(invalid("max_length must be greater than zero"));
                }
            }
            Self::MycelialBastion { cells, .. } => {
                if cells == 0 {
                    return Err(invalid("cells must be greater than zero"));
                }
            }
        }
        Ok(())
    }
}

/// Progress of a single colony.
#[derive(Clone, Debug, PartialEq)]
pub struct Colony {
    id: PlayerId,
    levels: Vec<u8>,
    mycovariants: Vec<Mycovariant>,
}

impl Colony {
    /// Creates a colony with every mutation at level zero.
    #[must_use]
    pub fn new(id: PlayerId, catalog: &MutationCatalog) -> Self {
        Self {
            id,
            levels: vec![0; catalog.len()],
            mycovariants: Vec::new(),
        }
    }

    /// Identifier of the colony.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Current level of a mutation; unknown mutations report zero.
    #[must_use]
    pub fn level(&self, mutation: MutationId) -> u8 {
        self.levels.get(mutation.index()).copied().unwrap_or(0)
    }

    /// Raises a mutation by one level and returns the new level.
    pub fn upgrade(
        &mut self,
        catalog: &MutationCatalog,
        mutation: MutationId,
    ) -> Result<u8, EffectsError> {
        let definition = catalog.get(mutation)?;
        let current = self.level(mutation);
        if current >= definition.max_level {
            return Err(EffectsError::LevelCapReached {
                mutation,
                max_level: definition.max_level,
            });
        }
        for prerequisite in &definition.prerequisites {
            if self.level(prerequisite.mutation) < prerequisite.level {
                return Err(EffectsError::MissingPrerequisite {
                    mutation,
                    required: prerequisite.mutation,
                    level: prerequisite.level,
                });
            }
        }

        if self.levels.len() < catalog.len() {
            self.levels.resize(catalog.len(), 0);
        }
        let next = current + 1;
        self.levels[mutation.index()] = next;
        tracing::debug!(colony = %self.id, %mutation, level = next, "mutation upgraded");
        Ok(next)
    }

    /// Every owned mycovariant.
    #[must_use]
    pub fn mycovariants(&self) -> &[Mycovariant] {
        &self.mycovariants
    }

    /// Adds a mycovariant to the colony.
    pub fn grant(&mut self, mycovariant: Mycovariant) {
        self.mycovariants.push(mycovariant);
    }

    /// Sum of active surge bonuses.
    #[must_use]
    pub fn surge_bonus(&self) -> f32 {
        self.mycovariants
            .iter()
            .map(|mycovariant| match *mycovariant {
                Mycovariant::HyphalSurge {
                    bonus,
                    rounds_remaining,
                } if rounds_remaining > 0 => bonus,
                _ => 0.0,
            })
            .sum()
    }

    /// Strongest perimeter multiplier with its qualifying band width.
    #[must_use]
    pub fn perimeter(&self) -> Option<(f32, u32)> {
        self.mycovariants
            .iter()
            .filter_map(|mycovariant| match *mycovariant {
                Mycovariant::PerimeterProliferator {
                    multiplier,
                    edge_distance,
                } => Some((multiplier, edge_distance)),
                _ => None,
            })
            .reduce(|best, candidate| if candidate.0 > best.0 { candidate } else { best })
    }

    /// Fires the first unused jetting ability, returning its segment lengths.
    pub fn take_jet(&mut self) -> Option<(u32, u32)> {
        self.mycovariants
            .iter_mut()
            .find_map(|mycovariant| match mycovariant {
                Mycovariant::JettingMycelium {
                    living_length,
                    toxin_length,
                    used,
                } if !*used => {
                    *used = true;
                    Some((*living_length, *toxin_length))
                }
                _ => None,
            })
    }

    /// Fires the first unused vectoring ability, returning its maximum length.
    pub fn take_vectoring(&mut self) -> Option<u32> {
        self.mycovariants
            .iter_mut()
            .find_map(|mycovariant| match mycovariant {
                Mycovariant::SurgicalVectoring { max_length, used } if !*used => {
                    *used = true;
                    Some(*max_length)
                }
                _ => None,
            })
    }

    /// Fires the first unused bastion, returning how many cells it hardens.
    pub fn take_bastion(&mut self) -> Option<u32> {
        self.mycovariants
            .iter_mut()
            .find_map(|mycovariant| match mycovariant {
                Mycovariant::MycelialBastion { cells, used } if !*used => {
                    *used = true;
                    Some(*cells)
                }
                _ => None,
            })
    }

    /// Counts down surges and drops the ones that lapsed.
    pub fn end_round(&mut self) {
        for mycovariant in &mut self.mycovariants {
            if let Mycovariant::HyphalSurge {
                rounds_remaining, ..
            } = mycovariant
            {
                *rounds_remaining = rounds_remaining.saturating_sub(1);
            }
        }
        self.mycovariants.retain(|mycovariant| {
            !matches!(
                mycovariant,
                Mycovariant::HyphalSurge {
                    rounds_remaining: 0,
                    ..
                }
            )
        });
    }
}
