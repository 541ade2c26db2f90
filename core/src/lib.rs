#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sporefront engine.
//!
//! This crate defines the vocabulary that connects the authoritative board,
//! the pure systems that mutate it, and the adapters that drive a session.
//! Systems borrow the board for a single cycle, consult an
//! [`EffectCoordinator`] for per-colony modifiers, draw from a shared
//! [`RandomSource`], and report what happened as [`Event`] values pushed into
//! caller-owned buffers. Deaths are additionally reported through the narrow
//! [`DeathRecorder`] surface so decay bookkeeping stays outside the growth
//! engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod config;
mod effects;
mod geometry;
mod random;

pub use config::{DecayTuning, EngineConfig, ToxinResidue};
pub use effects::{EffectCoordinator, GrowthModifiers, InfiltrationChances, UniformEffects};
pub use geometry::{Adjacency, BoardSize, CardinalDirection, DiagonalDirection, TileCoord};
pub use random::{RandomSource, SimRng};

/// Identifier of a competing colony.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u16);

impl PlayerId {
    /// Creates a new colony identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Dense index of a tile, bijective with its [`TileCoord`] on a given board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a tile identifier from its raw index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index usable for slice access.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Occupancy state of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupancy {
    /// Nothing grows on the tile.
    #[default]
    Empty,
    /// A living cell belonging to `owner`.
    Alive {
        /// Colony that owns the living cell.
        owner: PlayerId,
    },
    /// A dead cell that last belonged to `owner`.
    Dead {
        /// Colony the cell belonged to when it died.
        owner: PlayerId,
    },
    /// A toxin deposit that blocks ordinary growth until it expires.
    Toxin {
        /// Colony that placed the toxin.
        owner: PlayerId,
        /// Age at which the deposit evaporates.
        expires_at_age: u32,
    },
}

impl Occupancy {
    /// Colony associated with the occupancy, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<PlayerId> {
        match *self {
            Self::Empty => None,
            Self::Alive { owner } | Self::Dead { owner } | Self::Toxin { owner, .. } => Some(owner),
        }
    }

    /// Reports whether the tile is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Reports whether the tile holds a living cell.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self, Self::Alive { .. })
    }

    /// Reports whether the tile holds a dead cell.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        matches!(self, Self::Dead { .. })
    }

    /// Reports whether the tile holds a toxin deposit.
    #[must_use]
    pub const fn is_toxin(&self) -> bool {
        matches!(self, Self::Toxin { .. })
    }

    /// Living colony occupying the tile, if any.
    #[must_use]
    pub const fn living_owner(&self) -> Option<PlayerId> {
        match *self {
            Self::Alive { owner } => Some(owner),
            _ => None,
        }
    }

    /// Colony whose dead cell rests on the tile, if any.
    #[must_use]
    pub const fn dead_owner(&self) -> Option<PlayerId> {
        match *self {
            Self::Dead { owner } => Some(owner),
            _ => None,
        }
    }
}

/// Result of asking the takeover resolver to claim an occupied tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TakeoverOutcome {
    /// A foreign living or dead cell (or a permitted toxin) was overwritten.
    Parasitized,
    /// The requester's own dead cell was restored.
    Reclaimed,
    /// The requester's own dead cell was restored under the catabolic mode.
    CatabolicGrowth,
    /// The requester already owns the living cell; nothing changed.
    AlreadyOwned,
    /// The target cell is resistant; nothing changed.
    InvalidBecauseResistant,
    /// The request could not be applied to the target; nothing changed.
    Invalid,
}

impl TakeoverOutcome {
    /// Reports whether the outcome mutated the target cell.
    #[must_use]
    pub const fn claimed(self) -> bool {
        matches!(
            self,
            Self::Parasitized | Self::Reclaimed | Self::CatabolicGrowth
        )
    }
}

/// Selects which outcome a successful reclaim of an own dead cell reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReclaimMode {
    /// Reports [`TakeoverOutcome::Reclaimed`].
    #[default]
    Standard,
    /// Reports [`TakeoverOutcome::CatabolicGrowth`].
    Catabolic,
}

/// Which probability band a successful growth roll landed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthKind {
    /// The roll fell below the primary chance.
    Standard,
    /// The roll missed the primary chance but fell inside the stacked surge bonus.
    Surge,
}

/// Candidate tile considered by a single source cell during one growth cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthTarget {
    /// Tile the source cell may grow into.
    pub tile: TileId,
    /// Coordinate of the candidate tile.
    pub coord: TileCoord,
    /// Relationship between the source and the candidate.
    pub adjacency: Adjacency,
    /// Probability of standard growth.
    pub chance: f32,
    /// Additional probability stacked after `chance` while a surge is active.
    pub surge_bonus: Option<f32>,
}

impl GrowthTarget {
    /// Classifies a uniform roll in `[0, 1)` against the target's probability bands.
    ///
    /// The primary band is checked first; the surge band only ever catches rolls
    /// that already missed the primary chance.
    #[must_use]
    pub fn resolve(&self, roll: f32) -> Option<GrowthKind> {
        if roll < self.chance {
            return Some(GrowthKind::Standard);
        }

        match self.surge_bonus {
            Some(bonus) if roll < self.chance + bonus => Some(GrowthKind::Surge),
            _ => None,
        }
    }
}

/// Reason a living cell died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeathCause {
    /// The cell reached the configured maximum age.
    Age,
    /// The cell failed its random survival roll.
    Randomness,
    /// The cell sat in the toxin segment of a directional projection.
    Jetting,
    /// The cell stood on a vectoring path.
    Vectoring,
}

/// Telemetry broadcast by systems after mutating the board.
///
/// Events are informational; nothing in the engine reads them back.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// A growth cycle began.
    CycleStarted {
        /// Zero-based index of the cycle.
        cycle: u64,
    },
    /// A living cell placed a new living cell on an empty tile.
    CellGrew {
        /// Colony that grew.
        owner: PlayerId,
        /// Source tile that produced the growth.
        source: TileId,
        /// Newly occupied tile.
        tile: TileId,
        /// Relationship between source and new tile.
        adjacency: Adjacency,
        /// Probability band that produced the growth.
        kind: GrowthKind,
    },
    /// A living cell relocated instead of duplicating.
    CellCrept {
        /// Colony that moved.
        owner: PlayerId,
        /// Tile vacated by the move.
        from: TileId,
        /// Tile occupied after the move.
        to: TileId,
    },
    /// A colony restored one of its own dead cells.
    CellReclaimed {
        /// Colony that reclaimed the cell.
        owner: PlayerId,
        /// Reclaimed tile.
        tile: TileId,
    },
    /// A colony overtook a foreign dead cell through infiltration.
    CellInfiltrated {
        /// Colony that infiltrated.
        owner: PlayerId,
        /// Previous owner of the dead cell.
        victim: PlayerId,
        /// Infiltrated tile.
        tile: TileId,
        /// Zero for the initial infiltration, then one per cascade step.
        depth: u32,
    },
    /// Every growth option of a living cell failed this cycle.
    GrowthFailed {
        /// Colony whose growth failed.
        owner: PlayerId,
        /// Source tile that failed to grow.
        tile: TileId,
    },
    /// A living cell was claimed by a takeover request.
    CellTakenOver {
        /// Colony that issued the takeover.
        owner: PlayerId,
        /// Tile the takeover targeted.
        tile: TileId,
        /// Outcome reported by the resolver.
        outcome: TakeoverOutcome,
    },
    /// An ability placed a fresh living cell.
    CellColonized {
        /// Colony that received the cell.
        owner: PlayerId,
        /// Colonized tile.
        tile: TileId,
    },
    /// A living cell died.
    CellKilled {
        /// Colony that lost the cell.
        owner: PlayerId,
        /// Tile the cell occupied.
        tile: TileId,
        /// Reason the cell died.
        cause: DeathCause,
    },
    /// A living cell became permanently resistant.
    CellFortified {
        /// Colony that owns the cell.
        owner: PlayerId,
        /// Hardened tile.
        tile: TileId,
    },
    /// A toxin deposit was placed or refreshed.
    ToxinPlaced {
        /// Colony that placed the toxin.
        owner: PlayerId,
        /// Poisoned tile.
        tile: TileId,
        /// Age at which the deposit evaporates.
        expires_at_age: u32,
    },
    /// A toxin deposit reached its expiration age.
    ToxinExpired {
        /// Colony that placed the toxin.
        owner: PlayerId,
        /// Tile the deposit occupied.
        tile: TileId,
    },
    /// A growth cycle finished aging and toxin expiry.
    CycleCompleted {
        /// Zero-based index of the cycle.
        cycle: u64,
    },
}

/// Collaborator that receives death reports for bookkeeping.
pub trait DeathRecorder {
    /// Records `count` deaths of `owner`'s cells attributed to `cause`.
    fn record_death(&mut self, owner: PlayerId, cause: DeathCause, count: u32);
}

/// Integration failures that indicate a caller bug.
///
/// Ordinary contention never produces an error; these variants abort the
/// operation that observed them.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// The requested board dimensions are zero or overflow the tile index space.
    #[error("board dimensions {width}x{height} are not usable")]
    InvalidBoardSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A tile index does not exist on the board.
    #[error("tile {tile} is outside a board of {tile_count} tiles")]
    TileOutOfRange {
        /// Offending tile.
        tile: TileId,
        /// Number of tiles on the board.
        tile_count: usize,
    },
    /// A coordinate does not exist on the board.
    #[error("coordinate {coord} lies outside a {width}x{height} board")]
    CoordOutOfRange {
        /// Offending coordinate.
        coord: TileCoord,
        /// Board width.
        width: u32,
        /// Board height.
        height: u32,
    },
    /// An owner id has no corresponding colony record.
    #[error("no colony record exists for owner {0}")]
    UnknownOwner(PlayerId),
    /// A configured or requested length was zero.
    #[error("{what} must be greater than zero")]
    InvalidLength {
        /// Name of the offending length.
        what: &'static str,
    },
    /// A configured probability fell outside `[0, 1]`.
    #[error("{what} must lie within [0, 1], got {value}")]
    InvalidProbability {
        /// Name of the offending probability.
        what: &'static str,
        /// Rejected value.
        value: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        Adjacency, CardinalDirection, GrowthKind, GrowthTarget, Occupancy, PlayerId,
        TakeoverOutcome, TileCoord, TileId,
    };

    fn target(chance: f32, surge_bonus: Option<f32>) -> GrowthTarget {
        GrowthTarget {
            tile: TileId::new(0),
            coord: TileCoord::new(0, 0),
            adjacency: Adjacency::Orthogonal(CardinalDirection::North),
            chance,
            surge_bonus,
        }
    }

    #[test]
    fn primary_band_wins_before_surge_band() {
        let candidate = target(0.4, Some(0.3));
        assert_eq!(candidate.resolve(0.1), Some(GrowthKind::Standard));
        assert_eq!(candidate.resolve(0.39), Some(GrowthKind::Standard));
        assert_eq!(candidate.resolve(0.4), Some(GrowthKind::Surge));
        assert_eq!(candidate.resolve(0.69), Some(GrowthKind::Surge));
        assert_eq!(candidate.resolve(0.75), None);
    }

    #[test]
    fn missing_surge_only_uses_primary_band() {
        let candidate = target(0.4, None);
        assert_eq!(candidate.resolve(0.2), Some(GrowthKind::Standard));
        assert_eq!(candidate.resolve(0.5), None);
    }

    #[test]
    fn occupancy_reports_owner_for_every_occupied_state() {
        let owner = PlayerId::new(3);
        assert_eq!(Occupancy::Empty.owner(), None);
        assert_eq!(Occupancy::Alive { owner }.owner(), Some(owner));
        assert_eq!(Occupancy::Dead { owner }.owner(), Some(owner));
        assert_eq!(
            Occupancy::Toxin {
                owner,
                expires_at_age: 2
            }
            .owner(),
            Some(owner)
        );
        assert_eq!(Occupancy::Dead { owner }.living_owner(), None);
        assert_eq!(Occupancy::Dead { owner }.dead_owner(), Some(owner));
    }

    #[test]
    fn only_mutating_outcomes_count_as_claimed() {
        assert!(TakeoverOutcome::Parasitized.claimed());
        assert!(TakeoverOutcome::Reclaimed.claimed());
        assert!(TakeoverOutcome::CatabolicGrowth.claimed());
        assert!(!TakeoverOutcome::AlreadyOwned.claimed());
        assert!(!TakeoverOutcome::InvalidBecauseResistant.claimed());
        assert!(!TakeoverOutcome::Invalid.claimed());
    }

    #[test]
    fn occupancy_round_trips_through_bincode() {
        let value = Occupancy::Toxin {
            owner: PlayerId::new(7),
            expires_at_age: 5,
        };
        let bytes = bincode::serialize(&value).expect("serialize");
        let restored: Occupancy = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, value);
    }
}
