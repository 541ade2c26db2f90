#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Growth cycle engine that expands, relocates and ages every living cell.
//!
//! A cycle snapshots the living cells, shuffles them and lets each one act in
//! turn against the live board, so earlier actors can claim tiles later
//! actors would have wanted. The shared random stream is consumed in a fixed
//! order:
//!
//! 1. one shuffle of the snapshot;
//! 2. per acting cell, one shuffle of its candidate targets;
//! 3. one roll per empty candidate until a placement succeeds;
//! 4. one creep roll when creeping is possible;
//! 5. one reclaim roll and pick when an own dead neighbour exists;
//! 6. the infiltration rolls and picks.

use std::collections::BTreeMap;

use sporefront_core::{
    Adjacency, EffectCoordinator, EngineConfig, EngineError, Event, GrowthKind, GrowthTarget,
    Occupancy, PlayerId, RandomSource, ReclaimMode, TileCoord, TileId,
};
use sporefront_system_infiltration::Infiltration;
use sporefront_world::{query, Board};

/// Counters gathered for a single colony during one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GrowthTally {
    /// Cells placed by the primary chance.
    pub grown: u32,
    /// Cells placed by the surge band.
    pub surge_grown: u32,
    /// Cells that relocated instead of growing.
    pub crept: u32,
    /// Own dead cells restored.
    pub reclaimed: u32,
    /// Foreign dead cells taken by an initial infiltration.
    pub infiltrated: u32,
    /// Foreign dead cells taken by cascade steps.
    pub cascaded: u32,
    /// Cells whose every option failed.
    pub failed: u32,
}

/// Summary of a completed growth cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrowthReport {
    /// Index of the cycle that ran.
    pub cycle: u64,
    /// Per-colony counters.
    pub tallies: BTreeMap<PlayerId, GrowthTally>,
    /// Toxin deposits that expired at the end of the cycle.
    pub expired_toxins: usize,
}

impl GrowthReport {
    /// Counters of a colony, zero when it did not act.
    #[must_use]
    pub fn tally(&self, owner: PlayerId) -> GrowthTally {
        self.tallies.get(&owner).copied().unwrap_or_default()
    }
}

/// Growth cycle system that reuses scratch buffers between cycles.
#[derive(Debug, Default)]
pub struct GrowthCycle {
    actors: Vec<(TileId, PlayerId)>,
    targets: Vec<GrowthTarget>,
    reclaimable: Vec<TileId>,
    infiltration: Infiltration,
}

impl GrowthCycle {
    /// Creates a growth cycle system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one complete growth cycle against the board.
    ///
    /// Integration errors abort the cycle immediately and leave the board in
    /// whatever state the cells processed so far produced.
    pub fn run<E, R>(
        &mut self,
        board: &mut Board,
        effects: &E,
        config: &EngineConfig,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Result<GrowthReport, EngineError>
    where
        E: EffectCoordinator + ?Sized,
        R: RandomSource,
    {
        let cycle = board.cycle();
        out.push(Event::CycleStarted { cycle });
        board.clear_marks();

        self.actors.clear();
        self.actors.extend(
            query::living_cells(board)
                .into_iter()
                .map(|cell| (cell.tile, cell.owner)),
        );
        rng.shuffle(&mut self.actors);

        let mut report = GrowthReport {
            cycle,
            ..GrowthReport::default()
        };
        for index in 0..self.actors.len() {
            let (tile, owner) = self.actors[index];
            if board.occupancy(tile)?.living_owner() != Some(owner) {
                continue;
            }
            let tally = report.tallies.entry(owner).or_default();
            self.act(board, effects, owner, tile, rng, tally, out)?;
        }

        board.advance_ages(|owner, age| effects.advance_age(owner, age));
        report.expired_toxins = board.expire_toxins(config.toxin_residue, out);

        let finished = board.complete_cycle();
        out.push(Event::CycleCompleted { cycle: finished });
        tracing::debug!(
            cycle = finished,
            actors = self.actors.len(),
            expired_toxins = report.expired_toxins,
            "growth cycle completed"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn act<E, R>(
        &mut self,
        board: &mut Board,
        effects: &E,
        owner: PlayerId,
        source: TileId,
        rng: &mut R,
        tally: &mut GrowthTally,
        out: &mut Vec<Event>,
    ) -> Result<(), EngineError>
    where
        E: EffectCoordinator + ?Sized,
        R: RandomSource,
    {
        let coord = board.coord(source)?;
        self.collect_targets(board, effects, owner, coord)?;
        rng.shuffle(&mut self.targets);

        for target in &self.targets {
            if !board.occupancy(target.tile)?.is_empty() {
                continue;
            }
            let Some(kind) = target.resolve(rng.next_unit()) else {
                continue;
            };
            let _ = board.place_alive(target.tile, owner)?;
            match kind {
                GrowthKind::Standard => tally.grown += 1,
                GrowthKind::Surge => tally.surge_grown += 1,
            }
            out.push(Event::CellGrew {
                owner,
                source,
                tile: target.tile,
                adjacency: target.adjacency,
                kind,
            });
            return Ok(());
        }

        if self.creep(board, effects, owner, source, rng, out)? {
            tally.crept += 1;
            return Ok(());
        }

        if self.reclaim(board, effects, owner, coord, rng, out)? {
            tally.reclaimed += 1;
            return Ok(());
        }

        let chances = effects.infiltration_chances(owner)?;
        if chances.first > 0.0 {
            if let Some(report) =
                self.infiltration
                    .attempt(board, owner, source, chances, rng, out)?
            {
                tally.infiltrated += 1;
                tally.cascaded += report.cascade;
                return Ok(());
            }
        }

        tally.failed += 1;
        out.push(Event::GrowthFailed {
            owner,
            tile: source,
        });
        Ok(())
    }

    fn collect_targets<E>(
        &mut self,
        board: &Board,
        effects: &E,
        owner: PlayerId,
        coord: TileCoord,
    ) -> Result<(), EngineError>
    where
        E: EffectCoordinator + ?Sized,
    {
        self.targets.clear();
        let size = board.size();
        let modifiers = effects.growth_modifiers(owner)?;
        let edge = effects.edge_multiplier(owner, coord, size)?;
        let surge_bonus = (modifiers.surge_bonus > 0.0).then_some(modifiers.surge_bonus);
        let onto_toxin = effects.creeps_onto_toxin(owner)?;

        for (direction, neighbor) in size.orthogonal_neighbors(coord) {
            let tile = size.tile_id(neighbor)?;
            let open = match board.occupancy(tile)? {
                Occupancy::Empty => true,
                Occupancy::Toxin { .. } => onto_toxin,
                Occupancy::Alive { .. } | Occupancy::Dead { .. } => false,
            };
            if open {
                self.targets.push(GrowthTarget {
                    tile,
                    coord: neighbor,
                    adjacency: Adjacency::Orthogonal(direction),
                    chance: modifiers.base_chance * edge,
                    surge_bonus,
                });
            }
        }

        let diagonal_multiplier = effects.diagonal_multiplier(owner)?;
        for (direction, neighbor) in size.diagonal_neighbors(coord) {
            let chance =
                effects.diagonal_chance(owner, direction)? * diagonal_multiplier * edge;
            if chance <= 0.0 {
                continue;
            }
            let tile = size.tile_id(neighbor)?;
            if board.occupancy(tile)?.is_empty() {
                self.targets.push(GrowthTarget {
                    tile,
                    coord: neighbor,
                    adjacency: Adjacency::Diagonal(direction),
                    chance,
                    surge_bonus,
                });
            }
        }
        Ok(())
    }

    fn creep<E, R>(
        &self,
        board: &mut Board,
        effects: &E,
        owner: PlayerId,
        source: TileId,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Result<bool, EngineError>
    where
        E: EffectCoordinator + ?Sized,
        R: RandomSource,
    {
        let Some(first) = self.targets.first() else {
            return Ok(false);
        };
        let chance = effects.creep_chance(owner)?;
        if chance <= 0.0 || board.cell(source)?.is_resistant() {
            return Ok(false);
        }
        let destination = board.occupancy(first.tile)?;
        if !matches!(destination, Occupancy::Empty | Occupancy::Toxin { .. }) {
            return Ok(false);
        }
        if rng.next_unit() >= chance {
            return Ok(false);
        }
        if !board.relocate(source, first.tile)? {
            return Ok(false);
        }
        out.push(Event::CellCrept {
            owner,
            from: source,
            to: first.tile,
        });
        Ok(true)
    }

    fn reclaim<E, R>(
        &mut self,
        board: &mut Board,
        effects: &E,
        owner: PlayerId,
        coord: TileCoord,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Result<bool, EngineError>
    where
        E: EffectCoordinator + ?Sized,
        R: RandomSource,
    {
        let chance = effects.reclaim_chance(owner)?;
        if chance <= 0.0 {
            return Ok(false);
        }

        self.reclaimable.clear();
        let size = board.size();
        for (_, neighbor) in size.orthogonal_neighbors(coord) {
            let tile = size.tile_id(neighbor)?;
            if board.occupancy(tile)?.dead_owner() == Some(owner) {
                self.reclaimable.push(tile);
            }
        }
        if self.reclaimable.is_empty() || rng.next_unit() >= chance {
            return Ok(false);
        }

        let tile = self.reclaimable[rng.next_below(self.reclaimable.len())];
        let outcome = board.take_over(tile, owner, false, ReclaimMode::Standard)?;
        if !outcome.claimed() {
            return Ok(false);
        }
        out.push(Event::CellReclaimed { owner, tile });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sporefront_core::{SimRng, UniformEffects};

    const ALPHA: PlayerId = PlayerId::new(1);

    #[test]
    fn unknown_owner_aborts_the_cycle() {
        let mut board = Board::with_dimensions(3, 3).expect("valid board");
        let stranger = PlayerId::new(7);
        let center = board.tile_id(TileCoord::new(1, 1)).expect("on board");
        assert!(board.place_alive(center, stranger).expect("on board"));

        let effects = UniformEffects::new([ALPHA]);
        let result = GrowthCycle::new().run(
            &mut board,
            &effects,
            &EngineConfig::default(),
            &mut SimRng::seeded(1),
            &mut Vec::new(),
        );
        assert_eq!(result, Err(EngineError::UnknownOwner(stranger)));
    }

    #[test]
    fn empty_board_only_advances_the_cycle() {
        let mut board = Board::with_dimensions(2, 2).expect("valid board");
        let effects = UniformEffects::new([ALPHA]);
        let mut events = Vec::new();
        let report = GrowthCycle::new()
            .run(
                &mut board,
                &effects,
                &EngineConfig::default(),
                &mut SimRng::seeded(1),
                &mut events,
            )
            .expect("cycle runs");

        assert_eq!(report.cycle, 0);
        assert!(report.tallies.is_empty());
        assert_eq!(board.cycle(), 1);
        assert_eq!(
            events,
            vec![
                Event::CycleStarted { cycle: 0 },
                Event::CycleCompleted { cycle: 0 }
            ]
        );
    }

    #[test]
    fn isolated_cell_without_chances_fails() {
        let mut board = Board::with_dimensions(3, 3).expect("valid board");
        let center = board.tile_id(TileCoord::new(1, 1)).expect("on board");
        assert!(board.place_alive(center, ALPHA).expect("on board"));

        let effects = UniformEffects::new([ALPHA]);
        let mut events = Vec::new();
        let report = GrowthCycle::new()
            .run(
                &mut board,
                &effects,
                &EngineConfig::default(),
                &mut SimRng::seeded(3),
                &mut events,
            )
            .expect("cycle runs");

        assert_eq!(report.tally(ALPHA).failed, 1);
        assert!(events.contains(&Event::GrowthFailed {
            owner: ALPHA,
            tile: center
        }));
        assert_eq!(board.cell(center).expect("on board").age(), 1);
    }
}
