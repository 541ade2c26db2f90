#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Necrohyphal infiltration: chained takeover of adjacent foreign dead cells.

use std::collections::BTreeSet;

use sporefront_core::{
    EngineError, Event, InfiltrationChances, Occupancy, PlayerId, RandomSource, ReclaimMode,
    TakeoverOutcome, TileId,
};
use sporefront_world::Board;

/// Result of a successful infiltration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfiltrationReport {
    /// Tile taken by the initial infiltration.
    pub first: TileId,
    /// Further tiles taken by the cascade.
    pub cascade: u32,
}

/// Infiltration system that reuses its scratch buffers between calls.
#[derive(Debug, Default)]
pub struct Infiltration {
    visited: BTreeSet<TileId>,
    candidates: Vec<(TileId, PlayerId)>,
}

impl Infiltration {
    /// Creates an infiltration system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to infiltrate from `source` and cascade onward.
    ///
    /// Foreign dead neighbours are gathered in north, east, south, west order.
    /// No random draw happens when there is nothing to infiltrate. Otherwise a
    /// single roll against the first chance decides whether the infiltration
    /// happens, an index draw picks the victim, and every cascade step repeats
    /// the roll and pick from the newly taken tile. Each tile is taken at most
    /// once per chain.
    pub fn attempt<R>(
        &mut self,
        board: &mut Board,
        owner: PlayerId,
        source: TileId,
        chances: InfiltrationChances,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> Result<Option<InfiltrationReport>, EngineError>
    where
        R: RandomSource,
    {
        self.visited.clear();
        let _ = self.visited.insert(source);

        self.gather(board, owner, source)?;
        if self.candidates.is_empty() {
            return Ok(None);
        }
        if rng.next_unit() >= chances.first {
            return Ok(None);
        }
        let first = self.take(board, owner, rng, 0, out)?;

        let mut current = first;
        let mut cascade = 0;
        loop {
            self.gather(board, owner, current)?;
            if self.candidates.is_empty() {
                break;
            }
            if rng.next_unit() >= chances.cascade {
                break;
            }
            cascade += 1;
            current = self.take(board, owner, rng, cascade, out)?;
        }

        if cascade > 0 {
            tracing::trace!(%owner, %first, cascade, "infiltration cascaded");
        }
        Ok(Some(InfiltrationReport { first, cascade }))
    }

    fn gather(&mut self, board: &Board, owner: PlayerId, from: TileId) -> Result<(), EngineError> {
        self.candidates.clear();
        let size = board.size();
        let coord = size.coord(from)?;
        for (_, neighbor) in size.orthogonal_neighbors(coord) {
            let tile = size.tile_id(neighbor)?;
            if self.visited.contains(&tile) {
                continue;
            }
            let cell = board.cell(tile)?;
            if cell.is_resistant() {
                continue;
            }
            if let Occupancy::Dead { owner: victim } = cell.occupancy() {
                if victim != owner {
                    self.candidates.push((tile, victim));
                }
            }
        }
        Ok(())
    }

    fn take<R>(
        &mut self,
        board: &mut Board,
        owner: PlayerId,
        rng: &mut R,
        depth: u32,
        out: &mut Vec<Event>,
    ) -> Result<TileId, EngineError>
    where
        R: RandomSource,
    {
        let pick = rng.next_below(self.candidates.len());
        let (tile, victim) = self.candidates[pick];
        let _ = self.visited.insert(tile);
        let outcome = board.take_over(tile, owner, false, ReclaimMode::Standard)?;
        debug_assert_eq!(outcome, TakeoverOutcome::Parasitized);
        out.push(Event::CellInfiltrated {
            owner,
            victim,
            tile,
            depth,
        });
        Ok(tile)
    }
}
