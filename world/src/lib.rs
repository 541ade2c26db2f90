#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for Sporefront.
//!
//! The [`Board`] owns every tile for the lifetime of a game. Systems borrow
//! it mutably for the duration of a single operation and must not hold on to
//! cell references across cycles. Every mutation path checks the cell's
//! resistance before touching it and keeps the active toxin set in sync.

use std::collections::BTreeSet;

use sporefront_core::{
    BoardSize, EngineError, Event, Occupancy, PlayerId, ReclaimMode, TakeoverOutcome, TileCoord,
    TileId, ToxinResidue,
};

mod cell;

pub use cell::{Cell, CellMarks};

/// Fixed-size grid of cells.
#[derive(Clone, Debug)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Cell>,
    toxins: BTreeSet<TileId>,
    cycle: u64,
}

impl Board {
    /// Creates an empty board of the provided size.
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        Self {
            size,
            cells: vec![Cell::default(); size.tile_count()],
            toxins: BTreeSet::new(),
            cycle: 0,
        }
    }

    /// Creates an empty board, validating the dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Result<Self, EngineError> {
        Ok(Self::new(BoardSize::new(width, height)?))
    }

    /// Geometry of the board.
    #[must_use]
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    /// Number of growth cycles completed so far.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Marks the end of a growth cycle and returns the index of the cycle that finished.
    pub fn complete_cycle(&mut self) -> u64 {
        let finished = self.cycle;
        self.cycle = self.cycle.saturating_add(1);
        finished
    }

    /// Maps a coordinate onto its tile.
    pub fn tile_id(&self, coord: TileCoord) -> Result<TileId, EngineError> {
        self.size.tile_id(coord)
    }

    /// Maps a tile onto its coordinate.
    pub fn coord(&self, tile: TileId) -> Result<TileCoord, EngineError> {
        self.size.coord(tile)
    }

    /// Cell stored on a tile.
    pub fn cell(&self, tile: TileId) -> Result<&Cell, EngineError> {
        self.cells.get(tile.index()).ok_or(EngineError::TileOutOfRange {
            tile,
            tile_count: self.cells.len(),
        })
    }

    /// Cell stored at a coordinate.
    pub fn cell_at(&self, coord: TileCoord) -> Result<&Cell, EngineError> {
        let tile = self.tile_id(coord)?;
        self.cell(tile)
    }

    /// Occupancy of a tile.
    pub fn occupancy(&self, tile: TileId) -> Result<Occupancy, EngineError> {
        self.cell(tile).map(Cell::occupancy)
    }

    /// Iterator over every tile and its cell in index order.
    pub fn cells(&self) -> impl Iterator<Item = (TileId, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, cell)| (TileId::new(index as u32), cell))
    }

    /// Tiles currently holding toxin, in index order.
    pub fn active_toxins(&self) -> impl Iterator<Item = TileId> + '_ {
        self.toxins.iter().copied()
    }

    /// Places a fresh living cell, overwriting whatever occupied the tile.
    ///
    /// Returns `false` without mutating when the tile is resistant.
    pub fn place_alive(&mut self, tile: TileId, owner: PlayerId) -> Result<bool, EngineError> {
        let placed = self.cell_mut(tile)?.grow(owner);
        if placed {
            let _ = self.toxins.remove(&tile);
        }
        Ok(placed)
    }

    /// Runs the takeover resolver against an occupied tile.
    pub fn take_over(
        &mut self,
        tile: TileId,
        requester: PlayerId,
        allow_toxin: bool,
        mode: ReclaimMode,
    ) -> Result<TakeoverOutcome, EngineError> {
        let outcome = self
            .cell_mut(tile)?
            .resolve_takeover(requester, allow_toxin, mode);
        if outcome.claimed() {
            let _ = self.toxins.remove(&tile);
        }
        Ok(outcome)
    }

    /// Kills the living cell on a tile, leaving a dead cell of the same owner.
    ///
    /// Returns the owner of the killed cell, or `None` when the tile held no
    /// living cell or the cell is resistant.
    pub fn kill(&mut self, tile: TileId) -> Result<Option<PlayerId>, EngineError> {
        Ok(self.cell_mut(tile)?.kill())
    }

    /// Converts a tile into a toxin deposit that expires after `lifespan` cycles.
    ///
    /// Any previous occupant is replaced, including an older toxin. Returns
    /// `false` without mutating when the tile is resistant.
    pub fn poison(
        &mut self,
        tile: TileId,
        owner: PlayerId,
        lifespan: u32,
    ) -> Result<bool, EngineError> {
        if lifespan == 0 {
            return Err(EngineError::InvalidLength {
                what: "toxin lifespan",
            });
        }
        let poisoned = self.cell_mut(tile)?.poison(owner, lifespan);
        if poisoned {
            let _ = self.toxins.insert(tile);
        }
        Ok(poisoned)
    }

    /// Pushes back the expiration of an existing toxin deposit.
    ///
    /// Returns `false` when the tile holds no toxin.
    pub fn extend_toxin(&mut self, tile: TileId, extra: u32) -> Result<bool, EngineError> {
        Ok(self.cell_mut(tile)?.extend_toxin(extra))
    }

    /// Moves a living cell onto an empty or toxin tile, vacating its source.
    ///
    /// The cell keeps its age. Returns `false` without mutating when the source
    /// is not a living, non-resistant cell or the destination is neither empty
    /// nor toxin.
    pub fn relocate(&mut self, from: TileId, to: TileId) -> Result<bool, EngineError> {
        let source = *self.cell(from)?;
        let destination = *self.cell(to)?;
        let movable = source.occupancy().is_alive() && !source.is_resistant();
        let open = matches!(
            destination.occupancy(),
            Occupancy::Empty | Occupancy::Toxin { .. }
        );
        if from == to || !movable || !open {
            return Ok(false);
        }

        self.cell_mut(to)?.settle(source.occupancy(), source.age());
        self.cell_mut(from)?.clear();
        let _ = self.toxins.remove(&to);
        Ok(true)
    }

    /// Flags the living cell on a tile as permanently resistant.
    ///
    /// Returns `false` when the tile holds no living cell.
    pub fn make_resistant(&mut self, tile: TileId) -> Result<bool, EngineError> {
        Ok(self.cell_mut(tile)?.make_resistant())
    }

    /// Clears the presentation hints of every cell.
    pub fn clear_marks(&mut self) {
        for cell in &mut self.cells {
            cell.clear_marks();
        }
    }

    /// Ages every living cell through `policy` and every toxin by one cycle.
    pub fn advance_ages<F>(&mut self, policy: F)
    where
        F: Fn(PlayerId, u32) -> u32,
    {
        for cell in &mut self.cells {
            match cell.occupancy() {
                Occupancy::Alive { owner } => cell.set_age(policy(owner, cell.age())),
                Occupancy::Toxin { .. } => cell.set_age(cell.age().saturating_add(1)),
                Occupancy::Empty | Occupancy::Dead { .. } => {}
            }
        }
    }

    /// Removes every toxin whose age reached its expiration age.
    ///
    /// Expired deposits become empty tiles or dead cells of the placing colony
    /// depending on `residue`. Returns the number of expired deposits.
    pub fn expire_toxins(&mut self, residue: ToxinResidue, out: &mut Vec<Event>) -> usize {
        let expired: Vec<(TileId, PlayerId)> = self
            .toxins
            .iter()
            .filter_map(|tile| {
                let cell = self.cells.get(tile.index())?;
                match cell.occupancy() {
                    Occupancy::Toxin {
                        owner,
                        expires_at_age,
                    } if cell.age() >= expires_at_age => Some((*tile, owner)),
                    _ => None,
                }
            })
            .collect();

        for &(tile, owner) in &expired {
            let _ = self.toxins.remove(&tile);
            if let Some(cell) = self.cells.get_mut(tile.index()) {
                match residue {
                    ToxinResidue::Empty => cell.clear(),
                    ToxinResidue::Dead => cell.settle(Occupancy::Dead { owner }, 0),
                }
            }
            out.push(Event::ToxinExpired { owner, tile });
        }

        if !expired.is_empty() {
            tracing::trace!(count = expired.len(), "toxins expired");
        }
        expired.len()
    }

    fn cell_mut(&mut self, tile: TileId) -> Result<&mut Cell, EngineError> {
        let tile_count = self.cells.len();
        self.cells
            .get_mut(tile.index())
            .ok_or(EngineError::TileOutOfRange { tile, tile_count })
    }
}

/// Query functions that provide read-only access to the board.
pub mod query {
    use std::collections::BTreeMap;

    use sporefront_core::{Occupancy, PlayerId, TileCoord, TileId};

    use super::Board;

    /// Living cell captured at the moment of the query.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LivingCell {
        /// Tile the cell occupies.
        pub tile: TileId,
        /// Coordinate of the tile.
        pub coord: TileCoord,
        /// Colony that owns the cell.
        pub owner: PlayerId,
    }

    /// Per-colony tile counts.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ColonyCensus {
        /// Living cells.
        pub alive: u32,
        /// Dead cells.
        pub dead: u32,
        /// Toxin deposits placed by the colony.
        pub toxins: u32,
        /// Living cells flagged as resistant.
        pub resistant: u32,
    }

    /// Every living cell in tile index order.
    #[must_use]
    pub fn living_cells(board: &Board) -> Vec<LivingCell> {
        let size = board.size();
        board
            .cells()
            .filter_map(|(tile, cell)| {
                let owner = cell.occupancy().living_owner()?;
                let coord = size.coord(tile).ok()?;
                Some(LivingCell { tile, coord, owner })
            })
            .collect()
    }

    /// Living cells of a single colony in tile index order.
    #[must_use]
    pub fn living_cells_of(board: &Board, owner: PlayerId) -> Vec<LivingCell> {
        living_cells(board)
            .into_iter()
            .filter(|cell| cell.owner == owner)
            .collect()
    }

    /// Number of living cells owned by a colony.
    #[must_use]
    pub fn living_count(board: &Board, owner: PlayerId) -> usize {
        board
            .cells()
            .filter(|(_, cell)| cell.occupancy().living_owner() == Some(owner))
            .count()
    }

    /// Tile counts for every colony present on the board.
    #[must_use]
    pub fn census(board: &Board) -> BTreeMap<PlayerId, ColonyCensus> {
        let mut census: BTreeMap<PlayerId, ColonyCensus> = BTreeMap::new();
        for (_, cell) in board.cells() {
            let Some(owner) = cell.occupancy().owner() else {
                continue;
            };
            let entry = census.entry(owner).or_default();
            match cell.occupancy() {
                Occupancy::Alive { .. } => {
                    entry.alive += 1;
                    if cell.is_resistant() {
                        entry.resistant += 1;
                    }
                }
                Occupancy::Dead { .. } => entry.dead += 1,
                Occupancy::Toxin { .. } => entry.toxins += 1,
                Occupancy::Empty => {}
            }
        }
        census
    }

    /// Occupancy of every tile in index order.
    #[must_use]
    pub fn occupancy_snapshot(board: &Board) -> Vec<Occupancy> {
        board.cells().map(|(_, cell)| cell.occupancy()).collect()
    }
}
