#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-to-target resolver that cuts a path of living cells toward a point.
//!
//! Paths are rasterized with integer Bresenham stepping. They start on the
//! tile after the origin, pass through the target and keep going in the same
//! direction until the length budget or the board runs out.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use sporefront_core::{
    BoardSize, DeathCause, DeathRecorder, EngineConfig, EngineError, Event, Occupancy, PlayerId,
    RandomSource, TileCoord, TileId,
};
use sporefront_world::{query, Board};

/// Rasterizes the straight path from `origin` toward `target`.
///
/// The origin is excluded. An origin equal to the target has no direction and
/// yields an empty path.
#[must_use]
pub fn rasterize(
    size: BoardSize,
    origin: TileCoord,
    target: TileCoord,
    max_length: u32,
) -> Vec<TileCoord> {
    let mut path = Vec::new();
    if origin == target {
        return path;
    }

    let (x0, y0) = (i64::from(origin.x()), i64::from(origin.y()));
    let (x1, y1) = (i64::from(target.x()), i64::from(target.y()));
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let step_x = if x0 < x1 { 1 } else { -1 };
    let step_y = if y0 < y1 { 1 } else { -1 };
    let mut error = dx + dy;
    let (mut x, mut y) = (x0, y0);

    while path.len() < max_length as usize {
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
        let (Ok(column), Ok(row)) = (u32::try_from(x), u32::try_from(y)) else {
            break;
        };
        let next = TileCoord::new(column, row);
        if !size.contains(next) {
            break;
        }
        path.push(next);
    }
    path
}

/// Path quality of a candidate origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OriginScore {
    /// Candidate origin tile.
    pub origin: TileId,
    /// Coordinate of the origin.
    pub coord: TileCoord,
    /// Own living cells on the path.
    pub self_blockers: u32,
    /// Foreign living cells on the path.
    pub foreign: u32,
    /// Squared Euclidean distance from origin to target.
    pub distance_squared: u64,
}

impl OriginScore {
    fn rank(&self, other: &Self) -> Ordering {
        self.self_blockers
            .cmp(&other.self_blockers)
            .then_with(|| other.foreign.cmp(&self.foreign))
            .then_with(|| self.distance_squared.cmp(&other.distance_squared))
    }
}

/// What a path application did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VectorReport {
    /// Tiles walked, including skipped ones.
    pub processed: u32,
    /// Living cells placed.
    pub placed: u32,
    /// Foreign living cells killed before placement.
    pub killed: u32,
    /// Own living cells skipped.
    pub skipped_own: u32,
    /// Resistant cells skipped.
    pub skipped_resistant: u32,
}

/// Vectoring system that reuses its scratch buffers between shots.
#[derive(Debug, Default)]
pub struct Vectoring {
    scores: Vec<OriginScore>,
    path: Vec<TileCoord>,
}

impl Vectoring {
    /// Creates a vectoring system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores every living cell of `owner` as a path origin, best first.
    ///
    /// Cells standing on the target have no path and are not scored.
    pub fn score_origins(
        &mut self,
        board: &Board,
        owner: PlayerId,
        target: TileCoord,
        max_length: u32,
    ) -> Result<&[OriginScore], EngineError> {
        validate(board, target, max_length)?;
        self.scores.clear();
        let size = board.size();

        for cell in query::living_cells_of(board, owner) {
            self.path.clear();
            self.path
                .extend(rasterize(size, cell.coord, target, max_length));
            if self.path.is_empty() {
                continue;
            }
            let mut self_blockers = 0;
            let mut foreign = 0;
            for &coord in &self.path {
                match board.cell_at(coord)?.occupancy() {
                    Occupancy::Alive { owner: resident } if resident == owner => {
                        self_blockers += 1;
                    }
                    Occupancy::Alive { .. } => foreign += 1,
                    _ => {}
                }
            }
            self.scores.push(OriginScore {
                origin: cell.tile,
                coord: cell.coord,
                self_blockers,
                foreign,
                distance_squared: cell.coord.distance_squared(target),
            });
        }

        self.scores
            .sort_by(|left, right| left.rank(right).then(left.origin.cmp(&right.origin)));
        Ok(&self.scores)
    }

    /// Picks the origin a shot should start from.
    ///
    /// When the best origin has a clear path, the choice is uniform among the
    /// origins scoring exactly as well. Otherwise it is uniform among the top
    /// `vectoring_fallback_pool` origins. Returns `None` when the colony has no
    /// living cells.
    pub fn select_origin<R>(
        &mut self,
        board: &Board,
        owner: PlayerId,
        target: TileCoord,
        max_length: u32,
        config: &EngineConfig,
        rng: &mut R,
    ) -> Result<Option<OriginScore>, EngineError>
    where
        R: RandomSource,
    {
        let scores = self.score_origins(board, owner, target, max_length)?;
        let Some(best) = scores.first().copied() else {
            return Ok(None);
        };

        let pool = if best.self_blockers == 0 {
            scores
                .iter()
                .take_while(|score| score.rank(&best) == Ordering::Equal)
                .count()
        } else {
            scores.len().min(config.vectoring_fallback_pool.max(1))
        };
        if pool <= 1 {
            return Ok(Some(best));
        }
        Ok(scores.get(rng.next_below(pool)).copied())
    }

    /// Walks the path from `origin` and converts it into living cells of `owner`.
    #[allow(clippy::too_many_arguments)]
    pub fn apply<D>(
        &mut self,
        board: &mut Board,
        owner: PlayerId,
        origin: TileCoord,
        target: TileCoord,
        max_length: u32,
        deaths: &mut D,
        out: &mut Vec<Event>,
    ) -> Result<VectorReport, EngineError>
    where
        D: DeathRecorder + ?Sized,
    {
        validate(board, target, max_length)?;
        let _ = board.tile_id(origin)?;
        self.path.clear();
        self.path
            .extend(rasterize(board.size(), origin, target, max_length));

        let mut report = VectorReport::default();
        let mut casualties: BTreeMap<PlayerId, u32> = BTreeMap::new();
        for &coord in &self.path {
            report.processed += 1;
            let tile = board.tile_id(coord)?;
            let cell = *board.cell(tile)?;
            if cell.is_resistant() {
                report.skipped_resistant += 1;
                continue;
            }
            match cell.occupancy() {
                Occupancy::Alive { owner: resident } if resident == owner => {
                    report.skipped_own += 1;
                    continue;
                }
                Occupancy::Alive { .. } => {
                    if let Some(victim) = board.kill(tile)? {
                        report.killed += 1;
                        *casualties.entry(victim).or_default() += 1;
                        out.push(Event::CellKilled {
                            owner: victim,
                            tile,
                            cause: DeathCause::Vectoring,
                        });
                    }
                }
                Occupancy::Empty | Occupancy::Dead { .. } | Occupancy::Toxin { .. } => {}
            }
            if board.place_alive(tile, owner)? {
                report.placed += 1;
                out.push(Event::CellColonized { owner, tile });
            }
        }

        for (victim, count) in casualties {
            deaths.record_death(victim, DeathCause::Vectoring, count);
        }
        tracing::debug!(
            %owner,
            processed = report.processed,
            placed = report.placed,
            killed = report.killed,
            "vector applied"
        );
        Ok(report)
    }

    /// Selects an origin and applies the path from it in one step.
    #[allow(clippy::too_many_arguments)]
    pub fn fire<R, D>(
        &mut self,
        board: &mut Board,
        owner: PlayerId,
        target: TileCoord,
        max_length: u32,
        config: &EngineConfig,
        rng: &mut R,
        deaths: &mut D,
        out: &mut Vec<Event>,
    ) -> Result<Option<VectorReport>, EngineError>
    where
        R: RandomSource,
        D: DeathRecorder + ?Sized,
    {
        let Some(origin) = self.select_origin(board, owner, target, max_length, config, rng)?
        else {
            return Ok(None);
        };
        self.apply(board, owner, origin.coord, target, max_length, deaths, out)
            .map(Some)
    }
}

fn validate(board: &Board, target: TileCoord, max_length: u32) -> Result<(), EngineError> {
    if max_length == 0 {
        return Err(EngineError::InvalidLength {
            what: "vector length",
        });
    }
    board.tile_id(target).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: u32, height: u32) -> BoardSize {
        BoardSize::new(width, height).expect("valid size")
    }

    fn coords(path: &[TileCoord]) -> Vec<(u32, u32)> {
        path.iter().map(|coord| (coord.x(), coord.y())).collect()
    }

    #[test]
    fn horizontal_path_runs_past_the_target() {
        let path = rasterize(size(8, 3), TileCoord::new(0, 1), TileCoord::new(3, 1), 5);
        assert_eq!(coords(&path), vec![(1, 1), (2, 1), (3, 1), (4, 1), (5, 1)]);
    }

    #[test]
    fn diagonal_path_steps_both_axes() {
        let path = rasterize(size(5, 5), TileCoord::new(0, 0), TileCoord::new(2, 2), 10);
        assert_eq!(coords(&path), vec![(1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn path_stops_at_the_board_edge() {
        let path = rasterize(size(4, 4), TileCoord::new(3, 3), TileCoord::new(1, 3), 10);
        assert_eq!(coords(&path), vec![(2, 3), (1, 3), (0, 3)]);
    }

    #[test]
    fn origin_on_target_has_no_path() {
        let path = rasterize(size(4, 4), TileCoord::new(2, 2), TileCoord::new(2, 2), 10);
        assert!(path.is_empty());
    }

    #[test]
    fn shallow_slope_stays_connected() {
        let path = rasterize(size(9, 9), TileCoord::new(0, 0), TileCoord::new(6, 2), 6);
        assert_eq!(path.len(), 6);
        let mut previous = TileCoord::new(0, 0);
        for coord in path {
            assert!(coord.x().abs_diff(previous.x()) <= 1);
            assert!(coord.y().abs_diff(previous.y()) <= 1);
            previous = coord;
        }
        assert_eq!(previous, TileCoord::new(6, 2));
    }

    #[test]
    fn zero_length_is_rejected() {
        let board = Board::with_dimensions(3, 3).expect("valid board");
        assert_eq!(
            Vectoring::new()
                .score_origins(&board, PlayerId::new(1), TileCoord::new(1, 1), 0)
                .map(<[OriginScore]>::len),
            Err(EngineError::InvalidLength {
                what: "vector length"
            })
        );
    }
}
