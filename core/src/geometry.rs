//! Board geometry: coordinate and index mapping plus neighbour queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, TileId};

/// Location of a tile expressed as a column (`x`) and a row (`y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance, exact and order-preserving.
    #[must_use]
    pub fn distance_squared(self, other: TileCoord) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal compass directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardinalDirection {
    /// Toward decreasing rows.
    North,
    /// Toward increasing columns.
    East,
    /// Toward increasing rows.
    South,
    /// Toward decreasing columns.
    West,
}

impl CardinalDirection {
    /// Every cardinal direction in clockwise order starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Diagonal compass directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagonalDirection {
    /// Up and to the right.
    NorthEast,
    /// Down and to the right.
    SouthEast,
    /// Down and to the left.
    SouthWest,
    /// Up and to the left.
    NorthWest,
}

impl DiagonalDirection {
    /// Every diagonal direction in clockwise order starting at north-east.
    pub const ALL: [Self; 4] = [
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
        Self::NorthWest,
    ];

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::NorthEast => (1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Stable position of the direction within [`DiagonalDirection::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::NorthEast => 0,
            Self::SouthEast => 1,
            Self::SouthWest => 2,
            Self::NorthWest => 3,
        }
    }
}

/// How a candidate tile relates to the tile it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjacency {
    /// Shares an edge with the source.
    Orthogonal(CardinalDirection),
    /// Shares only a corner with the source.
    Diagonal(DiagonalDirection),
}

impl Adjacency {
    /// Reports whether the relationship is diagonal.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Self::Diagonal(_))
    }
}

/// Dimensions of a rectangular board and the geometry derived from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    width: u32,
    height: u32,
}

impl BoardSize {
    /// Creates a board size, rejecting empty boards and boards whose tile
    /// count does not fit the tile index space.
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        let fits = width
            .checked_mul(height)
            .is_some_and(|count| count > 0);
        if !fits {
            return Err(EngineError::InvalidBoardSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reports whether the coordinate lies on the board.
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Tile closest to the middle of the board.
    #[must_use]
    pub const fn center(&self) -> TileCoord {
        TileCoord::new(self.width / 2, self.height / 2)
    }

    /// Maps a coordinate onto its tile index.
    pub fn tile_id(&self, coord: TileCoord) -> Result<TileId, EngineError> {
        if !self.contains(coord) {
            return Err(EngineError::CoordOutOfRange {
                coord,
                width: self.width,
                height: self.height,
            });
        }
        Ok(TileId::new(coord.y * self.width + coord.x))
    }

    /// Maps a tile index back onto its coordinate.
    pub fn coord(&self, tile: TileId) -> Result<TileCoord, EngineError> {
        if tile.index() >= self.tile_count() {
            return Err(EngineError::TileOutOfRange {
                tile,
                tile_count: self.tile_count(),
            });
        }
        Ok(TileCoord::new(tile.get() % self.width, tile.get() / self.width))
    }

    /// Coordinate reached by applying a signed delta, if it stays on the board.
    #[must_use]
    pub fn offset(&self, coord: TileCoord, dx: i32, dy: i32) -> Option<TileCoord> {
        let x = coord.x.checked_add_signed(dx)?;
        let y = coord.y.checked_add_signed(dy)?;
        let moved = TileCoord::new(x, y);
        self.contains(moved).then_some(moved)
    }

    /// Neighbour one step away in a cardinal direction.
    #[must_use]
    pub fn step(&self, coord: TileCoord, direction: CardinalDirection) -> Option<TileCoord> {
        let (dx, dy) = direction.offset();
        self.offset(coord, dx, dy)
    }

    /// Neighbour one step away in a diagonal direction.
    #[must_use]
    pub fn diagonal_step(&self, coord: TileCoord, direction: DiagonalDirection) -> Option<TileCoord> {
        let (dx, dy) = direction.offset();
        self.offset(coord, dx, dy)
    }

    /// Orthogonal neighbours in north, east, south, west order, clipped to the board.
    pub fn orthogonal_neighbors(
        self,
        coord: TileCoord,
    ) -> impl Iterator<Item = (CardinalDirection, TileCoord)> {
        CardinalDirection::ALL
            .into_iter()
            .filter_map(move |direction| self.step(coord, direction).map(|next| (direction, next)))
    }

    /// Diagonal neighbours in clockwise order from north-east, clipped to the board.
    pub fn diagonal_neighbors(
        self,
        coord: TileCoord,
    ) -> impl Iterator<Item = (DiagonalDirection, TileCoord)> {
        DiagonalDirection::ALL.into_iter().filter_map(move |direction| {
            self.diagonal_step(coord, direction)
                .map(|next| (direction, next))
        })
    }

    /// Straight line of up to `length` tiles starting next to `origin`.
    ///
    /// The line stops early at the board boundary.
    pub fn line(
        self,
        origin: TileCoord,
        direction: CardinalDirection,
        length: u32,
    ) -> impl Iterator<Item = TileCoord> {
        std::iter::successors(self.step(origin, direction), move |current| {
            self.step(*current, direction)
        })
        .take(length as usize)
    }

    /// Tiles whose Euclidean distance from `center` is at most `radius`,
    /// excluding `center`, in row-major order.
    #[must_use]
    pub fn within_radius(&self, center: TileCoord, radius: u32) -> Vec<TileCoord> {
        let reach = i32::try_from(radius).unwrap_or(i32::MAX);
        let limit = u64::from(radius) * u64::from(radius);
        let mut tiles = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let Some(candidate) = self.offset(center, dx, dy) else {
                    continue;
                };
                if candidate.distance_squared(center) <= limit {
                    tiles.push(candidate);
                }
            }
        }
        tiles
    }

    /// Number of tiles between the coordinate and the nearest board edge.
    ///
    /// Tiles on the outermost ring report zero.
    #[must_use]
    pub fn distance_to_edge(&self, coord: TileCoord) -> u32 {
        let right = self.width.saturating_sub(1).saturating_sub(coord.x);
        let bottom = self.height.saturating_sub(1).saturating_sub(coord.y);
        coord.x.min(coord.y).min(right).min(bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardSize, CardinalDirection, DiagonalDirection, TileCoord};
    use crate::{EngineError, TileId};

    #[test]
    fn tile_ids_are_bijective_with_coordinates() {
        let size = BoardSize::new(7, 4).expect("valid size");
        for index in 0..28 {
            let tile = TileId::new(index);
            let coord = size.coord(tile).expect("in range");
            assert_eq!(size.tile_id(coord).expect("in range"), tile);
        }
    }

    #[test]
    fn out_of_range_lookups_fail_loudly() {
        let size = BoardSize::new(3, 3).expect("valid size");
        assert!(matches!(
            size.coord(TileId::new(9)),
            Err(EngineError::TileOutOfRange { .. })
        ));
        assert!(matches!(
            size.tile_id(TileCoord::new(3, 0)),
            Err(EngineError::CoordOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_sized_boards_are_rejected() {
        assert!(BoardSize::new(0, 5).is_err());
        assert!(BoardSize::new(5, 0).is_err());
        assert!(BoardSize::new(u32::MAX, 2).is_err());
    }

    #[test]
    fn corner_tiles_have_clipped_neighbourhoods() {
        let size = BoardSize::new(4, 4).expect("valid size");
        let corner = TileCoord::new(0, 0);
        let orthogonal: Vec<_> = size.orthogonal_neighbors(corner).collect();
        assert_eq!(
            orthogonal,
            vec![
                (CardinalDirection::East, TileCoord::new(1, 0)),
                (CardinalDirection::South, TileCoord::new(0, 1)),
            ]
        );
        let diagonal: Vec<_> = size.diagonal_neighbors(corner).collect();
        assert_eq!(
            diagonal,
            vec![(DiagonalDirection::SouthEast, TileCoord::new(1, 1))]
        );
    }

    #[test]
    fn line_is_clipped_at_board_edge() {
        let size = BoardSize::new(6, 6).expect("valid size");
        let line: Vec<_> = size
            .line(TileCoord::new(3, 2), CardinalDirection::East, 5)
            .collect();
        assert_eq!(line, vec![TileCoord::new(4, 2), TileCoord::new(5, 2)]);
    }

    #[test]
    fn radius_query_excludes_center_and_respects_distance() {
        let size = BoardSize::new(5, 5).expect("valid size");
        let tiles = size.within_radius(TileCoord::new(2, 2), 1);
        assert_eq!(tiles.len(), 4);
        assert!(!tiles.contains(&TileCoord::new(2, 2)));
        assert_eq!(size.within_radius(TileCoord::new(0, 0), 2).len(), 5);
    }

    #[test]
    fn distance_to_edge_is_zero_on_outer_ring() {
        let size = BoardSize::new(5, 7).expect("valid size");
        assert_eq!(size.distance_to_edge(TileCoord::new(0, 3)), 0);
        assert_eq!(size.distance_to_edge(TileCoord::new(4, 3)), 0);
        assert_eq!(size.distance_to_edge(TileCoord::new(2, 3)), 2);
        assert_eq!(size.distance_to_edge(TileCoord::new(1, 5)), 1);
    }
}
