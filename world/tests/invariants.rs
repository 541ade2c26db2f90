use proptest::prelude::*;

use sporefront_core::{Occupancy, PlayerId, ReclaimMode, TileId, ToxinResidue};
use sporefront_world::{query, Board};

const WIDTH: u32 = 5;
const HEIGHT: u32 = 5;
const TILE_COUNT: u32 = WIDTH * HEIGHT;

#[derive(Clone, Debug)]
enum Operation {
    Place { tile: u32, owner: u16 },
    TakeOver { tile: u32, owner: u16, allow_toxin: bool, catabolic: bool },
    Kill { tile: u32 },
    Poison { tile: u32, owner: u16, lifespan: u32 },
    Extend { tile: u32, extra: u32 },
    Relocate { from: u32, to: u32 },
    Resist { tile: u32 },
    Age,
    Expire { dead_residue: bool },
}

fn operation() -> impl Strategy<Value = Operation> {
    let tile = 0..TILE_COUNT;
    let owner = 1u16..=3;
    prop_oneof![
        (tile.clone(), owner.clone()).prop_map(|(tile, owner)| Operation::Place { tile, owner }),
        (tile.clone(), owner.clone(), any::<bool>(), any::<bool>()).prop_map(
            |(tile, owner, allow_toxin, catabolic)| Operation::TakeOver {
                tile,
                owner,
                allow_toxin,
                catabolic,
            }
        ),
        tile.clone().prop_map(|tile| Operation::Kill { tile }),
        (tile.clone(), owner, 1u32..5).prop_map(|(tile, owner, lifespan)| Operation::Poison {
            tile,
            owner,
            lifespan,
        }),
        (tile.clone(), 0u32..3).prop_map(|(tile, extra)| Operation::Extend { tile, extra }),
        (tile.clone(), tile.clone()).prop_map(|(from, to)| Operation::Relocate { from, to }),
        tile.prop_map(|tile| Operation::Resist { tile }),
        Just(Operation::Age),
        any::<bool>().prop_map(|dead_residue| Operation::Expire { dead_residue }),
    ]
}

fn apply(board: &mut Board, operation: &Operation) {
    let result = match *operation {
        Operation::Place { tile, owner } => board
            .place_alive(TileId::new(tile), PlayerId::new(owner))
            .map(drop),
        Operation::TakeOver {
            tile,
            owner,
            allow_toxin,
            catabolic,
        } => {
            let mode = if catabolic {
                ReclaimMode::Catabolic
            } else {
                ReclaimMode::Standard
            };
            board
                .take_over(TileId::new(tile), PlayerId::new(owner), allow_toxin, mode)
                .map(drop)
        }
        Operation::Kill { tile } => board.kill(TileId::new(tile)).map(drop),
        Operation::Poison {
            tile,
            owner,
            lifespan,
        } => board
            .poison(TileId::new(tile), PlayerId::new(owner), lifespan)
            .map(drop),
        Operation::Extend { tile, extra } => board.extend_toxin(TileId::new(tile), extra).map(drop),
        Operation::Relocate { from, to } => board
            .relocate(TileId::new(from), TileId::new(to))
            .map(drop),
        Operation::Resist { tile } => board.make_resistant(TileId::new(tile)).map(drop),
        Operation::Age => {
            board.advance_ages(|_, age| age + 1);
            Ok(())
        }
        Operation::Expire { dead_residue } => {
            let residue = if dead_residue {
                ToxinResidue::Dead
            } else {
                ToxinResidue::Empty
            };
            let mut events = Vec::new();
            let _ = board.expire_toxins(residue, &mut events);
            Ok(())
        }
    };
    result.expect("operations only reference tiles on the board");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn resistant_cells_never_change_occupancy(
        operations in proptest::collection::vec(operation(), 1..64)
    ) {
        let mut board = Board::with_dimensions(WIDTH, HEIGHT).expect("valid board");
        for operation in &operations {
            let resistant: Vec<(TileId, Occupancy)> = board
                .cells()
                .filter(|(_, cell)| cell.is_resistant())
                .map(|(tile, cell)| (tile, cell.occupancy()))
                .collect();

            apply(&mut board, operation);

            for (tile, before) in resistant {
                let cell = board.cell(tile).expect("on board");
                prop_assert!(cell.is_resistant());
                prop_assert_eq!(cell.occupancy(), before);
            }
        }
    }

    #[test]
    fn occupancy_stays_coherent(
        operations in proptest::collection::vec(operation(), 1..64)
    ) {
        let mut board = Board::with_dimensions(WIDTH, HEIGHT).expect("valid board");
        for operation in &operations {
            apply(&mut board, operation);

            let toxin_tiles: Vec<TileId> = board
                .cells()
                .filter(|(_, cell)| cell.occupancy().is_toxin())
                .map(|(tile, _)| tile)
                .collect();
            prop_assert_eq!(board.active_toxins().collect::<Vec<_>>(), toxin_tiles);

            for (_, cell) in board.cells() {
                if cell.is_resistant() {
                    prop_assert!(cell.occupancy().is_alive());
                }
                let occupancy = cell.occupancy();
                prop_assert_eq!(occupancy.is_empty(), occupancy.owner().is_none());
            }

            let living: usize = query::census(&board)
                .values()
                .map(|census| census.alive as usize)
                .sum();
            prop_assert_eq!(living, query::living_cells(&board).len());
        }
    }
}
