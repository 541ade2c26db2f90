use sporefront_core::{
    DeathCause, DecayTuning, EngineConfig, Event, Occupancy, PlayerId, SimRng, TileCoord, TileId,
};
use sporefront_system_decay::{Decay, DeathLedger};
use sporefront_world::{query, Board};

const ALPHA: PlayerId = PlayerId::new(1);
const BETA: PlayerId = PlayerId::new(2);

fn config(base_death_chance: f32, max_age: u32) -> EngineConfig {
    EngineConfig {
        decay: DecayTuning {
            base_death_chance,
            age_death_increment: 0.0,
            max_age,
        },
        ..EngineConfig::default()
    }
}

fn populated() -> (Board, Vec<TileId>) {
    let mut board = Board::with_dimensions(4, 1).expect("valid board");
    let tiles: Vec<TileId> = (0..4)
        .map(|x| board.tile_id(TileCoord::new(x, 0)).expect("on board"))
        .collect();
    for (index, tile) in tiles.iter().enumerate() {
        let owner = if index % 2 == 0 { ALPHA } else { BETA };
        assert!(board.place_alive(*tile, owner).expect("on board"));
    }
    (board, tiles)
}

#[test]
fn certain_death_kills_every_ordinary_cell() {
    let (mut board, tiles) = populated();
    assert!(board.make_resistant(tiles[0]).expect("on board"));

    let mut ledger = DeathLedger::default();
    let mut events = Vec::new();
    let report = Decay::new()
        .run(
            &mut board,
            &config(1.0, 40),
            &mut SimRng::seeded(3),
            &mut ledger,
            &mut events,
        )
        .expect("decay runs");

    assert_eq!(report.random, 3);
    assert_eq!(report.aged_out, 0);
    assert_eq!(
        board.occupancy(tiles[0]).expect("on board"),
        Occupancy::Alive { owner: ALPHA }
    );
    assert_eq!(
        board.occupancy(tiles[1]).expect("on board"),
        Occupancy::Dead { owner: BETA }
    );
    assert_eq!(ledger.deaths(ALPHA, DeathCause::Randomness), 1);
    assert_eq!(ledger.deaths(BETA, DeathCause::Randomness), 2);
    assert!(board.cell(tiles[1]).expect("on board").marks().dying);
    assert_eq!(events.len(), 3);
}

#[test]
fn zero_chance_spares_young_cells() {
    let (mut board, _) = populated();
    let mut ledger = DeathLedger::default();
    let report = Decay::new()
        .run(
            &mut board,
            &config(0.0, 40),
            &mut SimRng::seeded(8),
            &mut ledger,
            &mut Vec::new(),
        )
        .expect("decay runs");

    assert_eq!(report.random + report.aged_out, 0);
    assert_eq!(query::living_cells(&board).len(), 4);
    assert_eq!(ledger.total(ALPHA), 0);
}

#[test]
fn cells_at_max_age_die_of_age() {
    let (mut board, tiles) = populated();
    board.advance_ages(|_, age| age + 2);

    let mut ledger = DeathLedger::default();
    let mut events = Vec::new();
    let report = Decay::new()
        .run(
            &mut board,
            &config(0.0, 2),
            &mut SimRng::seeded(1),
            &mut ledger,
            &mut events,
        )
        .expect("decay runs");

    assert_eq!(report.aged_out, 4);
    assert_eq!(ledger.deaths(ALPHA, DeathCause::Age), 2);
    assert_eq!(ledger.deaths(BETA, DeathCause::Age), 2);
    assert!(events.contains(&Event::CellKilled {
        owner: ALPHA,
        tile: tiles[0],
        cause: DeathCause::Age,
    }));
}
