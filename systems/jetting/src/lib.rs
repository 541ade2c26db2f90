#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Directional projection that lays a living segment followed by a toxin segment.

use std::collections::BTreeMap;

use sporefront_core::{
    CardinalDirection, DeathCause, DeathRecorder, EffectCoordinator, EngineConfig, EngineError,
    Event, Occupancy, PlayerId, ReclaimMode, TakeoverOutcome, TileId,
};
use sporefront_world::Board;

/// Parameters of a single projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JetRequest {
    /// Tile the projection starts next to.
    pub origin: TileId,
    /// Direction of travel.
    pub direction: CardinalDirection,
    /// Tiles converted into living cells.
    pub living_length: u32,
    /// Tiles converted into toxin after the living segment.
    pub toxin_length: u32,
    /// Colony firing the projection.
    pub owner: PlayerId,
    /// Outcome reported when the living segment restores an own dead cell.
    pub reclaim_mode: ReclaimMode,
}

/// Per-effect counters reported by a projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct JetTally {
    /// Empty tiles that received a living cell.
    pub colonized: u32,
    /// Foreign cells or toxins overwritten by the living segment.
    pub infested: u32,
    /// Own dead cells restored.
    pub reclaimed: u32,
    /// Own dead cells restored under catabolic mode.
    pub catabolic_growth: u32,
    /// Tiles the colony already held.
    pub already_owned: u32,
    /// Tiles the projection could not affect.
    pub invalid: u32,
    /// Tiles converted into toxin.
    pub poisoned: u32,
    /// Foreign living cells killed by the toxin segment.
    pub killed: u32,
}

impl JetTally {
    /// Number of tiles the projection walked over.
    #[must_use]
    pub fn affected(&self) -> u32 {
        self.colonized
            + self.infested
            + self.reclaimed
            + self.catabolic_growth
            + self.already_owned
            + self.invalid
            + self.poisoned
    }

    fn record(&mut self, outcome: TakeoverOutcome) {
        match outcome {
            TakeoverOutcome::Parasitized => self.infested += 1,
            TakeoverOutcome::Reclaimed => self.reclaimed += 1,
            TakeoverOutcome::CatabolicGrowth => self.catabolic_growth += 1,
            TakeoverOutcome::AlreadyOwned => self.already_owned += 1,
            TakeoverOutcome::InvalidBecauseResistant | TakeoverOutcome::Invalid => {
                self.invalid += 1;
            }
        }
    }
}

/// Fires a projection and returns its tallies.
///
/// The line starts on the tile adjacent to the origin and stops early at the
/// board edge. Tiles outside the line are never touched. Own living cells in
/// the toxin segment are skipped without being counted.
pub fn project<E, D>(
    board: &mut Board,
    effects: &E,
    config: &EngineConfig,
    request: JetRequest,
    deaths: &mut D,
    out: &mut Vec<Event>,
) -> Result<JetTally, EngineError>
where
    E: EffectCoordinator + ?Sized,
    D: DeathRecorder + ?Sized,
{
    if request.living_length == 0 {
        return Err(EngineError::InvalidLength {
            what: "jet living length",
        });
    }
    if request.toxin_length == 0 {
        return Err(EngineError::InvalidLength {
            what: "jet toxin length",
        });
    }

    let owner = request.owner;
    let size = board.size();
    let origin = size.coord(request.origin)?;
    let lifespan = config
        .toxin_base_duration
        .saturating_add(effects.toxin_duration_bonus(owner)?);
    let total = request.living_length.saturating_add(request.toxin_length);

    let mut tally = JetTally::default();
    let mut casualties: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for (step, coord) in size.line(origin, request.direction, total).enumerate() {
        let tile = size.tile_id(coord)?;
        if (step as u32) < request.living_length {
            grow(board, tile, request, &mut tally, out)?;
        } else {
            poison(board, tile, owner, lifespan, &mut tally, &mut casualties, out)?;
        }
    }

    for (victim, count) in casualties {
        deaths.record_death(victim, DeathCause::Jetting, count);
    }
    tracing::debug!(
        %owner,
        colonized = tally.colonized,
        infested = tally.infested,
        poisoned = tally.poisoned,
        "jet fired"
    );
    Ok(tally)
}

fn grow(
    board: &mut Board,
    tile: TileId,
    request: JetRequest,
    tally: &mut JetTally,
    out: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let owner = request.owner;
    if board.occupancy(tile)?.is_empty() {
        if board.place_alive(tile, owner)? {
            tally.colonized += 1;
            out.push(Event::CellColonized { owner, tile });
        } else {
            tally.invalid += 1;
        }
        return Ok(());
    }

    let outcome = board.take_over(tile, owner, true, request.reclaim_mode)?;
    tally.record(outcome);
    if outcome.claimed() {
        out.push(Event::CellTakenOver {
            owner,
            tile,
            outcome,
        });
    }
    Ok(())
}

fn poison(
    board: &mut Board,
    tile: TileId,
    owner: PlayerId,
    lifespan: u32,
    tally: &mut JetTally,
    casualties: &mut BTreeMap<PlayerId, u32>,
    out: &mut Vec<Event>,
) -> Result<(), EngineError> {
    match board.occupancy(tile)? {
        Occupancy::Alive { owner: resident } if resident == owner => return Ok(()),
        Occupancy::Alive { .. } => match board.kill(tile)? {
            Some(victim) => {
                tally.killed += 1;
                *casualties.entry(victim).or_default() += 1;
                out.push(Event::CellKilled {
                    owner: victim,
                    tile,
                    cause: DeathCause::Jetting,
                });
            }
            None => {
                tally.invalid += 1;
                return Ok(());
            }
        },
        Occupancy::Empty | Occupancy::Dead { .. } | Occupancy::Toxin { .. } => {}
    }

    if board.poison(tile, owner, lifespan)? {
        tally.poisoned += 1;
        out.push(Event::ToxinPlaced {
            owner,
            tile,
            expires_at_age: lifespan,
        });
    } else {
        tally.invalid += 1;
    }
    Ok(())
}
