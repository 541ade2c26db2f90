//! Headless session runner: spore placement, the round loop and summaries.

use std::{collections::BTreeMap, fmt, fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sporefront_core::{
    BoardSize, CardinalDirection, EngineConfig, Event, PlayerId, RandomSource, ReclaimMode,
    SimRng, TileCoord, TileId,
};
use sporefront_effects::{BalanceConfig, EffectTable, Mycovariant};
use sporefront_system_decay::{Decay, DeathLedger};
use sporefront_system_growth::{GrowthCycle, GrowthTally};
use sporefront_system_jetting::{project, JetRequest, JetTally};
use sporefront_system_vectoring::{VectorReport, Vectoring};
use sporefront_world::{
    query::{self, ColonyCensus},
    Board,
};

/// Everything a session needs, loadable from a single TOML document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    /// Engine-wide parameters.
    pub(crate) engine: EngineConfig,
    /// Baseline chances and mutation catalog.
    pub(crate) balance: BalanceConfig,
    /// Board, colonies and round structure.
    pub(crate) session: SessionSettings,
}

/// Shape of a session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionSettings {
    /// Board width in tiles.
    pub(crate) width: u32,
    /// Board height in tiles.
    pub(crate) height: u32,
    /// Number of competing colonies.
    pub(crate) players: u16,
    /// Rounds to play.
    pub(crate) rounds: u32,
    /// Growth cycles per round before the decay pass.
    pub(crate) cycles_per_round: u32,
    /// Seed of the first game.
    pub(crate) seed: u64,
    /// Round at which one-shot abilities fire.
    pub(crate) ability_round: u32,
    /// Mutation bought by every colony at the start of each round, by name.
    pub(crate) upgrade_plan: Vec<String>,
    /// Mycovariants granted to every colony at the start of the game.
    pub(crate) mycovariants: Vec<Mycovariant>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            players: 4,
            rounds: 25,
            cycles_per_round: 5,
            seed: 0x5eed,
            ability_round: 6,
            upgrade_plan: [
                "hyphal_growth",
                "hyphal_growth",
                "reclamation",
                "hyphal_growth",
                "tendril_northeast",
                "creeping_mold",
                "reclamation",
                "necrohyphal_infiltration",
                "toxin_potency",
                "diagonal_affinity",
                "tendril_southwest",
                "hyphal_growth",
                "hyphal_growth",
                "chronoreset",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            mycovariants: vec![
                Mycovariant::HyphalSurge {
                    bonus: 0.15,
                    rounds_remaining: 3,
                },
                Mycovariant::PerimeterProliferator {
                    multiplier: 1.5,
                    edge_distance: 2,
                },
                Mycovariant::JettingMycelium {
                    living_length: 4,
                    toxin_length: 3,
                    used: false,
                },
                Mycovariant::SurgicalVectoring {
                    max_length: 10,
                    used: false,
                },
                Mycovariant::MycelialBastion {
                    cells: 3,
                    used: false,
                },
            ],
        }
    }
}

impl SessionConfig {
    /// Reads a configuration file, falling back to defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse session config at {}", path.display()))
    }

    /// Rejects configurations that cannot produce a game.
    pub(crate) fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("invalid engine configuration")?;
        self.balance
            .validate()
            .context("invalid balance configuration")?;
        let _ = BoardSize::new(self.session.width, self.session.height)
            .context("invalid board dimensions")?;
        if self.session.players == 0 {
            bail!("a session needs at least one colony");
        }
        if self.session.cycles_per_round == 0 {
            bail!("cycles_per_round must be greater than zero");
        }
        for mycovariant in &self.session.mycovariants {
            mycovariant
                .validate()
                .context("invalid starting mycovariant")?;
        }
        for name in &self.session.upgrade_plan {
            if self.balance.catalog.find(name).is_none() {
                bail!("upgrade plan names unknown mutation `{name}`");
            }
        }
        Ok(())
    }
}

/// End-of-game state of one colony.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ColonySummary {
    /// Colony identifier.
    pub(crate) id: PlayerId,
    /// Tile counts at the end of the game.
    pub(crate) census: ColonyCensus,
    /// Growth counters summed over every cycle.
    pub(crate) growth: GrowthTally,
    /// Deaths across every cause.
    pub(crate) deaths: u32,
    /// Cells hardened by the colony's bastion.
    pub(crate) fortified: u32,
    /// Result of the colony's jet, when it fired.
    pub(crate) jet: Option<JetTally>,
    /// Result of the colony's vectoring shot, when it fired.
    pub(crate) vector: Option<VectorReport>,
}

/// Outcome of a complete game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionSummary {
    /// Seed the game was played with.
    pub(crate) seed: u64,
    /// Growth cycles played.
    pub(crate) cycles: u64,
    /// Per-colony results in identifier order.
    pub(crate) colonies: Vec<ColonySummary>,
}

impl SessionSummary {
    /// Colony holding the most living cells; ties go to the lower identifier.
    pub(crate) fn leader(&self) -> Option<PlayerId> {
        self.colonies
            .iter()
            .filter(|colony| colony.census.alive > 0)
            .max_by(|left, right| {
                left.census
                    .alive
                    .cmp(&right.census.alive)
                    .then(right.id.cmp(&left.id))
            })
            .map(|colony| colony.id)
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "seed {:#x} after {} cycles", self.seed, self.cycles)?;
        for colony in &self.colonies {
            write!(
                f,
                "  {}: alive {:>4} dead {:>4} toxins {:>3} | grown {:>5} surge {:>4} crept {:>4} \
                 reclaimed {:>4} infiltrated {:>3}+{:<3} failed {:>5} | deaths {:>5}",
                colony.id,
                colony.census.alive,
                colony.census.dead,
                colony.census.toxins,
                colony.growth.grown,
                colony.growth.surge_grown,
                colony.growth.crept,
                colony.growth.reclaimed,
                colony.growth.infiltrated,
                colony.growth.cascaded,
                colony.growth.failed,
                colony.deaths,
            )?;
            if colony.fortified > 0 {
                write!(f, " | fortified {}", colony.fortified)?;
            }
            if let Some(jet) = colony.jet {
                write!(f, " | jet {}/{}", jet.colonized + jet.infested, jet.poisoned)?;
            }
            if let Some(vector) = colony.vector {
                write!(f, " | vector {}/{}", vector.placed, vector.processed)?;
            }
            writeln!(f)?;
        }
        match self.leader() {
            Some(leader) => write!(f, "  leader: {leader}"),
            None => write!(f, "  every colony died out"),
        }
    }
}

/// Plays one full game with the given seed.
pub(crate) fn run(config: &SessionConfig, seed: u64) -> Result<SessionSummary> {
    let settings = &config.session;
    let mut board = Board::with_dimensions(settings.width, settings.height)
        .context("failed to build the board")?;
    let mut effects = EffectTable::new(config.balance.clone());
    let colonies: Vec<PlayerId> = (1..=settings.players).map(PlayerId::new).collect();

    for (index, &owner) in colonies.iter().enumerate() {
        let colony = effects
            .register(owner)
            .with_context(|| format!("failed to register colony {owner}"))?;
        for &mycovariant in &settings.mycovariants {
            colony.grant(mycovariant);
        }
        let spore = spore_position(board.size(), index, colonies.len());
        let tile = board.tile_id(spore)?;
        let _ = board.place_alive(tile, owner)?;
    }

    let plan = settings
        .upgrade_plan
        .iter()
        .map(|name| {
            config
                .balance
                .catalog
                .find(name)
                .with_context(|| format!("unknown mutation `{name}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rng = SimRng::seeded(seed);
    let mut growth = GrowthCycle::new();
    let mut decay = Decay::new();
    let mut vectoring = Vectoring::new();
    let mut ledger = DeathLedger::default();
    let mut events: Vec<Event> = Vec::new();
    let mut growth_totals: BTreeMap<PlayerId, GrowthTally> = BTreeMap::new();
    let mut jets: BTreeMap<PlayerId, JetTally> = BTreeMap::new();
    let mut vectors: BTreeMap<PlayerId, VectorReport> = BTreeMap::new();
    let mut fortified: BTreeMap<PlayerId, u32> = BTreeMap::new();

    for round in 0..settings.rounds {
        if let Some(&mutation) = plan.get(round as usize) {
            for &owner in &colonies {
                if let Err(error) = effects.upgrade(owner, mutation) {
                    tracing::warn!(%owner, %error, "skipping planned upgrade");
                }
            }
        }

        if round == settings.ability_round {
            for &owner in &colonies {
                if let Some(cells) = effects.colony_mut(owner)?.take_bastion() {
                    let hardened = fortify(&mut board, owner, cells, &mut rng, &mut events)?;
                    let _ = fortified.insert(owner, hardened);
                }
            }

            let center = board.size().center();
            for &owner in &colonies {
                let Some(origin) = closest_cell(&board, owner, center) else {
                    continue;
                };
                let colony = effects.colony_mut(owner)?;
                let jet = colony.take_jet();
                let vector = colony.take_vectoring();

                if let Some((living_length, toxin_length)) = jet {
                    let request = JetRequest {
                        origin: origin.tile,
                        direction: heading(origin.coord, center),
                        living_length,
                        toxin_length,
                        owner,
                        reclaim_mode: ReclaimMode::Standard,
                    };
                    let tally = project(
                        &mut board,
                        &effects,
                        &config.engine,
                        request,
                        &mut ledger,
                        &mut events,
                    )?;
                    let _ = jets.insert(owner, tally);
                }
                if let Some(max_length) = vector {
                    if let Some(report) = vectoring.fire(
                        &mut board,
                        owner,
                        center,
                        max_length,
                        &config.engine,
                        &mut rng,
                        &mut ledger,
                        &mut events,
                    )? {
                        let _ = vectors.insert(owner, report);
                    }
                }
            }
        }

        for _ in 0..settings.cycles_per_round {
            events.clear();
            let report = growth.run(&mut board, &effects, &config.engine, &mut rng, &mut events)?;
            for (owner, tally) in report.tallies {
                accumulate(growth_totals.entry(owner).or_default(), tally);
            }
        }

        events.clear();
        let _ = decay.run(&mut board, &config.engine, &mut rng, &mut ledger, &mut events)?;
        effects.end_round();
        tracing::debug!(round, living = query::living_cells(&board).len(), "round finished");
    }

    let census = query::census(&board);
    let summary = SessionSummary {
        seed,
        cycles: board.cycle(),
        colonies: colonies
            .iter()
            .map(|&id| ColonySummary {
                id,
                census: census.get(&id).copied().unwrap_or_default(),
                growth: growth_totals.get(&id).copied().unwrap_or_default(),
                deaths: ledger.total(id),
                fortified: fortified.get(&id).copied().unwrap_or(0),
                jet: jets.get(&id).copied(),
                vector: vectors.get(&id).copied(),
            })
            .collect(),
    };
    tracing::info!(seed, leader = ?summary.leader(), "game finished");
    Ok(summary)
}

/// Centers of an evenly divided grid of cells, one per colony.
fn spore_position(size: BoardSize, index: usize, count: usize) -> TileCoord {
    let columns = (1..=count).find(|c| c * c >= count).unwrap_or(1);
    let rows = count.div_ceil(columns);
    let column = (index % columns) as u64;
    let row = (index / columns) as u64;
    let x = (2 * column + 1) * u64::from(size.width()) / (2 * columns as u64);
    let y = (2 * row + 1) * u64::from(size.height()) / (2 * rows as u64);
    TileCoord::new(
        x.min(u64::from(size.width() - 1)) as u32,
        y.min(u64::from(size.height() - 1)) as u32,
    )
}

/// Hardens up to `cells` randomly chosen living cells of `owner`.
fn fortify<R>(
    board: &mut Board,
    owner: PlayerId,
    cells: u32,
    rng: &mut R,
    out: &mut Vec<Event>,
) -> Result<u32>
where
    R: RandomSource,
{
    let mut tiles: Vec<TileId> = query::living_cells_of(board, owner)
        .into_iter()
        .filter(|cell| board.cell(cell.tile).is_ok_and(|state| !state.is_resistant()))
        .map(|cell| cell.tile)
        .collect();
    rng.shuffle(&mut tiles);

    let mut hardened = 0;
    for tile in tiles.into_iter().take(cells as usize) {
        if board.make_resistant(tile)? {
            hardened += 1;
            out.push(Event::CellFortified { owner, tile });
        }
    }
    tracing::debug!(%owner, hardened, "bastion raised");
    Ok(hardened)
}

fn closest_cell(board: &Board, owner: PlayerId, center: TileCoord) -> Option<query::LivingCell> {
    query::living_cells_of(board, owner)
        .into_iter()
        .min_by_key(|cell| (cell.coord.distance_squared(center), cell.tile))
}

fn heading(from: TileCoord, to: TileCoord) -> CardinalDirection {
    let dx = i64::from(to.x()) - i64::from(from.x());
    let dy = i64::from(to.y()) - i64::from(from.y());
    if dx.abs() >= dy.abs() && dx != 0 {
        if dx > 0 {
            CardinalDirection::East
        } else {
            CardinalDirection::West
        }
    } else if dy > 0 {
        CardinalDirection::South
    } else {
        CardinalDirection::North
    }
}

fn accumulate(total: &mut GrowthTally, cycle: GrowthTally) {
    total.grown += cycle.grown;
    total.surge_grown += cycle.surge_grown;
    total.crept += cycle.crept;
    total.reclaimed += cycle.reclaimed;
    total.infiltrated += cycle.infiltrated;
    total.cascaded += cycle.cascaded;
    total.failed += cycle.failed;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.session.width = 16;
        config.session.height = 16;
        config.session.players = 3;
        config.session.rounds = 6;
        config.session.cycles_per_round = 3;
        config.session.ability_round = 2;
        config.engine.decay.base_death_chance = 0.0;
        config.engine.decay.age_death_increment = 0.0;
        config
    }

    #[test]
    fn default_configuration_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn unknown_planned_mutation_is_rejected() {
        let mut config = small_config();
        config.session.upgrade_plan.push("photosynthesis".to_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SessionConfig = toml::from_str(
            r#"
            [engine]
            toxin_base_duration = 2

            [balance]
            base_growth_chance = 0.3

            [session]
            players = 2
            upgrade_plan = ["hyphal_growth"]
            mycovariants = [{ kind = "hyphal_surge", bonus = 0.2, rounds_remaining = 1 }]
            "#,
        )
        .expect("parse session config");

        assert_eq!(config.engine.toxin_base_duration, 2);
        assert_eq!(config.session.players, 2);
        assert_eq!(config.session.width, SessionSettings::default().width);
        assert_eq!(config.session.mycovariants.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn spores_are_spread_across_the_board() {
        let size = BoardSize::new(40, 40).expect("valid size");
        let spores: Vec<TileCoord> = (0..4).map(|index| spore_position(size, index, 4)).collect();
        assert_eq!(
            spores,
            vec![
                TileCoord::new(10, 10),
                TileCoord::new(30, 10),
                TileCoord::new(10, 30),
                TileCoord::new(30, 30),
            ]
        );
        assert_eq!(spore_position(size, 0, 1), TileCoord::new(20, 20));
    }

    #[test]
    fn malformed_starting_mycovariant_is_rejected_up_front() {
        let mut config = small_config();
        config.session.mycovariants = vec![Mycovariant::SurgicalVectoring {
            max_length: 0,
            used: false,
        }];
        assert!(config.validate().is_err());

        config.session.mycovariants = vec![Mycovariant::JettingMycelium {
            living_length: 0,
            toxin_length: 2,
            used: false,
        }];
        assert!(config.validate().is_err());

        config.session.mycovariants = vec![Mycovariant::HyphalSurge {
            bonus: -0.1,
            rounds_remaining: 1,
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn bastion_cells_outlive_certain_decay() {
        let mut config = small_config();
        config.session.ability_round = 0;
        config.engine.decay.base_death_chance = 1.0;
        config.session.mycovariants = vec![Mycovariant::MycelialBastion {
            cells: 2,
            used: false,
        }];
        assert!(config.validate().is_ok());

        let summary = run(&config, 7).expect("session runs");

        for colony in &summary.colonies {
            assert_eq!(colony.fortified, 1, "{}", colony.id);
            assert_eq!(colony.census.resistant, 1, "{}", colony.id);
            assert_eq!(colony.census.alive, 1, "{}", colony.id);
        }
    }

    #[test]
    fn heading_points_along_the_dominant_axis() {
        let origin = TileCoord::new(5, 5);
        assert_eq!(heading(origin, TileCoord::new(9, 6)), CardinalDirection::East);
        assert_eq!(heading(origin, TileCoord::new(1, 4)), CardinalDirection::West);
        assert_eq!(heading(origin, TileCoord::new(4, 9)), CardinalDirection::South);
        assert_eq!(heading(origin, TileCoord::new(5, 0)), CardinalDirection::North);
    }

    #[test]
    fn sessions_replay_identically() {
        let config = small_config();
        let first = run(&config, 21).expect("session runs");
        let second = run(&config, 21).expect("session runs");

        assert_eq!(first, second);
        assert_eq!(first.cycles, 18);
        assert_eq!(first.colonies.len(), 3);
        assert!(first.colonies[0].jet.is_some());
    }

    #[test]
    fn summary_names_the_leader() {
        let summary = run(&small_config(), 4).expect("session runs");
        let rendered = summary.to_string();
        assert!(rendered.contains("after 18 cycles"));
        assert!(rendered.contains("leader") || rendered.contains("died out"));
    }
}
