#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Decay pass that retires aging cells, plus the ledger counting every death.

use std::collections::BTreeMap;

use sporefront_core::{
    DeathCause, DeathRecorder, EngineConfig, EngineError, Event, PlayerId, RandomSource,
};
use sporefront_world::{query, Board};

/// Death counters keyed by colony and cause.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeathLedger {
    counts: BTreeMap<(PlayerId, DeathCause), u32>,
}

impl DeathLedger {
    /// Deaths of `owner` attributed to `cause`.
    #[must_use]
    pub fn deaths(&self, owner: PlayerId, cause: DeathCause) -> u32 {
        self.counts.get(&(owner, cause)).copied().unwrap_or(0)
    }

    /// Deaths of `owner` across every cause.
    #[must_use]
    pub fn total(&self, owner: PlayerId) -> u32 {
        self.counts
            .iter()
            .filter(|((colony, _), _)| *colony == owner)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Every non-zero counter in colony then cause order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, DeathCause, u32)> + '_ {
        self.counts
            .iter()
            .map(|(&(owner, cause), &count)| (owner, cause, count))
    }
}

impl DeathRecorder for DeathLedger {
    fn record_death(&mut self, owner: PlayerId, cause: DeathCause, count: u32) {
        if count == 0 {
            return;
        }
        let entry = self.counts.entry((owner, cause)).or_insert(0);
        *entry = entry.saturating_add(count);
    }
}

/// Deaths produced by one decay pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Cells that reached the maximum age.
    pub aged_out: u32,
    /// Cells that failed their survival roll.
    pub random: u32,
}

/// Decay system that reuses its scratch buffers between passes.
#[derive(Debug, Default)]
pub struct Decay {
    casualties: BTreeMap<(PlayerId, DeathCause), u32>,
}

impl Decay {
    /// Creates a decay system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolls death for every non-resistant living cell in tile order.
    ///
    /// Cells at or past the maximum age die without a draw; every other cell
    /// draws once against `base + age * increment`. Deaths are reported to
    /// `deaths` once per colony and cause after the pass.
    pub fn run<R, D>(
        &mut self,
        board: &mut Board,
        config: &EngineConfig,
        rng: &mut R,
        deaths: &mut D,
        out: &mut Vec<Event>,
    ) -> Result<DecayReport, EngineError>
    where
        R: RandomSource,
        D: DeathRecorder + ?Sized,
    {
        let tuning = &config.decay;
        self.casualties.clear();
        let mut report = DecayReport::default();

        for cell in query::living_cells(board) {
            let state = board.cell(cell.tile)?;
            if state.is_resistant() {
                continue;
            }
            let age = state.age();
            let cause = if age >= tuning.max_age {
                DeathCause::Age
            } else {
                let chance = (tuning.base_death_chance
                    + age as f32 * tuning.age_death_increment)
                    .min(1.0);
                if rng.next_unit() >= chance {
                    continue;
                }
                DeathCause::Randomness
            };

            if board.kill(cell.tile)?.is_none() {
                continue;
            }
            match cause {
                DeathCause::Age => report.aged_out += 1,
                _ => report.random += 1,
            }
            *self.casualties.entry((cell.owner, cause)).or_default() += 1;
            out.push(Event::CellKilled {
                owner: cell.owner,
                tile: cell.tile,
                cause,
            });
        }

        for (&(owner, cause), &count) in &self.casualties {
            deaths.record_death(owner, cause, count);
        }
        tracing::debug!(
            aged_out = report.aged_out,
            random = report.random,
            "decay pass completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_accumulates_per_cause() {
        let alpha = PlayerId::new(1);
        let mut ledger = DeathLedger::default();
        ledger.record_death(alpha, DeathCause::Jetting, 2);
        ledger.record_death(alpha, DeathCause::Jetting, 1);
        ledger.record_death(alpha, DeathCause::Age, 4);
        ledger.record_death(alpha, DeathCause::Vectoring, 0);

        assert_eq!(ledger.deaths(alpha, DeathCause::Jetting), 3);
        assert_eq!(ledger.deaths(alpha, DeathCause::Vectoring), 0);
        assert_eq!(ledger.total(alpha), 7);
        assert_eq!(ledger.iter().count(), 2);
    }
}
