//! Per-tile cell state and the takeover resolver.

use sporefront_core::{Occupancy, PlayerId, ReclaimMode, TakeoverOutcome};

/// Presentation hints consumed by renderers; never read by the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellMarks {
    /// The cell appeared during the current cycle.
    pub newly_grown: bool,
    /// The cell died during the current cycle.
    pub dying: bool,
    /// A toxin landed on the tile during the current cycle.
    pub receiving_toxin: bool,
}

/// State held by a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    occupancy: Occupancy,
    age: u32,
    resistant: bool,
    marks: CellMarks,
}

impl Cell {
    /// Occupancy of the tile.
    #[must_use]
    pub const fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    /// Cycles survived since the occupancy last changed.
    #[must_use]
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Whether the cell is permanently immune to overwrites, kills and conversions.
    #[must_use]
    pub const fn is_resistant(&self) -> bool {
        self.resistant
    }

    /// Presentation hints for the current cycle.
    #[must_use]
    pub const fn marks(&self) -> CellMarks {
        self.marks
    }

    /// Claims an occupied cell for `requester`, mutating it in place on success.
    ///
    /// Resistance is checked before anything else. Empty cells are rejected
    /// with [`TakeoverOutcome::Invalid`]; callers place fresh cells on empty
    /// tiles directly. Toxins are only overwritten when `allow_toxin` is set.
    pub fn resolve_takeover(
        &mut self,
        requester: PlayerId,
        allow_toxin: bool,
        mode: ReclaimMode,
    ) -> TakeoverOutcome {
        if self.resistant {
            return TakeoverOutcome::InvalidBecauseResistant;
        }

        match self.occupancy {
            Occupancy::Empty => TakeoverOutcome::Invalid,
            Occupancy::Alive { owner } if owner == requester => TakeoverOutcome::AlreadyOwned,
            Occupancy::Alive { .. } => {
                self.become_alive(requester);
                TakeoverOutcome::Parasitized
            }
            Occupancy::Dead { owner } if owner == requester => {
                self.become_alive(requester);
                match mode {
                    ReclaimMode::Standard => TakeoverOutcome::Reclaimed,
                    ReclaimMode::Catabolic => TakeoverOutcome::CatabolicGrowth,
                }
            }
            Occupancy::Dead { .. } => {
                self.become_alive(requester);
                TakeoverOutcome::Parasitized
            }
            Occupancy::Toxin { .. } if allow_toxin => {
                self.become_alive(requester);
                TakeoverOutcome::Parasitized
            }
            Occupancy::Toxin { .. } => TakeoverOutcome::Invalid,
        }
    }

    pub(crate) fn grow(&mut self, owner: PlayerId) -> bool {
        if self.resistant {
            return false;
        }
        self.become_alive(owner);
        true
    }

    pub(crate) fn kill(&mut self) -> Option<PlayerId> {
        if self.resistant {
            return None;
        }
        let owner = self.occupancy.living_owner()?;
        self.occupancy = Occupancy::Dead { owner };
        self.age = 0;
        self.marks.dying = true;
        Some(owner)
    }

    pub(crate) fn poison(&mut self, owner: PlayerId, expires_at_age: u32) -> bool {
        if self.resistant {
            return false;
        }
        self.occupancy = Occupancy::Toxin {
            owner,
            expires_at_age,
        };
        self.age = 0;
        self.marks.receiving_toxin = true;
        true
    }

    pub(crate) fn extend_toxin(&mut self, extra: u32) -> bool {
        match &mut self.occupancy {
            Occupancy::Toxin { expires_at_age, .. } => {
                *expires_at_age = expires_at_age.saturating_add(extra);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.occupancy = Occupancy::Empty;
        self.age = 0;
    }

    pub(crate) fn settle(&mut self, occupancy: Occupancy, age: u32) {
        self.occupancy = occupancy;
        self.age = age;
    }

    pub(crate) fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub(crate) fn make_resistant(&mut self) -> bool {
        if !self.occupancy.is_alive() {
            return false;
        }
        self.resistant = true;
        true
    }

    pub(crate) fn clear_marks(&mut self) {
        self.marks = CellMarks::default();
    }

    fn become_alive(&mut self, owner: PlayerId) {
        self.occupancy = Occupancy::Alive { owner };
        self.age = 0;
        self.marks.newly_grown = true;
    }
}

#[cfg(test)]
mod tests {
    use super::Cell;
    use sporefront_core::{Occupancy, PlayerId, ReclaimMode, TakeoverOutcome};

    const ALPHA: PlayerId = PlayerId::new(1);
    const BETA: PlayerId = PlayerId::new(2);

    fn cell(occupancy: Occupancy) -> Cell {
        let mut cell = Cell::default();
        cell.settle(occupancy, 3);
        cell
    }

    #[test]
    fn own_living_cell_is_already_owned() {
        let mut target = cell(Occupancy::Alive { owner: ALPHA });
        let outcome = target.resolve_takeover(ALPHA, true, ReclaimMode::Standard);
        assert_eq!(outcome, TakeoverOutcome::AlreadyOwned);
        assert_eq!(target.age(), 3);
    }

    #[test]
    fn foreign_living_cell_is_parasitized() {
        let mut target = cell(Occupancy::Alive { owner: BETA });
        let outcome = target.resolve_takeover(ALPHA, false, ReclaimMode::Standard);
        assert_eq!(outcome, TakeoverOutcome::Parasitized);
        assert_eq!(target.occupancy(), Occupancy::Alive { owner: ALPHA });
        assert_eq!(target.age(), 0);
        assert!(target.marks().newly_grown);
    }

    #[test]
    fn own_dead_cell_reports_mode_specific_outcome() {
        let mut standard = cell(Occupancy::Dead { owner: ALPHA });
        let mut catabolic = standard;
        assert_eq!(
            standard.resolve_takeover(ALPHA, false, ReclaimMode::Standard),
            TakeoverOutcome::Reclaimed
        );
        assert_eq!(
            catabolic.resolve_takeover(ALPHA, false, ReclaimMode::Catabolic),
            TakeoverOutcome::CatabolicGrowth
        );
        assert_eq!(standard, catabolic);
    }

    #[test]
    fn foreign_dead_cell_is_parasitized() {
        let mut target = cell(Occupancy::Dead { owner: BETA });
        let outcome = target.resolve_takeover(ALPHA, false, ReclaimMode::Standard);
        assert_eq!(outcome, TakeoverOutcome::Parasitized);
        assert_eq!(target.occupancy(), Occupancy::Alive { owner: ALPHA });
    }

    #[test]
    fn toxin_requires_permission() {
        let toxin = Occupancy::Toxin {
            owner: BETA,
            expires_at_age: 4,
        };
        let mut refused = cell(toxin);
        assert_eq!(
            refused.resolve_takeover(ALPHA, false, ReclaimMode::Standard),
            TakeoverOutcome::Invalid
        );
        assert_eq!(refused.occupancy(), toxin);

        let mut allowed = cell(toxin);
        assert_eq!(
            allowed.resolve_takeover(ALPHA, true, ReclaimMode::Standard),
            TakeoverOutcome::Parasitized
        );
        assert_eq!(allowed.occupancy(), Occupancy::Alive { owner: ALPHA });
    }

    #[test]
    fn empty_cell_is_not_a_takeover_target() {
        let mut target = Cell::default();
        assert_eq!(
            target.resolve_takeover(ALPHA, true, ReclaimMode::Standard),
            TakeoverOutcome::Invalid
        );
        assert!(target.occupancy().is_empty());
    }

    #[test]
    fn resistance_is_checked_first() {
        let mut target = cell(Occupancy::Alive { owner: BETA });
        assert!(target.make_resistant());
        let before = target;
        assert_eq!(
            target.resolve_takeover(ALPHA, true, ReclaimMode::Standard),
            TakeoverOutcome::InvalidBecauseResistant
        );
        assert_eq!(target.kill(), None);
        assert!(!target.poison(ALPHA, 3));
        assert!(!target.grow(ALPHA));
        assert_eq!(target, before);
    }

    #[test]
    fn only_living_cells_become_resistant() {
        let mut dead = cell(Occupancy::Dead { owner: ALPHA });
        assert!(!dead.make_resistant());
        assert!(!dead.is_resistant());
    }
}
