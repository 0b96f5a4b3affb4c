//! How much the clue reducer should remove for each difficulty, and in what order it tries to
//! remove clues.

use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    error::InvalidInput,
    indexed_vec::CellIdx,
    types::{ClueGrid, Difficulty},
};

/// A target range of clue densities (the fraction of cells which carry a clue).  Deserializing
/// checks that `0 <= low <= high <= 1`; bands built in code are checked when a generator uses
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBand")]
pub struct DensityBand {
    pub low: f32,
    pub high: f32,
}

#[derive(Deserialize)]
struct RawBand {
    low: f32,
    high: f32,
}

impl TryFrom<RawBand> for DensityBand {
    type Error = InvalidInput;

    fn try_from(raw: RawBand) -> Result<Self, Self::Error> {
        let band = DensityBand::new(raw.low, raw.high);
        band.validate()?;
        Ok(band)
    }
}

impl DensityBand {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Checks that `0 <= low <= high <= 1` (which also rules out NaNs)
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if 0.0 <= self.low && self.low <= self.high && self.high <= 1.0 {
            Ok(())
        } else {
            Err(InvalidInput::BadDensityBand(format!(
                "{}..{}",
                self.low, self.high
            )))
        }
    }

    pub fn contains(&self, density: f32) -> bool {
        self.low <= density && density <= self.high
    }
}

/// A target [`DensityBand`] for each [`Difficulty`], along with the order in which clues are
/// considered for removal.  These are tuning data rather than anything derived: the bands are
/// aspirational and the reducer emits a puzzle even when it can't reach its band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityPolicy {
    pub easy: DensityBand,
    pub medium: DensityBand,
    pub difficult: DensityBand,
    pub removal_order: RemovalOrder,
}

impl DensityPolicy {
    /// Bands which narrow as the grid grows.  Larger grids need a smaller fraction of clues for
    /// the same deductive difficulty.
    pub fn calibrated(grid_size: usize) -> Self {
        let (easy, medium, difficult) = match grid_size {
            0..=7 => ((0.45, 0.65), (0.35, 0.50), (0.25, 0.40)),
            8..=10 => ((0.35, 0.50), (0.25, 0.35), (0.15, 0.25)),
            _ => ((0.30, 0.45), (0.20, 0.30), (0.15, 0.25)),
        };
        let band = |(low, high): (f32, f32)| DensityBand::new(low, high);
        Self {
            easy: band(easy),
            medium: band(medium),
            difficult: band(difficult),
            removal_order: RemovalOrder::Shuffled,
        }
    }

    /// Checks every band with [`DensityBand::validate`]
    pub fn validate(&self) -> Result<(), InvalidInput> {
        Difficulty::ALL
            .iter()
            .try_for_each(|&difficulty| self.band(difficulty).validate())
    }

    pub fn band(&self, difficulty: Difficulty) -> DensityBand {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Difficult => self.difficult,
        }
    }
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self {
            easy: DensityBand::new(0.35, 0.60),
            medium: DensityBand::new(0.20, 0.40),
            difficult: DensityBand::new(0.15, 0.30),
            removal_order: RemovalOrder::Shuffled,
        }
    }
}

/// The order in which the clue reducer attempts to remove clues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalOrder {
    /// A uniformly random permutation of the clued cells
    Shuffled,
    /// Clues which are easiest to deduce without are tried first, with ties broken randomly.
    /// Interior cells, `0`s and `3`s are tried early.  Corners are tried first for difficult
    /// puzzles, and last for the others.
    Prioritized,
}

impl RemovalOrder {
    /// Orders the clued cells of `clues`, earliest removal candidate first
    pub fn order(
        self,
        clues: &ClueGrid,
        difficulty: Difficulty,
        rng: &mut impl Rng,
    ) -> Vec<CellIdx> {
        let mut cells = clues.clued_cells().collect_vec();
        cells.shuffle(rng);
        if self == RemovalOrder::Prioritized {
            // The sort is stable, so the shuffle decides ties
            cells.sort_by_key(|&cell| std::cmp::Reverse(removal_priority(clues, cell, difficulty)));
        }
        cells
    }
}

fn removal_priority(clues: &ClueGrid, cell: CellIdx, difficulty: Difficulty) -> i32 {
    let grid = clues.grid();
    let (row, col) = grid.cell_coords(cell);
    let last = grid.cells_per_side() - 1;

    let border_distance = row.min(col).min(last - row).min(last - col) as i32;
    let mut priority = border_distance * 2;
    priority += match clues.cell(cell) {
        Some(0) | Some(3) => 5,
        Some(1) => 3,
        Some(2) => 1,
        _ => 0,
    };

    let on_row_border = row == 0 || row == last;
    let on_col_border = col == 0 || col == last;
    let is_corner = on_row_border && on_col_border;
    let is_edge = on_row_border || on_col_border;
    priority += match (difficulty, is_corner, is_edge) {
        (Difficulty::Difficult, true, _) => 10,
        (Difficulty::Difficult, false, true) => 3,
        (_, true, _) => -5,
        (_, false, true) => 1,
        _ => 0,
    };
    priority
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::grid::Grid;

    #[test]
    fn default_bands() {
        let policy = DensityPolicy::default();
        assert_eq!(policy.band(Difficulty::Easy), DensityBand::new(0.35, 0.60));
        assert_eq!(policy.band(Difficulty::Difficult), DensityBand::new(0.15, 0.30));
        for difficulty in Difficulty::ALL {
            let band = policy.band(difficulty);
            assert!(band.low < band.high);
            assert!(band.contains((band.low + band.high) / 2.0));
        }
    }

    #[test]
    fn bands_are_checked() {
        assert!(DensityPolicy::default().validate().is_ok());
        assert!(DensityPolicy::calibrated(12).validate().is_ok());
        assert!(DensityBand::new(0.0, 0.0).validate().is_ok());
        for (low, high) in [(0.5, 0.2), (-0.1, 0.3), (0.2, 1.5), (f32::NAN, 0.5)] {
            assert!(DensityBand::new(low, high).validate().is_err());
        }
        let policy = DensityPolicy {
            medium: DensityBand::new(0.1, -0.2),
            ..DensityPolicy::default()
        };
        assert_eq!(
            policy.validate(),
            Err(InvalidInput::BadDensityBand("0.1..-0.2".to_owned()))
        );

        let band: DensityBand = serde_json::from_str(r#"{"low": 0.2, "high": 0.4}"#).unwrap();
        assert_eq!(band, DensityBand::new(0.2, 0.4));
        assert!(serde_json::from_str::<DensityBand>(r#"{"low": 0.4, "high": 0.2}"#).is_err());
        assert!(serde_json::from_str::<DensityBand>(r#"{"low": 0.0, "high": -1.0}"#).is_err());
    }

    #[test]
    fn calibrated_bands_narrow() {
        let small = DensityPolicy::calibrated(5);
        let medium = DensityPolicy::calibrated(10);
        let large = DensityPolicy::calibrated(15);
        assert_eq!(small.easy, DensityBand::new(0.45, 0.65));
        assert_eq!(medium.medium, DensityBand::new(0.25, 0.35));
        assert_eq!(large.difficult, DensityBand::new(0.15, 0.25));
        for difficulty in Difficulty::ALL {
            assert!(small.band(difficulty).high >= medium.band(difficulty).high);
            assert!(medium.band(difficulty).high >= large.band(difficulty).high);
        }
    }

    #[test]
    fn orders_contain_every_clue() {
        let grid = Grid::new(5).unwrap();
        let mut clues = ClueGrid::empty(&grid);
        clues.set(0, 0, Some(2)).unwrap();
        clues.set(1, 2, Some(3)).unwrap();
        clues.set(3, 1, Some(1)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for order in [RemovalOrder::Shuffled, RemovalOrder::Prioritized] {
            let cells = order.order(&clues, Difficulty::Medium, &mut rng);
            assert_eq!(cells.len(), 3);
            assert!(cells.iter().all(|&c| clues.cell(c).is_some()));
        }
    }

    #[test]
    fn prioritized_order() {
        let grid = Grid::new(5).unwrap();
        let mut clues = ClueGrid::empty(&grid);
        let corner = grid.cell_idx(0, 0);
        let interior = grid.cell_idx(1, 1);
        clues.set(0, 0, Some(3)).unwrap();
        clues.set(1, 1, Some(3)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // Corners are kept for as long as possible in easier puzzles...
        let easy = RemovalOrder::Prioritized.order(&clues, Difficulty::Easy, &mut rng);
        assert_eq!(easy, vec![interior, corner]);
        // ...but removed first in difficult ones
        let difficult = RemovalOrder::Prioritized.order(&clues, Difficulty::Difficult, &mut rng);
        assert_eq!(difficult, vec![corner, interior]);
    }
}
