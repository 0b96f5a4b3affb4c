//! The formats used to hand puzzles to the outside world: solutions as `[dot, next_dot]` pairs,
//! display seeds like `"7-m-12345"`, and whole-puzzle records.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::InvalidInput,
    grid::Grid,
    indexed_vec::{DotIdx, DotVec, IdxType},
    puzzle_gen::Puzzle,
    types::{ClueGrid, Difficulty, EdgeAssignment},
    validate::trace_loop,
};

impl EdgeAssignment {
    /// Encodes a single loop as one `[dot, next_dot]` pair per dot (in dot order).  Dots on the
    /// loop are paired with their clockwise successor and every other dot is paired with itself.
    /// Returns `None` if the `on` edges aren't exactly one loop.
    pub fn to_pairs(&self) -> Option<Vec<[usize; 2]>> {
        let grid = self.grid();
        let loop_dots = trace_loop(self)?;
        let mut next = DotVec::from_fn(grid.num_dots(), |dot: DotIdx| dot);
        for (&dot, &successor) in loop_dots.iter().circular_tuple_windows::<(_, _)>() {
            next[dot] = successor;
        }
        Some(
            next.indexed_iter()
                .map(|(dot, successor)| [dot.to_idx(), successor.to_idx()])
                .collect_vec(),
        )
    }

    /// Decodes `[dot, next_dot]` pairs into a complete assignment where the edge between each
    /// pair is `on`.  Pairs of a dot with itself are ignored.  This doesn't check that the result
    /// is a loop; use [`crate::validate`] for that.
    pub fn from_pairs(grid: &Grid, pairs: &[[usize; 2]]) -> Result<Self, InvalidInput> {
        let mut on_edges = Vec::with_capacity(pairs.len());
        for &[from, to] in pairs {
            if from == to {
                continue;
            }
            let bad_pair = InvalidInput::BadPair { from, to };
            if from >= grid.num_dots() || to >= grid.num_dots() {
                return Err(bad_pair);
            }
            let edge = grid
                .edge_between(DotIdx::from_idx(from), DotIdx::from_idx(to))
                .ok_or(bad_pair)?;
            on_edges.push(edge);
        }
        Ok(Self::from_on_edges(grid, on_edges))
    }
}

/// Everything needed to regenerate a puzzle, displayed as `"{grid_size}-{e|m|d}-{seed}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PuzzleSeed {
    pub grid_size: usize,
    pub difficulty: Difficulty,
    pub seed: u64,
}

impl Display for PuzzleSeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.grid_size,
            self.difficulty.code(),
            self.seed
        )
    }
}

impl FromStr for PuzzleSeed {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad_seed = || InvalidInput::BadSeed(s.to_owned());
        let (grid_size, difficulty, seed) = s
            .trim()
            .split('-')
            .collect_tuple()
            .ok_or_else(bad_seed)?;
        Ok(Self {
            grid_size: grid_size.parse().map_err(|_| bad_seed())?,
            difficulty: difficulty.parse().map_err(|_| bad_seed())?,
            seed: seed.parse().map_err(|_| bad_seed())?,
        })
    }
}

impl Serialize for PuzzleSeed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PuzzleSeed {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A puzzle in the shape that puzzle stores and web clients expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub grid_size: usize,
    pub difficulty: Difficulty,
    /// The clues, `-1` for no clue
    pub count: ClueGrid,
    /// The solution as `[dot, next_dot]` pairs
    pub pairs: Vec<[usize; 2]>,
    pub seed: PuzzleSeed,
    pub density: f32,
}

impl PuzzleRecord {
    /// Decodes the solution stored in `pairs`
    pub fn solution(&self) -> Result<EdgeAssignment, InvalidInput> {
        EdgeAssignment::from_pairs(&self.count.grid(), &self.pairs)
    }
}

impl Puzzle {
    pub fn display_seed(&self) -> PuzzleSeed {
        PuzzleSeed {
            grid_size: self.grid_size,
            difficulty: self.difficulty,
            seed: self.seed,
        }
    }

    pub fn to_record(&self) -> PuzzleRecord {
        // Generated solutions are always a single loop
        let pairs = self.solution.to_pairs().unwrap_or_default();
        debug_assert_eq!(pairs.len(), self.grid().num_dots());
        PuzzleRecord {
            grid_size: self.grid_size,
            difficulty: self.difficulty,
            count: self.clues.clone(),
            pairs,
            seed: self.display_seed(),
            density: self.density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The 5x5-dot loop from the known puzzle, as each dot's successor
    const SUCCESSORS: [usize; 25] = [
        0, 2, 7, 4, 9, 6, 1, 8, 3, 14, 5, 10, 12, 18, 13, 15, 11, 17, 23, 19, 20, 16, 21, 22, 24,
    ];

    fn successor_pairs() -> Vec<[usize; 2]> {
        SUCCESSORS.iter().enumerate().map(|(i, &n)| [i, n]).collect()
    }

    #[test]
    fn pairs_decode_to_a_loop() {
        let grid = Grid::new(5).unwrap();
        let solution = EdgeAssignment::from_pairs(&grid, &successor_pairs()).unwrap();
        assert!(crate::validate::is_single_loop(&solution));
        assert_eq!(solution.num_on(), 18);

        let clues = ClueGrid::from_rows(&[
            vec![None, Some(3), None, Some(3)],
            vec![None, Some(0), None, Some(2)],
            vec![None, Some(1), None, Some(2)],
            vec![Some(1), Some(2), Some(2), None],
        ])
        .unwrap();
        assert!(crate::validate::validate_assignment(&clues, &solution));
    }

    #[test]
    fn pairs_round_trip() {
        let grid = Grid::new(5).unwrap();
        let solution = EdgeAssignment::from_pairs(&grid, &successor_pairs()).unwrap();
        let pairs = solution.to_pairs().unwrap();
        assert_eq!(pairs.len(), 25);
        // Off-loop dots map to themselves
        assert_eq!(pairs[0], [0, 0]);
        assert_eq!(pairs[24], [24, 24]);
        // Re-encoding might reverse the direction, but gives the same edges
        assert_eq!(EdgeAssignment::from_pairs(&grid, &pairs).unwrap(), solution);
    }

    #[test]
    fn pairs_go_clockwise() {
        // The outline of the single cell of a 2x2-dot grid
        let grid = Grid::new(2).unwrap();
        let solution = EdgeAssignment::from_on_edges(&grid, grid.edges());
        assert_eq!(
            solution.to_pairs().unwrap(),
            vec![[0, 1], [1, 3], [2, 0], [3, 2]]
        );
    }

    #[test]
    fn bad_pairs() {
        let grid = Grid::new(3).unwrap();
        assert_eq!(
            EdgeAssignment::from_pairs(&grid, &[[0, 4]]),
            Err(InvalidInput::BadPair { from: 0, to: 4 })
        );
        assert_eq!(
            EdgeAssignment::from_pairs(&grid, &[[8, 9]]),
            Err(InvalidInput::BadPair { from: 8, to: 9 })
        );
        assert!(EdgeAssignment::unknown(&grid).to_pairs().is_none());
    }

    #[test]
    fn seeds() {
        let seed = PuzzleSeed {
            grid_size: 7,
            difficulty: Difficulty::Medium,
            seed: 12345,
        };
        assert_eq!(seed.to_string(), "7-m-12345");
        assert_eq!("7-m-12345".parse::<PuzzleSeed>(), Ok(seed));
        assert_eq!(" 7-medium-12345 ".parse::<PuzzleSeed>(), Ok(seed));
        for bad in ["", "7-m", "7-x-1", "7-m-1-2", "seven-m-1", "7-m--1"] {
            assert_eq!(
                bad.parse::<PuzzleSeed>(),
                Err(InvalidInput::BadSeed(bad.to_owned()))
            );
        }
    }

    #[test]
    fn record_json() {
        let grid = Grid::new(5).unwrap();
        let solution = EdgeAssignment::from_pairs(&grid, &successor_pairs()).unwrap();
        let mut clues = ClueGrid::empty(&grid);
        clues.set(0, 1, Some(3)).unwrap();
        let puzzle = Puzzle {
            grid_size: 5,
            clues,
            solution: solution.clone(),
            difficulty: Difficulty::Difficult,
            density: 1.0 / 16.0,
            seed: 42,
        };
        let record = puzzle.to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["seed"], "5-d-42");
        assert_eq!(json["difficulty"], "difficult");
        assert_eq!(json["count"][0], serde_json::json!([-1, 3, -1, -1]));
        assert_eq!(json["pairs"].as_array().unwrap().len(), 25);

        let decoded: PuzzleRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.solution().unwrap(), solution);
    }

    #[test]
    fn null_clues_deserialize() {
        let clues: ClueGrid = serde_json::from_str("[[null, 2], [-1, 0]]").unwrap();
        assert_eq!(clues.rows(), vec![vec![None, Some(2)], vec![None, Some(0)]]);
        assert!(serde_json::from_str::<ClueGrid>("[[5]]").is_err());
        assert!(serde_json::from_str::<ClueGrid>("[[1, 2], [3]]").is_err());
    }
}
