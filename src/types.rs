use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::InvalidInput,
    grid::Grid,
    indexed_vec::{CellIdx, CellVec, EdgeIdx, EdgeVec},
};

/// The state of a single edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeState {
    /// Part of the loop
    On,
    /// Definitely not part of the loop
    Off,
    /// Not yet decided (only seen in partial assignments)
    Unknown,
}

/// A state for every edge of a grid.  An assignment is *complete* if no edge is
/// [`Unknown`](EdgeState::Unknown).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeAssignment {
    grid: Grid,
    states: EdgeVec<EdgeState>,
}

impl EdgeAssignment {
    /// An assignment where every edge is [`Unknown`](EdgeState::Unknown)
    pub fn unknown(grid: &Grid) -> Self {
        Self {
            grid: *grid,
            states: EdgeVec::repeat(EdgeState::Unknown, grid.num_edges()),
        }
    }

    /// A complete assignment where exactly the given edges are [`On`](EdgeState::On)
    pub fn from_on_edges(grid: &Grid, on_edges: impl IntoIterator<Item = EdgeIdx>) -> Self {
        let mut states = EdgeVec::repeat(EdgeState::Off, grid.num_edges());
        for edge in on_edges {
            states[edge] = EdgeState::On;
        }
        Self {
            grid: *grid,
            states,
        }
    }

    pub(crate) fn from_states(grid: &Grid, states: EdgeVec<EdgeState>) -> Self {
        debug_assert_eq!(states.len(), grid.num_edges());
        Self {
            grid: *grid,
            states,
        }
    }

    /// The grid which this assignment covers
    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn num_edges(&self) -> usize {
        self.states.len()
    }

    pub fn get(&self, edge: EdgeIdx) -> EdgeState {
        self.states[edge]
    }

    pub fn set(&mut self, edge: EdgeIdx, state: EdgeState) {
        self.states[edge] = state;
    }

    /// Returns `true` if no edges are [`Unknown`](EdgeState::Unknown)
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|s| *s != EdgeState::Unknown)
    }

    pub fn num_on(&self) -> usize {
        self.states.iter().filter(|s| **s == EdgeState::On).count()
    }

    /// Iterates over the edges which are [`On`](EdgeState::On), in index order
    pub fn on_edges(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        self.states
            .indexed_iter()
            .filter(|(_, s)| **s == EdgeState::On)
            .map(|(edge, _)| edge)
    }

    pub fn states(&self) -> &EdgeVec<EdgeState> {
        &self.states
    }
}

/// A clue (or no clue) for every cell of a grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Option<i64>>>", into = "Vec<Vec<i64>>")]
pub struct ClueGrid {
    grid: Grid,
    clues: CellVec<Option<u8>>,
}

impl ClueGrid {
    /// A clue grid with no clues at all
    pub fn empty(grid: &Grid) -> Self {
        Self {
            grid: *grid,
            clues: CellVec::repeat(None, grid.num_cells()),
        }
    }

    /// Labels every cell with the number of `on` edges around it in `solution`
    pub fn from_solution(solution: &EdgeAssignment) -> Self {
        let grid = solution.grid();
        Self {
            grid,
            clues: CellVec::from_fn(grid.num_cells(), |cell| {
                Some(grid.cell_count(solution, cell) as u8)
            }),
        }
    }

    /// Builds a clue grid from `(size - 1)` rows of `(size - 1)` optional clues
    pub fn from_rows(rows: &[Vec<Option<u8>>]) -> Result<Self, InvalidInput> {
        let grid = Grid::new(rows.len() + 1)?;
        let mut clue_grid = Self::empty(&grid);
        for (row, line) in rows.iter().enumerate() {
            if line.len() != rows.len() {
                return Err(InvalidInput::ClueShapeMismatch {
                    rows: line.len(),
                    expected: rows.len(),
                });
            }
            for (col, clue) in line.iter().enumerate() {
                clue_grid.set(row, col, *clue)?;
            }
        }
        Ok(clue_grid)
    }

    /// The clues as `(size - 1)` rows of `(size - 1)` optional values
    pub fn rows(&self) -> Vec<Vec<Option<u8>>> {
        let n = self.grid.cells_per_side();
        (0..n)
            .map(|row| {
                (0..n)
                    .map(|col| self.clues[self.grid.cell_idx(row, col)])
                    .collect_vec()
            })
            .collect_vec()
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.grid
            .checked_cell_idx(row, col)
            .ok()
            .and_then(|cell| self.clues[cell])
    }

    /// Sets (or clears, with `None`) the clue at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, clue: Option<u8>) -> Result<(), InvalidInput> {
        let cell = self.grid.checked_cell_idx(row, col)?;
        if let Some(value) = clue {
            if value > 4 {
                return Err(InvalidInput::ClueOutOfRange {
                    row,
                    col,
                    value: value as i64,
                });
            }
        }
        self.clues[cell] = clue;
        Ok(())
    }

    pub(crate) fn cell(&self, cell: CellIdx) -> Option<u8> {
        self.clues[cell]
    }

    pub(crate) fn set_cell(&mut self, cell: CellIdx, clue: Option<u8>) {
        debug_assert!(clue.map_or(true, |v| v <= 4));
        self.clues[cell] = clue;
    }

    pub(crate) fn clues(&self) -> &CellVec<Option<u8>> {
        &self.clues
    }

    /// The cells which carry a clue, in index order
    pub fn clued_cells(&self) -> impl Iterator<Item = CellIdx> + '_ {
        self.clues
            .indexed_iter()
            .filter(|(_, c)| c.is_some())
            .map(|(cell, _)| cell)
    }

    pub fn num_clues(&self) -> usize {
        self.clues.iter().filter(|c| c.is_some()).count()
    }

    /// The fraction of cells which carry a clue
    pub fn density(&self) -> f32 {
        self.num_clues() as f32 / self.clues.len() as f32
    }
}

impl TryFrom<Vec<Vec<Option<i64>>>> for ClueGrid {
    type Error = InvalidInput;

    /// Decodes the boundary format, where `-1` or `null` both mean 'no clue'
    fn try_from(rows: Vec<Vec<Option<i64>>>) -> Result<Self, Self::Error> {
        let mut decoded = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let mut decoded_line = Vec::with_capacity(line.len());
            for (col, clue) in line.iter().enumerate() {
                decoded_line.push(match clue {
                    None | Some(-1) => None,
                    Some(value @ 0..=4) => Some(*value as u8),
                    Some(value) => {
                        return Err(InvalidInput::ClueOutOfRange {
                            row,
                            col,
                            value: *value,
                        })
                    }
                });
            }
            decoded.push(decoded_line);
        }
        Self::from_rows(&decoded)
    }
}

impl From<ClueGrid> for Vec<Vec<i64>> {
    /// Encodes to the boundary format, where `-1` means 'no clue'
    fn from(clues: ClueGrid) -> Self {
        clues
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(|c| c.map_or(-1, i64::from)).collect_vec())
            .collect_vec()
    }
}

impl Display for ClueGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row
                .iter()
                .map(|c| c.map_or('.', |v| (b'0' + v) as char))
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// How hard a generated puzzle should be.  Difficulty is approximated by clue density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Difficult];

    /// The single-letter code used in display seeds
    pub fn code(self) -> char {
        match self {
            Difficulty::Easy => 'e',
            Difficulty::Medium => 'm',
            Difficulty::Difficult => 'd',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Difficulty {
    type Err = InvalidInput;

    /// Parses either the full name or the single-letter code (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "e" => Ok(Difficulty::Easy),
            "medium" | "m" => Ok(Difficulty::Medium),
            "difficult" | "d" => Ok(Difficulty::Difficult),
            _ => Err(InvalidInput::UnknownDifficulty(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clue_rows() {
        let rows = vec![vec![Some(3), None], vec![None, Some(0)]];
        let clues = ClueGrid::from_rows(&rows).unwrap();
        assert_eq!(clues.grid().size(), 3);
        assert_eq!(clues.num_clues(), 2);
        assert_eq!(clues.density(), 0.5);
        assert_eq!(clues.get(0, 0), Some(3));
        assert_eq!(clues.get(1, 0), None);
        assert_eq!(clues.rows(), rows);
        assert_eq!(clues.to_string(), "3.\n.0\n");
    }

    #[test]
    fn bad_clue_rows() {
        assert_eq!(
            ClueGrid::from_rows(&[]),
            Err(InvalidInput::GridTooSmall { size: 1 })
        );
        assert_eq!(
            ClueGrid::from_rows(&[vec![Some(1), None], vec![None]]),
            Err(InvalidInput::ClueShapeMismatch {
                rows: 1,
                expected: 2
            })
        );
        assert_eq!(
            ClueGrid::from_rows(&[vec![Some(5)]]),
            Err(InvalidInput::ClueOutOfRange {
                row: 0,
                col: 0,
                value: 5
            })
        );
    }

    #[test]
    fn set_out_of_range_cell() {
        let mut clues = ClueGrid::empty(&Grid::new(3).unwrap());
        assert_eq!(
            clues.set(2, 0, Some(1)),
            Err(InvalidInput::CellOutOfRange { row: 2, col: 0 })
        );
    }

    #[test]
    fn clues_from_square_loop() {
        // The outline of the whole 3x3-dot grid
        let grid = Grid::new(3).unwrap();
        let solution = EdgeAssignment::from_on_edges(
            &grid,
            vec![
                grid.horizontal(0, 0),
                grid.horizontal(0, 1),
                grid.horizontal(2, 0),
                grid.horizontal(2, 1),
                grid.vertical(0, 0),
                grid.vertical(1, 0),
                grid.vertical(0, 2),
                grid.vertical(1, 2),
            ],
        );
        let clues = ClueGrid::from_solution(&solution);
        assert_eq!(
            clues.rows(),
            vec![vec![Some(2), Some(2)], vec![Some(2), Some(2)]]
        );
        assert_eq!(clues.density(), 1.0);
    }

    #[test]
    fn difficulty_names() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.name().parse::<Difficulty>(), Ok(difficulty));
            assert_eq!(
                difficulty.code().to_string().parse::<Difficulty>(),
                Ok(difficulty)
            );
        }
        assert!("hard".parse::<Difficulty>().is_err());
    }
}
