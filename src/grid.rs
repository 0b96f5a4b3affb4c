//! The geometry of a Slitherlink grid.  A grid of `size` dots per side has `(size - 1)^2` cells
//! and `2 * size * (size - 1)` edges.  Everything here is pure arithmetic over `size`; there is no
//! state beyond that one number.

use crate::{
    error::InvalidInput,
    indexed_vec::{CellIdx, DotIdx, EdgeIdx, IdxType},
    types::{EdgeAssignment, EdgeState},
};

/// Which way an edge runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Joins `(row, col)` to `(row, col + 1)`
    Horizontal,
    /// Joins `(row, col)` to `(row + 1, col)`
    Vertical,
}

/// An edge, named by its orientation and the coordinates of its top-left dot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub orientation: Orientation,
    pub row: usize,
    pub col: usize,
}

/// A square point grid with `size` dots on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    size: usize,
}

impl Grid {
    /// Creates a grid with `size` dots per side, which must be at least 2
    pub fn new(size: usize) -> Result<Self, InvalidInput> {
        if size < 2 {
            return Err(InvalidInput::GridTooSmall { size });
        }
        Ok(Self { size })
    }

    /// The number of dots per side
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of cells per side (one fewer than the number of dots)
    pub fn cells_per_side(&self) -> usize {
        self.size - 1
    }

    pub fn num_dots(&self) -> usize {
        self.size * self.size
    }

    pub fn num_cells(&self) -> usize {
        self.cells_per_side() * self.cells_per_side()
    }

    pub fn num_edges(&self) -> usize {
        2 * self.num_horizontal()
    }

    /// Horizontal edges come first in the edge numbering, and there are as many horizontal edges
    /// as vertical ones
    fn num_horizontal(&self) -> usize {
        self.size * (self.size - 1)
    }

    /* INDEXING */

    pub fn dot_idx(&self, row: usize, col: usize) -> DotIdx {
        debug_assert!(row < self.size && col < self.size);
        DotIdx::from_idx(row * self.size + col)
    }

    pub fn dot_coords(&self, dot: DotIdx) -> (usize, usize) {
        (dot.to_idx() / self.size, dot.to_idx() % self.size)
    }

    pub fn cell_idx(&self, row: usize, col: usize) -> CellIdx {
        debug_assert!(row < self.cells_per_side() && col < self.cells_per_side());
        CellIdx::from_idx(row * self.cells_per_side() + col)
    }

    /// Like [`Self::cell_idx`], but returns an error for coordinates outside the grid
    pub fn checked_cell_idx(&self, row: usize, col: usize) -> Result<CellIdx, InvalidInput> {
        if row >= self.cells_per_side() || col >= self.cells_per_side() {
            return Err(InvalidInput::CellOutOfRange { row, col });
        }
        Ok(self.cell_idx(row, col))
    }

    pub fn cell_coords(&self, cell: CellIdx) -> (usize, usize) {
        let n = self.cells_per_side();
        (cell.to_idx() / n, cell.to_idx() % n)
    }

    /// The edge joining `(row, col)` to `(row, col + 1)`
    pub fn horizontal(&self, row: usize, col: usize) -> EdgeIdx {
        debug_assert!(row < self.size && col + 1 < self.size);
        EdgeIdx::from_idx(row * (self.size - 1) + col)
    }

    /// The edge joining `(row, col)` to `(row + 1, col)`
    pub fn vertical(&self, row: usize, col: usize) -> EdgeIdx {
        debug_assert!(row + 1 < self.size && col < self.size);
        EdgeIdx::from_idx(self.num_horizontal() + row * self.size + col)
    }

    pub fn edge_idx(&self, edge: Edge) -> EdgeIdx {
        match edge.orientation {
            Orientation::Horizontal => self.horizontal(edge.row, edge.col),
            Orientation::Vertical => self.vertical(edge.row, edge.col),
        }
    }

    pub fn edge(&self, edge_idx: EdgeIdx) -> Edge {
        let idx = edge_idx.to_idx();
        if idx < self.num_horizontal() {
            Edge {
                orientation: Orientation::Horizontal,
                row: idx / (self.size - 1),
                col: idx % (self.size - 1),
            }
        } else {
            let idx = idx - self.num_horizontal();
            Edge {
                orientation: Orientation::Vertical,
                row: idx / self.size,
                col: idx % self.size,
            }
        }
    }

    /* ITERATION */

    pub fn dots(&self) -> impl Iterator<Item = DotIdx> {
        (0..self.num_dots()).map(DotIdx::from_idx)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeIdx> {
        (0..self.num_edges()).map(EdgeIdx::from_idx)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellIdx> {
        (0..self.num_cells()).map(CellIdx::from_idx)
    }

    /* GEOMETRY */

    /// The four edges bordering a cell, in the order top, bottom, left, right
    pub fn cell_edges(&self, cell: CellIdx) -> [EdgeIdx; 4] {
        let (row, col) = self.cell_coords(cell);
        [
            self.horizontal(row, col),
            self.horizontal(row + 1, col),
            self.vertical(row, col),
            self.vertical(row, col + 1),
        ]
    }

    /// The edges touching a dot, in the order up, down, left, right.  Corner dots have 2 and other
    /// border dots have 3.
    pub fn edges_of_dot(&self, dot: DotIdx) -> impl Iterator<Item = EdgeIdx> {
        let (row, col) = self.dot_coords(dot);
        let last = self.size - 1;
        [
            (row > 0).then(|| self.vertical(row - 1, col)),
            (row < last).then(|| self.vertical(row, col)),
            (col > 0).then(|| self.horizontal(row, col - 1)),
            (col < last).then(|| self.horizontal(row, col)),
        ]
        .into_iter()
        .flatten()
    }

    /// The two dots joined by an edge, top/left dot first
    pub fn edge_dots(&self, edge_idx: EdgeIdx) -> (DotIdx, DotIdx) {
        let edge = self.edge(edge_idx);
        let first = self.dot_idx(edge.row, edge.col);
        let second = match edge.orientation {
            Orientation::Horizontal => self.dot_idx(edge.row, edge.col + 1),
            Orientation::Vertical => self.dot_idx(edge.row + 1, edge.col),
        };
        (first, second)
    }

    /// The cells bordered by an edge: two for interior edges, one for edges on the boundary
    pub fn edge_cells(&self, edge_idx: EdgeIdx) -> impl Iterator<Item = CellIdx> {
        let edge = self.edge(edge_idx);
        let last = self.cells_per_side();
        let (before, after) = match edge.orientation {
            // Cells above and below
            Orientation::Horizontal => (
                (edge.row > 0).then(|| self.cell_idx(edge.row - 1, edge.col)),
                (edge.row < last).then(|| self.cell_idx(edge.row, edge.col)),
            ),
            // Cells left and right
            Orientation::Vertical => (
                (edge.col > 0).then(|| self.cell_idx(edge.row, edge.col - 1)),
                (edge.col < last).then(|| self.cell_idx(edge.row, edge.col)),
            ),
        };
        [before, after].into_iter().flatten()
    }

    /// The dot at the other end of `edge` from `dot`
    pub fn other_dot(&self, edge: EdgeIdx, dot: DotIdx) -> DotIdx {
        let (a, b) = self.edge_dots(edge);
        debug_assert!(dot == a || dot == b);
        if dot == a {
            b
        } else {
            a
        }
    }

    /// The edge joining two dots, or `None` if they aren't orthogonally adjacent
    pub fn edge_between(&self, a: DotIdx, b: DotIdx) -> Option<EdgeIdx> {
        self.edges_of_dot(a)
            .find(|&edge| self.other_dot(edge, a) == b)
    }

    /// The dots orthogonally adjacent to `dot`
    pub fn neighbours(&self, dot: DotIdx) -> impl Iterator<Item = DotIdx> + '_ {
        self.edges_of_dot(dot)
            .map(move |edge| self.other_dot(edge, dot))
    }

    /// The number of `on` edges touching a dot
    pub fn dot_degree(&self, assignment: &EdgeAssignment, dot: DotIdx) -> usize {
        self.edges_of_dot(dot)
            .filter(|&edge| assignment.get(edge) == EdgeState::On)
            .count()
    }

    /// The number of `on` edges bordering a cell
    pub fn cell_count(&self, assignment: &EdgeAssignment, cell: CellIdx) -> usize {
        self.cell_edges(cell)
            .iter()
            .filter(|&&edge| assignment.get(edge) == EdgeState::On)
            .count()
    }
}
