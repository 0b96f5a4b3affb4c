//! Search-free checks on complete edge assignments.  These are what the outside world uses to
//! check a player's submitted solution.

use itertools::Itertools;

use crate::{
    indexed_vec::DotIdx,
    types::{ClueGrid, EdgeAssignment, EdgeState},
};

/// Returns `true` if `candidate` is complete, matches every clue exactly and its `on` edges form a
/// single simple loop.  Returns `false` (rather than an error) for assignments built for a
/// different grid size.
pub fn validate_assignment(clues: &ClueGrid, candidate: &EdgeAssignment) -> bool {
    candidate.grid() == clues.grid()
        && clues_satisfied(clues, candidate)
        && is_single_loop(candidate)
}

/// Returns `true` if every clued cell is bordered by exactly as many `on` edges as its clue
pub fn clues_satisfied(clues: &ClueGrid, assignment: &EdgeAssignment) -> bool {
    let grid = clues.grid();
    clues.clued_cells().all(|cell| {
        clues.cell(cell) == Some(grid.cell_count(assignment, cell) as u8)
    })
}

/// Returns `true` if `assignment` is complete and its `on` edges form exactly one simple closed
/// loop
pub fn is_single_loop(assignment: &EdgeAssignment) -> bool {
    trace_loop(assignment).is_some()
}

/// Walks the loop in `assignment`, returning its dots in clockwise order starting from the
/// top-left-most dot.  Returns `None` if the assignment is incomplete or isn't exactly one simple
/// loop.
pub fn trace_loop(assignment: &EdgeAssignment) -> Option<Vec<DotIdx>> {
    let grid = assignment.grid();
    if !assignment.is_complete() {
        return None;
    }
    // A simple loop never branches or dead-ends
    if grid
        .dots()
        .any(|dot| !matches!(grid.dot_degree(assignment, dot), 0 | 2))
    {
        return None;
    }
    // Horizontal edges are numbered first and row-major, so the first `on` edge is the top edge of
    // the loop's top-left corner.  Leaving that corner rightwards makes the walk clockwise.
    let first_edge = assignment.on_edges().next()?;
    let (start, mut current) = grid.edge_dots(first_edge);
    let mut prev_edge = first_edge;
    let mut dots = vec![start];
    while current != start {
        dots.push(current);
        let next_edge = grid
            .edges_of_dot(current)
            .filter(|&edge| edge != prev_edge && assignment.get(edge) == EdgeState::On)
            .exactly_one()
            .ok()?;
        current = grid.other_dot(next_edge, current);
        prev_edge = next_edge;
    }
    // If we walked all the way round without touching every `on` edge, then there must be another
    // disjoint loop somewhere else
    (dots.len() == assignment.num_on()).then(|| dots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    /// The outline of a `w` by `h` rectangle of cells with its top-left dot at `(row, col)`
    fn rectangle(grid: &Grid, row: usize, col: usize, w: usize, h: usize) -> Vec<crate::indexed_vec::EdgeIdx> {
        let mut edges = Vec::new();
        for c in col..col + w {
            edges.push(grid.horizontal(row, c));
            edges.push(grid.horizontal(row + h, c));
        }
        for r in row..row + h {
            edges.push(grid.vertical(r, col));
            edges.push(grid.vertical(r, col + w));
        }
        edges
    }

    #[test]
    fn square_is_a_loop() {
        let grid = Grid::new(4).unwrap();
        let loop_ = EdgeAssignment::from_on_edges(&grid, rectangle(&grid, 1, 1, 2, 2));
        assert!(is_single_loop(&loop_));
        let dots = trace_loop(&loop_).unwrap();
        assert_eq!(dots.len(), 8);
        // Clockwise from the top-left corner
        assert_eq!(dots[0], grid.dot_idx(1, 1));
        assert_eq!(dots[1], grid.dot_idx(1, 2));
        assert_eq!(dots[7], grid.dot_idx(2, 1));
    }

    #[test]
    fn two_loops_are_rejected() {
        let grid = Grid::new(5).unwrap();
        let mut edges = rectangle(&grid, 0, 0, 1, 1);
        edges.extend(rectangle(&grid, 2, 2, 2, 2));
        let assignment = EdgeAssignment::from_on_edges(&grid, edges);
        assert!(!is_single_loop(&assignment));
    }

    #[test]
    fn empty_and_incomplete_are_rejected() {
        let grid = Grid::new(3).unwrap();
        assert!(!is_single_loop(&EdgeAssignment::from_on_edges(&grid, vec![])));
        assert!(!is_single_loop(&EdgeAssignment::unknown(&grid)));
    }

    #[test]
    fn dead_end_is_rejected() {
        let grid = Grid::new(3).unwrap();
        let mut edges = rectangle(&grid, 0, 0, 1, 1);
        edges.push(grid.horizontal(1, 1));
        let assignment = EdgeAssignment::from_on_edges(&grid, edges);
        assert!(!is_single_loop(&assignment));
    }

    #[test]
    fn validation_checks_clues() {
        let grid = Grid::new(3).unwrap();
        let solution = EdgeAssignment::from_on_edges(&grid, rectangle(&grid, 0, 0, 2, 1));
        let clues = ClueGrid::from_solution(&solution);
        assert!(validate_assignment(&clues, &solution));

        let other = EdgeAssignment::from_on_edges(&grid, rectangle(&grid, 0, 0, 1, 1));
        assert!(is_single_loop(&other));
        assert!(!validate_assignment(&clues, &other));

        let smaller_grid = Grid::new(2).unwrap();
        let wrong_size = EdgeAssignment::from_on_edges(&smaller_grid, rectangle(&smaller_grid, 0, 0, 1, 1));
        assert!(!validate_assignment(&clues, &wrong_size));
    }
}
