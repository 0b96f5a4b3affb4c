use std::fmt::{Display, Formatter};

use crate::{
    grid::Grid,
    indexed_vec::{CellIdx, CellVec, DotIdx, DotVec, EdgeIdx, EdgeVec},
    types::{ClueGrid, EdgeAssignment, EdgeState},
};

use super::union_find::{Join, UndoUnionFind};

/// Returned when an assignment breaks a clue or loop constraint.  This is expected (and frequent)
/// during search, so it carries no information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Contradiction;

/// A constraint which needs re-checking because one of its edges changed
#[derive(Debug, Clone, Copy)]
enum Check {
    Cell(CellIdx),
    Dot(DotIdx),
    /// The loop has closed, so every remaining unknown edge must be `off`
    SealLoop,
}

/// The state of a `Partial`ly solved grid.  Every change is recorded on a trail, so that the
/// search can backtrack by undoing changes instead of cloning the whole state.
#[derive(Debug, Clone)]
pub(super) struct Partial<'t> {
    table: &'t Table,
    clues: CellVec<Option<u8>>,
    states: EdgeVec<EdgeState>,

    /// Number of `on` and `off` edges around each cell
    ///
    /// Invariant: these agree with `states`
    cell_on: CellVec<usize>,
    cell_off: CellVec<usize>,
    /// Number of `on` and `off` edges touching each dot
    ///
    /// Invariant: these agree with `states`
    dot_on: DotVec<usize>,
    dot_off: DotVec<usize>,
    num_on: usize,
    num_unknown: usize,

    /// Every edge which has been decided, in the order that they were decided
    trail: Vec<EdgeIdx>,
    /// The `on` edges of `trail`, in the same order
    on_trail: Vec<EdgeIdx>,
    /// Connectivity of the `on` edges.  This has one history entry per `on` edge in `trail`.
    components: UndoUnionFind,
    /// The position in `trail` of the edge which closed the loop (if it has closed)
    closed_at: Option<usize>,
    queue: Vec<Check>,
}

impl<'t> Partial<'t> {
    /// Create a `Partial` where every edge is unknown.  All constraints are queued for checking,
    /// so the first [`Self::propagate`] makes every deduction available from the clues alone.
    pub fn new(table: &'t Table, clues: &ClueGrid) -> Self {
        let grid = &table.grid;
        let queue = grid
            .cells()
            .map(Check::Cell)
            .chain(grid.dots().map(Check::Dot))
            .collect();
        Self {
            table,
            clues: clues.clues().clone(),
            states: EdgeVec::repeat(EdgeState::Unknown, grid.num_edges()),
            cell_on: CellVec::repeat(0, grid.num_cells()),
            cell_off: CellVec::repeat(0, grid.num_cells()),
            dot_on: DotVec::repeat(0, grid.num_dots()),
            dot_off: DotVec::repeat(0, grid.num_dots()),
            num_on: 0,
            num_unknown: grid.num_edges(),
            trail: Vec::with_capacity(grid.num_edges()),
            on_trail: Vec::new(),
            components: UndoUnionFind::new(grid.num_dots()),
            closed_at: None,
            queue,
        }
    }

    /// A position which [`Self::undo_to`] can later return to
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Undo every assignment made since `mark` was taken
    pub fn undo_to(&mut self, mark: usize) {
        self.queue.clear();
        let undone = self.trail.split_off(mark);
        for edge in undone.into_iter().rev() {
            let (a, b) = self.table.edge_dots[edge];
            match self.states[edge] {
                EdgeState::On => {
                    self.components.undo();
                    self.on_trail.pop();
                    self.num_on -= 1;
                    self.dot_on[a] -= 1;
                    self.dot_on[b] -= 1;
                    for &cell in &self.table.edge_cells[edge] {
                        self.cell_on[cell] -= 1;
                    }
                }
                EdgeState::Off => {
                    self.dot_off[a] -= 1;
                    self.dot_off[b] -= 1;
                    for &cell in &self.table.edge_cells[edge] {
                        self.cell_off[cell] -= 1;
                    }
                }
                EdgeState::Unknown => unreachable!("unknown edge on the trail"),
            }
            self.states[edge] = EdgeState::Unknown;
            self.num_unknown += 1;
        }
        if self.closed_at.map_or(false, |pos| pos >= mark) {
            self.closed_at = None;
        }
        self.debug_assert_invariants();
    }

    /// Decide the state of a single edge, queueing every constraint that it touches.  Deciding an
    /// edge to the state it already has does nothing.
    pub fn assign(&mut self, edge: EdgeIdx, state: EdgeState) -> Result<(), Contradiction> {
        debug_assert_ne!(state, EdgeState::Unknown);
        match self.states[edge] {
            EdgeState::Unknown => {}
            current if current == state => return Ok(()),
            _ => return Err(Contradiction),
        }
        // Nothing can join a loop once it has closed
        if state == EdgeState::On && self.closed_at.is_some() {
            return Err(Contradiction);
        }

        let table = self.table;
        let (a, b) = table.edge_dots[edge];
        self.states[edge] = state;
        self.num_unknown -= 1;
        self.trail.push(edge);
        match state {
            EdgeState::On => {
                self.on_trail.push(edge);
                self.num_on += 1;
                self.dot_on[a] += 1;
                self.dot_on[b] += 1;
                for &cell in &table.edge_cells[edge] {
                    self.cell_on[cell] += 1;
                }
                match self.components.add_edge(a, b) {
                    // The ends of the joined path may now be next to each other
                    Join::Merged { ends } => {
                        self.queue.extend(ends.iter().copied().map(Check::Dot))
                    }
                    Join::Closed { num_edges } => {
                        // A cycle is only allowed to close if it contains every `on` edge;
                        // anything else would leave a second loop (or a stray path) elsewhere
                        if num_edges != self.num_on {
                            return Err(Contradiction);
                        }
                        self.closed_at = Some(self.trail.len() - 1);
                        self.queue.push(Check::SealLoop);
                    }
                }
            }
            EdgeState::Off => {
                self.dot_off[a] += 1;
                self.dot_off[b] += 1;
                for &cell in &table.edge_cells[edge] {
                    self.cell_off[cell] += 1;
                }
            }
            EdgeState::Unknown => unreachable!(),
        }

        self.queue.push(Check::Dot(a));
        self.queue.push(Check::Dot(b));
        self.queue
            .extend(table.edge_cells[edge].iter().copied().map(Check::Cell));
        Ok(())
    }

    /// Repeatedly apply forced deductions until none are left (or a constraint is broken)
    pub fn propagate(&mut self) -> Result<(), Contradiction> {
        let result = self.propagate_queue();
        if result.is_err() {
            self.queue.clear();
        }
        self.debug_assert_invariants();
        result
    }

    fn propagate_queue(&mut self) -> Result<(), Contradiction> {
        while let Some(check) = self.queue.pop() {
            match check {
                Check::Cell(cell) => self.check_cell(cell)?,
                Check::Dot(dot) => self.check_dot(dot)?,
                Check::SealLoop => self.seal_loop()?,
            }
        }
        Ok(())
    }

    /// A cell with clue `k` needs exactly `k` `on` edges
    fn check_cell(&mut self, cell: CellIdx) -> Result<(), Contradiction> {
        let clue = match self.clues[cell] {
            Some(clue) => clue as usize,
            None => return Ok(()),
        };
        let on = self.cell_on[cell];
        let unknown = 4 - on - self.cell_off[cell];
        if on > clue || on + unknown < clue {
            return Err(Contradiction);
        }
        let fill = if unknown == 0 {
            return Ok(());
        } else if on == clue {
            EdgeState::Off
        } else if on + unknown == clue {
            EdgeState::On
        } else {
            return Ok(());
        };
        let table = self.table;
        for &edge in &table.cell_edges[cell] {
            if self.states[edge] == EdgeState::Unknown {
                self.assign(edge, fill)?;
            }
        }
        Ok(())
    }

    /// Every dot has either 0 or 2 `on` edges
    fn check_dot(&mut self, dot: DotIdx) -> Result<(), Contradiction> {
        let table = self.table;
        let edges = &table.dot_edges[dot];
        let on = self.dot_on[dot];
        let unknown = edges.len() - on - self.dot_off[dot];
        match (on, unknown) {
            // The loop would branch
            (on, _) if on > 2 => Err(Contradiction),
            // The loop would dead-end here
            (1, 0) => Err(Contradiction),
            (_, 0) => Ok(()),
            // Either the path through this dot is complete, or there's only one way in and
            // therefore no way out
            (2, _) | (0, 1) => self.assign_all(self.unknown_edges(edges), EdgeState::Off),
            // A path ends here and has only one way to continue
            (1, 1) => self.assign_all(self.unknown_edges(edges), EdgeState::On),
            (0, _) => Ok(()),
            // A path ends here, so it can't join its own other end unless that finishes the loop
            _ => {
                if self.components.component_edges(dot) == self.num_on {
                    return Ok(());
                }
                let other_end = self.components.partner(dot);
                match table.grid.edge_between(dot, other_end) {
                    Some(edge) if self.states[edge] == EdgeState::Unknown => {
                        self.assign(edge, EdgeState::Off)
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    fn unknown_edges(&self, edges: &[EdgeIdx]) -> Vec<EdgeIdx> {
        edges
            .iter()
            .copied()
            .filter(|&e| self.states[e] == EdgeState::Unknown)
            .collect()
    }

    fn assign_all(&mut self, edges: Vec<EdgeIdx>, state: EdgeState) -> Result<(), Contradiction> {
        for edge in edges {
            self.assign(edge, state)?;
        }
        Ok(())
    }

    fn seal_loop(&mut self) -> Result<(), Contradiction> {
        for edge in self.table.grid.edges() {
            if self.states[edge] == EdgeState::Unknown {
                self.assign(edge, EdgeState::Off)?;
            }
        }
        Ok(())
    }

    /// Is every edge decided, with the `on` edges forming one closed loop?
    pub fn is_solved(&self, min_loop_len: usize) -> bool {
        self.num_unknown == 0 && self.closed_at.is_some() && self.num_on >= min_loop_len
    }

    /// Picks an undecided edge to branch on, or `None` if every edge is decided.  If any path
    /// has been started, the search extends the most recently grown one.  Otherwise every edge is
    /// a candidate.  Candidates next to nearly-decided clues are preferred, and ties go to the
    /// highest index so the choice is deterministic.
    pub fn pick_branch_edge(&self) -> Option<EdgeIdx> {
        let by_priority = |&edge: &EdgeIdx| (self.branch_priority(edge), edge);
        let path_edge = self.open_path_end().and_then(|dot| {
            self.unknown_edges(&self.table.dot_edges[dot])
                .into_iter()
                .max_by_key(by_priority)
        });
        path_edge.or_else(|| {
            self.states
                .indexed_iter()
                .filter(|(_, state)| **state == EdgeState::Unknown)
                .map(|(edge, _)| edge)
                .max_by_key(by_priority)
        })
    }

    /// A dot with exactly one `on` edge, found by walking back from the newest `on` edge.  The
    /// newest edge nearly always has a free end, so this rarely looks far.
    fn open_path_end(&self) -> Option<DotIdx> {
        self.on_trail
            .iter()
            .rev()
            .flat_map(|&edge| {
                let (a, b) = self.table.edge_dots[edge];
                [a, b]
            })
            .find(|&dot| self.dot_on[dot] == 1)
    }

    fn branch_priority(&self, edge: EdgeIdx) -> usize {
        let (a, b) = self.table.edge_dots[edge];
        let mut priority = 0;
        for dot in [a, b] {
            if self.dot_on[dot] == 1 {
                priority += 8;
            }
        }
        for &cell in &self.table.edge_cells[edge] {
            if self.clues[cell].is_some() {
                let decided = self.cell_on[cell] + self.cell_off[cell];
                priority += 1 + decided;
            }
        }
        priority
    }

    /// Copy out the current edge states
    pub fn to_assignment(&self) -> EdgeAssignment {
        EdgeAssignment::from_states(&self.table.grid, self.states.clone())
    }

    /// Asserts that `self` upholds the required invariants, and panics otherwise (does nothing in
    /// release mode)
    #[cfg(debug_assertions)]
    pub fn debug_assert_invariants(&self) {
        let table = self.table;
        let count = |edges: &[EdgeIdx], state: EdgeState| {
            edges.iter().filter(|&&e| self.states[e] == state).count()
        };
        for (cell, edges) in table.cell_edges.indexed_iter() {
            assert_eq!(self.cell_on[cell], count(&edges[..], EdgeState::On));
            assert_eq!(self.cell_off[cell], count(&edges[..], EdgeState::Off));
        }
        for (dot, edges) in table.dot_edges.indexed_iter() {
            assert_eq!(self.dot_on[dot], count(&edges[..], EdgeState::On));
            assert_eq!(self.dot_off[dot], count(&edges[..], EdgeState::Off));
        }
        assert_eq!(self.num_on, count_states(&self.states, EdgeState::On));
        assert_eq!(self.num_unknown, count_states(&self.states, EdgeState::Unknown));
        assert_eq!(self.trail.len() + self.num_unknown, self.states.len());
        assert_eq!(self.on_trail.len(), self.num_on);
    }

    /// Asserts that `self` upholds the required invariants, and panics otherwise (does nothing in
    /// release mode)
    #[cfg(not(debug_assertions))]
    #[inline(always)]
    pub fn debug_assert_invariants(&self) {}
}

#[cfg(debug_assertions)]
fn count_states(states: &EdgeVec<EdgeState>, state: EdgeState) -> usize {
    states.iter().filter(|s| **s == state).count()
}

impl Display for Partial<'_> {
    /// Draws the grid with `-`/`|` for `on` edges, `x` for `off` edges and spaces for unknown
    /// edges
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let grid = &self.table.grid;
        let symbol = |edge: EdgeIdx, on: char| match self.states[edge] {
            EdgeState::On => on,
            EdgeState::Off => 'x',
            EdgeState::Unknown => ' ',
        };
        for row in 0..grid.size() {
            let mut line = String::new();
            for col in 0..grid.size() {
                line.push('+');
                if col + 1 < grid.size() {
                    line.push(symbol(grid.horizontal(row, col), '-'));
                }
            }
            writeln!(f, "{}", line)?;
            if row + 1 == grid.size() {
                break;
            }
            let mut line = String::new();
            for col in 0..grid.size() {
                line.push(symbol(grid.vertical(row, col), '|'));
                if col + 1 < grid.size() {
                    let clue = self.clues[grid.cell_idx(row, col)];
                    line.push(clue.map_or(' ', |v| (b'0' + v) as char));
                }
            }
            writeln!(f, "{}", line)?;
        }
        write!(f, "{} edges unknown", self.num_unknown)
    }
}

/// Lookup tables used by [`Partial`]s, built once per grid size
#[derive(Debug, Clone)]
pub(super) struct Table {
    pub grid: Grid,
    edge_dots: EdgeVec<(DotIdx, DotIdx)>,
    edge_cells: EdgeVec<Vec<CellIdx>>,
    dot_edges: DotVec<Vec<EdgeIdx>>,
    cell_edges: CellVec<[EdgeIdx; 4]>,
}

impl Table {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            grid: *grid,
            edge_dots: EdgeVec::from_fn(grid.num_edges(), |e| grid.edge_dots(e)),
            edge_cells: EdgeVec::from_fn(grid.num_edges(), |e| grid.edge_cells(e).collect()),
            dot_edges: DotVec::from_fn(grid.num_dots(), |d| grid.edges_of_dot(d).collect()),
            cell_edges: CellVec::from_fn(grid.num_cells(), |c| grid.cell_edges(c)),
        }
    }
}
