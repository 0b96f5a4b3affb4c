//! Counting solver for Slitherlink clue sets.  The search is depth-first over edge states, with
//! forced deductions applied after every decision.  Backtracking undoes changes from a trail rather
//! than cloning state, and the decision stack is explicit so deep searches can't overflow the call
//! stack.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use log::{debug, trace};

use crate::{
    error::{Error, InvalidInput},
    grid::Grid,
    indexed_vec::EdgeIdx,
    types::{ClueGrid, EdgeAssignment, EdgeState},
};

use self::partial::{Partial, Table};

mod partial;
mod union_find;

/// Solves clue sets for grids of one size, counting solutions up to a cap.  Creating a `Solver`
/// builds lookup tables for its grid, so reusing one `Solver` for many clue sets (as the clue
/// reducer does) avoids rebuilding them.
#[derive(Debug, Clone)]
pub struct Solver {
    table: Table,
    config: Config,
}

impl Solver {
    pub fn new(grid: &Grid, config: Config) -> Self {
        Self {
            table: Table::from_grid(grid),
            config,
        }
    }

    pub fn grid(&self) -> Grid {
        self.table.grid
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Count the solutions of `clues`, stopping once [`Config::max_solutions`] have been found
    pub fn solve(&self, clues: &ClueGrid) -> Result<SolverResult, Error> {
        self.solve_from(clues, None)
    }

    /// Like [`Self::solve`], but only counts solutions which agree with every decided edge in
    /// `initial`.  `Unknown` edges in `initial` are left for the search to decide.
    pub fn solve_from(
        &self,
        clues: &ClueGrid,
        initial: Option<&EdgeAssignment>,
    ) -> Result<SolverResult, Error> {
        let grid = self.grid();
        if clues.grid() != grid {
            return Err(InvalidInput::ClueShapeMismatch {
                rows: clues.grid().cells_per_side(),
                expected: grid.cells_per_side(),
            }
            .into());
        }
        if let Some(initial) = initial {
            if initial.grid() != grid {
                return Err(InvalidInput::AssignmentSizeMismatch {
                    edges: initial.num_edges(),
                    expected: grid.num_edges(),
                }
                .into());
            }
        }

        let start = Instant::now();
        let mut search = Search::new(&self.table, &self.config, clues);
        let consistent = match initial {
            Some(initial) => search.seed(initial),
            None => true,
        };
        if consistent {
            search.run()?;
        }
        let stats = SolveStats {
            branches: search.branches,
            elapsed: start.elapsed(),
        };
        debug!(
            "Solved {}x{} clue set: {} solution(s), {} branches in {:?}",
            grid.size(),
            grid.size(),
            search.solution_count,
            stats.branches,
            stats.elapsed
        );
        Ok(SolverResult {
            solution_count: search.solution_count,
            first_solution: search.first_solution,
            stats,
        })
    }
}

/// The mutable state of one run of the search
struct Search<'a> {
    partial: Partial<'a>,
    config: &'a Config,
    decisions: Vec<Decision>,
    solution_count: usize,
    first_solution: Option<EdgeAssignment>,
    branches: usize,
}

/// A speculative edge assignment, along with how to undo it
#[derive(Debug, Clone, Copy)]
struct Decision {
    edge: EdgeIdx,
    /// The trail length before this decision was made
    mark: usize,
    /// The state currently being explored.  `On` is always tried first, then `Off`.
    state: EdgeState,
}

impl<'a> Search<'a> {
    fn new(table: &'a Table, config: &'a Config, clues: &ClueGrid) -> Self {
        Self {
            partial: Partial::new(table, clues),
            config,
            decisions: Vec::new(),
            solution_count: 0,
            first_solution: None,
            branches: 0,
        }
    }

    /// Apply the decided edges of `initial`, returning `false` if they already contradict each
    /// other (in which case there can be no solutions)
    fn seed(&mut self, initial: &EdgeAssignment) -> bool {
        initial
            .states()
            .indexed_iter()
            .filter(|(_, state)| **state != EdgeState::Unknown)
            .all(|(edge, state)| self.partial.assign(edge, *state).is_ok())
    }

    fn run(&mut self) -> Result<(), Error> {
        let max_solutions = self.config.max_solutions.max(1);
        // Whether the state after the most recent change is consistent
        let mut consistent = self.partial.propagate().is_ok();
        loop {
            self.check_interrupts()?;

            if consistent {
                if self.partial.is_solved(self.config.min_loop_len) {
                    self.record_solution();
                    if self.solution_count >= max_solutions {
                        return Ok(());
                    }
                } else if let Some(edge) = self.partial.pick_branch_edge() {
                    self.branches += 1;
                    if self.branches >= self.config.max_iterations {
                        return Err(Error::IterationLimitReached);
                    }
                    let decision = Decision {
                        edge,
                        mark: self.partial.mark(),
                        state: EdgeState::On,
                    };
                    trace!("Branching on {:?} at depth {}", edge, self.decisions.len());
                    self.decisions.push(decision);
                    consistent = self.apply(decision);
                    continue;
                }
                // Otherwise every edge is decided but the loop is too short, so this is a dead
                // end
            }

            // Backtrack to the deepest decision with an unexplored alternative
            loop {
                let decision = match self.decisions.last_mut() {
                    Some(d) => d,
                    // The whole search space has been explored
                    None => return Ok(()),
                };
                self.partial.undo_to(decision.mark);
                if decision.state == EdgeState::On {
                    decision.state = EdgeState::Off;
                    let decision = *decision;
                    consistent = self.apply(decision);
                    break;
                }
                self.decisions.pop();
            }
        }
    }

    fn apply(&mut self, decision: Decision) -> bool {
        self.partial.assign(decision.edge, decision.state).is_ok()
            && self.partial.propagate().is_ok()
    }

    fn record_solution(&mut self) {
        self.solution_count += 1;
        if self.first_solution.is_none() {
            self.first_solution = Some(self.partial.to_assignment());
        }
        trace!("Solution #{}:\n{}", self.solution_count, self.partial);
    }

    fn check_interrupts(&self) -> Result<(), Error> {
        let cancelled = self
            .config
            .cancel
            .as_ref()
            .map_or(false, CancelToken::is_cancelled);
        let expired = self
            .config
            .deadline
            .map_or(false, |deadline| Instant::now() >= deadline);
        if cancelled || expired {
            debug!("Search interrupted after {} branches", self.branches);
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// The outcome of a search which ran to completion (or hit [`Config::max_solutions`])
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// The number of solutions found, never more than [`Config::max_solutions`]
    pub solution_count: usize,
    /// The first solution found, if there were any
    pub first_solution: Option<EdgeAssignment>,
    pub stats: SolveStats,
}

impl SolverResult {
    /// Returns `true` if exactly one solution was found.  This is only meaningful if the search
    /// was allowed to look for at least 2 solutions.
    pub fn is_unique(&self) -> bool {
        self.solution_count == 1
    }

    pub fn is_unsolvable(&self) -> bool {
        self.solution_count == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// The number of speculative decisions made
    pub branches: usize,
    pub elapsed: Duration,
}

/// A flag shared between a running search and whoever may want to stop it.  Clones share the same
/// flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search holding this token to stop.  Searches check the flag between steps, so
    /// they stop soon after this is called and return [`Error::Cancelled`].
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Stop searching once this many solutions have been found.  `2` is enough to decide
    /// uniqueness.
    pub max_solutions: usize,
    /// The maximum number of branches before the search gives up with
    /// [`Error::IterationLimitReached`]
    pub max_iterations: usize,
    /// Loops with fewer edges than this aren't counted as solutions
    pub min_loop_len: usize,
    /// If set, the search returns [`Error::Cancelled`] once this time has passed
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelToken>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_solutions: 2,
            max_iterations: 10_000_000,
            min_loop_len: 0,
            deadline: None,
            cancel: None,
        }
    }
}
