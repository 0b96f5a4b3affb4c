//! Generation and solving of Slitherlink puzzles with unique solutions.
//!
//! A puzzle is made by growing a random loop on an `N`x`N` grid of dots
//! ([`loop_gen::generate_loop`]), labelling every cell with the number of loop edges around it,
//! then removing labels for as long as the [`Solver`] confirms that they still pin down exactly
//! one loop ([`PuzzleGen::reduce_clues`]).

use log::warn;

mod batch;
mod error;
mod grid;
mod indexed_vec;
pub mod loop_gen;
mod policy;
pub mod puzzle_gen;
mod record;
pub mod solve;
mod types;
pub mod validate;

pub use batch::{batch_generate, BatchReport, BatchRequest};
pub use error::{Error, InvalidInput};
pub use grid::{Edge, Grid, Orientation};
pub use indexed_vec::{CellIdx, DotIdx, EdgeIdx, IdxType};
pub use policy::{DensityBand, DensityPolicy, RemovalOrder};
pub use puzzle_gen::{Puzzle, PuzzleGen};
pub use record::{PuzzleRecord, PuzzleSeed};
pub use solve::{CancelToken, SolveStats, Solver, SolverResult};
pub use types::{ClueGrid, Difficulty, EdgeAssignment, EdgeState};

/// Generates a puzzle with `grid_size` dots per side and a unique solution.  Without a `seed`, one
/// is drawn from the operating system's entropy source; either way the seed is stored in the
/// returned [`Puzzle`] so it can be regenerated.
pub fn generate_puzzle(
    grid_size: usize,
    difficulty: Difficulty,
    seed: Option<u64>,
) -> Result<Puzzle, Error> {
    generate_puzzle_with(grid_size, difficulty, seed, &puzzle_gen::Config::default())
}

/// Like [`generate_puzzle`], but with a custom generator config
pub fn generate_puzzle_with(
    grid_size: usize,
    difficulty: Difficulty,
    seed: Option<u64>,
    config: &puzzle_gen::Config,
) -> Result<Puzzle, Error> {
    let grid = Grid::new(grid_size)?;
    let seed = seed.unwrap_or_else(random_seed);
    PuzzleGen::new(&grid, config.clone()).generate(difficulty, seed)
}

/// Regenerates the puzzle described by a display seed such as `"7-m-12345"`
pub fn load_puzzle(seed: &str) -> Result<Puzzle, Error> {
    let seed = seed.parse::<PuzzleSeed>()?;
    generate_puzzle(seed.grid_size, seed.difficulty, Some(seed.seed))
}

/// Counts the solutions of `clues`, up to 2.  The clues are a valid puzzle if and only if
/// [`SolverResult::is_unique`] returns `true`.
pub fn check_unique_solution(grid_size: usize, clues: &ClueGrid) -> Result<SolverResult, Error> {
    solve(grid_size, clues, &solve::Config::default(), None)
}

/// Counts the solutions of `clues` (which agree with `initial`, if given) with a custom solver
/// config
pub fn solve(
    grid_size: usize,
    clues: &ClueGrid,
    config: &solve::Config,
    initial: Option<&EdgeAssignment>,
) -> Result<SolverResult, Error> {
    let grid = Grid::new(grid_size)?;
    Solver::new(&grid, config.clone()).solve_from(clues, initial)
}

/// Checks, without searching, that `candidate` is a complete single loop on a `grid_size` grid
/// which satisfies every clue.  Mismatched sizes give `false`.
pub fn validate_assignment(grid_size: usize, clues: &ClueGrid, candidate: &EdgeAssignment) -> bool {
    clues.grid().size() == grid_size && validate::validate_assignment(clues, candidate)
}

/// A fresh seed from the operating system's entropy source
pub fn random_seed() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(e) => {
            warn!("OS entropy unavailable ({}); falling back to the thread RNG", e);
            rand::random()
        }
    }
}
