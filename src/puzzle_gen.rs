use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    error::{Error, InvalidInput},
    grid::Grid,
    loop_gen::{self, generate_loop},
    policy::DensityPolicy,
    solve::{self, Solver},
    types::{ClueGrid, Difficulty, EdgeAssignment},
    validate::validate_assignment,
};

/// A generated puzzle: a partial set of clues, along with the unique loop that they describe
#[derive(Debug, Clone, PartialEq)]
pub struct Puzzle {
    /// Dots per side
    pub grid_size: usize,
    pub clues: ClueGrid,
    pub solution: EdgeAssignment,
    pub difficulty: Difficulty,
    /// The fraction of cells which carry a clue
    pub density: f32,
    /// The seed from which this puzzle can be regenerated
    pub seed: u64,
}

impl Puzzle {
    pub fn grid(&self) -> Grid {
        self.clues.grid()
    }
}

/// A generator for random Slitherlink puzzles of one grid size
#[derive(Debug, Clone)]
pub struct PuzzleGen {
    grid: Grid,
    config: Config,
    /// Checks that a loop's full clues pin it down
    solver: Solver,
    /// Checks that reduced clues still pin down their loop, with a tighter iteration limit
    reducer: Solver,
}

impl PuzzleGen {
    /// Creates a new puzzle generator for a given [`Grid`]
    pub fn new(grid: &Grid, config: Config) -> Self {
        // The reducer only needs to tell 'unique' from 'not unique'
        let solver_config = solve::Config {
            max_solutions: 2,
            ..config.solver_config.clone()
        };
        let reducer_config = solve::Config {
            max_iterations: solver_config.max_iterations.min(config.reduce_iterations),
            ..solver_config.clone()
        };
        Self {
            grid: *grid,
            solver: Solver::new(grid, solver_config),
            reducer: Solver::new(grid, reducer_config),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate a puzzle from a seed.  The same seed, grid, difficulty and config always give the
    /// same puzzle.
    pub fn generate(&self, difficulty: Difficulty, seed: u64) -> Result<Puzzle, Error> {
        self.config.policy.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (full_clues, solution) = self.unique_loop(&mut rng)?;
        let clues = self.reduce_unique_clues(&full_clues, &solution, difficulty, &mut rng)?;
        let density = clues.density();
        debug!(
            "Generated {} {}x{} puzzle from seed {}: {} clues ({:.1}% density)",
            difficulty,
            self.grid.size(),
            self.grid.size(),
            seed,
            clues.num_clues(),
            density * 100.0
        );
        Ok(Puzzle {
            grid_size: self.grid.size(),
            clues,
            solution,
            difficulty,
            density,
            seed,
        })
    }

    /// Generate loops until one is found whose full clue grid pins it down uniquely.  Nearly all
    /// loops qualify, but a full clue grid can occasionally admit a second loop and no amount of
    /// clue removal will fix that.
    fn unique_loop(&self, rng: &mut impl Rng) -> Result<(ClueGrid, EdgeAssignment), Error> {
        for attempt in 0..self.config.max_ambiguous_loops {
            let solution = generate_loop(&self.grid, &self.config.loop_config, rng)?;
            let full_clues = ClueGrid::from_solution(&solution);
            match self.solver.solve(&full_clues) {
                Ok(result) if result.is_unique() => return Ok((full_clues, solution)),
                Ok(result) => trace!(
                    "Loop #{} has {} solutions with full clues; regenerating",
                    attempt,
                    result.solution_count
                ),
                Err(Error::IterationLimitReached) => {
                    trace!("Loop #{} hit the solver's iteration limit; regenerating", attempt)
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::GenerationFailed {
            restarts: self.config.max_ambiguous_loops,
        })
    }

    /// Remove clues from `full_clues` for as long as `solution` stays their only solution,
    /// stopping once the density reaches the band for `difficulty`.  If the band can't be
    /// reached, the puzzle is returned at whatever density was achieved.
    ///
    /// `full_clues` must be uniquely solved by `solution`; anything else is
    /// [`Error::InvalidInput`].
    pub fn reduce_clues(
        &self,
        full_clues: &ClueGrid,
        solution: &EdgeAssignment,
        difficulty: Difficulty,
        rng: &mut impl Rng,
    ) -> Result<ClueGrid, Error> {
        self.config.policy.validate()?;
        if full_clues.grid() != self.grid {
            return Err(InvalidInput::ClueShapeMismatch {
                rows: full_clues.grid().cells_per_side(),
                expected: self.grid.cells_per_side(),
            }
            .into());
        }
        if !validate_assignment(full_clues, solution) {
            return Err(InvalidInput::SolutionMismatch.into());
        }
        let result = self.solver.solve(full_clues)?;
        if !result.is_unique() {
            return Err(InvalidInput::AmbiguousClues {
                solutions: result.solution_count,
            }
            .into());
        }
        self.reduce_unique_clues(full_clues, solution, difficulty, rng)
    }

    fn reduce_unique_clues(
        &self,
        full_clues: &ClueGrid,
        solution: &EdgeAssignment,
        difficulty: Difficulty,
        rng: &mut impl Rng,
    ) -> Result<ClueGrid, Error> {
        let policy = &self.config.policy;
        let band = policy.band(difficulty);
        let num_cells = self.grid.num_cells() as f32;
        let order = policy.removal_order.order(full_clues, difficulty, rng);

        let mut clues = full_clues.clone();
        let mut num_solver_runs = 0;
        for cell in order {
            if clues.density() <= band.high {
                break;
            }
            // Don't jump straight over a band narrower than one clue
            let fewer_clues = clues.num_clues().saturating_sub(1);
            if fewer_clues as f32 / num_cells < band.low {
                break;
            }

            let value = clues.cell(cell);
            clues.set_cell(cell, None);
            num_solver_runs += 1;
            match self.reducer.solve(&clues) {
                Ok(result) if result.is_unique() => {
                    trace!("Removed clue {:?} from {:?}", value, self.grid.cell_coords(cell));
                    debug_assert_eq!(result.first_solution.as_ref(), Some(solution));
                }
                Ok(result) => {
                    trace!(
                        "Kept clue {:?} at {:?} ({} solutions without it)",
                        value,
                        self.grid.cell_coords(cell),
                        result.solution_count
                    );
                    clues.set_cell(cell, value);
                }
                Err(Error::IterationLimitReached) => {
                    debug!(
                        "Solver hit its iteration limit without clue at {:?}; keeping it",
                        self.grid.cell_coords(cell)
                    );
                    clues.set_cell(cell, value);
                }
                Err(e) => return Err(e),
            }
        }

        if clues.density() > band.high {
            warn!(
                "Couldn't reduce {} puzzle below {:.1}% density (target {:.0}-{:.0}%)",
                difficulty,
                clues.density() * 100.0,
                band.low * 100.0,
                band.high * 100.0
            );
        }
        debug!(
            "Reduced {} clues to {} with {} solver runs",
            full_clues.num_clues(),
            clues.num_clues(),
            num_solver_runs
        );
        Ok(clues)
    }
}

/// Configuration parameters for a [`PuzzleGen`]erator
#[derive(Debug, Clone)]
pub struct Config {
    pub loop_config: loop_gen::Config,
    /// Config for the uniqueness checks.  `max_solutions` is always overridden to `2`.
    pub solver_config: solve::Config,
    pub policy: DensityPolicy,
    /// How many loops can be rejected for having ambiguous full clues before generation fails
    pub max_ambiguous_loops: usize,
    /// The iteration limit for each uniqueness check made while removing clues.  A check which
    /// hits it keeps its clue, so this trades density for generation time on large grids.
    pub reduce_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loop_config: loop_gen::Config::default(),
            solver_config: solve::Config::default(),
            policy: DensityPolicy::default(),
            max_ambiguous_loops: 20,
            reduce_iterations: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policy::{DensityBand, RemovalOrder},
        solve::CancelToken,
    };

    fn check_puzzle(puzzle: &Puzzle) {
        assert!(validate_assignment(&puzzle.clues, &puzzle.solution));
        let result = Solver::new(&puzzle.grid(), solve::Config::default())
            .solve(&puzzle.clues)
            .unwrap();
        assert!(result.is_unique());
        assert_eq!(result.first_solution.as_ref(), Some(&puzzle.solution));
        assert_eq!(puzzle.density, puzzle.clues.density());
    }

    #[test]
    fn generated_puzzles_are_unique() {
        for size in 2..=6 {
            let generator = PuzzleGen::new(&Grid::new(size).unwrap(), Config::default());
            for difficulty in Difficulty::ALL {
                for seed in 0..3 {
                    let puzzle = generator.generate(difficulty, seed).unwrap();
                    assert_eq!(puzzle.grid_size, size);
                    check_puzzle(&puzzle);
                }
            }
        }
    }

    #[test]
    fn prioritized_removal() {
        let config = Config {
            policy: DensityPolicy {
                removal_order: RemovalOrder::Prioritized,
                ..DensityPolicy::calibrated(6)
            },
            ..Config::default()
        };
        let generator = PuzzleGen::new(&Grid::new(6).unwrap(), config);
        for seed in 10..15 {
            check_puzzle(&generator.generate(Difficulty::Difficult, seed).unwrap());
        }
    }

    #[test]
    fn generation_is_reproducible() {
        let generator = PuzzleGen::new(&Grid::new(6).unwrap(), Config::default());
        let a = generator.generate(Difficulty::Medium, 1234).unwrap();
        let b = generator.generate(Difficulty::Medium, 1234).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reducer_stops_inside_band() {
        let grid = Grid::new(6).unwrap();
        let generator = PuzzleGen::new(&grid, Config::default());
        let band = generator.config().policy.band(Difficulty::Easy);
        for seed in 0..5 {
            let puzzle = generator.generate(Difficulty::Easy, seed).unwrap();
            // Reduction is monotone, and stops before dropping below the band
            assert!(puzzle.density <= 1.0);
            assert!(puzzle.density >= band.low);
        }
    }

    #[test]
    fn unreachable_band_emits_anyway() {
        let grid = Grid::new(4).unwrap();
        let config = Config {
            policy: DensityPolicy {
                easy: DensityBand::new(0.0, 0.0),
                ..DensityPolicy::default()
            },
            ..Config::default()
        };
        let generator = PuzzleGen::new(&grid, config);
        let puzzle = generator.generate(Difficulty::Easy, 99).unwrap();
        // An empty clue grid is never unique on a 4x4-dot grid, so some clues must remain
        assert!(puzzle.clues.num_clues() > 0);
        check_puzzle(&puzzle);
    }

    #[test]
    fn cancellation_propagates() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let config = Config {
            solver_config: solve::Config {
                cancel: Some(cancel),
                ..solve::Config::default()
            },
            ..Config::default()
        };
        let generator = PuzzleGen::new(&Grid::new(5).unwrap(), config);
        assert_eq!(
            generator.generate(Difficulty::Easy, 0),
            Err(Error::Cancelled)
        );
    }

    #[test]
    fn ambiguous_loops_are_regenerated() {
        // With this seed, the first loop on a 3x3-dot grid is an L-tromino whose full clues are
        // shared with its half-turned twin
        let grid = Grid::new(3).unwrap();
        let seed = 5;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let first_loop = generate_loop(&grid, &loop_gen::Config::default(), &mut rng).unwrap();
        let first_clues = ClueGrid::from_solution(&first_loop);
        let solver = Solver::new(&grid, solve::Config::default());
        assert_eq!(solver.solve(&first_clues).unwrap().solution_count, 2);

        let generator = PuzzleGen::new(&grid, Config::default());
        let puzzle = generator.generate(Difficulty::Medium, seed).unwrap();
        assert_ne!(puzzle.solution, first_loop);
        check_puzzle(&puzzle);
    }

    #[test]
    fn too_many_ambiguous_loops() {
        let grid = Grid::new(3).unwrap();
        for max_ambiguous_loops in [0, 1] {
            let config = Config {
                max_ambiguous_loops,
                ..Config::default()
            };
            let generator = PuzzleGen::new(&grid, config);
            assert_eq!(
                generator.generate(Difficulty::Easy, 5),
                Err(Error::GenerationFailed {
                    restarts: max_ambiguous_loops
                })
            );
        }
    }

    #[test]
    fn reducer_checks_its_input() {
        let grid = Grid::new(4).unwrap();
        let generator = PuzzleGen::new(&grid, Config::default());
        let puzzle = generator.generate(Difficulty::Easy, 8).unwrap();
        let full_clues = ClueGrid::from_solution(&puzzle.solution);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // A solution which isn't a loop, and one for a different grid
        for bad_solution in [
            EdgeAssignment::unknown(&grid),
            EdgeAssignment::unknown(&Grid::new(5).unwrap()),
        ] {
            assert_eq!(
                generator.reduce_clues(&full_clues, &bad_solution, Difficulty::Easy, &mut rng),
                Err(Error::InvalidInput(InvalidInput::SolutionMismatch))
            );
        }

        // An L-tromino's full clues are satisfied by it, but don't pin it down
        let grid = Grid::new(3).unwrap();
        let l_tromino = EdgeAssignment::from_on_edges(
            &grid,
            [
                grid.horizontal(0, 0),
                grid.horizontal(0, 1),
                grid.vertical(0, 2),
                grid.horizontal(1, 1),
                grid.vertical(1, 1),
                grid.horizontal(2, 0),
                grid.vertical(1, 0),
                grid.vertical(0, 0),
            ],
        );
        let clues = ClueGrid::from_solution(&l_tromino);
        let generator = PuzzleGen::new(&grid, Config::default());
        assert_eq!(
            generator.reduce_clues(&clues, &l_tromino, Difficulty::Easy, &mut rng),
            Err(Error::InvalidInput(InvalidInput::AmbiguousClues { solutions: 2 }))
        );

        // Unique full clues are reduced as normal
        let grid = Grid::new(4).unwrap();
        let generator = PuzzleGen::new(&grid, Config::default());
        let reduced = generator
            .reduce_clues(&full_clues, &puzzle.solution, Difficulty::Easy, &mut rng)
            .unwrap();
        assert!(reduced.num_clues() < full_clues.num_clues());
    }

    #[test]
    fn bad_bands_are_rejected() {
        let config = Config {
            policy: DensityPolicy {
                difficult: DensityBand::new(-0.5, -0.1),
                ..DensityPolicy::default()
            },
            ..Config::default()
        };
        let generator = PuzzleGen::new(&Grid::new(4).unwrap(), config);
        assert_eq!(
            generator.generate(Difficulty::Difficult, 0),
            Err(Error::InvalidInput(InvalidInput::BadDensityBand(
                "-0.5..-0.1".to_owned()
            )))
        );
    }

    #[test]
    fn reducer_iteration_limit_keeps_clues() {
        // With no room to search, only removals settled by deduction alone go ahead
        let config = Config {
            reduce_iterations: 1,
            ..Config::default()
        };
        let generator = PuzzleGen::new(&Grid::new(7).unwrap(), config);
        for seed in 0..3 {
            check_puzzle(&generator.generate(Difficulty::Difficult, seed).unwrap());
        }
    }
}
