//! Generating many puzzles in one go.  Each puzzle is an independent generation with its own seed;
//! a failure only loses that one puzzle.

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    grid::Grid,
    puzzle_gen::{self, Puzzle, PuzzleGen},
    types::Difficulty,
};

/// A request for `count` puzzles of one size and difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRequest {
    pub grid_size: usize,
    pub difficulty: Difficulty,
    pub count: usize,
}

/// The outcome of [`batch_generate`]
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub puzzles: Vec<Puzzle>,
    pub total_generated: usize,
    /// The number of puzzles which couldn't be generated
    pub failed_count: usize,
}

/// Generates every puzzle asked for by `requests`.  Puzzle seeds are drawn from a generator seeded
/// by `seed`, so the whole batch is reproducible.
///
/// Malformed requests are rejected before anything is generated, and cancellation aborts the whole
/// batch.  Puzzles which fail in any other way are counted in
/// [`BatchReport::failed_count`].
pub fn batch_generate(
    requests: &[BatchRequest],
    config: &puzzle_gen::Config,
    seed: u64,
) -> Result<BatchReport, Error> {
    let grids = requests
        .iter()
        .map(|request| Grid::new(request.grid_size))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seed_rng = ChaCha8Rng::seed_from_u64(seed);
    let mut report = BatchReport::default();
    for (request, grid) in requests.iter().zip(grids) {
        info!(
            "Batch generating {} puzzles: {}x{}, {}",
            request.count, request.grid_size, request.grid_size, request.difficulty
        );
        let generator = PuzzleGen::new(&grid, config.clone());
        for i in 0..request.count {
            let puzzle_seed = seed_rng.gen::<u64>();
            match generator.generate(request.difficulty, puzzle_seed) {
                Ok(puzzle) => report.puzzles.push(puzzle),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!(
                        "Failed to generate puzzle {}/{} for {}: {}",
                        i + 1,
                        request.count,
                        request.difficulty,
                        e
                    );
                    report.failed_count += 1;
                }
            }
        }
    }
    report.total_generated = report.puzzles.len();
    info!(
        "Batch generation completed: {} success, {} failed",
        report.total_generated, report.failed_count
    );
    Ok(report)
}
