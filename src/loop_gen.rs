//! Random generation of solution loops.  A loop is grown as a self-avoiding walk over the dots,
//! which closes as soon as it's long enough and its end is next to its start.  A walk that gets
//! stuck backtracks, and a walk that runs out of backtracks is abandoned and restarted from a new
//! random dot.

use itertools::Itertools;
use log::{debug, trace};
use rand::{seq::SliceRandom, Rng};

use crate::{
    error::Error,
    grid::Grid,
    indexed_vec::{DotIdx, DotVec, IdxType},
    types::EdgeAssignment,
};

/// Generates a random simple closed loop on `grid`.  The loop is returned as a complete
/// [`EdgeAssignment`] whose `on` edges are exactly the loop.
pub fn generate_loop(
    grid: &Grid,
    config: &Config,
    rng: &mut impl Rng,
) -> Result<EdgeAssignment, Error> {
    for restart in 0..config.max_restarts {
        match random_walk(grid, config, rng) {
            Some(path) => {
                debug!(
                    "Generated loop of length {} on {}x{} grid after {} restart(s)",
                    path.len(),
                    grid.size(),
                    grid.size(),
                    restart
                );
                // The path's end is adjacent to its start, so every consecutive pair (including
                // the wrap-around) is joined by an edge
                let edges = path
                    .iter()
                    .copied()
                    .circular_tuple_windows::<(_, _)>()
                    .filter_map(|(a, b)| grid.edge_between(a, b))
                    .collect_vec();
                debug_assert_eq!(edges.len(), path.len());
                return Ok(EdgeAssignment::from_on_edges(grid, edges));
            }
            None => trace!("Loop walk #{} ran out of backtracks", restart),
        }
    }
    Err(Error::GenerationFailed {
        restarts: config.max_restarts,
    })
}

/// Attempt to grow a closed walk from a random start dot.  Returns the dots of the loop in walk
/// order, or `None` if the backtrack budget ran out first.
fn random_walk(grid: &Grid, config: &Config, rng: &mut impl Rng) -> Option<Vec<DotIdx>> {
    let (min_len, max_len) = config.length_range(grid);
    let target_len = rng.gen_range(min_len..=max_len);
    let max_backtracks = config.backtracks_per_dot * grid.num_dots();

    let start = DotIdx::from_idx(rng.gen_range(0..grid.num_dots()));
    let mut on_path = DotVec::repeat(false, grid.num_dots());
    on_path[start] = true;
    // Each frame is a dot on the path, along with the neighbours which are still to be tried from
    // that dot
    let mut stack = vec![(start, shuffled_neighbours(grid, start, rng))];
    let mut backtracks = 0;

    loop {
        let (dot, next) = match stack.last_mut() {
            Some((dot, untried)) => (*dot, untried.pop()),
            None => return None,
        };
        if stack.len() >= target_len && stack.len() >= 4 && grid.edge_between(dot, start).is_some()
        {
            return Some(stack.into_iter().map(|(dot, _)| dot).collect_vec());
        }
        match next {
            Some(next) if !on_path[next] => {
                on_path[next] = true;
                let untried = shuffled_neighbours(grid, next, rng);
                stack.push((next, untried));
            }
            // Already on the path, so stepping there would cross the walk
            Some(_) => {}
            // Dead end
            None => {
                on_path[dot] = false;
                stack.pop();
                backtracks += 1;
                if backtracks > max_backtracks {
                    return None;
                }
            }
        }
    }
}

fn shuffled_neighbours(grid: &Grid, dot: DotIdx, rng: &mut impl Rng) -> Vec<DotIdx> {
    let mut neighbours = grid.neighbours(dot).collect_vec();
    neighbours.shuffle(rng);
    neighbours
}

/// Configuration parameters for [`generate_loop`]
#[derive(Debug, Clone)]
pub struct Config {
    /// How many times a walk can be abandoned before generation fails with
    /// [`Error::GenerationFailed`]
    pub max_restarts: usize,
    /// Each walk may backtrack this many times per dot in the grid before it's abandoned
    pub backtracks_per_dot: usize,
    /// The shortest loop which will be generated, as a fraction of the number of dots
    pub min_fill: f32,
    /// The longest target length for a loop, as a fraction of the number of dots.  Loops
    /// can overshoot their target slightly when the walk's end isn't next to its start.
    pub max_fill: f32,
}

impl Config {
    /// The range of target loop lengths for `grid`, which is always at least 4 and at most the
    /// number of dots
    fn length_range(&self, grid: &Grid) -> (usize, usize) {
        let num_dots = grid.num_dots();
        let scaled = |fill: f32| (num_dots as f32 * fill) as usize;
        let min_len = scaled(self.min_fill).clamp(4, num_dots);
        let max_len = scaled(self.max_fill).clamp(min_len, num_dots);
        (min_len, max_len)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_restarts: 500,
            backtracks_per_dot: 64,
            min_fill: 0.35,
            max_fill: 0.8,
        }
    }
}
