use std::fmt::{Display, Formatter};

/// The ways that generating, solving or decoding a puzzle can fail.  Note that a clue set having
/// no solutions (or many solutions) is *not* an error; that is reported through
/// [`SolverResult`](crate::solve::SolverResult).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Error {
    /// The caller passed malformed input, which was rejected before any search started
    InvalidInput(InvalidInput),
    /// The loop generator ran out of restarts without producing a closed loop
    GenerationFailed { restarts: usize },
    /// The search was aborted by a [`CancelToken`](crate::solve::CancelToken) or a deadline
    Cancelled,
    /// The solver hit its branch limit before the search terminated naturally
    IterationLimitReached,
}

/// The specific ways that input to this crate can be malformed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvalidInput {
    /// Grids need at least 2 dots per side (i.e. at least one cell)
    GridTooSmall { size: usize },
    /// A clue grid has the wrong number of rows, or a row of the wrong length
    ClueShapeMismatch { rows: usize, expected: usize },
    /// A clue value outside `0..=4`
    ClueOutOfRange { row: usize, col: usize, value: i64 },
    /// A cell coordinate outside the grid
    CellOutOfRange { row: usize, col: usize },
    /// An edge assignment was built for a different grid size
    AssignmentSizeMismatch { edges: usize, expected: usize },
    /// A `[dot, next_dot]` pair which doesn't join two adjacent dots
    BadPair { from: usize, to: usize },
    /// A display seed which isn't of the form `{size}-{e|m|d}-{seed}`
    BadSeed(String),
    /// A difficulty label other than `easy`, `medium` or `difficult`
    UnknownDifficulty(String),
    /// A density band which isn't `0 <= low <= high <= 1`, displayed as `low..high`
    BadDensityBand(String),
    /// A solution which doesn't satisfy the clues it was given with
    SolutionMismatch,
    /// Clues which were expected to have exactly one solution, but had some other number
    AmbiguousClues { solutions: usize },
}

impl From<InvalidInput> for Error {
    fn from(e: InvalidInput) -> Self {
        Error::InvalidInput(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            Error::GenerationFailed { restarts } => {
                write!(f, "Loop generation failed after {} restarts", restarts)
            }
            Error::Cancelled => write!(f, "Search was cancelled"),
            Error::IterationLimitReached => write!(f, "Solver's iteration limit was reached"),
        }
    }
}

impl Display for InvalidInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidInput::GridTooSmall { size } => {
                write!(f, "grid size {} is too small (need at least 2 dots per side)", size)
            }
            InvalidInput::ClueShapeMismatch { rows, expected } => write!(
                f,
                "clue grid has a line of length {} where {} was expected",
                rows, expected
            ),
            InvalidInput::ClueOutOfRange { row, col, value } => {
                write!(f, "clue {} at ({}, {}) is outside 0..=4", value, row, col)
            }
            InvalidInput::CellOutOfRange { row, col } => {
                write!(f, "cell ({}, {}) is outside the grid", row, col)
            }
            InvalidInput::AssignmentSizeMismatch { edges, expected } => write!(
                f,
                "edge assignment has {} edges, grid has {}",
                edges, expected
            ),
            InvalidInput::BadPair { from, to } => {
                write!(f, "dots {} and {} are not adjacent", from, to)
            }
            InvalidInput::BadSeed(s) => write!(f, "malformed puzzle seed {:?}", s),
            InvalidInput::UnknownDifficulty(s) => write!(f, "unknown difficulty {:?}", s),
            InvalidInput::BadDensityBand(s) => {
                write!(f, "density band {} must satisfy 0 <= low <= high <= 1", s)
            }
            InvalidInput::SolutionMismatch => write!(f, "solution doesn't satisfy the clues"),
            InvalidInput::AmbiguousClues { solutions } => {
                write!(f, "clues have {} solutions, not exactly 1", solutions)
            }
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for InvalidInput {}
