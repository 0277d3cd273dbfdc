use std::fmt;

/// Errors raised while validating user-supplied parameters, before any
/// simulation work begins. Collects every problem found so a caller can
/// report them all at once instead of one per run.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub problems: Vec<String>,
}

impl ConfigError {
    #[must_use]
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.problems.join("; "))
    }
}

impl std::error::Error for ConfigError {}

/// Domain errors raised by the state model, rule functions and solvers.
///
/// Convergence failures are NOT errors: the bisection solver reports them as
/// a value-level result so callers can present the closest outcome found.
/// Per-run infeasibility is likewise a flag on the run, not an error.
#[derive(Debug, Clone)]
pub enum ModelError {
    /// A delta record was applied to a balance record for the wrong year.
    YearMismatch { funds_year: i32, deltas_year: i32 },
    /// The two partners' records describe different years.
    PartnerYearMismatch { partner1: i32, partner2: i32 },
    /// A policy rule was asked about a year outside its modeled range.
    YearOutOfRange { year: i32, lower: i32, upper: i32 },
    /// A split fraction or weighting lies outside [0, 1].
    InvalidFraction { what: &'static str, value: f64 },
    /// A rule referenced a free scalar the optimizer never registered.
    UnknownParameter(String),
    /// The values handed to the top-up routine already exceed the target sum.
    TargetSumExceeded { sum: f64, target: f64 },
    /// A bounded loop exceeded its hard iteration cap. Fatal: the model
    /// itself cannot converge.
    IterationLimit { cap: u64 },
    /// Solver bounds or clamp limits are inverted.
    InvalidBounds { lower: f64, upper: f64 },
    /// Configuration error surfaced during a run.
    Config(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::YearMismatch {
                funds_year,
                deltas_year,
            } => write!(
                f,
                "deltas for year {deltas_year} cannot advance a balance for year {funds_year}"
            ),
            ModelError::PartnerYearMismatch { partner1, partner2 } => write!(
                f,
                "partner records disagree on the year ({partner1} vs {partner2})"
            ),
            ModelError::YearOutOfRange { year, lower, upper } => {
                write!(f, "year {year} lies outside the modeled range [{lower}, {upper}]")
            }
            ModelError::InvalidFraction { what, value } => {
                write!(f, "{what} must lie in [0, 1], got {value}")
            }
            ModelError::UnknownParameter(name) => {
                write!(f, "no registered scalar named {name:?}")
            }
            ModelError::TargetSumExceeded { sum, target } => {
                write!(f, "values already sum to {sum}, above the target {target}")
            }
            ModelError::IterationLimit { cap } => {
                write!(f, "exceeded the hard cap of {cap} loop iterations")
            }
            ModelError::InvalidBounds { lower, upper } => {
                write!(f, "lower bound {lower} exceeds upper bound {upper}")
            }
            ModelError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ConfigError> for ModelError {
    fn from(e: ConfigError) -> Self {
        ModelError::Config(e.problems.join("; "))
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
