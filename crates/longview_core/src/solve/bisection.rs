//! Monotonic bisection root-finder.
//!
//! This is the primitive that finds the initial household spending level
//! driving terminal savings to a target: a transform maps a scalar guess to
//! a run object, a model function reduces the run to a scalar assumed
//! monotonic in the guess, and the bracket narrows until the target is hit
//! within tolerance.

use tracing::trace;

use crate::error::ModelError;
use crate::guard::LoopGuard;

/// Outcome of a bisection solve. Convergence failures are reported here, not
/// as errors, so callers can present the closest outcome found.
#[derive(Debug, Clone)]
pub struct BisectionResult<R> {
    /// The solved (or, on failure, last attempted) input.
    pub input: f64,
    /// The run object produced at `input`.
    pub run: R,
    /// The model output at `input`.
    pub output: f64,
    pub converged: bool,
    /// Human-readable description of why the search stopped short.
    pub message: Option<String>,
}

/// Finds the input in `[lower, upper]` whose model output hits `target`
/// within `tolerance`.
///
/// Degenerate inputs (identical bounds, or a flat model across the bracket)
/// are reported as failures with a message, without searching. The search
/// direction is oriented from the sign of the output difference at the
/// bounds; the bracket then halves toward the target until either the output
/// lands within `tolerance` (success) or the bracket width falls below
/// `tolerance * 1e-5` (failure carrying the last guess and run).
pub fn bisect<R>(
    mut transform: impl FnMut(f64) -> Result<R, ModelError>,
    mut model: impl FnMut(&R) -> f64,
    target: f64,
    lower: f64,
    upper: f64,
    tolerance: f64,
) -> Result<BisectionResult<R>, ModelError> {
    if lower == upper {
        let run = transform(lower)?;
        let output = model(&run);
        return Ok(BisectionResult {
            input: lower,
            run,
            output,
            converged: false,
            message: Some(format!(
                "lower and upper bounds are both {lower}; nothing to search"
            )),
        });
    }

    let lower_run = transform(lower)?;
    let lower_output = model(&lower_run);
    let upper_run = transform(upper)?;
    let upper_output = model(&upper_run);

    if lower_output == upper_output {
        return Ok(BisectionResult {
            input: upper,
            run: upper_run,
            output: upper_output,
            converged: false,
            message: Some(format!(
                "model output is {upper_output} at both bounds; expected a non-flat monotonic function"
            )),
        });
    }

    // Orient the bracket so `low` sits on the below-target side.
    let (mut low, mut high) = if upper_output > lower_output {
        (lower, upper)
    } else {
        (upper, lower)
    };

    let width_epsilon = tolerance * 1e-5;
    let mut guard = LoopGuard::default();

    loop {
        let guess = f64::midpoint(low, high);
        let run = transform(guess)?;
        let output = model(&run);
        trace!(guess, output, target, "bisection step");

        if (output - target).abs() <= tolerance {
            return Ok(BisectionResult {
                input: guess,
                run,
                output,
                converged: true,
                message: None,
            });
        }
        if (high - low).abs() < width_epsilon {
            return Ok(BisectionResult {
                input: guess,
                run,
                output,
                converged: false,
                message: Some(format!(
                    "bracket narrowed to {:.3e} without reaching {target} (closest output {output})",
                    (high - low).abs()
                )),
            });
        }

        if output > target {
            high = guess;
        } else {
            low = guess;
        }
        guard.tick()?;
    }
}
