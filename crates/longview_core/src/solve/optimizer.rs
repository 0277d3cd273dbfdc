//! The optimizing solver: a derivative-free search over named free scalars
//! wrapped around the bisection root-finder.
//!
//! Policy rules read the scalars through [`ParamRef`] accessors resolved
//! against the current [`ParamVector`], which this solver sets once per
//! outer evaluation. The vector is owned and passed explicitly; the solver
//! is deliberately not reentrant and must not be shared across concurrent
//! searches.

use tracing::debug;

use crate::error::ModelError;
use crate::rules::{ParamRef, ParamVector};
use crate::solve::bisection::BisectionResult;
use crate::solve::nelder_mead::{self, NelderMeadOptions};

/// Flat penalty per scalar sitting outside its bounds. The simplex search
/// knows nothing of constraints, so bounds are soft: violations are priced
/// into the fitness instead.
const BOUND_PENALTY: f64 = 1e6;
/// Additional penalty per unit of bound violation, so the search still sees
/// a slope back toward the feasible region.
const BOUND_VIOLATION_SCALE: f64 = 1e6;
/// Penalty when the inner root-finder failed or a rule flagged the solved
/// run infeasible. Larger than any bound penalty: such regions are to be
/// escaped first.
const FAILED_RUN_PENALTY: f64 = 1e9;

/// A free scalar registered for optimization.
#[derive(Debug, Clone)]
struct ScalarSpec {
    name: String,
    lower: Option<f64>,
    upper: Option<f64>,
    initial: Option<f64>,
}

impl ScalarSpec {
    fn initial_guess(&self) -> f64 {
        if let Some(initial) = self.initial {
            return initial;
        }
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => f64::midpoint(lower, upper),
            (Some(lower), None) => lower,
            (None, Some(upper)) => upper,
            (None, None) => 0.0,
        }
    }

    fn bound_penalty(&self, value: f64) -> f64 {
        let mut penalty = 0.0;
        if let Some(lower) = self.lower
            && value < lower
        {
            penalty += BOUND_PENALTY + BOUND_VIOLATION_SCALE * (lower - value);
        }
        if let Some(upper) = self.upper
            && value > upper
        {
            penalty += BOUND_PENALTY + BOUND_VIOLATION_SCALE * (value - upper);
        }
        penalty
    }
}

/// One inner evaluation: the bisection outcome plus whether any policy rule
/// flagged the solved run infeasible.
#[derive(Debug, Clone)]
pub struct InnerSolve<R> {
    pub solution: BisectionResult<R>,
    pub feasible: bool,
}

/// The first unpenalized outer evaluation, kept separately so consumers can
/// report a naive-versus-optimized comparison.
#[derive(Debug, Clone)]
pub struct FirstFeasible {
    pub parameters: Vec<(String, f64)>,
    pub solved_input: f64,
}

/// Final outcome of an optimized solve.
#[derive(Debug)]
pub struct OptimizedOutcome<R> {
    /// The optimized scalar values, in registration order.
    pub parameters: Vec<(String, f64)>,
    /// The inner solve at the optimized parameters.
    pub solution: BisectionResult<R>,
    pub outer_converged: bool,
    /// Combined success: the inner root-finder and the outer search both
    /// converged.
    pub converged: bool,
    pub first_feasible: Option<FirstFeasible>,
    /// Total outer-objective evaluations performed.
    pub evaluations: usize,
}

pub struct OptimizingSolver {
    scalars: Vec<ScalarSpec>,
    maximize: bool,
    disabled: bool,
    options: NelderMeadOptions,
}

impl OptimizingSolver {
    /// `maximize` inverts the fitness sign so the simplex search maximizes
    /// the inner solver's solved value instead of minimizing it.
    #[must_use]
    pub fn new(maximize: bool) -> Self {
        Self {
            scalars: Vec::new(),
            maximize,
            disabled: false,
            options: NelderMeadOptions::default(),
        }
    }

    /// Skip the outer search and solve once at the initial guesses.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_options(&mut self, options: NelderMeadOptions) {
        self.options = options;
    }

    /// Registers a named free scalar with optional soft bounds and initial
    /// guess (bound midpoint when omitted), returning the [`ParamRef`]
    /// policy rules use to read its current value.
    pub fn subscribe_scalar(
        &mut self,
        name: &str,
        lower: impl Into<Option<f64>>,
        upper: impl Into<Option<f64>>,
        initial: impl Into<Option<f64>>,
    ) -> ParamRef {
        let spec = ScalarSpec {
            name: name.to_owned(),
            lower: lower.into(),
            upper: upper.into(),
            initial: initial.into(),
        };
        match self.scalars.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.scalars.push(spec),
        }
        ParamRef::Named(name.to_owned())
    }

    fn snapshot(&self, values: &[f64]) -> Vec<(String, f64)> {
        self.scalars
            .iter()
            .zip(values.iter())
            .map(|(spec, value)| (spec.name.clone(), *value))
            .collect()
    }

    /// Runs the outer search, calling `inner` once per candidate vector.
    ///
    /// With no registered scalars (or optimization disabled) this
    /// degenerates to a single inner solve at the initial guesses.
    pub fn solve<R>(
        &mut self,
        mut inner: impl FnMut(&ParamVector) -> Result<InnerSolve<R>, ModelError>,
    ) -> Result<OptimizedOutcome<R>, ModelError> {
        let mut params = ParamVector::default();
        let guesses: Vec<f64> = self.scalars.iter().map(ScalarSpec::initial_guess).collect();
        for (spec, guess) in self.scalars.iter().zip(guesses.iter()) {
            params.set(&spec.name, *guess);
        }

        if self.scalars.is_empty() || self.disabled {
            let InnerSolve { solution, feasible } = inner(&params)?;
            let first_feasible = (solution.converged && feasible).then(|| FirstFeasible {
                parameters: self.snapshot(&guesses),
                solved_input: solution.input,
            });
            let converged = solution.converged;
            return Ok(OptimizedOutcome {
                parameters: self.snapshot(&guesses),
                solution,
                outer_converged: true,
                converged,
                first_feasible,
                evaluations: 1,
            });
        }

        let sign = if self.maximize { -1.0 } else { 1.0 };
        let mut evaluations = 0usize;
        let mut first_feasible: Option<FirstFeasible> = None;

        let search = nelder_mead::minimize::<ModelError>(
            |candidate: &[f64]| {
                evaluations += 1;
                let mut penalty = 0.0;
                for (spec, value) in self.scalars.iter().zip(candidate.iter()) {
                    params.set(&spec.name, *value);
                    penalty += spec.bound_penalty(*value);
                }

                let InnerSolve { solution, feasible } = inner(&params)?;
                if !solution.converged || !feasible {
                    penalty += FAILED_RUN_PENALTY;
                }
                if penalty == 0.0 && first_feasible.is_none() {
                    first_feasible = Some(FirstFeasible {
                        parameters: self.snapshot(candidate),
                        solved_input: solution.input,
                    });
                }

                let fitness = sign * solution.input + penalty;
                debug!(
                    ?candidate,
                    solved = solution.input,
                    penalty,
                    fitness,
                    "outer evaluation"
                );
                Ok(fitness)
            },
            &guesses,
            &self.options,
        )?;

        // Re-solve at the optimum so the returned run matches the returned
        // parameters.
        for (spec, value) in self.scalars.iter().zip(search.best.iter()) {
            params.set(&spec.name, *value);
        }
        let InnerSolve { solution, feasible } = inner(&params)?;

        Ok(OptimizedOutcome {
            parameters: self.snapshot(&search.best),
            converged: solution.converged && feasible && search.converged,
            solution,
            outer_converged: search.converged,
            first_feasible,
            evaluations: evaluations + 1,
        })
    }
}
