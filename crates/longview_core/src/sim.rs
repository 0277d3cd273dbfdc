//! The simulation runner: a thin loop stepping the rule pipeline year by
//! year from an initial state, and the solve entry points that bisect the
//! initial spending level against a terminal savings target.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ModelError};
use crate::model::{
    CoupleDeltasState, CoupleFundsState, DeltasState, FundsState, advance_couple_funds,
    advance_funds, step_couple_deltas, step_deltas,
};
use crate::rules::{ParamVector, Rule, RuleCtx};
use crate::ruleset::CoupleRulesetBuilder;
use crate::solve::{BisectionResult, InnerSolve, OptimizedOutcome, OptimizingSolver, bisect};

/// Parameters describing one income-earner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonParams {
    pub name: String,
    pub year_of_birth: i32,
    /// Age at retirement, inclusive: the first year no longer working.
    pub retirement_age: i32,
    pub age_at_death: i32,
    pub initial_salary: f64,
    pub initial_deferred: f64,
    pub initial_exempt: f64,
}

impl PersonParams {
    #[must_use]
    pub fn year_of_retirement(&self) -> i32 {
        self.year_of_birth + self.retirement_age
    }

    #[must_use]
    pub fn year_of_death(&self) -> i32 {
        self.year_of_birth + self.age_at_death
    }

    fn collect_problems(&self, problems: &mut Vec<String>) {
        let name = &self.name;
        if self.age_at_death <= self.retirement_age {
            problems.push(format!(
                "{name}: age at death ({}) must exceed retirement age ({})",
                self.age_at_death, self.retirement_age
            ));
        }
        if self.initial_salary < 0.0 {
            problems.push(format!("{name}: initial salary is negative"));
        }
        if self.initial_deferred < 0.0 || self.initial_exempt < 0.0 {
            problems.push(format!("{name}: initial savings are negative"));
        }
    }
}

fn collect_shared_problems(
    initial_year: i32,
    spending_bounds: (f64, f64),
    tolerance: f64,
    problems: &mut Vec<String>,
) {
    if initial_year <= 0 {
        problems.push(format!("initial year {initial_year} is not a calendar year"));
    }
    if spending_bounds.0 >= spending_bounds.1 {
        problems.push(format!(
            "spending bounds [{}, {}] are empty",
            spending_bounds.0, spending_bounds.1
        ));
    }
    if tolerance <= 0.0 {
        problems.push(format!("tolerance {tolerance} must be positive"));
    }
}

/// Parameters for a single-earner simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    pub person: PersonParams,
    /// First simulated year, inclusive.
    pub initial_year: i32,
    /// Savings to be left over at the end of the simulation.
    pub target_final_savings: f64,
    /// Bracket for the initial-spending solve.
    pub spending_bounds: (f64, f64),
    /// Allowed deviation of terminal savings from the target.
    pub tolerance: f64,
}

impl SimulationParams {
    /// Checks every field upfront, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        self.person.collect_problems(&mut problems);
        collect_shared_problems(
            self.initial_year,
            self.spending_bounds,
            self.tolerance,
            &mut problems,
        );
        if self.person.year_of_retirement() <= self.initial_year {
            problems.push(format!(
                "{} retires in {}, before the simulation starts in {}",
                self.person.name,
                self.person.year_of_retirement(),
                self.initial_year
            ));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(problems))
        }
    }
}

/// Parameters for a dual-income simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualIncomeParams {
    pub partner1: PersonParams,
    pub partner2: PersonParams,
    pub initial_year: i32,
    pub target_final_savings: f64,
    pub spending_bounds: (f64, f64),
    pub tolerance: f64,
}

impl DualIncomeParams {
    /// Last simulated year: the later of the two partners' death years.
    #[must_use]
    pub fn final_year(&self) -> i32 {
        self.partner1.year_of_death().max(self.partner2.year_of_death())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        self.partner1.collect_problems(&mut problems);
        self.partner2.collect_problems(&mut problems);
        collect_shared_problems(
            self.initial_year,
            self.spending_bounds,
            self.tolerance,
            &mut problems,
        );
        if self.final_year() <= self.initial_year {
            problems.push(format!(
                "both partners die by {}, before the simulation starts in {}",
                self.final_year(),
                self.initial_year
            ));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(problems))
        }
    }
}

/// The full recorded trajectory of one single-earner run. Never mutated
/// after the run completes.
#[derive(Debug, Clone)]
pub struct RunHistory {
    pub funds: Vec<FundsState>,
    pub deltas: Vec<DeltasState>,
    pub funds_at_retirement: FundsState,
    /// False when a policy rule flagged an invalid internal state; the
    /// optimizing solver penalizes such runs instead of failing.
    pub feasible: bool,
    pub infeasible_reason: Option<String>,
}

impl RunHistory {
    #[must_use]
    pub fn final_funds(&self) -> FundsState {
        *self
            .funds
            .last()
            .expect("a run history always contains the initial year")
    }
}

/// The full recorded trajectory of one couple run.
#[derive(Debug, Clone)]
pub struct CoupleRunHistory {
    pub funds: Vec<CoupleFundsState>,
    pub deltas: Vec<CoupleDeltasState>,
    pub feasible: bool,
    pub infeasible_reason: Option<String>,
}

impl CoupleRunHistory {
    #[must_use]
    pub fn final_funds(&self) -> CoupleFundsState {
        *self
            .funds
            .last()
            .expect("a run history always contains the initial year")
    }
}

/// A single-earner simulation: career rules up to (exclusive) the
/// retirement year, then retirement rules through the death year.
pub struct Simulation {
    params: SimulationParams,
    career_rules: Vec<Rule>,
    retirement_rules: Vec<Rule>,
}

impl Simulation {
    pub fn new(
        params: SimulationParams,
        career_rules: Vec<Rule>,
        retirement_rules: Vec<Rule>,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            career_rules,
            retirement_rules,
        })
    }

    #[must_use]
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Runs the full trajectory at one candidate initial spending level.
    pub fn run_at(
        &self,
        initial_spending: f64,
        free_scalars: &ParamVector,
    ) -> Result<RunHistory, ModelError> {
        let person = &self.params.person;
        let initial_year = self.params.initial_year;
        let year_of_retirement = person.year_of_retirement();
        let year_of_death = person.year_of_death();

        let mut ctx = RuleCtx::new(free_scalars);
        let mut funds = FundsState::new(person.initial_deferred, person.initial_exempt, initial_year);
        let mut deltas = DeltasState::from_year(initial_year)
            .with_gross_salary(person.initial_salary)
            .with_spending(initial_spending);

        let mut all_funds = vec![funds];
        let mut all_deltas = vec![deltas];

        for _ in initial_year..year_of_retirement {
            let next = step_deltas(&mut ctx, &funds, &deltas, &self.career_rules)?;
            funds = advance_funds(funds, &next)?;
            deltas = next;
            all_funds.push(funds);
            all_deltas.push(deltas);
        }
        let funds_at_retirement = funds;

        for _ in year_of_retirement..year_of_death {
            let next = step_deltas(&mut ctx, &funds, &deltas, &self.retirement_rules)?;
            funds = advance_funds(funds, &next)?;
            deltas = next;
            all_funds.push(funds);
            all_deltas.push(deltas);
        }

        Ok(RunHistory {
            funds: all_funds,
            deltas: all_deltas,
            funds_at_retirement,
            feasible: ctx.is_feasible(),
            infeasible_reason: ctx.infeasible_reason().map(str::to_owned),
        })
    }

    /// Bisects the initial spending level that leaves the target savings at
    /// death.
    pub fn solve(&self) -> Result<BisectionResult<RunHistory>, ModelError> {
        let free_scalars = ParamVector::default();
        let (lower, upper) = self.params.spending_bounds;
        let result = bisect(
            |spending| self.run_at(spending, &free_scalars),
            |run| run.final_funds().total(),
            self.params.target_final_savings,
            lower,
            upper,
            self.params.tolerance,
        )?;
        debug!(
            spending = result.input,
            converged = result.converged,
            "single-earner solve finished"
        );
        Ok(result)
    }

    /// Solves through the optimizing solver, letting registered free
    /// scalars tune the policy rules.
    pub fn solve_optimized(
        &self,
        optimizer: &mut OptimizingSolver,
    ) -> Result<OptimizedOutcome<RunHistory>, ModelError> {
        let (lower, upper) = self.params.spending_bounds;
        optimizer.solve(|free_scalars| {
            let solution = bisect(
                |spending| self.run_at(spending, free_scalars),
                |run| run.final_funds().total(),
                self.params.target_final_savings,
                lower,
                upper,
                self.params.tolerance,
            )?;
            let feasible = solution.run.feasible;
            Ok(InnerSolve { solution, feasible })
        })
    }
}

/// A dual-income simulation. Each year's ruleset is rebuilt from the
/// partners' computed retirement status (`year >= birth year + retirement
/// age`), so the two retirements are handled independently.
pub struct DualIncomeSimulation {
    params: DualIncomeParams,
    builder: CoupleRulesetBuilder,
}

impl DualIncomeSimulation {
    pub fn new(params: DualIncomeParams, builder: CoupleRulesetBuilder) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params, builder })
    }

    #[must_use]
    pub fn params(&self) -> &DualIncomeParams {
        &self.params
    }

    pub fn run_at(
        &self,
        initial_spending: f64,
        free_scalars: &ParamVector,
    ) -> Result<CoupleRunHistory, ModelError> {
        let initial_year = self.params.initial_year;
        let final_year = self.params.final_year();
        let partner1 = &self.params.partner1;
        let partner2 = &self.params.partner2;

        let mut ctx = RuleCtx::new(free_scalars);
        let mut funds = CoupleFundsState::new(
            FundsState::new(partner1.initial_deferred, partner1.initial_exempt, initial_year),
            FundsState::new(partner2.initial_deferred, partner2.initial_exempt, initial_year),
        )?;
        let mut deltas =
            CoupleDeltasState::from_year(initial_year).with_household_spending(initial_spending);
        deltas = deltas
            .with_partner1(deltas.partner1().with_gross_salary(partner1.initial_salary))?;
        deltas = deltas
            .with_partner2(deltas.partner2().with_gross_salary(partner2.initial_salary))?;

        let mut all_funds = vec![funds];
        let mut all_deltas = vec![deltas];

        for year in (initial_year + 1)..=final_year {
            let rules = self
                .builder
                .rules_for_year(
                    year >= partner1.year_of_retirement(),
                    year >= partner2.year_of_retirement(),
                );
            let next = step_couple_deltas(&mut ctx, &funds, &deltas, &rules)?;
            funds = advance_couple_funds(funds, &next)?;
            deltas = next;
            all_funds.push(funds);
            all_deltas.push(deltas);
        }

        Ok(CoupleRunHistory {
            funds: all_funds,
            deltas: all_deltas,
            feasible: ctx.is_feasible(),
            infeasible_reason: ctx.infeasible_reason().map(str::to_owned),
        })
    }

    /// Solves for the initial household spending hitting the terminal
    /// target, with the optimizer searching any registered free scalars.
    pub fn solve(
        &self,
        optimizer: &mut OptimizingSolver,
    ) -> Result<OptimizedOutcome<CoupleRunHistory>, ModelError> {
        let (lower, upper) = self.params.spending_bounds;
        let outcome = optimizer.solve(|free_scalars| {
            let solution = bisect(
                |spending| self.run_at(spending, free_scalars),
                |run| run.final_funds().total(),
                self.params.target_final_savings,
                lower,
                upper,
                self.params.tolerance,
            )?;
            let feasible = solution.run.feasible;
            Ok(InnerSolve { solution, feasible })
        })?;
        debug!(
            spending = outcome.solution.input,
            converged = outcome.converged,
            evaluations = outcome.evaluations,
            "dual-income solve finished"
        );
        Ok(outcome)
    }
}
