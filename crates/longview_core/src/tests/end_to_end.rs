//! Full solves: bisecting initial spending against a terminal savings
//! target, with and without the outer parameter search.

use crate::presets::{
    self, CoupleEqualizingConfig, CoupleOptimizedConfig, SingleRulesetConfig,
};
use crate::sim::{DualIncomeParams, DualIncomeSimulation, Simulation, SimulationParams};
use crate::solve::{NelderMeadOptions, OptimizingSolver};
use crate::tax::default_tax_fn;
use crate::tests::person;

fn single_fixture() -> Simulation {
    let params = SimulationParams {
        person: person("solo", 1990, 60, 80, 40_000.0, 5_000.0, 600.0),
        initial_year: 2025,
        target_final_savings: 10_000.0,
        spending_bounds: (0.0, 150_000.0),
        tolerance: 1.0,
    };
    let config = SingleRulesetConfig {
        salary_growth_rate: 0.05,
        salary_plateau: 70_000.0,
        base_spending: 30_000.0,
        luxury_growth_rate: 0.04,
        initial_deferred_fraction: 0.5,
        final_deferred_fraction: 0.5,
        initial_year: 2025,
        year_of_retirement: 2050,
        year_of_death: 2070,
        retirement_income: 30_000.0,
        deferred_interest_rate: 0.05,
        exempt_interest_rate: 0.05,
    };
    let tax_fn = default_tax_fn();
    let (career, retirement) = presets::single_fixed_split(&config, &tax_fn).unwrap();
    Simulation::new(params, career, retirement).unwrap()
}

#[test]
fn single_solve_hits_the_terminal_target() {
    let simulation = single_fixture();
    let result = simulation.solve().unwrap();

    assert!(result.converged, "message: {:?}", result.message);
    assert!((result.run.final_funds().total() - 10_000.0).abs() <= 1.0);
    assert!(result.input > 0.0);
    // The solved spending reproduces the solved run.
    let replay = simulation
        .run_at(result.input, &crate::rules::ParamVector::default())
        .unwrap();
    assert_eq!(replay.final_funds().total(), result.run.final_funds().total());
}

fn couple_params() -> DualIncomeParams {
    DualIncomeParams {
        partner1: person("a", 1990, 60, 80, 40_000.0, 5_000.0, 600.0),
        partner2: person("b", 1989, 64, 75, 60_000.0, 2_000.0, 800.0),
        initial_year: 2025,
        target_final_savings: 10_000.0,
        spending_bounds: (0.0, 200_000.0),
        tolerance: 1.0,
    }
}

#[test]
fn couple_solve_without_scalars_degenerates_to_bisection() {
    let config = CoupleEqualizingConfig {
        partner1_salary_growth_rate: 0.06,
        partner1_salary_plateau: 80_000.0,
        partner2_salary_growth_rate: 0.04,
        partner2_salary_plateau: 75_000.0,
        base_spending: 60_000.0,
        luxury_growth_rate: 0.05,
        deferred_interest_rate: 0.1,
        exempt_interest_rate: 0.1,
    };
    let tax_fn = default_tax_fn();
    let builder = presets::couple_equalizing(&config, &tax_fn);
    let simulation = DualIncomeSimulation::new(couple_params(), builder).unwrap();

    let mut optimizer = OptimizingSolver::new(true);
    let outcome = simulation.solve(&mut optimizer).unwrap();

    assert_eq!(outcome.evaluations, 1);
    assert!(outcome.converged);
    assert!((outcome.solution.run.final_funds().total() - 10_000.0).abs() <= 1.0);
}

fn optimized_config() -> CoupleOptimizedConfig {
    CoupleOptimizedConfig {
        partner1_salary_growth_rate: 0.05,
        partner1_salary_plateau: 80_000.0,
        partner2_salary_growth_rate: 0.04,
        partner2_salary_plateau: 75_000.0,
        initial_year: 2025,
        savings_weight: 0.5,
        initial_exempt_guess: 0.5,
        final_exempt_guess: 0.5,
        initial_equalize_guess: 0.5,
        final_equalize_guess: 0.5,
        drawdown_correction_guess: 0.05,
        partner1_year_of_retirement: 2050,
        partner2_year_of_retirement: 2053,
        final_year: 2070,
        deferred_interest_rate: 0.08,
        exempt_interest_rate: 0.08,
    }
}

#[test]
fn disabled_optimization_solves_at_the_guesses() {
    let tax_fn = default_tax_fn();
    let mut optimizer = OptimizingSolver::new(true);
    optimizer.set_disabled(true);
    let builder = presets::couple_optimized(&optimized_config(), &mut optimizer, &tax_fn);
    let simulation = DualIncomeSimulation::new(couple_params(), builder).unwrap();

    let outcome = simulation.solve(&mut optimizer).unwrap();

    assert_eq!(outcome.evaluations, 1);
    assert!(outcome.solution.converged, "message: {:?}", outcome.solution.message);
    assert!((outcome.solution.run.final_funds().total() - 10_000.0).abs() <= 1.0);
    // All five registered scalars are reported at their guesses.
    assert_eq!(outcome.parameters.len(), 5);
    assert!(
        outcome
            .parameters
            .iter()
            .any(|(name, value)| name == "drawdown_correction" && (value - 0.05).abs() < 1e-9)
    );
}

#[test]
fn optimized_solve_improves_on_the_first_feasible_evaluation() {
    let tax_fn = default_tax_fn();
    let mut optimizer = OptimizingSolver::new(true);
    optimizer.set_options(NelderMeadOptions {
        max_iterations: 80,
        tolerance: 1e-2,
        initial_step: 0.1,
    });
    let builder = presets::couple_optimized(&optimized_config(), &mut optimizer, &tax_fn);
    let simulation = DualIncomeSimulation::new(couple_params(), builder).unwrap();

    let outcome = simulation.solve(&mut optimizer).unwrap();

    assert!(outcome.solution.converged, "message: {:?}", outcome.solution.message);
    assert!((outcome.solution.run.final_funds().total() - 10_000.0).abs() <= 1.0);

    // Maximizing lifetime spending: the optimized solution should be at
    // least as good as the naive first feasible one.
    let first = outcome.first_feasible.expect("initial guesses are feasible");
    assert!(outcome.solution.input >= first.solved_input - 1e-6);
}
