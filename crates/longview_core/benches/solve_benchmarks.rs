use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use longview_core::presets::{self, CoupleEqualizingConfig, SingleRulesetConfig};
use longview_core::rules::ParamVector;
use longview_core::sim::{
    DualIncomeParams, DualIncomeSimulation, PersonParams, Simulation, SimulationParams,
};
use longview_core::tax::default_tax_fn;

fn person(name: &str, year_of_birth: i32, salary: f64) -> PersonParams {
    PersonParams {
        name: name.to_owned(),
        year_of_birth,
        retirement_age: 60,
        age_at_death: 80,
        initial_salary: salary,
        initial_deferred: 5_000.0,
        initial_exempt: 600.0,
    }
}

fn single_simulation() -> Simulation {
    let params = SimulationParams {
        person: person("solo", 1990, 40_000.0),
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

fn couple_simulation() -> DualIncomeSimulation {
    let params = DualIncomeParams {
        partner1: person("a", 1990, 40_000.0),
        partner2: person("b", 1989, 60_000.0),
        initial_year: 2025,
        target_final_savings: 10_000.0,
        spending_bounds: (0.0, 200_000.0),
        tolerance: 1.0,
    };
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
    DualIncomeSimulation::new(params, builder).unwrap()
}

fn bench_single_run(c: &mut Criterion) {
    let simulation = single_simulation();
    let free_scalars = ParamVector::default();
    c.bench_function("single_run_45_years", |b| {
        b.iter(|| {
            simulation
                .run_at(black_box(35_000.0), &free_scalars)
                .unwrap()
        });
    });
}

fn bench_single_solve(c: &mut Criterion) {
    let simulation = single_simulation();
    c.bench_function("single_solve", |b| {
        b.iter(|| simulation.solve().unwrap());
    });
}

fn bench_couple_run(c: &mut Criterion) {
    let simulation = couple_simulation();
    let free_scalars = ParamVector::default();
    c.bench_function("couple_run_46_years", |b| {
        b.iter(|| {
            simulation
                .run_at(black_box(65_000.0), &free_scalars)
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_single_run,
    bench_single_solve,
    bench_couple_run
);
criterion_main!(benches);
