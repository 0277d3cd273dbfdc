//! Assembled rulesets built from simple, plausible models for income,
//! spending and saving. Each preset wires a policy-rule family into the
//! ordered ruleset the runner consumes.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::rules::{Rule, couple_savings, couple_spending, salary, savings, spending};
use crate::ruleset::{CoupleRulesetBuilder, career_rules, retirement_rules};
use crate::solve::OptimizingSolver;
use crate::tax::TaxFn;

/// Inputs shared by the single-earner presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleRulesetConfig {
    pub salary_growth_rate: f64,
    pub salary_plateau: f64,
    pub base_spending: f64,
    pub luxury_growth_rate: f64,
    pub initial_deferred_fraction: f64,
    pub final_deferred_fraction: f64,
    pub initial_year: i32,
    pub year_of_retirement: i32,
    pub year_of_death: i32,
    pub retirement_income: f64,
    pub deferred_interest_rate: f64,
    pub exempt_interest_rate: f64,
}

/// Career and retirement rulesets with compounding salary, luxury-over-basic
/// spending and a time-linear account split.
pub fn single_fixed_split(
    config: &SingleRulesetConfig,
    tax_fn: &TaxFn,
) -> Result<(Vec<Rule>, Vec<Rule>), ModelError> {
    let career_length = config.year_of_retirement - config.initial_year;
    let career = career_rules(
        salary::compound_plateau(config.salary_growth_rate, config.salary_plateau),
        spending::luxury_over_basic(config.base_spending, config.luxury_growth_rate),
        savings::linear_split(
            config.initial_deferred_fraction,
            config.final_deferred_fraction,
            config.initial_year,
            career_length,
        )?,
        config.deferred_interest_rate,
        config.exempt_interest_rate,
        tax_fn,
    );
    let retirement = retirement_rules(
        config.retirement_income,
        savings::retirement_drawdown(config.year_of_retirement, config.year_of_death)?,
        config.deferred_interest_rate,
        config.exempt_interest_rate,
        tax_fn,
    );
    Ok((career, retirement))
}

/// [`single_fixed_split`] with career spending clamped to a fraction of net
/// income.
pub fn single_capped_spending(
    config: &SingleRulesetConfig,
    spending_cap_fraction: f64,
    tax_fn: &TaxFn,
) -> Result<(Vec<Rule>, Vec<Rule>), ModelError> {
    let career_length = config.year_of_retirement - config.initial_year;
    let career = career_rules(
        salary::compound_plateau(config.salary_growth_rate, config.salary_plateau),
        spending::luxury_over_basic_capped(
            config.base_spending,
            config.luxury_growth_rate,
            spending_cap_fraction,
        )?,
        savings::linear_split(
            config.initial_deferred_fraction,
            config.final_deferred_fraction,
            config.initial_year,
            career_length,
        )?,
        config.deferred_interest_rate,
        config.exempt_interest_rate,
        tax_fn,
    );
    let retirement = retirement_rules(
        config.retirement_income,
        savings::retirement_drawdown(config.year_of_retirement, config.year_of_death)?,
        config.deferred_interest_rate,
        config.exempt_interest_rate,
        tax_fn,
    );
    Ok((career, retirement))
}

/// Inputs for the simple dual-income preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupleEqualizingConfig {
    pub partner1_salary_growth_rate: f64,
    pub partner1_salary_plateau: f64,
    pub partner2_salary_growth_rate: f64,
    pub partner2_salary_plateau: f64,
    pub base_spending: f64,
    pub luxury_growth_rate: f64,
    pub deferred_interest_rate: f64,
    pub exempt_interest_rate: f64,
}

/// A dual-income ruleset using simple rules throughout: compounding
/// salaries, luxury-over-basic household spending, and the equalizing
/// deferred-only account split.
#[must_use]
pub fn couple_equalizing(config: &CoupleEqualizingConfig, tax_fn: &TaxFn) -> CoupleRulesetBuilder {
    CoupleRulesetBuilder::new(
        salary::compound_plateau(
            config.partner1_salary_growth_rate,
            config.partner1_salary_plateau,
        ),
        salary::compound_plateau(
            config.partner2_salary_growth_rate,
            config.partner2_salary_plateau,
        ),
        couple_spending::luxury_over_basic(config.base_spending, config.luxury_growth_rate),
        couple_savings::equalizing_deferred_split(),
        config.deferred_interest_rate,
        config.exempt_interest_rate,
        tax_fn,
    )
}

/// Inputs for the optimizer-tuned dual-income preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupleOptimizedConfig {
    pub partner1_salary_growth_rate: f64,
    pub partner1_salary_plateau: f64,
    pub partner2_salary_growth_rate: f64,
    pub partner2_salary_plateau: f64,
    pub initial_year: i32,
    /// How much of any salary increase goes to saving rather than spending.
    pub savings_weight: f64,
    pub initial_exempt_guess: f64,
    pub final_exempt_guess: f64,
    pub initial_equalize_guess: f64,
    pub final_equalize_guess: f64,
    pub drawdown_correction_guess: f64,
    pub partner1_year_of_retirement: i32,
    pub partner2_year_of_retirement: i32,
    pub final_year: i32,
    pub deferred_interest_rate: f64,
    pub exempt_interest_rate: f64,
}

/// A dual-income ruleset using the rising-savings spending model and the
/// staged account split, with the five split scalars registered on the
/// optimizing solver. With optimization disabled the guesses are used
/// as-is.
#[must_use]
pub fn couple_optimized(
    config: &CoupleOptimizedConfig,
    optimizer: &mut OptimizingSolver,
    tax_fn: &TaxFn,
) -> CoupleRulesetBuilder {
    let initial_exempt =
        optimizer.subscribe_scalar("initial_exempt", 0.0, 1.0, config.initial_exempt_guess);
    let final_exempt =
        optimizer.subscribe_scalar("final_exempt", 0.0, 1.0, config.final_exempt_guess);
    let initial_equalize =
        optimizer.subscribe_scalar("initial_equalize", 0.0, 1.0, config.initial_equalize_guess);
    let final_equalize =
        optimizer.subscribe_scalar("final_equalize", 0.0, 1.0, config.final_equalize_guess);
    let drawdown_correction = optimizer.subscribe_scalar(
        "drawdown_correction",
        -1.0,
        1.0,
        config.drawdown_correction_guess,
    );

    CoupleRulesetBuilder::new(
        salary::compound_plateau(
            config.partner1_salary_growth_rate,
            config.partner1_salary_plateau,
        ),
        salary::compound_plateau(
            config.partner2_salary_growth_rate,
            config.partner2_salary_plateau,
        ),
        couple_spending::rising_savings_spending(config.initial_year, config.savings_weight),
        couple_savings::staged_split(couple_savings::StagedSplitConfig {
            initial_exempt,
            final_exempt,
            initial_equalize,
            final_equalize,
            drawdown_correction,
            partner1_retirement_year: config.partner1_year_of_retirement,
            partner2_retirement_year: config.partner2_year_of_retirement,
            initial_year: config.initial_year,
            final_year: config.final_year,
        }),
        config.deferred_interest_rate,
        config.exempt_interest_rate,
        tax_fn,
    )
}
