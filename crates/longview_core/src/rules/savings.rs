//! Account-split policy rules for a single earner: how undifferentiated
//! savings (or withdrawals) divide between the two accounts.

use crate::error::ModelError;
use crate::rules::Rule;

/// Splits savings between the accounts as a linear function of time: the
/// deferred fraction interpolates from `initial_deferred` in `initial_year`
/// to `final_deferred` after `career_length` years.
pub fn linear_split(
    initial_deferred: f64,
    final_deferred: f64,
    initial_year: i32,
    career_length: i32,
) -> Result<Rule, ModelError> {
    if !(0.0..=1.0).contains(&initial_deferred) {
        return Err(ModelError::InvalidFraction {
            what: "initial deferred fraction",
            value: initial_deferred,
        });
    }
    if !(0.0..=1.0).contains(&final_deferred) {
        return Err(ModelError::InvalidFraction {
            what: "final deferred fraction",
            value: final_deferred,
        });
    }

    let slope = (final_deferred - initial_deferred) / f64::from(career_length);

    Ok(Box::new(
        move |_ctx, deltas, _previous_funds, _previous_deltas| {
            let elapsed = deltas.year() - initial_year;
            if elapsed < 0 || elapsed > career_length {
                return Err(ModelError::YearOutOfRange {
                    year: deltas.year(),
                    lower: initial_year,
                    upper: initial_year + career_length,
                });
            }

            let deferred_fraction = initial_deferred + slope * f64::from(elapsed);
            debug_assert!((0.0..=1.0).contains(&deferred_fraction));

            let savings = deltas.undifferentiated_savings();
            Ok(deltas
                .with_deferred_flow(savings * deferred_fraction)
                .with_exempt_flow(savings * (1.0 - deferred_fraction)))
        },
    ))
}

/// Retirement drawdown: spreads the deferred balance evenly over the years
/// of retirement that remain, and covers the rest of the year's shortfall
/// from the tax-free account. A run that would overdraw the tax-free
/// account is flagged infeasible rather than failed, so the outer solver
/// can discard it.
pub fn retirement_drawdown(
    year_of_retirement: i32,
    year_of_death: i32,
) -> Result<Rule, ModelError> {
    if year_of_death <= year_of_retirement {
        return Err(ModelError::InvalidBounds {
            lower: f64::from(year_of_retirement),
            upper: f64::from(year_of_death),
        });
    }

    Ok(Box::new(
        move |ctx, deltas, previous_funds, _previous_deltas| {
            let year = deltas.year();
            if year <= year_of_retirement || year > year_of_death {
                return Err(ModelError::YearOutOfRange {
                    year,
                    lower: year_of_retirement + 1,
                    upper: year_of_death,
                });
            }

            let savings = deltas.undifferentiated_savings();
            if savings >= 0.0 {
                // A refund larger than spending; park it tax-free.
                return Ok(deltas.with_exempt_flow(savings));
            }

            let needed = -savings;
            let years_left = f64::from(year_of_death - year + 1);
            let deferred_draw = (previous_funds.deferred / years_left).clamp(0.0, needed);
            let exempt_draw = needed - deferred_draw;
            if exempt_draw > previous_funds.exempt {
                ctx.flag_infeasible(format!(
                    "tax-free account overdrawn in {year}: need {exempt_draw:.2}, have {:.2}",
                    previous_funds.exempt
                ));
            }

            Ok(deltas
                .with_deferred_flow(-deferred_draw)
                .with_exempt_flow(-exempt_draw))
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeltasState, FundsState};
    use crate::rules::{ParamVector, RuleCtx};

    #[test]
    fn linear_split_interpolates_over_the_career() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let rule = linear_split(0.0, 1.0, 1999, 10).unwrap();
        let funds = FundsState::new(0.0, 0.0, 1998);
        let previous = DeltasState::from_year(1998);

        let first = DeltasState::from_year(1999).with_gross_salary(4_000.0);
        let split = rule(&mut ctx, first, &funds, &previous).unwrap();
        assert_eq!(split.deferred_flow(), 0.0);
        assert_eq!(split.exempt_flow(), 4_000.0);

        let second = DeltasState::from_year(2000).with_gross_salary(4_000.0);
        let split = rule(&mut ctx, second, &funds, &previous).unwrap();
        assert_eq!(split.deferred_flow(), 400.0);
        assert_eq!(split.exempt_flow(), 3_600.0);
    }

    #[test]
    fn linear_split_rejects_bad_fractions_upfront() {
        assert!(matches!(
            linear_split(-0.1, 0.5, 1999, 10),
            Err(ModelError::InvalidFraction { .. })
        ));
        assert!(matches!(
            linear_split(0.5, 1.5, 1999, 10),
            Err(ModelError::InvalidFraction { .. })
        ));
    }

    #[test]
    fn linear_split_rejects_years_outside_the_career() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let rule = linear_split(0.5, 0.5, 1999, 10).unwrap();
        let out_of_range = DeltasState::from_year(2015);
        assert!(matches!(
            rule(
                &mut ctx,
                out_of_range,
                &FundsState::new(0.0, 0.0, 2014),
                &DeltasState::from_year(2014)
            ),
            Err(ModelError::YearOutOfRange { .. })
        ));
    }

    #[test]
    fn drawdown_spreads_the_deferred_balance() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let rule = retirement_drawdown(2050, 2059).unwrap();

        // First retirement year, 10 years left, 100k deferred.
        let deltas = DeltasState::from_year(2051).with_spending(29_000.0);
        let funds = FundsState::new(100_000.0, 200_000.0, 2050);
        let split = rule(&mut ctx, deltas, &funds, &DeltasState::from_year(2050)).unwrap();

        assert_eq!(split.deferred_flow(), -10_000.0);
        assert_eq!(split.exempt_flow(), -19_000.0);
        assert!(ctx.is_feasible());
    }

    #[test]
    fn drawdown_flags_an_overdrawn_exempt_account() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let rule = retirement_drawdown(2050, 2059).unwrap();

        let deltas = DeltasState::from_year(2051).with_spending(50_000.0);
        let funds = FundsState::new(10_000.0, 5_000.0, 2050);
        let split = rule(&mut ctx, deltas, &funds, &DeltasState::from_year(2050)).unwrap();

        // 1k from deferred (10k over 10 years), 49k demanded from exempt.
        assert_eq!(split.deferred_flow(), -1_000.0);
        assert_eq!(split.exempt_flow(), -49_000.0);
        assert!(!ctx.is_feasible());
    }
}
