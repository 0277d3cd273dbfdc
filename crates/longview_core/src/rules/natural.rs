//! Natural rules: updates set by law, economics and arithmetic, as opposed
//! to rules articulating the model's assumptions.

use crate::rules::Rule;
use crate::tax::TaxFn;

/// Sets income tax owed on gross salary, deliberately ignoring the current
/// year's deferred contribution: the account split runs after tax in the
/// pipeline, so the overpayment is settled by next year's refund rule.
#[must_use]
pub fn tax_on_salary(tax_fn: TaxFn) -> Rule {
    Box::new(move |_ctx, deltas, _previous_funds, _previous_deltas| {
        let owed = tax_fn(deltas.gross_salary());
        Ok(deltas.with_tax(owed))
    })
}

/// Settles the previous year's taxes: the difference between tax actually
/// paid and the tax owed on that year's true taxable income. Positive after
/// a contribution year (a refund), negative after a withdrawal year
/// (additional tax owed).
#[must_use]
pub fn tax_refund(tax_fn: TaxFn) -> Rule {
    Box::new(move |_ctx, deltas, _previous_funds, previous_deltas| {
        let settled = tax_fn(previous_deltas.taxable_income());
        Ok(deltas.with_tax_refund(previous_deltas.tax() - settled))
    })
}

/// Credits interest on the previous year's closing balances at fixed rates.
#[must_use]
pub fn investment_interest(deferred_rate: f64, exempt_rate: f64) -> Rule {
    Box::new(move |_ctx, deltas, previous_funds, _previous_deltas| {
        Ok(deltas
            .with_deferred_interest(previous_funds.deferred * deferred_rate)
            .with_exempt_interest(previous_funds.exempt * exempt_rate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeltasState, FundsState, advance_funds};
    use crate::rules::{ParamVector, RuleCtx};
    use crate::tax::{default_tax_fn, income_tax};

    fn ctx_fixture() -> ParamVector {
        ParamVector::default()
    }

    #[test]
    fn tax_rule_ignores_the_deferred_flow() {
        let params = ctx_fixture();
        let mut ctx = RuleCtx::new(&params);
        let deltas = DeltasState::from_year(1999)
            .with_gross_salary(60_000.0)
            .with_deferred_flow(5_000.0);
        let rule = tax_on_salary(default_tax_fn());
        let updated = rule(
            &mut ctx,
            deltas,
            &FundsState::new(0.0, 0.0, 1998),
            &DeltasState::from_year(1998),
        )
        .unwrap();
        assert_eq!(updated.tax(), income_tax(60_000.0));
    }

    #[test]
    fn refund_settles_last_years_contribution() {
        let params = ctx_fixture();
        let mut ctx = RuleCtx::new(&params);
        let previous = DeltasState::from_year(1999)
            .with_gross_salary(60_000.0)
            .with_deferred_flow(8_000.0)
            .with_tax(income_tax(60_000.0));

        let rule = tax_refund(default_tax_fn());
        let updated = rule(
            &mut ctx,
            DeltasState::from_year(2000),
            &FundsState::new(0.0, 0.0, 1999),
            &previous,
        )
        .unwrap();

        let expected = income_tax(60_000.0) - income_tax(52_000.0);
        assert_eq!(updated.tax_refund(), expected);
        assert!(updated.tax_refund() > 0.0);
    }

    #[test]
    fn refund_is_negative_after_a_withdrawal_year() {
        let params = ctx_fixture();
        let mut ctx = RuleCtx::new(&params);
        // Retired: no salary, tax paid 0, but the withdrawal was taxable.
        let previous = DeltasState::from_year(2051).with_deferred_flow(-30_000.0);

        let rule = tax_refund(default_tax_fn());
        let updated = rule(
            &mut ctx,
            DeltasState::from_year(2052),
            &FundsState::new(0.0, 0.0, 2051),
            &previous,
        )
        .unwrap();

        assert_eq!(updated.tax_refund(), -income_tax(30_000.0));
        assert!(updated.tax_refund() < 0.0);
    }

    #[test]
    fn interest_accrues_on_previous_balances() {
        let params = ctx_fixture();
        let mut ctx = RuleCtx::new(&params);
        let previous_funds = FundsState::new(12_000.0, 19_000.0, 1672);

        let rule = investment_interest(0.04, 0.07);
        let deltas = rule(
            &mut ctx,
            DeltasState::from_year(1673),
            &previous_funds,
            &DeltasState::from_year(1672),
        )
        .unwrap();

        assert!((deltas.deferred_interest() - 480.0).abs() < 1e-9);
        assert!((deltas.exempt_interest() - 1_330.0).abs() < 1e-9);

        let funds = advance_funds(previous_funds, &deltas).unwrap();
        assert!((funds.deferred - 12_480.0).abs() < 1e-9);
        assert!((funds.exempt - 20_330.0).abs() < 1e-9);
    }
}
