//! Household spending policy rules for a couple.

use std::cell::Cell;

use crate::math::edge_ramp;
use crate::rules::CoupleRule;

/// Couple variant of the luxury-over-basic model: a compounding
/// discretionary component over a fixed floor, applied to household
/// spending. When neither partner is earning, the couple is assumed retired
/// and spending holds constant.
#[must_use]
pub fn luxury_over_basic(base_spending: f64, luxury_rate: f64) -> CoupleRule {
    Box::new(move |_ctx, deltas, _previous_funds, previous_deltas| {
        if deltas.partner1().gross_salary() == 0.0 && deltas.partner2().gross_salary() == 0.0 {
            return Ok(deltas.with_household_spending(previous_deltas.household_spending()));
        }
        let previous_spending = previous_deltas.household_spending();
        let previous_luxury = previous_spending - base_spending;
        if previous_luxury < 0.0 {
            // Below the floor; the solver probes spendings from zero upwards.
            return Ok(deltas.with_household_spending((1.0 + luxury_rate) * previous_spending));
        }
        let luxury = (1.0 + luxury_rate) * previous_luxury;
        Ok(deltas.with_household_spending(base_spending + luxury))
    })
}

/// The increasing-savings/increasing-spending model.
///
/// Each year blends two candidates for household spending: one that keeps
/// spending a constant share of net income (all income growth is spent) and
/// one that keeps spending constant in absolute terms (all income growth is
/// saved), weighted by `savings_weight` in [0, 1]. Spending never decreases
/// in absolute terms, which also holds it constant once both partners
/// retire.
///
/// On the very first simulated year only, the effective weight is pushed
/// toward 1 or 0 when the initial spending sits within 5% of 0% or 100% of
/// net income, so that lifetime spending totals approach the clean
/// zero/maximal bounds at the solver's bracket edges.
#[must_use]
pub fn rising_savings_spending(initial_year: i32, savings_weight: f64) -> CoupleRule {
    let effective_weight = Cell::new(None::<f64>);
    Box::new(move |_ctx, deltas, _previous_funds, previous_deltas| {
        let net_income = deltas.household_net_income();
        let previous_net_income = previous_deltas.household_net_income();
        let previous_spending = previous_deltas.household_spending();

        if deltas.year() == initial_year + 1 {
            let spending_fraction = if net_income > 0.0 {
                previous_spending / net_income
            } else {
                1.0
            };
            effective_weight.set(Some(edge_ramp(savings_weight, spending_fraction)));
        }
        let weight = effective_weight.get().unwrap_or(savings_weight);

        let proportional = if previous_net_income > 0.0 {
            previous_spending * (net_income / previous_net_income)
        } else {
            previous_spending
        };
        let spending = (proportional + weight * (previous_spending - proportional))
            .max(previous_spending);

        Ok(deltas.with_household_spending(spending))
    })
}
