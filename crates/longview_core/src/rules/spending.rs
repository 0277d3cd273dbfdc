//! Spending policy rules for a single earner.

use crate::error::ModelError;
use crate::rules::Rule;

/// Spending modeled as a compounding "luxury" component on top of a fixed
/// "basic needs" floor: `sp[y] = base + (1 + rate) * (sp[y-1] - base)`.
///
/// When previous spending sits below the floor (the solver probes spendings
/// from zero upwards), the raw previous spending compounds instead; callers
/// are responsible for warning the user if the final solution lands there.
#[must_use]
pub fn luxury_over_basic(base_spending: f64, luxury_rate: f64) -> Rule {
    Box::new(move |_ctx, deltas, _previous_funds, previous_deltas| {
        let previous_luxury = previous_deltas.spending() - base_spending;
        if previous_luxury < 0.0 {
            let spending = (1.0 + luxury_rate) * previous_deltas.spending();
            return Ok(deltas.with_spending(spending));
        }
        let luxury = (1.0 + luxury_rate) * previous_luxury;
        Ok(deltas.with_spending(base_spending + luxury))
    })
}

/// [`luxury_over_basic`] with spending additionally clamped to a fraction of
/// the year's net income. Runs after the tax rule, so net income is known.
pub fn luxury_over_basic_capped(
    base_spending: f64,
    luxury_rate: f64,
    cap_fraction: f64,
) -> Result<Rule, ModelError> {
    if !(0.0..=1.0).contains(&cap_fraction) {
        return Err(ModelError::InvalidFraction {
            what: "spending cap fraction",
            value: cap_fraction,
        });
    }
    let uncapped = luxury_over_basic(base_spending, luxury_rate);
    Ok(Box::new(
        move |ctx, deltas, previous_funds, previous_deltas| {
            let deltas = uncapped(ctx, deltas, previous_funds, previous_deltas)?;
            let cap = cap_fraction * deltas.total_net_income();
            Ok(deltas.with_spending(deltas.spending().min(cap)))
        },
    ))
}
