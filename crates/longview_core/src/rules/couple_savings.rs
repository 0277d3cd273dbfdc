//! Account-split policy rules for a couple: dividing household savings (or
//! withdrawals) across 2 partners x 2 accounts.

use crate::error::ModelError;
use crate::guard::LoopGuard;
use crate::math::{clamp, lerp};
use crate::model::{CoupleDeltasState, DeltasState, Partner};
use crate::rules::{CoupleRule, ParamRef};

const SUM_EPSILON: f64 = 1e-9;

fn higher_earner(deltas: &CoupleDeltasState) -> Partner {
    if deltas.partner2().gross_salary() > deltas.partner1().gross_salary() {
        Partner::Second
    } else {
        Partner::First
    }
}

fn other(partner: Partner) -> Partner {
    match partner {
        Partner::First => Partner::Second,
        Partner::Second => Partner::First,
    }
}

/// Routes all savings into the deferred accounts, equalizing the partners'
/// taxable incomes as far as possible; in withdrawal years it draws the
/// deferred accounts down evenly, rebalancing when one partner's account
/// would go below zero. An unavoidable overdraw is tolerated but flagged,
/// so the outer solver discards the run.
#[must_use]
pub fn equalizing_deferred_split() -> CoupleRule {
    Box::new(move |ctx, deltas, previous_funds, _previous_deltas| {
        let raw_savings = deltas.household_undifferentiated_savings();
        if raw_savings >= 0.0 {
            // Functionally working: salaried net income covers spending.
            let higher = higher_earner(&deltas);
            let lower = other(higher);
            let salary_gap =
                deltas.partner(higher).gross_salary() - deltas.partner(lower).gross_salary();

            let (higher_contribution, lower_contribution) = if salary_gap >= raw_savings {
                // The higher earner's extra earnings cover the whole amount.
                (raw_savings, 0.0)
            } else {
                let excess_split = (raw_savings - salary_gap) / 2.0;
                (salary_gap + excess_split, excess_split)
            };

            let updated = deltas.partner(higher).with_deferred_flow(higher_contribution);
            let deltas = deltas.with_partner(higher, updated)?;
            let updated = deltas.partner(lower).with_deferred_flow(lower_contribution);
            deltas.with_partner(lower, updated)
        } else {
            // Functionally retired: spending exceeds salaried net income.
            let half = raw_savings / 2.0;
            let mut partner1_contribution = half;
            let mut partner2_contribution = half;

            let partner1_shortfall =
                (previous_funds.partner1().deferred + partner1_contribution).max(half);
            if partner1_shortfall < 0.0 {
                // Partner 1 would go below zero; partner 2 makes up the gap.
                partner2_contribution += partner1_shortfall;
                partner1_contribution -= partner1_shortfall;
            }
            let partner2_shortfall =
                (previous_funds.partner2().deferred + partner2_contribution).max(half);
            if partner2_shortfall < 0.0 {
                // This may push partner 1 below zero in turn; tolerated, and
                // flagged below so the solver discards the run.
                partner1_contribution += partner2_shortfall;
                partner2_contribution -= partner2_shortfall;
            }

            if previous_funds.partner1().deferred + partner1_contribution < 0.0
                || previous_funds.partner2().deferred + partner2_contribution < 0.0
            {
                ctx.flag_infeasible(format!(
                    "deferred accounts cannot cover the {:.2} withdrawal in {}",
                    -raw_savings,
                    deltas.year()
                ));
            }

            let updated = deltas.partner1().with_deferred_flow(partner1_contribution);
            let deltas = deltas.with_partner1(updated)?;
            let updated = deltas.partner2().with_deferred_flow(partner2_contribution);
            deltas.with_partner2(updated)
        }
    })
}

/// Increases `values` toward their `limits` until they reach `target`.
///
/// Errors if the unmodified values already exceed the target. Otherwise the
/// shortfall is distributed equally across buckets with headroom, clamping
/// each to its limit and repeating; once no bucket has headroom the last
/// bucket absorbs the remainder, beyond its limit.
pub fn adjust_values_to_sum(
    values_and_limits: &[(f64, f64)],
    target: f64,
) -> Result<Vec<(f64, f64)>, ModelError> {
    let mut entries = values_and_limits.to_vec();
    let sum: f64 = entries.iter().map(|(value, _)| value).sum();
    if sum > target + SUM_EPSILON {
        return Err(ModelError::TargetSumExceeded { sum, target });
    }
    if entries.is_empty() {
        return Ok(entries);
    }

    let mut guard = LoopGuard::default();
    loop {
        let sum: f64 = entries.iter().map(|(value, _)| value).sum();
        let shortfall = target - sum;
        if shortfall <= SUM_EPSILON {
            return Ok(entries);
        }

        let open: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, (value, limit))| value < limit)
            .map(|(i, _)| i)
            .collect();

        if open.is_empty() {
            let last = entries.len() - 1;
            entries[last].0 += shortfall;
            return Ok(entries);
        }

        let share = shortfall / open.len() as f64;
        for i in open {
            let (value, limit) = entries[i];
            entries[i].0 = (value + share).min(limit);
        }
        guard.tick()?;
    }
}

/// Configuration for [`staged_split`]. The scalar endpoints may be fixed or
/// registered with the optimizing solver.
#[derive(Debug, Clone)]
pub struct StagedSplitConfig {
    /// Tax-free share of savings in the first simulated year.
    pub initial_exempt: ParamRef,
    /// Tax-free share in the last working year.
    pub final_exempt: ParamRef,
    /// Weight of taxable-income equalization at the start of the career:
    /// 1 routes deferred contributions to the higher earner, 0 splits them
    /// evenly.
    pub initial_equalize: ParamRef,
    /// Equalization weight in the last working year.
    pub final_equalize: ParamRef,
    /// Correction factor on the even deferred drawdown schedule, in [-1, 1].
    pub drawdown_correction: ParamRef,
    pub partner1_retirement_year: i32,
    pub partner2_retirement_year: i32,
    pub initial_year: i32,
    pub final_year: i32,
}

/// Splits savings first by investment type, then between partners.
///
/// While the household saves, the tax-free share interpolates across the
/// career between its two endpoints and deferred contributions divide
/// between the partners by the interpolated equalization weight. While the
/// household withdraws, each partner's deferred account is drawn down as
/// remaining-balance / years-remaining (scaled by the correction factor,
/// clamped to `[0, min(spending/2, balance)]`), and [`adjust_values_to_sum`]
/// tops up the rest of the shortfall across all four allotments, overdrawing
/// the last only when nothing has headroom. Overdraws are flagged
/// infeasible.
#[must_use]
pub fn staged_split(config: StagedSplitConfig) -> CoupleRule {
    Box::new(move |ctx, deltas, previous_funds, _previous_deltas| {
        let year = deltas.year();
        if year <= config.initial_year || year > config.final_year {
            return Err(ModelError::YearOutOfRange {
                year,
                lower: config.initial_year + 1,
                upper: config.final_year,
            });
        }

        let last_working_year =
            config.partner1_retirement_year.max(config.partner2_retirement_year) - 1;
        let span = f64::from((last_working_year - config.initial_year).max(1));
        let t = f64::from(year - config.initial_year) / span;

        let savings = deltas.household_undifferentiated_savings();
        if savings >= 0.0 {
            let exempt_fraction = clamp(
                lerp(
                    config.initial_exempt.value(ctx)?,
                    config.final_exempt.value(ctx)?,
                    t,
                ),
                0.0,
                1.0,
            )?;
            let equalize_weight = clamp(
                lerp(
                    config.initial_equalize.value(ctx)?,
                    config.final_equalize.value(ctx)?,
                    t,
                ),
                0.0,
                1.0,
            )?;

            let exempt_total = savings * exempt_fraction;
            let deferred_total = savings - exempt_total;

            let higher = higher_earner(&deltas);
            let lower = other(higher);
            let salary_gap =
                deltas.partner(higher).gross_salary() - deltas.partner(lower).gross_salary();

            // Fully-equalizing allocation of the deferred total.
            let (higher_equalized, lower_equalized) = if salary_gap >= deferred_total {
                (deferred_total, 0.0)
            } else {
                let excess_split = (deferred_total - salary_gap) / 2.0;
                (salary_gap + excess_split, excess_split)
            };
            let even = deferred_total / 2.0;

            let higher_deferred = lerp(even, higher_equalized, equalize_weight);
            let lower_deferred = lerp(even, lower_equalized, equalize_weight);
            let exempt_each = exempt_total / 2.0;

            let updated = deltas
                .partner(higher)
                .with_deferred_flow(higher_deferred)
                .with_exempt_flow(exempt_each);
            let deltas = deltas.with_partner(higher, updated)?;
            let updated = deltas
                .partner(lower)
                .with_deferred_flow(lower_deferred)
                .with_exempt_flow(exempt_each);
            deltas.with_partner(lower, updated)
        } else {
            let needed = -savings;
            let spending = deltas.household_spending();
            let correction = 1.0 + config.drawdown_correction.value(ctx)?;
            let years_left = f64::from((config.final_year - year + 1).max(1));

            // The needed/2 cap keeps the two seeds from already exceeding
            // the top-up target when balances are large and years are few.
            let seed = |balance: f64| -> Result<f64, ModelError> {
                clamp(
                    balance / years_left * correction,
                    0.0,
                    (spending / 2.0).min(needed / 2.0).min(balance).max(0.0),
                )
            };
            let partner1_deferred = seed(previous_funds.partner1().deferred)?;
            let partner2_deferred = seed(previous_funds.partner2().deferred)?;

            let allotments = adjust_values_to_sum(
                &[
                    (partner1_deferred, previous_funds.partner1().deferred.max(0.0)),
                    (partner2_deferred, previous_funds.partner2().deferred.max(0.0)),
                    (0.0, previous_funds.partner1().exempt.max(0.0)),
                    (0.0, previous_funds.partner2().exempt.max(0.0)),
                ],
                needed,
            )?;

            for (value, limit) in &allotments {
                if value > &(limit + SUM_EPSILON) {
                    ctx.flag_infeasible(format!(
                        "withdrawal of {needed:.2} in {year} overdraws an account"
                    ));
                }
            }

            let withdraw = |partner: DeltasState, deferred: f64, exempt: f64| {
                partner.with_deferred_flow(-deferred).with_exempt_flow(-exempt)
            };
            let updated = withdraw(deltas.partner1(), allotments[0].0, allotments[2].0);
            let deltas = deltas.with_partner1(updated)?;
            let updated = withdraw(deltas.partner2(), allotments[1].0, allotments[3].0);
            deltas.with_partner2(updated)
        }
    })
}
