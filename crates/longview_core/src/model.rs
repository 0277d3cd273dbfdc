//! Immutable per-year state records and the year-over-year transition.
//!
//! A simulated year is described by two records: a [`FundsState`] holding
//! account balances at the end of the year, and a [`DeltasState`] holding
//! everything that happened during the year. Both are immutable value types;
//! every update produces a new instance. The transition from one year to the
//! next is a fold of rule functions over a zeroed delta record, followed by
//! [`advance_funds`].

use crate::error::ModelError;
use crate::rules::{CoupleRule, Rule, RuleCtx};

/// End-of-year balances for one individual: the tax-deferred account
/// (contributions reduce taxable income, withdrawals are taxed) and the
/// tax-free account (after-tax contributions, untaxed withdrawals).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundsState {
    pub deferred: f64,
    pub exempt: f64,
    pub year: i32,
}

impl FundsState {
    #[must_use]
    pub fn new(deferred: f64, exempt: f64, year: i32) -> Self {
        Self {
            deferred,
            exempt,
            year,
        }
    }

    /// Total savings across both accounts.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.deferred + self.exempt
    }
}

/// Everything that happened during one year for one individual.
///
/// Flows are signed: a positive `deferred_flow` is a contribution, a
/// negative one a withdrawal. Each `with_*` method returns a new record with
/// exactly one field replaced, so rule functions form a fold over the year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltasState {
    year: i32,
    gross_salary: f64,
    tax: f64,
    deferred_flow: f64,
    exempt_flow: f64,
    spending: f64,
    deferred_interest: f64,
    exempt_interest: f64,
    tax_refund: f64,
}

impl DeltasState {
    /// An all-zero delta record for the given year.
    #[must_use]
    pub fn from_year(year: i32) -> Self {
        Self {
            year,
            gross_salary: 0.0,
            tax: 0.0,
            deferred_flow: 0.0,
            exempt_flow: 0.0,
            spending: 0.0,
            deferred_interest: 0.0,
            exempt_interest: 0.0,
            tax_refund: 0.0,
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Pre-tax salary.
    #[must_use]
    pub fn gross_salary(&self) -> f64 {
        self.gross_salary
    }

    #[must_use]
    pub fn with_gross_salary(self, value: f64) -> Self {
        Self {
            gross_salary: value,
            ..self
        }
    }

    /// Income tax owed this year.
    #[must_use]
    pub fn tax(&self) -> f64 {
        self.tax
    }

    #[must_use]
    pub fn with_tax(self, value: f64) -> Self {
        Self { tax: value, ..self }
    }

    /// Net flow into the tax-deferred account (negative for a withdrawal).
    #[must_use]
    pub fn deferred_flow(&self) -> f64 {
        self.deferred_flow
    }

    #[must_use]
    pub fn with_deferred_flow(self, value: f64) -> Self {
        Self {
            deferred_flow: value,
            ..self
        }
    }

    /// Net flow into the tax-free account (negative for a withdrawal).
    #[must_use]
    pub fn exempt_flow(&self) -> f64 {
        self.exempt_flow
    }

    #[must_use]
    pub fn with_exempt_flow(self, value: f64) -> Self {
        Self {
            exempt_flow: value,
            ..self
        }
    }

    /// Household spending for the year.
    #[must_use]
    pub fn spending(&self) -> f64 {
        self.spending
    }

    #[must_use]
    pub fn with_spending(self, value: f64) -> Self {
        Self {
            spending: value,
            ..self
        }
    }

    /// Interest credited to the tax-deferred account.
    #[must_use]
    pub fn deferred_interest(&self) -> f64 {
        self.deferred_interest
    }

    #[must_use]
    pub fn with_deferred_interest(self, value: f64) -> Self {
        Self {
            deferred_interest: value,
            ..self
        }
    }

    /// Interest credited to the tax-free account.
    #[must_use]
    pub fn exempt_interest(&self) -> f64 {
        self.exempt_interest
    }

    #[must_use]
    pub fn with_exempt_interest(self, value: f64) -> Self {
        Self {
            exempt_interest: value,
            ..self
        }
    }

    /// Refund (or, negative, additional tax owed) settling the previous
    /// year's deferred-account flows.
    #[must_use]
    pub fn tax_refund(&self) -> f64 {
        self.tax_refund
    }

    #[must_use]
    pub fn with_tax_refund(self, value: f64) -> Self {
        Self {
            tax_refund: value,
            ..self
        }
    }

    /// Salary plus last year's refund, minus tax owed.
    #[must_use]
    pub fn total_net_income(&self) -> f64 {
        self.gross_salary + self.tax_refund - self.tax
    }

    /// Taxable portion of the year's income: salary less the deferred
    /// contribution (a withdrawal adds back), plus interest earned in the
    /// deferred account. Tax-free interest is never taxed.
    #[must_use]
    pub fn taxable_income(&self) -> f64 {
        self.gross_salary - self.deferred_flow + self.deferred_interest
    }

    /// Savings available to be split between the two accounts. Negative
    /// during net-withdrawal years.
    #[must_use]
    pub fn undifferentiated_savings(&self) -> f64 {
        self.total_net_income() - self.spending
    }
}

/// Balances for both partners of a couple. The two records must describe the
/// same year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoupleFundsState {
    partner1: FundsState,
    partner2: FundsState,
}

impl CoupleFundsState {
    pub fn new(partner1: FundsState, partner2: FundsState) -> Result<Self, ModelError> {
        if partner1.year != partner2.year {
            return Err(ModelError::PartnerYearMismatch {
                partner1: partner1.year,
                partner2: partner2.year,
            });
        }
        Ok(Self { partner1, partner2 })
    }

    #[must_use]
    pub fn partner1(&self) -> FundsState {
        self.partner1
    }

    #[must_use]
    pub fn partner2(&self) -> FundsState {
        self.partner2
    }

    #[must_use]
    pub fn partner(&self, partner: Partner) -> FundsState {
        match partner {
            Partner::First => self.partner1,
            Partner::Second => self.partner2,
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.partner1.year
    }

    /// Total household savings across both partners and both accounts.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.partner1.total() + self.partner2.total()
    }
}

/// Per-year deltas for a couple: one individual record per partner, plus the
/// separately tracked household spending (the individual `spending` fields
/// stay zero in couple simulations).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoupleDeltasState {
    partner1: DeltasState,
    partner2: DeltasState,
    household_spending: f64,
}

impl CoupleDeltasState {
    pub fn new(
        partner1: DeltasState,
        partner2: DeltasState,
        household_spending: f64,
    ) -> Result<Self, ModelError> {
        if partner1.year != partner2.year {
            return Err(ModelError::PartnerYearMismatch {
                partner1: partner1.year,
                partner2: partner2.year,
            });
        }
        Ok(Self {
            partner1,
            partner2,
            household_spending,
        })
    }

    #[must_use]
    pub fn from_year(year: i32) -> Self {
        Self {
            partner1: DeltasState::from_year(year),
            partner2: DeltasState::from_year(year),
            household_spending: 0.0,
        }
    }

    #[must_use]
    pub fn partner1(&self) -> DeltasState {
        self.partner1
    }

    pub fn with_partner1(self, value: DeltasState) -> Result<Self, ModelError> {
        Self::new(value, self.partner2, self.household_spending)
    }

    #[must_use]
    pub fn partner2(&self) -> DeltasState {
        self.partner2
    }

    pub fn with_partner2(self, value: DeltasState) -> Result<Self, ModelError> {
        Self::new(self.partner1, value, self.household_spending)
    }

    #[must_use]
    pub fn partner(&self, partner: Partner) -> DeltasState {
        match partner {
            Partner::First => self.partner1,
            Partner::Second => self.partner2,
        }
    }

    pub fn with_partner(self, partner: Partner, value: DeltasState) -> Result<Self, ModelError> {
        match partner {
            Partner::First => self.with_partner1(value),
            Partner::Second => self.with_partner2(value),
        }
    }

    #[must_use]
    pub fn household_spending(&self) -> f64 {
        self.household_spending
    }

    #[must_use]
    pub fn with_household_spending(self, value: f64) -> Self {
        Self {
            household_spending: value,
            ..self
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.partner1.year
    }

    /// Combined net income of both partners.
    #[must_use]
    pub fn household_net_income(&self) -> f64 {
        self.partner1.total_net_income() + self.partner2.total_net_income()
    }

    /// Household savings available to route into the four partner/account
    /// allotments. Negative when the household is functionally retired.
    #[must_use]
    pub fn household_undifferentiated_savings(&self) -> f64 {
        self.household_net_income() - self.household_spending
    }
}

/// Selects one partner of a couple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partner {
    First,
    Second,
}

/// Applies a year's completed deltas to the previous balances.
///
/// The deltas must describe the year immediately after the balances; the
/// check guards against rule-ordering bugs upstream.
pub fn advance_funds(
    previous: FundsState,
    deltas: &DeltasState,
) -> Result<FundsState, ModelError> {
    if deltas.year != previous.year + 1 {
        return Err(ModelError::YearMismatch {
            funds_year: previous.year,
            deltas_year: deltas.year,
        });
    }
    Ok(FundsState::new(
        previous.deferred + deltas.deferred_flow + deltas.deferred_interest,
        previous.exempt + deltas.exempt_flow + deltas.exempt_interest,
        deltas.year,
    ))
}

pub fn advance_couple_funds(
    previous: CoupleFundsState,
    deltas: &CoupleDeltasState,
) -> Result<CoupleFundsState, ModelError> {
    CoupleFundsState::new(
        advance_funds(previous.partner1, &deltas.partner1)?,
        advance_funds(previous.partner2, &deltas.partner2)?,
    )
}

/// Folds the ordered rule list over a zeroed delta record for the year after
/// `previous_funds`. Each rule receives the accumulator produced by the rule
/// before it.
pub fn step_deltas(
    ctx: &mut RuleCtx<'_>,
    previous_funds: &FundsState,
    previous_deltas: &DeltasState,
    rules: &[Rule],
) -> Result<DeltasState, ModelError> {
    if previous_funds.year != previous_deltas.year {
        return Err(ModelError::YearMismatch {
            funds_year: previous_funds.year,
            deltas_year: previous_deltas.year,
        });
    }
    let mut deltas = DeltasState::from_year(previous_funds.year + 1);
    for rule in rules {
        deltas = rule(ctx, deltas, previous_funds, previous_deltas)?;
    }
    Ok(deltas)
}

/// Couple variant of [`step_deltas`], folding over borrowed rules since the
/// couple rule list is regenerated every year.
pub fn step_couple_deltas(
    ctx: &mut RuleCtx<'_>,
    previous_funds: &CoupleFundsState,
    previous_deltas: &CoupleDeltasState,
    rules: &[&CoupleRule],
) -> Result<CoupleDeltasState, ModelError> {
    if previous_funds.year() != previous_deltas.year() {
        return Err(ModelError::YearMismatch {
            funds_year: previous_funds.year(),
            deltas_year: previous_deltas.year(),
        });
    }
    let mut deltas = CoupleDeltasState::from_year(previous_funds.year() + 1);
    for rule in rules {
        deltas = rule(ctx, deltas, previous_funds, previous_deltas)?;
    }
    Ok(deltas)
}

/// Lifts a single-earner rule into a couple rule applied to one partner.
#[must_use]
pub fn for_partner(partner: Partner, rule: Rule) -> CoupleRule {
    Box::new(move |ctx, deltas, previous_funds, previous_deltas| {
        let updated = rule(
            ctx,
            deltas.partner(partner),
            &previous_funds.partner(partner),
            &previous_deltas.partner(partner),
        )?;
        deltas.with_partner(partner, updated)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ParamVector, RuleCtx};

    #[test]
    fn derived_delta_values() {
        let deltas = DeltasState::from_year(1999)
            .with_gross_salary(30_000.0)
            .with_tax(19_000.0)
            .with_tax_refund(700.0)
            .with_spending(60.0);
        assert_eq!(deltas.total_net_income(), 11_700.0);
        assert_eq!(deltas.undifferentiated_savings(), 11_640.0);
    }

    #[test]
    fn taxable_income_adds_back_withdrawals_and_interest() {
        let deltas = DeltasState::from_year(2001)
            .with_gross_salary(50_000.0)
            .with_deferred_flow(-8_000.0)
            .with_deferred_interest(1_200.0);
        assert_eq!(deltas.taxable_income(), 59_200.0);
    }

    #[test]
    fn advance_funds_applies_flows_and_interest() {
        let previous = FundsState::new(1_200.0, 1_010.0, 2040);
        let deltas = DeltasState::from_year(2041)
            .with_deferred_flow(400.0)
            .with_exempt_flow(333.0);
        let funds = advance_funds(previous, &deltas).unwrap();
        assert_eq!(funds.deferred, 1_600.0);
        assert_eq!(funds.exempt, 1_343.0);
        assert_eq!(funds.year, 2041);
    }

    #[test]
    fn advance_funds_rejects_wrong_year() {
        let previous = FundsState::new(0.0, 0.0, 2040);
        let deltas = DeltasState::from_year(2040);
        assert!(matches!(
            advance_funds(previous, &deltas),
            Err(ModelError::YearMismatch { .. })
        ));
    }

    #[test]
    fn couple_states_must_share_a_year() {
        let p1 = FundsState::new(0.0, 0.0, 2020);
        let p2 = FundsState::new(0.0, 0.0, 2021);
        assert!(matches!(
            CoupleFundsState::new(p1, p2),
            Err(ModelError::PartnerYearMismatch { .. })
        ));
    }

    #[test]
    fn step_deltas_folds_rules_in_order() {
        let set_deferred: Rule = Box::new(|_, d, _, _| Ok(d.with_deferred_flow(320.0)));
        let set_salary: Rule = Box::new(|_, d, _, _| Ok(d.with_gross_salary(109.0)));
        let double_deferred: Rule =
            Box::new(|_, d, _, _| Ok(d.with_deferred_flow(d.deferred_flow() * 2.0)));

        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let deltas = step_deltas(
            &mut ctx,
            &FundsState::new(0.0, 0.0, 1999),
            &DeltasState::from_year(1999),
            &[set_deferred, set_salary, double_deferred],
        )
        .unwrap();

        assert_eq!(deltas.year(), 2000);
        assert_eq!(deltas.gross_salary(), 109.0);
        assert_eq!(deltas.deferred_flow(), 640.0);
    }

    #[test]
    fn for_partner_touches_only_the_chosen_partner() {
        let set_salary: Rule = Box::new(|_, d, _, _| Ok(d.with_gross_salary(77_000.0)));
        let rule = for_partner(Partner::Second, set_salary);

        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let previous_funds = CoupleFundsState::new(
            FundsState::new(0.0, 0.0, 2024),
            FundsState::new(0.0, 0.0, 2024),
        )
        .unwrap();
        let previous_deltas = CoupleDeltasState::from_year(2024);

        let deltas = rule(
            &mut ctx,
            CoupleDeltasState::from_year(2025),
            &previous_funds,
            &previous_deltas,
        )
        .unwrap();

        assert_eq!(deltas.partner1().gross_salary(), 0.0);
        assert_eq!(deltas.partner2().gross_salary(), 77_000.0);
    }
}
