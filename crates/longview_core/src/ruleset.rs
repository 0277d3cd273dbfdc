//! Assembles ordered rule lists from assumption-driven policy rules and the
//! natural rules, with the ordering their dependencies require.

use crate::model::{Partner, for_partner};
use crate::rules::{CoupleRule, Rule, natural};
use crate::tax::TaxFn;

/// Full career ruleset, correctly ordered:
/// refund and interest first (no same-year dependencies), then salary, then
/// tax (depends on salary), then spending (may depend on salary and tax),
/// then the account split (depends on nearly everything before it).
#[must_use]
pub fn career_rules(
    salary_rule: Rule,
    spending_rule: Rule,
    savings_rule: Rule,
    deferred_interest_rate: f64,
    exempt_interest_rate: f64,
    tax_fn: &TaxFn,
) -> Vec<Rule> {
    vec![
        natural::tax_refund(tax_fn.clone()),
        natural::investment_interest(deferred_interest_rate, exempt_interest_rate),
        salary_rule,
        natural::tax_on_salary(tax_fn.clone()),
        spending_rule,
        savings_rule,
    ]
}

/// Retirement ruleset: constant retirement income, settlement of the
/// previous year's deferred flows (a payment, not a refund, when
/// withdrawing), the withdrawal split, and interest on what remains. No
/// salary or employment tax.
#[must_use]
pub fn retirement_rules(
    retirement_income: f64,
    savings_rule: Rule,
    deferred_interest_rate: f64,
    exempt_interest_rate: f64,
    tax_fn: &TaxFn,
) -> Vec<Rule> {
    let retirement_spending: Rule = Box::new(move |_ctx, deltas, _previous_funds, _previous_deltas| {
        Ok(deltas.with_spending(retirement_income))
    });
    vec![
        retirement_spending,
        natural::tax_refund(tax_fn.clone()),
        savings_rule,
        natural::investment_interest(deferred_interest_rate, exempt_interest_rate),
    ]
}

/// Builds each year's couple ruleset from the partners' retirement status.
///
/// The refund and interest rules always apply to both partners; salary and
/// tax only to a partner still working that year; the shared spending and
/// account-split rules always run last. Because membership is conditional
/// the list is regenerated every year, never cached.
pub struct CoupleRulesetBuilder {
    refund: [CoupleRule; 2],
    interest: [CoupleRule; 2],
    salary: [CoupleRule; 2],
    tax: [CoupleRule; 2],
    spending: CoupleRule,
    savings: CoupleRule,
}

impl CoupleRulesetBuilder {
    #[must_use]
    pub fn new(
        partner1_salary_rule: Rule,
        partner2_salary_rule: Rule,
        spending_rule: CoupleRule,
        savings_rule: CoupleRule,
        deferred_interest_rate: f64,
        exempt_interest_rate: f64,
        tax_fn: &TaxFn,
    ) -> Self {
        Self {
            refund: [
                for_partner(Partner::First, natural::tax_refund(tax_fn.clone())),
                for_partner(Partner::Second, natural::tax_refund(tax_fn.clone())),
            ],
            interest: [
                for_partner(
                    Partner::First,
                    natural::investment_interest(deferred_interest_rate, exempt_interest_rate),
                ),
                for_partner(
                    Partner::Second,
                    natural::investment_interest(deferred_interest_rate, exempt_interest_rate),
                ),
            ],
            salary: [
                for_partner(Partner::First, partner1_salary_rule),
                for_partner(Partner::Second, partner2_salary_rule),
            ],
            tax: [
                for_partner(Partner::First, natural::tax_on_salary(tax_fn.clone())),
                for_partner(Partner::Second, natural::tax_on_salary(tax_fn.clone())),
            ],
            spending: spending_rule,
            savings: savings_rule,
        }
    }

    /// The ordered rule list for one year.
    #[must_use]
    pub fn rules_for_year(
        &self,
        partner1_retired: bool,
        partner2_retired: bool,
    ) -> Vec<&CoupleRule> {
        let mut rules = Vec::with_capacity(10);
        for i in 0..2 {
            // No same-year dependencies; applies pre- and post-retirement.
            rules.push(&self.refund[i]);
            rules.push(&self.interest[i]);
        }
        if !partner1_retired {
            rules.push(&self.salary[0]);
            rules.push(&self.tax[0]);
        }
        if !partner2_retired {
            rules.push(&self.salary[1]);
            rules.push(&self.tax[1]);
        }
        rules.push(&self.spending);
        rules.push(&self.savings);
        rules
    }
}
