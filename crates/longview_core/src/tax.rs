//! Progressive income-tax tables.
//!
//! The simulation core treats taxation as an opaque pure function from
//! taxable income to tax owed; this module ships the default implementation
//! (combined federal and provincial brackets, with the provincial abatement
//! applied to the federal share). Swap in a different [`TaxFn`] to model
//! another jurisdiction.

use std::sync::Arc;

/// Opaque tax function consumed by the natural rules.
pub type TaxFn = Arc<dyn Fn(f64) -> f64>;

/// The calendar year the bracket tables below were taken from. Consumers
/// should warn when simulating from a materially different year.
pub const TAX_TABLE_YEAR: i32 = 2019;

/// A single marginal bracket: `rate` applies to income above `threshold`,
/// up to the next bracket's threshold.
#[derive(Debug, Clone, Copy)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

const FEDERAL_BRACKETS: [TaxBracket; 6] = [
    TaxBracket { threshold: 0.0, rate: 0.0 },
    TaxBracket { threshold: 12_069.0, rate: 0.15 },
    TaxBracket { threshold: 47_630.0, rate: 0.205 },
    TaxBracket { threshold: 95_259.0, rate: 0.26 },
    TaxBracket { threshold: 147_667.0, rate: 0.29 },
    TaxBracket { threshold: 210_371.0, rate: 0.33 },
];

const PROVINCIAL_BRACKETS: [TaxBracket; 5] = [
    TaxBracket { threshold: 0.0, rate: 0.0 },
    TaxBracket { threshold: 15_269.0, rate: 0.15 },
    TaxBracket { threshold: 43_790.0, rate: 0.20 },
    TaxBracket { threshold: 87_575.0, rate: 0.24 },
    TaxBracket { threshold: 106_555.0, rate: 0.2575 },
];

/// Refundable abatement applied to the federal share for provincial filers.
const PROVINCIAL_ABATEMENT: f64 = 0.165;

/// Tax owed on `income` under a progressive bracket table.
/// Income at or below zero owes nothing.
#[must_use]
pub fn bracket_tax(income: f64, brackets: &[TaxBracket]) -> f64 {
    if income <= 0.0 || brackets.is_empty() {
        return 0.0;
    }

    let mut tax = 0.0;
    for (i, bracket) in brackets.iter().enumerate() {
        if income <= bracket.threshold {
            break;
        }
        let next = brackets
            .get(i + 1)
            .map(|b| b.threshold)
            .unwrap_or(f64::INFINITY);
        tax += (income.min(next) - bracket.threshold) * bracket.rate;
    }
    tax
}

/// Total income tax owed on the nominated taxable income: abated federal tax
/// plus provincial tax.
#[must_use]
pub fn income_tax(taxable_income: f64) -> f64 {
    let federal = bracket_tax(taxable_income, &FEDERAL_BRACKETS) * (1.0 - PROVINCIAL_ABATEMENT);
    let provincial = bracket_tax(taxable_income, &PROVINCIAL_BRACKETS);
    federal + provincial
}

/// The default [`TaxFn`] backed by [`income_tax`].
#[must_use]
pub fn default_tax_fn() -> TaxFn {
    Arc::new(income_tax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tax_at_or_below_zero() {
        assert_eq!(income_tax(0.0), 0.0);
        assert_eq!(income_tax(-25_000.0), 0.0);
    }

    #[test]
    fn no_tax_below_the_first_threshold() {
        assert_eq!(bracket_tax(10_000.0, &FEDERAL_BRACKETS), 0.0);
        assert_eq!(bracket_tax(15_000.0, &PROVINCIAL_BRACKETS), 0.0);
    }

    #[test]
    fn federal_tax_spans_brackets() {
        // (47630 - 12069) * 0.15 + (50000 - 47630) * 0.205 = 5334.15 + 485.85
        let tax = bracket_tax(50_000.0, &FEDERAL_BRACKETS);
        assert!((tax - 5_820.0).abs() < 1e-6, "got {tax}");
    }

    #[test]
    fn combined_tax_applies_the_abatement() {
        // Provincial: (40000 - 15269) * 0.15 = 3709.65
        // Federal: (40000 - 12069) * 0.15 * (1 - 0.165) = 3498.35775
        let tax = income_tax(40_000.0);
        assert!((tax - 7_208.00775).abs() < 1e-6, "got {tax}");
    }

    #[test]
    fn marginal_rate_increases_with_income() {
        let low = income_tax(30_000.0);
        let mid = income_tax(60_000.0);
        let high = income_tax(120_000.0);
        assert!(mid - low < high - mid);
    }
}
