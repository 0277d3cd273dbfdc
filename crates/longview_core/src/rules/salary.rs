//! Salary-growth policy rules.

use crate::rules::Rule;

/// Salary compounds at a fixed rate each year until it plateaus:
/// `s[y] = min(plateau, (1 + rate) * s[y-1])`.
#[must_use]
pub fn compound_plateau(rate: f64, plateau: f64) -> Rule {
    Box::new(move |_ctx, deltas, _previous_funds, previous_deltas| {
        let compounded = (1.0 + rate) * previous_deltas.gross_salary();
        Ok(deltas.with_gross_salary(plateau.min(compounded)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeltasState, FundsState, advance_funds, step_deltas};
    use crate::rules::{ParamVector, RuleCtx};

    #[test]
    fn compounds_each_year() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let deltas = step_deltas(
            &mut ctx,
            &FundsState::new(0.0, 0.0, 1999),
            &DeltasState::from_year(1999).with_gross_salary(40_000.0),
            &[compound_plateau(0.1, 80_000.0)],
        )
        .unwrap();
        assert_eq!(deltas.gross_salary(), 44_000.0);
    }

    #[test]
    fn plateaus_at_the_ceiling() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        let rules = [compound_plateau(0.1, 80_000.0)];

        let mut funds = FundsState::new(0.0, 0.0, 1999);
        let mut deltas = DeltasState::from_year(1999).with_gross_salary(40_000.0);
        for _ in 0..20 {
            let next = step_deltas(&mut ctx, &funds, &deltas, &rules).unwrap();
            funds = advance_funds(funds, &next).unwrap();
            deltas = next;
        }

        assert_eq!(deltas.gross_salary(), 80_000.0);
    }
}
