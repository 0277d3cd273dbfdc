//! Rule functions: the ordered building blocks of a yearly update.
//!
//! A rule maps (accumulator, previous balances, previous deltas) to an
//! updated accumulator. "Natural" rules encode taxation, refunds and
//! interest; the remaining modules hold swappable policy families for salary
//! growth, spending and the account split.
//!
//! Rules additionally receive a [`RuleCtx`]: the explicit evaluation context
//! carrying the optimizer's current free-scalar values and the per-run
//! infeasibility flag. Passing the context by reference keeps rules
//! independently testable and makes the outer solver's non-reentrancy
//! explicit; nothing here is thread-safe, by design.

pub mod couple_savings;
pub mod couple_spending;
pub mod natural;
pub mod salary;
pub mod savings;
pub mod spending;

use rustc_hash::FxHashMap;

use crate::error::ModelError;
use crate::model::{CoupleDeltasState, CoupleFundsState, DeltasState, FundsState};

/// A single-earner rule. Part of a fold: it receives the accumulator
/// produced by the previous rule and returns a new one.
pub type Rule = Box<
    dyn Fn(
        &mut RuleCtx<'_>,
        DeltasState,
        &FundsState,
        &DeltasState,
    ) -> Result<DeltasState, ModelError>,
>;

/// A couple rule, operating on the paired records plus household spending.
pub type CoupleRule = Box<
    dyn Fn(
        &mut RuleCtx<'_>,
        CoupleDeltasState,
        &CoupleFundsState,
        &CoupleDeltasState,
    ) -> Result<CoupleDeltasState, ModelError>,
>;

/// Named free-scalar values, set once per outer-search evaluation and read
/// by policy rules during that evaluation only.
#[derive(Debug, Clone, Default)]
pub struct ParamVector {
    values: FxHashMap<String, f64>,
}

impl ParamVector {
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-run evaluation context handed to every rule.
#[derive(Debug)]
pub struct RuleCtx<'a> {
    params: &'a ParamVector,
    infeasible: Option<String>,
}

impl<'a> RuleCtx<'a> {
    #[must_use]
    pub fn new(params: &'a ParamVector) -> Self {
        Self {
            params,
            infeasible: None,
        }
    }

    /// Looks up a registered free scalar by name.
    pub fn param(&self, name: &str) -> Result<f64, ModelError> {
        self.params
            .get(name)
            .ok_or_else(|| ModelError::UnknownParameter(name.to_owned()))
    }

    /// Marks the current run as infeasible. Never an error: the outer
    /// solver consumes the flag as a fitness penalty and routes around the
    /// region. Only the first reason is kept.
    pub fn flag_infeasible(&mut self, reason: impl Into<String>) {
        if self.infeasible.is_none() {
            self.infeasible = Some(reason.into());
        }
    }

    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.infeasible.is_none()
    }

    #[must_use]
    pub fn infeasible_reason(&self) -> Option<&str> {
        self.infeasible.as_deref()
    }
}

/// A scalar a policy rule consumes: either fixed up front, or the current
/// value of a scalar registered with the optimizing solver.
#[derive(Debug, Clone)]
pub enum ParamRef {
    Fixed(f64),
    Named(String),
}

impl ParamRef {
    pub fn value(&self, ctx: &RuleCtx<'_>) -> Result<f64, ModelError> {
        match self {
            ParamRef::Fixed(v) => Ok(*v),
            ParamRef::Named(name) => ctx.param(name),
        }
    }
}

impl From<f64> for ParamRef {
    fn from(value: f64) -> Self {
        ParamRef::Fixed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_lookup_and_missing() {
        let mut params = ParamVector::default();
        params.set("weight", 0.25);
        let ctx = RuleCtx::new(&params);
        assert_eq!(ctx.param("weight").unwrap(), 0.25);
        assert!(matches!(
            ctx.param("absent"),
            Err(ModelError::UnknownParameter(_))
        ));
    }

    #[test]
    fn first_infeasibility_reason_wins() {
        let params = ParamVector::default();
        let mut ctx = RuleCtx::new(&params);
        assert!(ctx.is_feasible());
        ctx.flag_infeasible("account overdrawn");
        ctx.flag_infeasible("later reason");
        assert!(!ctx.is_feasible());
        assert_eq!(ctx.infeasible_reason(), Some("account overdrawn"));
    }

    #[test]
    fn param_ref_resolves_fixed_and_named() {
        let mut params = ParamVector::default();
        params.set("split", 0.6);
        let ctx = RuleCtx::new(&params);
        assert_eq!(ParamRef::Fixed(0.3).value(&ctx).unwrap(), 0.3);
        assert_eq!(
            ParamRef::Named("split".into()).value(&ctx).unwrap(),
            0.6
        );
    }
}
