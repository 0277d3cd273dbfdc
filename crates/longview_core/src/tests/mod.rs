//! Integration tests for the projection and solving engine.
//!
//! Tests are organized by topic:
//! - `single_run` - known-good trajectory arithmetic for a single earner
//! - `invariants` - accumulation invariants across whole runs
//! - `couple_run` - dual-income runs with independent retirements
//! - `end_to_end` - full solves against a terminal savings target

mod end_to_end;

use crate::sim::PersonParams;

pub(crate) fn person(
    name: &str,
    year_of_birth: i32,
    retirement_age: i32,
    age_at_death: i32,
    initial_salary: f64,
    initial_deferred: f64,
    initial_exempt: f64,
) -> PersonParams {
    PersonParams {
        name: name.to_owned(),
        year_of_birth,
        retirement_age,
        age_at_death,
        initial_salary,
        initial_deferred,
        initial_exempt,
    }
}
