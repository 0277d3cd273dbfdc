//! Nelder-Mead simplex minimization.
//!
//! A derivative-free method that maintains a simplex of N+1 points in
//! N-dimensional space and iteratively transforms it toward the optimum. It
//! tolerates the staircase non-smoothness a bisection-based inner solve
//! introduces, which rules out gradient methods here. Bounds are not
//! enforced; the caller expresses them as penalties in the objective.

use tracing::debug;

/// Standard Nelder-Mead coefficients.
const REFLECTION_COEF: f64 = 1.0;
const EXPANSION_COEF: f64 = 2.0;
const CONTRACTION_COEF: f64 = 0.5;
const SHRINK_COEF: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Convergence threshold on the simplex size.
    pub tolerance: f64,
    /// Initial per-dimension perturbation, relative to each coordinate's
    /// magnitude (an absolute step is used for zero coordinates).
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            tolerance: 1e-4,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NelderMeadOutcome {
    pub best: Vec<f64>,
    pub objective: f64,
    pub converged: bool,
    pub iterations: usize,
}

#[derive(Clone)]
struct SimplexVertex {
    values: Vec<f64>,
    objective: f64,
}

/// Centroid of all points except the worst (last).
fn centroid(simplex: &[SimplexVertex]) -> Vec<f64> {
    let n = simplex[0].values.len();
    let mut center = vec![0.0; n];
    for vertex in simplex.iter().take(simplex.len() - 1) {
        for (i, value) in vertex.values.iter().enumerate() {
            center[i] += value;
        }
    }
    let count = (simplex.len() - 1) as f64;
    for value in &mut center {
        *value /= count;
    }
    center
}

/// Reflect a point through the centroid with the given coefficient.
fn reflect(point: &[f64], centroid: &[f64], coef: f64) -> Vec<f64> {
    point
        .iter()
        .zip(centroid.iter())
        .map(|(p, c)| c + coef * (c - p))
        .collect()
}

/// Simplex size: the largest distance from the centroid to a vertex.
fn simplex_size(simplex: &[SimplexVertex], centroid: &[f64]) -> f64 {
    simplex
        .iter()
        .map(|vertex| {
            vertex
                .values
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .fold(0.0_f64, f64::max)
}

fn sort_simplex(simplex: &mut [SimplexVertex]) {
    simplex.sort_by(|a, b| {
        a.objective
            .partial_cmp(&b.objective)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Minimizes `objective` starting from `initial`, propagating any error the
/// objective raises.
pub fn minimize<E>(
    mut objective: impl FnMut(&[f64]) -> Result<f64, E>,
    initial: &[f64],
    options: &NelderMeadOptions,
) -> Result<NelderMeadOutcome, E> {
    let n = initial.len();
    debug_assert!(n > 0, "minimize requires at least one dimension");

    // Initial simplex: the starting point plus one perturbed point per
    // dimension.
    let mut simplex = Vec::with_capacity(n + 1);
    let start = initial.to_vec();
    let start_objective = objective(&start)?;
    simplex.push(SimplexVertex {
        values: start,
        objective: start_objective,
    });
    for i in 0..n {
        let mut point = initial.to_vec();
        let step = if point[i] != 0.0 {
            options.initial_step * point[i].abs()
        } else {
            options.initial_step
        };
        point[i] += step;
        let value = objective(&point)?;
        simplex.push(SimplexVertex {
            values: point,
            objective: value,
        });
    }

    let mut iteration = 0;
    let mut converged = false;

    while iteration < options.max_iterations {
        iteration += 1;
        sort_simplex(&mut simplex);

        let cent = centroid(&simplex);
        let size = simplex_size(&simplex, &cent);
        debug!(iteration, size, best = simplex[0].objective, "simplex step");
        if size < options.tolerance {
            converged = true;
            break;
        }

        let best = simplex[0].objective;
        let second_worst = simplex[simplex.len() - 2].objective;
        let worst_idx = simplex.len() - 1;
        let worst = simplex[worst_idx].objective;
        let worst_values = simplex[worst_idx].values.clone();

        let reflected = reflect(&worst_values, &cent, REFLECTION_COEF);
        let reflected_objective = objective(&reflected)?;

        if reflected_objective < best {
            // Best so far; try stretching further in the same direction.
            let expanded = reflect(&worst_values, &cent, EXPANSION_COEF);
            let expanded_objective = objective(&expanded)?;
            if expanded_objective < reflected_objective {
                simplex[worst_idx] = SimplexVertex {
                    values: expanded,
                    objective: expanded_objective,
                };
            } else {
                simplex[worst_idx] = SimplexVertex {
                    values: reflected,
                    objective: reflected_objective,
                };
            }
        } else if reflected_objective < second_worst {
            simplex[worst_idx] = SimplexVertex {
                values: reflected,
                objective: reflected_objective,
            };
        } else {
            // Contract toward the better of the worst and reflected points.
            let contract_base = if reflected_objective < worst {
                &reflected
            } else {
                &worst_values
            };
            let contracted: Vec<f64> = cent
                .iter()
                .zip(contract_base.iter())
                .map(|(c, p)| c + CONTRACTION_COEF * (p - c))
                .collect();
            let contracted_objective = objective(&contracted)?;

            if contracted_objective < worst {
                simplex[worst_idx] = SimplexVertex {
                    values: contracted,
                    objective: contracted_objective,
                };
            } else {
                // Shrink everything toward the best point.
                let best_values = simplex[0].values.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let shrunk: Vec<f64> = best_values
                        .iter()
                        .zip(vertex.values.iter())
                        .map(|(b, v)| b + SHRINK_COEF * (v - b))
                        .collect();
                    let shrunk_objective = objective(&shrunk)?;
                    *vertex = SimplexVertex {
                        values: shrunk,
                        objective: shrunk_objective,
                    };
                }
            }
        }
    }

    sort_simplex(&mut simplex);
    let best = simplex.swap_remove(0);
    Ok(NelderMeadOutcome {
        best: best.values,
        objective: best.objective,
        converged,
        iterations: iteration,
    })
}
