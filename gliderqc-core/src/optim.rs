//! Bounded Derivative-Free Minimization
//!
//! ## Overview
//!
//! The parameter estimator needs a box-constrained nonlinear minimizer
//! but should not care which one. [`Minimizer`] is the seam: any
//! algorithm that can take an objective, box bounds and an initial point
//! and either return a [`Minimum`] or a typed non-convergence error can
//! be swapped in without touching the corrector or estimator contracts.
//!
//! The shipped implementation is Nelder-Mead with bound clamping. The
//! mismatch-area objectives are cheap, low-dimensional (1 or 4
//! parameters) and noisy-gradient-free, which is exactly the regime
//! where a simplex search earns its keep.
//!
//! ## Convergence and Failure
//!
//! Convergence requires two things within the iteration budget: the
//! spread of objective values across the simplex below `tolerance`,
//! and the simplex diameter below `param_tolerance`. The value spread
//! alone is not enough: a simplex straddling the minimum symmetrically
//! sees nearly equal values at vertices that are all far from the
//! minimizer. Anything else is `ProcessingError::NoConvergence`
//! carrying the best value reached, never a silent return of the
//! initial guess.

use alloc::vec::Vec;

use crate::{
    constants::estimation::{
        MAX_ITERATIONS, PARAM_TOLERANCE, SIMPLEX_SEED_SCALE, SIMPLEX_SEED_ZERO, TOLERANCE,
    },
    errors::{ProcessingError, ProcessingResult},
};

/// Box constraints, one `[lower, upper]` pair per parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    /// Per-parameter lower bounds
    pub lower: Vec<f64>,
    /// Per-parameter upper bounds
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Build bounds, rejecting inverted or mismatched pairs
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> ProcessingResult<Self> {
        if lower.len() != upper.len() {
            return Err(ProcessingError::LengthMismatch {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        if lower.iter().zip(&upper).any(|(lo, hi)| lo > hi) {
            return Err(ProcessingError::InvalidConfig(
                "lower bound exceeds upper bound",
            ));
        }
        Ok(Self { lower, upper })
    }

    /// Clamp a point into the box, component-wise
    pub fn clamp(&self, point: &mut [f64]) {
        for ((p, lo), hi) in point.iter_mut().zip(&self.lower).zip(&self.upper) {
            if *p < *lo {
                *p = *lo;
            } else if *p > *hi {
                *p = *hi;
            }
        }
    }
}

/// Iteration budget and convergence tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimOptions {
    /// Maximum simplex iterations before reporting non-convergence
    pub max_iterations: usize,
    /// Convergence threshold on the simplex value spread
    pub tolerance: f64,
    /// Convergence threshold on the simplex diameter
    pub param_tolerance: f64,
}

impl Default for OptimOptions {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
            param_tolerance: PARAM_TOLERANCE,
        }
    }
}

/// A successful minimization
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Minimizing parameter vector
    pub params: Vec<f64>,
    /// Objective value at `params`
    pub value: f64,
    /// Iterations spent
    pub iterations: usize,
}

/// Swappable bounded minimizer interface
pub trait Minimizer {
    /// Minimize `objective` over the box `bounds` starting at `initial`.
    ///
    /// Must fail with [`ProcessingError::NoConvergence`] when the budget
    /// runs out, never silently return the initial point.
    fn minimize<F>(&self, objective: F, bounds: &Bounds, initial: &[f64]) -> ProcessingResult<Minimum>
    where
        F: Fn(&[f64]) -> f64;
}

/// Nelder-Mead simplex search with bound clamping
#[derive(Debug, Clone, Copy, Default)]
pub struct NelderMead {
    /// Budget and tolerance
    pub options: OptimOptions,
}

impl NelderMead {
    /// Construct with explicit options
    pub fn new(options: OptimOptions) -> Self {
        Self { options }
    }
}

// Standard simplex coefficients
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Largest coordinate distance from the first vertex to any other
fn simplex_diameter(simplex: &[Vec<f64>]) -> f64 {
    let mut diameter = 0.0f64;
    for vertex in &simplex[1..] {
        for (v, first) in vertex.iter().zip(&simplex[0]) {
            let d = libm::fabs(v - first);
            if d > diameter {
                diameter = d;
            }
        }
    }
    diameter
}

/// Order NaN objective values after everything finite
fn worse(a: f64, b: f64) -> bool {
    match (a.is_nan(), b.is_nan()) {
        (true, false) => true,
        (false, true) => false,
        _ => a > b,
    }
}

impl Minimizer for NelderMead {
    fn minimize<F>(&self, objective: F, bounds: &Bounds, initial: &[f64]) -> ProcessingResult<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let dim = initial.len();
        if dim == 0 {
            return Err(ProcessingError::EmptyInput {
                what: "initial parameter vector",
            });
        }
        if bounds.lower.len() != dim {
            return Err(ProcessingError::LengthMismatch {
                expected: dim,
                actual: bounds.lower.len(),
            });
        }

        // Seed simplex: initial point plus one perturbed vertex per axis
        let mut start = initial.to_vec();
        bounds.clamp(&mut start);
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
        simplex.push(start.clone());
        for d in 0..dim {
            let mut vertex = start.clone();
            let step = if vertex[d] != 0.0 {
                vertex[d] * SIMPLEX_SEED_SCALE
            } else {
                SIMPLEX_SEED_ZERO
            };
            vertex[d] += step;
            bounds.clamp(&mut vertex);
            // Clamping may collapse the vertex onto the start; push inward
            if vertex[d] == start[d] {
                vertex[d] -= step;
                bounds.clamp(&mut vertex);
            }
            simplex.push(vertex);
        }

        let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

        for iteration in 0..self.options.max_iterations {
            // Sort vertices best-first
            let mut order: Vec<usize> = (0..simplex.len()).collect();
            order.sort_by(|&i, &j| {
                if worse(values[i], values[j]) {
                    core::cmp::Ordering::Greater
                } else if worse(values[j], values[i]) {
                    core::cmp::Ordering::Less
                } else {
                    core::cmp::Ordering::Equal
                }
            });
            let simplex_sorted: Vec<Vec<f64>> = order.iter().map(|&i| simplex[i].clone()).collect();
            let values_sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
            simplex = simplex_sorted;
            values = values_sorted;

            // Converged only once values agree AND the vertices have
            // collapsed onto each other; a symmetric straddle of the
            // minimum passes the first test long before the second.
            let spread = values[dim] - values[0];
            let diameter = simplex_diameter(&simplex);
            if libm::fabs(spread) < self.options.tolerance && diameter < self.options.param_tolerance {
                return Ok(Minimum {
                    params: simplex[0].clone(),
                    value: values[0],
                    iterations: iteration,
                });
            }

            // Centroid of all but the worst vertex
            let mut centroid = alloc::vec![0.0; dim];
            for vertex in simplex.iter().take(dim) {
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v / dim as f64;
                }
            }

            let worst = simplex[dim].clone();
            let trial = |coeff: f64| -> Vec<f64> {
                let mut point: Vec<f64> = centroid
                    .iter()
                    .zip(&worst)
                    .map(|(c, w)| c + coeff * (c - w))
                    .collect();
                bounds.clamp(&mut point);
                point
            };

            let reflected = trial(REFLECT);
            let reflected_value = objective(&reflected);

            if !worse(reflected_value, values[0]) {
                // Better than the best: try to expand
                let expanded = trial(EXPAND);
                let expanded_value = objective(&expanded);
                if worse(reflected_value, expanded_value) {
                    simplex[dim] = expanded;
                    values[dim] = expanded_value;
                } else {
                    simplex[dim] = reflected;
                    values[dim] = reflected_value;
                }
            } else if !worse(reflected_value, values[dim - 1]) {
                // Better than the second-worst: accept
                simplex[dim] = reflected;
                values[dim] = reflected_value;
            } else {
                // Contract toward the centroid
                let contracted = trial(-CONTRACT);
                let contracted_value = objective(&contracted);
                if !worse(contracted_value, values[dim]) {
                    simplex[dim] = contracted;
                    values[dim] = contracted_value;
                } else {
                    // Shrink everything toward the best vertex
                    let best = simplex[0].clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        for (v, b) in vertex.iter_mut().zip(&best) {
                            *v = b + SHRINK * (*v - b);
                        }
                        bounds.clamp(vertex);
                    }
                    for (value, vertex) in values.iter_mut().zip(&simplex).skip(1) {
                        *value = objective(vertex);
                    }
                }
            }
        }

        let best = values
            .iter()
            .cloned()
            .fold(f64::INFINITY, |acc, v| if worse(acc, v) { v } else { acc });
        Err(ProcessingError::NoConvergence {
            iterations: self.options.max_iterations,
            best_value: best,
        })
    }
}
