//! Optimizer Bounds, Budgets and Tolerances
//!
//! Defaults for the profile-pair parameter estimation. All of these are
//! caller-overridable; they exist so a bare `Default` configuration
//! reproduces the published processing chain.

/// Lower bound shared by every estimated parameter.
///
/// Strictly positive so `1/flow` style terms inside the objective stay
/// finite for any trial vector the minimizer produces.
pub const PARAM_LOWER_BOUND: f64 = 1e-4;

/// Upper bound on the sensor time constant (s) for lead/lag estimation.
pub const TIME_CONSTANT_MAX: f64 = 16.0;

/// Default initial guess for the sensor time constant (s).
pub const TIME_CONSTANT_INITIAL: f64 = 0.5;

/// Upper bound on the thermal-lag alpha terms (dimensionless).
pub const ALPHA_MAX: f64 = 1.0;

/// Fraction of the shorter cast duration bounding `tau_offset`.
pub const TAU_OFFSET_DURATION_FRACTION: f64 = 0.5;

/// Fraction of the shorter cast duration bounding `tau_slope`.
pub const TAU_SLOPE_DURATION_FRACTION: f64 = 0.25;

/// Default iteration budget for the bounded minimizer.
pub const MAX_ITERATIONS: usize = 500;

/// Default convergence tolerance on the simplex value spread.
pub const TOLERANCE: f64 = 1e-8;

/// Default convergence tolerance on the simplex diameter.
///
/// A simplex straddling a minimum symmetrically can have a tiny value
/// spread while its best vertex is still far from the minimizer, so
/// convergence also requires the vertices themselves to collapse.
pub const PARAM_TOLERANCE: f64 = 1e-6;

/// Relative perturbation used to seed the initial simplex.
pub const SIMPLEX_SEED_SCALE: f64 = 0.05;

/// Absolute perturbation for zero-valued initial parameters.
pub const SIMPLEX_SEED_ZERO: f64 = 2.5e-4;
