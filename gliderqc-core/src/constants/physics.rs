//! Sensor and Seawater Physics Constants
//!
//! Reference coefficients for the thermal-lag model and the fixed
//! fallbacks used when a profile omits attitude data.

// ===== THERMAL-LAG REFERENCE COEFFICIENTS (Morison et al. 1994) =====

/// Error-magnitude offset term of the thermal-lag model (dimensionless).
///
/// `alpha = ALPHA_OFFSET + ALPHA_SLOPE / flow_speed`
pub const MORISON_ALPHA_OFFSET: f64 = 0.0135;

/// Error-magnitude flow-speed term of the thermal-lag model (m/s).
pub const MORISON_ALPHA_SLOPE: f64 = 0.0264;

/// Error time-constant offset term (s).
///
/// `tau = TAU_OFFSET + TAU_SLOPE / sqrt(flow_speed)`
pub const MORISON_TAU_OFFSET: f64 = 7.1499;

/// Error time-constant flow-speed term (s·(m/s)^1/2).
pub const MORISON_TAU_SLOPE: f64 = 2.7858;

// ===== CONDUCTIVITY SENSITIVITY TO TEMPERATURE =====

/// Constant term of dC/dT (S/m per °C).
///
/// Linearization of the seawater conductivity ratio: at typical shelf
/// salinities, `dC/dT ≈ 0.088 + 0.0006 · T` with T in °C.
pub const COND_TEMP_SENS_OFFSET: f64 = 0.088;

/// Temperature-dependent term of dC/dT (S/m per °C²).
pub const COND_TEMP_SENS_SLOPE: f64 = 0.0006;

// ===== GLIDER ATTITUDE =====

/// Default glider pitch in radians (~26°).
///
/// Shallow-water gliders fly a nearly constant pitch when no attitude
/// series is recorded; the surge-speed derivation falls back to this.
pub const DEFAULT_PITCH_RAD: f64 = 0.4538;

// ===== NUMERICAL FLOORS =====

/// Floor applied to inter-sample time deltas (s).
///
/// Raw files occasionally repeat a timestamp; the sampling frequency
/// `1/Δt` must stay finite.
pub const TIME_DELTA_FLOOR: f64 = 1e-6;

/// Floor applied to the cell flow speed (m/s).
///
/// Keeps `alpha_slope / flow` and `tau_slope / sqrt(flow)` finite while
/// the glider hovers.
pub const FLOW_SPEED_FLOOR: f64 = 1e-6;

// ===== EARTH GEOMETRY =====

/// Mean Earth radius (m), used for great-circle distance between casts.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
