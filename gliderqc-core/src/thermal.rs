//! Thermal-Lag Correction for Conductivity Cells
//!
//! ## The Problem
//!
//! The conductivity cell has thermal mass. Water inside the cell is not
//! at the temperature the (fast) thermistor reports outside it, so the
//! measured conductivity belongs to water at a slightly different
//! temperature than the measured temperature. Salinity computed from the
//! raw pair shows the familiar spikes at thermoclines, with opposite
//! sign on down-casts and up-casts.
//!
//! ## The Model
//!
//! Following Lueck & Picklo (1990) with the flow-speed dependence of
//! Morison et al. (1994), the temperature error inside the cell obeys a
//! first-order recursion driven by the temperature differences between
//! consecutive samples:
//!
//! ```text
//! alpha = alpha_offset + alpha_slope / flow
//! tau   = tau_offset + tau_slope / sqrt(flow)
//! a     = 4·f·alpha·tau / (1 + 4·f·tau)        (f = 1/Δt per interval)
//! b     = 1 − 2·a/alpha
//! temp_err[i+1] = −b[i]·temp_err[i] + a[i]·ΔT[i]
//! cond_err[i+1] = −b[i]·cond_err[i] + a[i]·(dC/dT)[i]·ΔT[i]
//! ```
//!
//! where `dC/dT ≈ 0.088 + 0.0006·T` is the sensitivity of conductivity
//! to temperature. The cell flow speed is derived from the glider's
//! surge speed: depth rate over `sin(pitch)`, scaled by a calibratable
//! polynomial factor.
//!
//! Both correction pairings are returned: conductivity referenced to the
//! water *outside* the cell (`cond + cond_err`) and temperature of the
//! water *inside* it (`temp − temp_err`). Choosing which pair feeds the
//! salinity computation is the caller's business, not this module's.
//!
//! ## Shape
//!
//! A strict left-to-right scan; the only state is the two error
//! accumulators, both starting at zero. O(n), deterministic, pure.

use alloc::vec::Vec;

use crate::{
    constants::physics::{
        COND_TEMP_SENS_OFFSET, COND_TEMP_SENS_SLOPE, DEFAULT_PITCH_RAD, FLOW_SPEED_FLOOR,
        TIME_DELTA_FLOOR,
    },
    errors::ProcessingResult,
    series::{Profile, ThermalLagParams},
};

/// Polynomial mapping surge speed to the cell-flow speed factor
///
/// Coefficients are ascending. The degree-1 default is the identity
/// factor (constant 1, zero slope): cell flow equals surge speed until a
/// deployment calibrates otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowPolynomial {
    /// Fixed factor independent of surge speed
    Constant(f64),
    /// `c0 + c1·u`
    Linear(f64, f64),
    /// `c0 + c1·u + c2·u²`
    Quadratic(f64, f64, f64),
}

impl Default for FlowPolynomial {
    fn default() -> Self {
        Self::Linear(1.0, 0.0)
    }
}

impl FlowPolynomial {
    /// Evaluate the factor at a surge speed
    pub fn eval(&self, surge: f64) -> f64 {
        match *self {
            Self::Constant(c0) => c0,
            Self::Linear(c0, c1) => c0 + c1 * surge,
            Self::Quadratic(c0, c1, c2) => c0 + surge * (c1 + c2 * surge),
        }
    }
}

/// Thermal-lag corrector options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalLagOptions {
    /// Surge-to-cell-flow factor polynomial
    pub flow_polynomial: FlowPolynomial,
}

/// Both corrected series produced by the thermal-lag model
///
/// Same length as the input cast. Callers pick one pairing:
/// `(conductivity_outside, raw temperature)` or
/// `(raw conductivity, temperature_inside)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalLagCorrection {
    /// Conductivity referenced to water outside the cell (S/m)
    pub conductivity_outside: Vec<f64>,
    /// Temperature of the water inside the cell (°C)
    pub temperature_inside: Vec<f64>,
}

/// Apply the recursive thermal-lag correction to one cast.
///
/// Casts of length ≤ 1 come back as unmodified copies. Zero time deltas
/// and vanishing flow speeds are floored, never propagated as `Inf`.
pub fn correct_thermal_lag(
    profile: &Profile,
    params: &ThermalLagParams,
    options: &ThermalLagOptions,
) -> ProcessingResult<ThermalLagCorrection> {
    let n = profile.len();
    if n <= 1 {
        return Ok(ThermalLagCorrection {
            conductivity_outside: profile.conductivity.clone(),
            temperature_inside: profile.temperature.clone(),
        });
    }

    let time = &profile.time;
    let depth = &profile.depth;
    let temp = &profile.temperature;
    let cond = &profile.conductivity;

    let mut cond_err = Vec::with_capacity(n);
    let mut temp_err = Vec::with_capacity(n);
    cond_err.push(0.0);
    temp_err.push(0.0);

    for i in 0..n - 1 {
        let dt = (time[i + 1] - time[i]).abs().max(TIME_DELTA_FLOOR);
        let freq = 1.0 / dt;
        let dtemp = temp[i + 1] - temp[i];

        let pitch = match &profile.pitch {
            Some(p) => p[i],
            None => DEFAULT_PITCH_RAD,
        };
        let sin_pitch = libm::sin(pitch);
        let depth_rate = (depth[i + 1] - depth[i]) / dt;
        let surge = if sin_pitch != 0.0 {
            depth_rate / sin_pitch
        } else {
            0.0
        };

        let factor = options.flow_polynomial.eval(surge);
        let flow = libm::fabs(factor * surge) + FLOW_SPEED_FLOOR;

        let alpha = params.alpha_offset + params.alpha_slope / flow;
        let tau = params.tau_offset + params.tau_slope / libm::sqrt(flow);

        let a = 4.0 * freq * alpha * tau / (1.0 + 4.0 * freq * tau);
        let b = 1.0 - 2.0 * a / alpha;
        let dcond_dtemp = COND_TEMP_SENS_OFFSET + COND_TEMP_SENS_SLOPE * temp[i];

        cond_err.push(-b * cond_err[i] + a * dcond_dtemp * dtemp);
        temp_err.push(-b * temp_err[i] + a * dtemp);
    }

    let conductivity_outside = cond.iter().zip(&cond_err).map(|(c, e)| c + e).collect();
    let temperature_inside = temp.iter().zip(&temp_err).map(|(t, e)| t - e).collect();

    Ok(ThermalLagCorrection {
        conductivity_outside,
        temperature_inside,
    })
}

/// Reference distortion used when validating the corrector.
///
/// The conductivity error term depends only on temperature, time, depth
/// and attitude, never on conductivity itself. Subtracting the error the
/// model would add therefore produces a cast whose correction recovers
/// the original conductivity exactly. Test helper; exposed to the
/// estimator tests as well.
#[cfg(test)]
pub(crate) fn distort_conductivity(
    profile: &Profile,
    params: &ThermalLagParams,
    options: &ThermalLagOptions,
) -> Profile {
    let corrected = correct_thermal_lag(profile, params, options).unwrap();
    let mut distorted = profile.clone();
    for (c, (out, raw)) in distorted
        .conductivity
        .iter_mut()
        .zip(corrected.conductivity_outside.iter().zip(&profile.conductivity))
    {
        // Remove the additive error the model reconstructs
        *c = raw - (out - raw);
    }
    distorted
}
