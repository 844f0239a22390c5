//! Sensor Time-Response (Lead/Lag) Corrector
//!
//! Slow sensors report a low-passed version of the water they fly
//! through. To first order the true signal can be recovered by adding
//! back the sensor's own derivative scaled by its time constant:
//!
//! ```text
//! corrected[i] = value[i] + τ · dvalue/dt[i]
//! ```
//!
//! The derivative is a forward difference with zero at index 0. Repeated
//! timestamps occur in raw glider files; a zero time delta is treated as
//! zero slope rather than letting `Inf`/`NaN` leak into the corrected
//! series.

use alloc::vec::Vec;

use crate::errors::{ProcessingError, ProcessingResult};

/// Advance a lagged signal using its derivative and a time constant.
///
/// `time_constant = 0` is the identity. Rejects mismatched slice
/// lengths; tolerates tied and out-of-order timestamps.
pub fn correct(values: &[f64], times: &[f64], time_constant: f64) -> ProcessingResult<Vec<f64>> {
    if values.len() != times.len() {
        return Err(ProcessingError::LengthMismatch {
            expected: values.len(),
            actual: times.len(),
        });
    }
    if time_constant == 0.0 || values.len() <= 1 {
        return Ok(values.to_vec());
    }

    let mut out = Vec::with_capacity(values.len());
    out.push(values[0]);
    for i in 1..values.len() {
        let dt = times[i] - times[i - 1];
        let slope = if dt != 0.0 {
            (values[i] - values[i - 1]) / dt
        } else {
            // Repeated timestamp: no usable slope at this sample
            0.0
        };
        out.push(values[i] + time_constant * slope);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    #[test]
    fn zero_time_constant_is_identity() {
        let values = vec![1.0, 4.0, 2.0, 8.0];
        let times = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(correct(&values, &times, 0.0).unwrap(), values);
    }

    #[test]
    fn advances_a_ramp() {
        // Slope 2 everywhere, so τ=1.5 shifts every sample but the
        // first by exactly 3.
        let times = vec![0.0, 1.0, 2.0, 3.0];
        let values = vec![0.0, 2.0, 4.0, 6.0];
        let out = correct(&values, &times, 1.5).unwrap();
        assert_eq!(out, vec![0.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn repeated_timestamp_yields_zero_slope() {
        let times = vec![0.0, 1.0, 1.0, 2.0];
        let values = vec![0.0, 2.0, 5.0, 6.0];
        let out = correct(&values, &times, 2.0).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
        // Tied timestamp: sample passes through uncorrected
        assert_eq!(out[2], 5.0);
    }

    #[test]
    fn rejects_length_skew() {
        let r = correct(&[1.0, 2.0], &[0.0], 1.0);
        assert!(matches!(r, Err(ProcessingError::LengthMismatch { .. })));
    }

    proptest! {
        #[test]
        fn zero_tau_identity_holds_for_any_input(
            values in proptest::collection::vec(-1e6f64..1e6, 0..64)
        ) {
            let times: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
            let out = correct(&values, &times, 0.0).unwrap();
            prop_assert_eq!(out, values);
        }
    }
}
