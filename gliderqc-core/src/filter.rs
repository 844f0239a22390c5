//! Zero-Phase Smoothing Filter
//!
//! First-order recursive low-pass run forward and then backward over the
//! signal. A single causal pass delays every feature by roughly the
//! filter time constant; the reversed second pass applies the same delay
//! in the opposite direction, cancelling the phase shift while squaring
//! the magnitude response.
//!
//! The coefficients come from the bilinear transform of `H(s) = 1/(1+τs)`:
//!
//! ```text
//! A = 1 / (1 + 2τ/Δt)
//! B = (1 − 2τ/Δt) · A
//! y[n] = A·(x[n] + x[n−1]) − B·y[n−1]
//! ```
//!
//! DC gain is exactly 1 (`2A − B = 1`), so a constant signal passes
//! through unchanged.

use alloc::vec::Vec;

/// Smooth a signal with a zero-phase first-order low-pass.
///
/// `time_constant` and `sampling_period` share the same time unit.
/// Signals of length ≤ 1 are returned unchanged. Purely deterministic,
/// no error conditions.
pub fn smooth(signal: &[f64], time_constant: f64, sampling_period: f64) -> Vec<f64> {
    if signal.len() <= 1 {
        return signal.to_vec();
    }

    let ratio = 2.0 * time_constant / sampling_period;
    let a = 1.0 / (1.0 + ratio);
    let b = (1.0 - ratio) * a;

    let mut forward = single_pass(signal, a, b);
    forward.reverse();
    let mut backward = single_pass(&forward, a, b);
    backward.reverse();
    backward
}

/// One causal pass of the recursion, seeded with the first sample
fn single_pass(signal: &[f64], a: f64, b: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(signal.len());
    out.push(signal[0]);
    for i in 1..signal.len() {
        let y = a * (signal[i] + signal[i - 1]) - b * out[i - 1];
        out.push(y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    #[test]
    fn constant_signal_unchanged() {
        let signal = vec![7.25; 64];
        let out = smooth(&signal, 3.0, 0.5);
        for (y, x) in out.iter().zip(&signal) {
            assert!((y - x).abs() < 1e-12, "DC gain must be exactly 1");
        }
    }

    #[test]
    fn short_signals_pass_through() {
        assert_eq!(smooth(&[], 2.0, 1.0), Vec::<f64>::new());
        assert_eq!(smooth(&[3.5], 2.0, 1.0), vec![3.5]);
    }

    #[test]
    fn preserves_length() {
        let signal: Vec<f64> = (0..37).map(|i| (i as f64 * 0.3).sin()).collect();
        assert_eq!(smooth(&signal, 4.0, 1.0).len(), signal.len());
    }

    #[test]
    fn attenuates_alternating_component() {
        // Nyquist-rate oscillation around a mean should shrink toward
        // the mean while the mean itself survives.
        let signal: Vec<f64> = (0..100)
            .map(|i| 10.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let out = smooth(&signal, 5.0, 1.0);
        let mid = &out[20..80];
        for y in mid {
            assert!((y - 10.0).abs() < 0.5);
        }
    }

    proptest! {
        #[test]
        fn dc_idempotence(level in -1e3f64..1e3, n in 2usize..128) {
            let signal = vec![level; n];
            let out = smooth(&signal, 2.0, 1.0);
            for y in out {
                prop_assert!((y - level).abs() < 1e-9);
            }
        }
    }
}
