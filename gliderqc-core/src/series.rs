//! Profile Data Model
//!
//! ## Overview
//!
//! Upstream loaders bundle the aligned per-sensor series for a single
//! vertical cast into a [`Profile`]. This core consumes profiles
//! read-only; corrections return fresh vectors and never mutate their
//! input.
//!
//! ## What Is and Is Not Guaranteed
//!
//! - Member series of a profile share one index space (equal length).
//!   This *is* validated at construction, because every downstream kernel
//!   assumes it.
//! - Timestamps are *not* guaranteed strictly increasing. Raw glider
//!   files contain tied and occasionally out-of-order records; the
//!   numeric kernels guard the resulting zero/negative deltas instead of
//!   rejecting the cast.
//! - Values are *not* guaranteed finite. NaN is the in-band missing-value
//!   marker throughout the crate.

use alloc::vec::Vec;

use crate::{
    constants::physics::{
        MORISON_ALPHA_OFFSET, MORISON_ALPHA_SLOPE, MORISON_TAU_OFFSET, MORISON_TAU_SLOPE,
    },
    errors::{ProcessingError, ProcessingResult},
};

/// Aligned sensor bundle for one vertical cast
///
/// All member series share a common index space. Optional members are
/// either absent or full-length; partial series are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Sample times in seconds
    pub time: Vec<f64>,
    /// Depth (or pressure-derived depth) in meters, positive down
    pub depth: Vec<f64>,
    /// In-situ temperature in °C
    pub temperature: Vec<f64>,
    /// Conductivity in S/m
    pub conductivity: Vec<f64>,
    /// Vehicle pitch in radians, if recorded
    pub pitch: Option<Vec<f64>>,
    /// Latitude in degrees north, if recorded
    pub latitude: Option<Vec<f64>>,
    /// Longitude in degrees east, if recorded
    pub longitude: Option<Vec<f64>>,
}

impl Profile {
    /// Build a profile from mandatory CTD series, rejecting length skew
    pub fn new(
        time: Vec<f64>,
        depth: Vec<f64>,
        temperature: Vec<f64>,
        conductivity: Vec<f64>,
    ) -> ProcessingResult<Self> {
        let n = time.len();
        for len in [depth.len(), temperature.len(), conductivity.len()] {
            if len != n {
                return Err(ProcessingError::LengthMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }
        Ok(Self {
            time,
            depth,
            temperature,
            conductivity,
            pitch: None,
            latitude: None,
            longitude: None,
        })
    }

    /// Attach a pitch series (radians), which must match the cast length
    pub fn with_pitch(mut self, pitch: Vec<f64>) -> ProcessingResult<Self> {
        if pitch.len() != self.time.len() {
            return Err(ProcessingError::LengthMismatch {
                expected: self.time.len(),
                actual: pitch.len(),
            });
        }
        self.pitch = Some(pitch);
        Ok(self)
    }

    /// Attach position series (degrees), which must match the cast length
    pub fn with_position(
        mut self,
        latitude: Vec<f64>,
        longitude: Vec<f64>,
    ) -> ProcessingResult<Self> {
        for len in [latitude.len(), longitude.len()] {
            if len != self.time.len() {
                return Err(ProcessingError::LengthMismatch {
                    expected: self.time.len(),
                    actual: len,
                });
            }
        }
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        Ok(self)
    }

    /// Number of samples in the cast
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the cast holds no samples
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Cast duration in seconds (0 for casts shorter than 2 samples)
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) if self.time.len() > 1 => last - first,
            _ => 0.0,
        }
    }
}

/// Thermal-lag model coefficients
///
/// `alpha = alpha_offset + alpha_slope / flow_speed` is the error
/// magnitude, `tau = tau_offset + tau_slope / sqrt(flow_speed)` the error
/// time constant, both per sampling interval. Immutable once estimated:
/// the corrector consumes these by shared reference and never writes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalLagParams {
    /// Error-magnitude offset (dimensionless)
    pub alpha_offset: f64,
    /// Error-magnitude flow term (m/s)
    pub alpha_slope: f64,
    /// Time-constant offset (s)
    pub tau_offset: f64,
    /// Time-constant flow term (s·(m/s)^1/2)
    pub tau_slope: f64,
}

impl Default for ThermalLagParams {
    /// Morison et al. (1994) reference coefficients
    fn default() -> Self {
        Self {
            alpha_offset: MORISON_ALPHA_OFFSET,
            alpha_slope: MORISON_ALPHA_SLOPE,
            tau_offset: MORISON_TAU_OFFSET,
            tau_slope: MORISON_TAU_SLOPE,
        }
    }
}

impl ThermalLagParams {
    /// View the coefficients as an ordered slice for the optimizer
    pub fn to_array(self) -> [f64; 4] {
        [
            self.alpha_offset,
            self.alpha_slope,
            self.tau_offset,
            self.tau_slope,
        ]
    }

    /// Rebuild coefficients from the optimizer's parameter vector
    pub fn from_array(p: [f64; 4]) -> Self {
        Self {
            alpha_offset: p[0],
            alpha_slope: p[1],
            tau_offset: p[2],
            tau_slope: p[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn position_rejects_length_skew() {
        let p = Profile::new(
            vec![0.0, 1.0],
            vec![1.0, 2.0],
            vec![15.0, 14.0],
            vec![4.0, 4.0],
        )
        .unwrap();
        let r = p.with_position(vec![39.5, 39.5], vec![2.4]);
        assert!(matches!(
            r,
            Err(ProcessingError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn profile_rejects_short_member() {
        let r = Profile::new(
            vec![0.0, 1.0, 2.0],
            vec![1.0, 2.0, 3.0],
            vec![15.0, 14.0],
            vec![4.0, 4.0, 4.0],
        );
        assert!(r.is_err());
    }

    #[test]
    fn profile_duration() {
        let p = Profile::new(
            vec![10.0, 12.0, 15.0],
            vec![1.0, 2.0, 3.0],
            vec![15.0, 14.0, 13.0],
            vec![4.0, 4.0, 4.0],
        )
        .unwrap();
        assert_eq!(p.duration(), 5.0);

        let single = Profile::new(vec![10.0], vec![1.0], vec![15.0], vec![4.0]).unwrap();
        assert_eq!(single.duration(), 0.0);
    }

    #[test]
    fn default_params_are_morison() {
        let p = ThermalLagParams::default();
        assert_eq!(p.alpha_offset, 0.0135);
        assert_eq!(p.tau_offset, 7.1499);
    }

    #[test]
    fn params_array_round_trip() {
        let p = ThermalLagParams::default();
        assert_eq!(ThermalLagParams::from_array(p.to_array()), p);
    }
}
