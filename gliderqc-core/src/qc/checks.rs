//! Stateless Per-Variable Check Functions
//!
//! Each check is a pure function over slices: it allocates a flag
//! vector sized to the primary variable, defaults every sample to
//! [`QcFlag::Good`](super::QcFlag), and overwrites failing indices with
//! the caller-supplied flag. Checks are independently invocable (no
//! required ordering) and tolerate NaN anywhere in their inputs: a NaN
//! is treated as already excluded, never a reason to panic or to flag a
//! *different* sample.

use alloc::vec;
use alloc::vec::Vec;

use crate::errors::{ProcessingError, ProcessingResult};

use super::QcFlag;

/// Flag every non-finite sample (NaN, ±Inf)
pub fn check_finite(data: &[f64], flag: QcFlag) -> Vec<QcFlag> {
    data.iter()
        .map(|v| if v.is_finite() { QcFlag::Good } else { flag })
        .collect()
}

/// Flag timestamps outside the plausible `[min, max]` range
///
/// Boundary values are valid. NaN timestamps fail (they are certainly
/// not plausible dates).
pub fn check_valid_date(times: &[f64], range: (f64, f64), flag: QcFlag) -> Vec<QcFlag> {
    let (min, max) = range;
    times
        .iter()
        .map(|t| {
            if *t >= min && *t <= max {
                QcFlag::Good
            } else {
                flag
            }
        })
        .collect()
}

/// Flag impossible positions: |lat| > 90 or |lon| > 180
///
/// The poles and the antimeridian are valid positions; only strictly
/// out-of-range values fail. A failing sample applies to the pair, so
/// the caller flags latitude and longitude together. NaN positions pass
/// through as Good here; the finite check owns missing-value flagging.
pub fn check_valid_location(
    latitude: &[f64],
    longitude: &[f64],
    flag: QcFlag,
) -> ProcessingResult<Vec<QcFlag>> {
    if latitude.len() != longitude.len() {
        return Err(ProcessingError::LengthMismatch {
            expected: latitude.len(),
            actual: longitude.len(),
        });
    }
    Ok(latitude
        .iter()
        .zip(longitude)
        .map(|(lat, lon)| {
            let lat_bad = lat.is_finite() && libm::fabs(*lat) > 90.0;
            let lon_bad = lon.is_finite() && libm::fabs(*lon) > 180.0;
            if lat_bad || lon_bad {
                flag
            } else {
                QcFlag::Good
            }
        })
        .collect())
}

/// One depth interval with its own validity range
///
/// Depth matching is closed-open: a sample belongs to the band when
/// `depth_min <= depth < depth_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthBand {
    /// Inclusive top of the band (m)
    pub depth_min: f64,
    /// Exclusive bottom of the band (m)
    pub depth_max: f64,
    /// Minimum valid value within the band
    pub min: f64,
    /// Maximum valid value within the band
    pub max: f64,
}

/// Valid-range thresholds: one global range or per-depth bands
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeSpec {
    /// One `[min, max]` for the whole cast
    Flat {
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },
    /// Different `[min, max]` per depth interval
    DepthBanded {
        /// The bands, matched first-wins
        bands: Vec<DepthBand>,
    },
}

/// Flag samples outside their validity range
///
/// The depth-banded variant requires a depth series of matching length;
/// samples whose depth falls in no band (or is NaN) are left Good:
/// unchecked is not failed. NaN data samples are left Good as well.
pub fn check_valid_range(
    data: &[f64],
    depth: Option<&[f64]>,
    spec: &RangeSpec,
    flag: QcFlag,
) -> ProcessingResult<Vec<QcFlag>> {
    match spec {
        RangeSpec::Flat { min, max } => Ok(data
            .iter()
            .map(|v| {
                if v.is_finite() && (*v < *min || *v > *max) {
                    flag
                } else {
                    QcFlag::Good
                }
            })
            .collect()),
        RangeSpec::DepthBanded { bands } => {
            let depth = depth.ok_or(ProcessingError::InvalidConfig(
                "depth-banded range check requires a depth series",
            ))?;
            if depth.len() != data.len() {
                return Err(ProcessingError::LengthMismatch {
                    expected: data.len(),
                    actual: depth.len(),
                });
            }
            Ok(data
                .iter()
                .zip(depth)
                .map(|(v, z)| {
                    if !v.is_finite() || !z.is_finite() {
                        return QcFlag::Good;
                    }
                    let band = bands
                        .iter()
                        .find(|b| *z >= b.depth_min && *z < b.depth_max);
                    match band {
                        Some(b) if *v < b.min || *v > b.max => flag,
                        _ => QcFlag::Good,
                    }
                })
                .collect())
        }
    }
}

/// Spike thresholds: one limit, or two regimes split by a divider
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpikeSpec {
    /// One threshold for the whole cast
    Single {
        /// Spike test limit
        threshold: f64,
    },
    /// Separate thresholds where a secondary depth-like signal is below
    /// or above `divider`
    TwoRegime {
        /// Regime boundary on the secondary signal
        divider: f64,
        /// Threshold where the signal is below the divider
        shallow_threshold: f64,
        /// Threshold where the signal is at or beyond the divider
        deep_threshold: f64,
    },
}

/// Flag local double-difference outliers.
///
/// For each interior sample the test value is
/// `|v - (prev + next)/2| - |(next - prev)/2|`: the excursion from the
/// local trend with the local gradient discounted. Endpoints cannot
/// spike. NaN neighbors make the test value NaN, which fails no
/// comparison, so samples adjacent to gaps are left Good.
pub fn check_spike(
    data: &[f64],
    divider_signal: Option<&[f64]>,
    spec: &SpikeSpec,
    flag: QcFlag,
) -> ProcessingResult<Vec<QcFlag>> {
    if let (SpikeSpec::TwoRegime { .. }, None) = (spec, divider_signal) {
        return Err(ProcessingError::InvalidConfig(
            "two-regime spike check requires a divider signal",
        ));
    }
    if let Some(signal) = divider_signal {
        if signal.len() != data.len() {
            return Err(ProcessingError::LengthMismatch {
                expected: data.len(),
                actual: signal.len(),
            });
        }
    }

    let mut flags = vec![QcFlag::Good; data.len()];
    if data.len() < 3 {
        return Ok(flags);
    }
    for i in 1..data.len() - 1 {
        let test_value =
            libm::fabs(data[i] - 0.5 * (data[i - 1] + data[i + 1]))
                - libm::fabs(0.5 * (data[i + 1] - data[i - 1]));
        let threshold = match *spec {
            SpikeSpec::Single { threshold } => threshold,
            SpikeSpec::TwoRegime {
                divider,
                shallow_threshold,
                deep_threshold,
            } => {
                // Unwrap is safe: arity was checked above
                let z = divider_signal.unwrap()[i];
                if z < divider {
                    shallow_threshold
                } else {
                    deep_threshold
                }
            }
        };
        if test_value > threshold {
            flags[i] = flag;
        }
    }
    Ok(flags)
}

/// Gradient/flatline detector parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientSpec {
    /// Depth from which the scan starts (m)
    pub start_depth: f64,
    /// 3-point curvature threshold that triggers a run
    pub gradient_threshold: f64,
    /// Run ends when |value - pre-step value| settles below this
    pub settle_tolerance: f64,
}

/// Flag stuck-after-step runs in depth order.
///
/// The cast is scanned in order of increasing depth from `start_depth`
/// onward. A 3-point curvature above `gradient_threshold` marks a step
/// change; the sample and the contiguous run after it stay flagged
/// until the running difference from the pre-step value settles back
/// below `settle_tolerance`, the signature of a sensor stuck after a
/// step. NaN samples are skipped in the scan and never flagged.
pub fn check_gradient_flatline(
    data: &[f64],
    depth: &[f64],
    spec: &GradientSpec,
    flag: QcFlag,
) -> ProcessingResult<Vec<QcFlag>> {
    if depth.len() != data.len() {
        return Err(ProcessingError::LengthMismatch {
            expected: data.len(),
            actual: depth.len(),
        });
    }

    let mut flags = vec![QcFlag::Good; data.len()];

    // Depth-sorted view of the usable samples
    let mut order: Vec<usize> = (0..data.len())
        .filter(|&i| data[i].is_finite() && depth[i].is_finite())
        .collect();
    order.sort_by(|&i, &j| {
        depth[i]
            .partial_cmp(&depth[j])
            .unwrap_or(core::cmp::Ordering::Equal)
    });

    // `last_good` is the most recent unflagged sample; using it as the
    // left neighbor keeps a flagged run from re-triggering on its own
    // recovery edge.
    let mut last_good = order.first().copied();
    let mut k = 1;
    while k + 1 < order.len() {
        let cur = order[k];
        let next = order[k + 1];
        let prev = last_good.unwrap_or(cur);
        if depth[cur] < spec.start_depth {
            last_good = Some(cur);
            k += 1;
            continue;
        }
        let curvature = libm::fabs(data[cur] - 0.5 * (data[prev] + data[next]));
        if curvature > spec.gradient_threshold {
            // Step change: flag until the signal settles back toward
            // the pre-step value
            let reference = data[prev];
            let mut run = k;
            while run < order.len()
                && libm::fabs(data[order[run]] - reference) >= spec.settle_tolerance
            {
                flags[order[run]] = flag;
                run += 1;
            }
            if run == k {
                // Settled immediately: a sharp but recovering gradient,
                // not a stuck sensor
                last_good = Some(cur);
                k += 1;
            } else {
                k = run;
            }
        } else {
            last_good = Some(cur);
            k += 1;
        }
    }

    Ok(flags)
}
