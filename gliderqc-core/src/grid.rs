//! Profile Gridding onto a Common Depth Axis
//!
//! ## Overview
//!
//! Corrected, flagged casts arrive with irregular depth sampling. The
//! gridder resamples every cast onto one regular depth axis so that
//! casts become columns of a `(depth_bin, cast)` matrix, computes one
//! mean position/time per cast, and summarizes each depth bin across
//! casts with a NaN-aware mean and standard deviation.
//!
//! ## Interpolation
//!
//! Within a cast, variables are interpolated with a monotone piecewise
//! cubic (PCHIP, Fritsch-Carlson slope limiting): it reproduces the
//! values exactly at the knots and never overshoots between them, which
//! matters for water-mass properties: a linear ramp of salinity must
//! not grow oscillations from the resampling. Before interpolation each
//! cast's `(depth, value)` pairs are cleaned: NaN pairs dropped,
//! depth-sorted, duplicate depths collapsed keeping the first
//! occurrence.
//!
//! Casts with fewer than two usable pairs produce an all-NaN column,
//! never an error; a short cast is data, not a defect. Bins outside a
//! cast's depth span are NaN (no extrapolation).

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::{
    constants::physics::EARTH_RADIUS_M,
    errors::{ProcessingError, ProcessingResult},
};

/// One cast's data offered to the gridder, by name
#[derive(Debug, Default)]
pub struct CastTable<'a> {
    /// Sample times (s)
    pub time: &'a [f64],
    /// Depth (m)
    pub depth: &'a [f64],
    /// Latitude (degrees north)
    pub latitude: &'a [f64],
    /// Longitude (degrees east)
    pub longitude: &'a [f64],
    /// Scientific variables keyed by name
    pub variables: BTreeMap<&'a str, &'a [f64]>,
}

/// Gridder configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    /// Depth-bin spacing (m)
    pub resolution: f64,
    /// Names of the variables to grid
    pub variables: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            variables: Vec::new(),
        }
    }
}

/// One gridded variable: the `(depth_bin, cast)` matrix plus per-bin
/// summary statistics across casts
#[derive(Debug, Clone, PartialEq)]
pub struct GridVariable {
    /// Row-major matrix, `bins × casts`; index with
    /// `bin * casts + cast`
    pub values: Vec<f64>,
    /// NaN-aware per-bin mean across casts
    pub mean: Vec<f64>,
    /// NaN-aware per-bin standard deviation (n−1) across casts
    pub std: Vec<f64>,
}

impl GridVariable {
    /// Value at a `(bin, cast)` cell
    pub fn get(&self, bin: usize, cast: usize, casts: usize) -> f64 {
        self.values[bin * casts + cast]
    }
}

/// The gridded product: coordinate vectors plus per-variable matrices
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileGrid {
    /// Regular depth axis (m), strictly increasing, even spacing
    pub depth_bins: Vec<f64>,
    /// Per-cast mean time (s)
    pub cast_time: Vec<f64>,
    /// Per-cast mean latitude (degrees)
    pub cast_latitude: Vec<f64>,
    /// Per-cast mean longitude (degrees)
    pub cast_longitude: Vec<f64>,
    /// Cumulative along-track distance between cast positions (m)
    pub cast_distance: Vec<f64>,
    /// Gridded variables keyed by name
    pub variables: BTreeMap<String, GridVariable>,
}

/// Grid a collection of casts onto a shared depth axis.
///
/// The axis covers `[floor(min depth), ceil(max depth)]` over all casts
/// at `config.resolution`. Fails on an empty cast list, a non-positive
/// resolution, or a variable name missing from any cast; short casts
/// and NaN-riddled data are handled by NaN-filling, not errors.
pub fn grid_profiles(casts: &[CastTable<'_>], config: &GridConfig) -> ProcessingResult<ProfileGrid> {
    if casts.is_empty() {
        return Err(ProcessingError::EmptyInput {
            what: "cast collection",
        });
    }
    if !(config.resolution > 0.0) {
        return Err(ProcessingError::InvalidConfig(
            "depth resolution must be positive",
        ));
    }
    for cast in casts {
        for name in &config.variables {
            if !cast.variables.contains_key(name.as_str()) {
                return Err(ProcessingError::UnknownVariable { name: name.clone() });
            }
        }
    }

    let depth_bins = depth_axis(casts, config.resolution)?;
    let n_casts = casts.len();

    let cast_time: Vec<f64> = casts.iter().map(|c| nan_mean(c.time)).collect();
    let cast_latitude: Vec<f64> = casts.iter().map(|c| nan_mean(c.latitude)).collect();
    let cast_longitude: Vec<f64> = casts.iter().map(|c| nan_mean(c.longitude)).collect();
    let cast_distance = cumulative_distance(&cast_latitude, &cast_longitude);

    let mut variables = BTreeMap::new();
    for name in &config.variables {
        let mut values = vec![f64::NAN; depth_bins.len() * n_casts];
        for (cast_idx, cast) in casts.iter().enumerate() {
            let data = cast.variables[name.as_str()];
            let column = grid_cast(cast.depth, data, &depth_bins);
            for (bin, v) in column.into_iter().enumerate() {
                values[bin * n_casts + cast_idx] = v;
            }
        }

        let mut mean = Vec::with_capacity(depth_bins.len());
        let mut std = Vec::with_capacity(depth_bins.len());
        for bin in 0..depth_bins.len() {
            let row = &values[bin * n_casts..(bin + 1) * n_casts];
            mean.push(nan_mean(row));
            std.push(nan_std(row));
        }

        variables.insert(
            name.clone(),
            GridVariable { values, mean, std },
        );
    }

    log_debug!(
        "gridded {} casts onto {} depth bins",
        n_casts,
        depth_bins.len()
    );

    Ok(ProfileGrid {
        depth_bins,
        cast_time,
        cast_latitude,
        cast_longitude,
        cast_distance,
        variables,
    })
}

/// Regular depth axis covering every finite depth in the collection
fn depth_axis(casts: &[CastTable<'_>], resolution: f64) -> ProcessingResult<Vec<f64>> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for cast in casts {
        for z in cast.depth {
            if z.is_finite() {
                if *z < min {
                    min = *z;
                }
                if *z > max {
                    max = *z;
                }
            }
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return Err(ProcessingError::EmptyInput {
            what: "no finite depths in any cast",
        });
    }
    let start = libm::floor(min);
    let stop = libm::ceil(max);
    // Rounded, not truncated: float error in the quotient must not
    // drop the top bin for fine resolutions (e.g. 0.1 over an 11 m span)
    let count = libm::round((stop - start) / resolution) as usize + 1;
    Ok((0..count).map(|i| start + i as f64 * resolution).collect())
}

/// Resample one cast's (depth, value) pairs onto the axis
fn grid_cast(depth: &[f64], data: &[f64], depth_bins: &[f64]) -> Vec<f64> {
    let n = depth.len().min(data.len());
    // Clean: drop NaN pairs, depth-sort, collapse duplicate depths
    // keeping the first occurrence
    let mut pairs: Vec<(f64, f64)> = (0..n)
        .filter(|&i| depth[i].is_finite() && data[i].is_finite())
        .map(|i| (depth[i], data[i]))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal));
    pairs.dedup_by(|next, kept| next.0 == kept.0);

    if pairs.len() < 2 {
        return vec![f64::NAN; depth_bins.len()];
    }

    let x: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let y: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    pchip(&x, &y, depth_bins)
}

/// Monotone piecewise-cubic interpolation (Fritsch-Carlson).
///
/// `x` must be strictly increasing with `len >= 2`. Query points
/// outside `[x[0], x[n-1]]` return NaN. Exact at the knots.
fn pchip(x: &[f64], y: &[f64], query: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut h = Vec::with_capacity(n - 1);
    let mut secant = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let dx = x[i + 1] - x[i];
        h.push(dx);
        secant.push((y[i + 1] - y[i]) / dx);
    }

    // Knot slopes with Fritsch-Carlson limiting
    let mut slope = vec![0.0; n];
    if n == 2 {
        slope[0] = secant[0];
        slope[1] = secant[0];
    } else {
        for i in 1..n - 1 {
            if secant[i - 1] * secant[i] <= 0.0 {
                slope[i] = 0.0;
            } else {
                let w1 = 2.0 * h[i] + h[i - 1];
                let w2 = h[i] + 2.0 * h[i - 1];
                slope[i] = (w1 + w2) / (w1 / secant[i - 1] + w2 / secant[i]);
            }
        }
        slope[0] = edge_slope(h[0], h[1], secant[0], secant[1]);
        slope[n - 1] = edge_slope(h[n - 2], h[n - 3], secant[n - 2], secant[n - 3]);
    }

    query
        .iter()
        .map(|&q| {
            if !q.is_finite() || q < x[0] || q > x[n - 1] {
                return f64::NAN;
            }
            // Rightmost interval whose start is <= q
            let i = match x.binary_search_by(|v| v.partial_cmp(&q).unwrap()) {
                Ok(exact) => return y[exact],
                Err(0) => 0,
                Err(pos) => (pos - 1).min(n - 2),
            };
            let t = (q - x[i]) / h[i];
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            h00 * y[i] + h10 * h[i] * slope[i] + h01 * y[i + 1] + h11 * h[i] * slope[i + 1]
        })
        .collect()
}

/// One-sided three-point endpoint slope, shape-limited
fn edge_slope(h0: f64, h1: f64, s0: f64, s1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * s0 - h0 * s1) / (h0 + h1);
    if d * s0 <= 0.0 {
        0.0
    } else if s0 * s1 < 0.0 && libm::fabs(d) > 3.0 * libm::fabs(s0) {
        3.0 * s0
    } else {
        d
    }
}

/// Mean ignoring NaN; NaN when nothing is finite
fn nan_mean(data: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in data {
        if v.is_finite() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Sample standard deviation ignoring NaN; NaN below 2 finite samples
fn nan_std(data: &[f64]) -> f64 {
    let mean = nan_mean(data);
    if !mean.is_finite() {
        return f64::NAN;
    }
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for v in data {
        if v.is_finite() {
            let d = v - mean;
            sum_sq += d * d;
            count += 1;
        }
    }
    if count < 2 {
        f64::NAN
    } else {
        libm::sqrt(sum_sq / (count - 1) as f64)
    }
}

/// Cumulative great-circle distance along the cast positions
fn cumulative_distance(latitude: &[f64], longitude: &[f64]) -> Vec<f64> {
    let mut distance = Vec::with_capacity(latitude.len());
    let mut total = 0.0;
    for i in 0..latitude.len() {
        if i > 0 {
            let d = haversine(
                latitude[i - 1],
                longitude[i - 1],
                latitude[i],
                longitude[i],
            );
            if d.is_finite() {
                total += d;
            }
        }
        distance.push(total);
    }
    distance
}

fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let rad = core::f64::consts::PI / 180.0;
    let dlat = (lat2 - lat1) * rad;
    let dlon = (lon2 - lon1) * rad;
    let a = libm::sin(dlat / 2.0) * libm::sin(dlat / 2.0)
        + libm::cos(lat1 * rad) * libm::cos(lat2 * rad) * libm::sin(dlon / 2.0) * libm::sin(dlon / 2.0);
    2.0 * EARTH_RADIUS_M * libm::asin(libm::sqrt(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn table<'a>(
        time: &'a [f64],
        depth: &'a [f64],
        lat: &'a [f64],
        lon: &'a [f64],
        temp: &'a [f64],
    ) -> CastTable<'a> {
        let mut variables = BTreeMap::new();
        variables.insert("temperature", temp);
        CastTable {
            time,
            depth,
            latitude: lat,
            longitude: lon,
            variables,
        }
    }

    fn config() -> GridConfig {
        GridConfig {
            resolution: 1.0,
            variables: vec!["temperature".to_string()],
        }
    }

    #[test]
    fn knot_exactness() {
        // Depths coincide with grid bins: gridded values must be the
        // originals, bit for bit.
        let depth = [0.0, 1.0, 2.0, 3.0, 4.0];
        let temp = [20.0, 19.5, 18.0, 15.0, 14.8];
        let time = [0.0, 1.0, 2.0, 3.0, 4.0];
        let pos = [39.5; 5];
        let casts = [table(&time, &depth, &pos, &pos, &temp)];
        let grid = grid_profiles(&casts, &config()).unwrap();

        assert_eq!(grid.depth_bins, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let var = &grid.variables["temperature"];
        for (bin, expected) in temp.iter().enumerate() {
            assert_eq!(var.get(bin, 0, 1), *expected);
        }
    }

    #[test]
    fn single_point_cast_yields_nan_column() {
        let depth_a = [0.0, 1.0, 2.0];
        let temp_a = [20.0, 19.0, 18.0];
        let depth_b = [1.0, f64::NAN, f64::NAN];
        let temp_b = [19.5, 19.0, 18.5];
        let time = [0.0, 1.0, 2.0];
        let pos = [39.5; 3];
        let casts = [
            table(&time, &depth_a, &pos, &pos, &temp_a),
            table(&time, &depth_b, &pos, &pos, &temp_b),
        ];
        let grid = grid_profiles(&casts, &config()).unwrap();
        let var = &grid.variables["temperature"];
        for bin in 0..grid.depth_bins.len() {
            assert!(var.get(bin, 1, 2).is_nan());
        }
        // The usable cast still grids
        assert_eq!(var.get(0, 0, 2), 20.0);
    }

    #[test]
    fn summary_ignores_missing_columns() {
        let depth_a = [0.0, 1.0, 2.0];
        let temp_a = [20.0, 19.0, 18.0];
        let depth_b = [0.5, f64::NAN, f64::NAN]; // all-NaN column
        let temp_b = [20.0, 20.0, 20.0];
        let time = [0.0, 1.0, 2.0];
        let pos = [39.5; 3];
        let casts = [
            table(&time, &depth_a, &pos, &pos, &temp_a),
            table(&time, &depth_b, &pos, &pos, &temp_b),
        ];
        let grid = grid_profiles(&casts, &config()).unwrap();
        let var = &grid.variables["temperature"];
        // Mean at bin 0 comes from the one cast with data there
        assert_eq!(var.mean[0], 20.0);
        assert!(!var.mean[0].is_nan());
        // Std needs two casts; with one it is NaN by contract
        assert!(var.std[0].is_nan());
    }

    #[test]
    fn duplicate_depths_keep_first_occurrence() {
        let depth = [0.0, 1.0, 1.0, 2.0];
        let temp = [20.0, 19.0, 17.0, 18.0];
        let time = [0.0, 1.0, 2.0, 3.0];
        let pos = [39.5; 4];
        let casts = [table(&time, &depth, &pos, &pos, &temp)];
        let grid = grid_profiles(&casts, &config()).unwrap();
        let var = &grid.variables["temperature"];
        assert_eq!(var.get(1, 0, 1), 19.0, "first of the duplicate pair wins");
    }

    #[test]
    fn no_extrapolation_outside_the_cast() {
        let depth_a = [0.0, 10.0];
        let temp_a = [20.0, 10.0];
        let depth_b = [0.0, 5.0];
        let temp_b = [20.0, 15.0];
        let time = [0.0, 1.0];
        let pos = [39.5; 2];
        let casts = [
            table(&time, &depth_a, &pos, &pos, &temp_a),
            table(&time, &depth_b, &pos, &pos, &temp_b),
        ];
        let grid = grid_profiles(&casts, &config()).unwrap();
        let var = &grid.variables["temperature"];
        // Below 5 m the short cast has no data but the summary stays
        // finite from the long cast
        let bin_8 = 8;
        assert!(var.get(bin_8, 1, 2).is_nan());
        assert!(var.mean[bin_8].is_finite());
    }

    #[test]
    fn monotone_data_stays_monotone() {
        // PCHIP must not overshoot between knots
        let depth = [0.0, 1.0, 2.0, 5.0, 6.0];
        let temp = [20.0, 19.9, 14.0, 13.9, 13.8];
        let time = [0.0; 5];
        let pos = [39.5; 5];
        let casts = [table(&time, &depth, &pos, &pos, &temp)];
        let grid = grid_profiles(&casts, &config()).unwrap();
        let var = &grid.variables["temperature"];
        let column: Vec<f64> = (0..grid.depth_bins.len()).map(|b| var.get(b, 0, 1)).collect();
        for w in column.windows(2) {
            assert!(w[1] <= w[0] + 1e-12, "overshoot in {column:?}");
        }
    }

    #[test]
    fn fine_resolution_axis_reaches_the_ceiling() {
        // 0.1 m bins over an 11 m span: 11/0.1 is not exact in floats
        // and a truncated count would lose the 11.0 m bin.
        let depth = [0.0, 11.0];
        let temp = [20.0, 15.0];
        let time = [0.0, 1.0];
        let pos = [39.5; 2];
        let casts = [table(&time, &depth, &pos, &pos, &temp)];
        let config = GridConfig {
            resolution: 0.1,
            variables: vec!["temperature".to_string()],
        };
        let grid = grid_profiles(&casts, &config).unwrap();
        assert_eq!(grid.depth_bins.len(), 111);
        let last = *grid.depth_bins.last().unwrap();
        assert!((last - 11.0).abs() < 1e-9, "axis stopped at {last}");
    }

    #[test]
    fn empty_collection_is_an_error() {
        assert!(matches!(
            grid_profiles(&[], &config()),
            Err(ProcessingError::EmptyInput { .. })
        ));
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let depth = [0.0, 1.0];
        let temp = [20.0, 19.0];
        let time = [0.0, 1.0];
        let pos = [39.5; 2];
        let casts = [table(&time, &depth, &pos, &pos, &temp)];
        let bad = GridConfig {
            resolution: 1.0,
            variables: vec!["salinity".to_string()],
        };
        assert!(matches!(
            grid_profiles(&casts, &bad),
            Err(ProcessingError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn cumulative_distance_is_monotone() {
        let lats = [39.0, 39.1, 39.2];
        let lons = [2.0, 2.0, 2.1];
        let d = cumulative_distance(&lats, &lons);
        assert_eq!(d[0], 0.0);
        assert!(d[1] > 0.0);
        assert!(d[2] > d[1]);
        // One degree of latitude is about 111 km
        assert!((d[1] - 11_100.0).abs() < 300.0);
    }
}
