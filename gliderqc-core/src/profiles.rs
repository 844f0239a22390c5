//! Cast Detection in Continuous Depth Records
//!
//! A glider's depth record is one long zigzag. Before any per-cast
//! processing can happen the record has to be cut at the apogees and
//! perigees into down-casts and up-casts. The cut is not a plain
//! local-extremum search: gliders stall at inflection points and shake
//! a few decimeters while inflecting, so a robust splitter tolerates
//! small counter-trend excursions (`max_inversion`) and discards
//! segments too short to be real casts (`min_range`, `min_duration`).
//!
//! NaN depths are skipped; a cast span never starts or ends on one.

use alloc::vec::Vec;

/// Travel direction of a cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastDirection {
    /// Depth increasing
    Down,
    /// Depth decreasing
    Up,
}

/// One detected cast: an inclusive index span into the source record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastSpan {
    /// First sample index of the cast
    pub start: usize,
    /// Last sample index of the cast (inclusive)
    pub end: usize,
    /// Travel direction
    pub direction: CastDirection,
}

/// Splitter tolerances
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastOptions {
    /// Minimum depth range (m) for a segment to count as a cast
    pub min_range: f64,
    /// Largest counter-trend excursion (m) tolerated within a cast
    pub max_inversion: f64,
    /// Minimum cast duration (s); 0 disables the duration filter
    pub min_duration: f64,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            min_range: 10.0,
            max_inversion: 1.0,
            min_duration: 0.0,
        }
    }
}

/// Split a continuous depth record into casts.
///
/// `time` and `depth` must have equal lengths (extra tail samples of
/// the longer slice are ignored). Returns the qualifying spans in
/// record order; a record with no qualifying segment returns an empty
/// vector, never an error.
pub fn find_casts(time: &[f64], depth: &[f64], options: &CastOptions) -> Vec<CastSpan> {
    let n = time.len().min(depth.len());
    let usable: Vec<usize> = (0..n).filter(|&i| depth[i].is_finite()).collect();
    if usable.len() < 2 {
        return Vec::new();
    }

    let mut spans = Vec::new();
    // Start of the current segment and the running extreme reached in
    // the current trend direction
    let mut start = usable[0];
    let mut extreme = usable[0];
    let mut direction: Option<CastDirection> = None;

    for &i in &usable[1..] {
        let delta = depth[i] - depth[extreme];
        match direction {
            None => {
                // The trend is confirmed once the record moves beyond
                // inflection shake from its starting depth
                if delta.abs() > options.max_inversion {
                    direction = Some(if delta > 0.0 {
                        CastDirection::Down
                    } else {
                        CastDirection::Up
                    });
                    extreme = i;
                }
            }
            Some(CastDirection::Down) => {
                if delta > 0.0 {
                    extreme = i;
                } else if -delta > options.max_inversion {
                    // Trend reversed: the cast ended at the deepest point
                    push_span(&mut spans, time, depth, start, extreme, options);
                    start = extreme;
                    extreme = i;
                    direction = Some(CastDirection::Up);
                }
            }
            Some(CastDirection::Up) => {
                if delta < 0.0 {
                    extreme = i;
                } else if delta > options.max_inversion {
                    push_span(&mut spans, time, depth, start, extreme, options);
                    start = extreme;
                    extreme = i;
                    direction = Some(CastDirection::Down);
                }
            }
        }
    }

    // Close the trailing segment
    let last = *usable.last().unwrap();
    let end = match direction {
        Some(CastDirection::Down) | Some(CastDirection::Up) => {
            if extreme != start {
                extreme
            } else {
                last
            }
        }
        None => last,
    };
    if end > start {
        push_span(&mut spans, time, depth, start, end, options);
    }

    spans
}

/// Append the span if it clears the range and duration filters
fn push_span(
    spans: &mut Vec<CastSpan>,
    time: &[f64],
    depth: &[f64],
    start: usize,
    end: usize,
    options: &CastOptions,
) {
    if end <= start {
        return;
    }
    let range = depth[end] - depth[start];
    if range.abs() < options.min_range {
        return;
    }
    if (time[end] - time[start]).abs() < options.min_duration {
        return;
    }
    spans.push(CastSpan {
        start,
        end,
        direction: if range > 0.0 {
            CastDirection::Down
        } else {
            CastDirection::Up
        },
    });
}
