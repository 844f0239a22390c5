//! Mismatch-Polygon Area Primitive
//!
//! The parameter estimator scores a trial correction by the area
//! enclosed between a down-cast and its paired up-cast in a diagnostic
//! diagram (value-depth, or conductivity-temperature). The two ordered
//! curves are merged into one closed polygon (first curve forward,
//! second curve reversed) and the polygon's unsigned area is the score.
//!
//! That polygon is usually self-intersecting: wherever the two casts
//! cross, the enclosed lobes alternate orientation, so a single signed
//! shoelace sum would let them cancel and report a near-zero mismatch
//! for badly corrected casts. The decomposition here works directly
//! from the curve structure instead of a general polygon-clipping pass:
//! the crossings *between* the two curves are located, both curves are
//! split there, and each lobe bounded by consecutive crossings is a
//! simple polygon whose absolute shoelace area is accumulated.
//!
//! A paired up-cast traverses the diagram in the opposite direction to
//! its down-cast, so the second curve is re-oriented to run with the
//! first before crossings are located; lobe spans then pair up
//! start-to-start along both curves. The area is orientation-free, so
//! the re-ordering never changes the score of an aligned pair.
//!
//! For coincident curves every lobe is degenerate and the area is
//! exactly zero, the property that makes the optimizer's minimum
//! meaningful. Within-curve self-intersections are not split; the
//! diagnostic diagrams are close to depth-monotone and do not produce
//! them in practice.
//!
//! NaN vertices are dropped before merging; curves with fewer than two
//! finite vertices yield zero area.

use alloc::vec::Vec;

/// A crossing between the two curves, located by fractional position
/// along each curve's vertex sequence
#[derive(Debug, Clone, Copy)]
struct Crossing {
    pos_a: f64,
    pos_b: f64,
    x: f64,
    y: f64,
}

/// Unsigned mismatch area between two ordered curves.
///
/// Both curves are `(x, y)` pairs; lengths must match within each curve
/// (extra tail samples of the longer slice are ignored).
pub fn profile_area(x_a: &[f64], y_a: &[f64], x_b: &[f64], y_b: &[f64]) -> f64 {
    let a = finite_points(x_a, y_a);
    let mut b = finite_points(x_b, y_b);
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    // Anti-parallel pair (a down-cast against an up-cast): run the
    // second curve the same way as the first so the lobe spans below
    // pair start-to-start and end-to-end.
    if traversal_dot(&a, &b) < 0.0 {
        b.reverse();
    }

    let crossings = find_crossings(&a, &b);
    let mut area = 0.0;

    // Lobe k runs from crossing k-1 (or the curve starts) to crossing k
    // (or the curve ends).
    for k in 0..=crossings.len() {
        let (prev_pa, prev_pb, prev_point) = if k == 0 {
            (-0.5, -0.5, None)
        } else {
            let c = crossings[k - 1];
            (c.pos_a, c.pos_b, Some((c.x, c.y)))
        };
        let (cur_pa, cur_pb, cur_point) = if k == crossings.len() {
            ((a.len() - 1) as f64 + 0.5, (b.len() - 1) as f64 + 0.5, None)
        } else {
            let c = crossings[k];
            (c.pos_a, c.pos_b, Some((c.x, c.y)))
        };

        let mut ring: Vec<(f64, f64)> = Vec::new();
        if let Some(p) = prev_point {
            ring.push(p);
        }
        for (i, point) in a.iter().enumerate() {
            let pos = i as f64;
            if pos > prev_pa && pos < cur_pa {
                ring.push(*point);
            }
        }
        if let Some(p) = cur_point {
            ring.push(p);
        }
        let (lo_b, hi_b) = if prev_pb <= cur_pb {
            (prev_pb, cur_pb)
        } else {
            (cur_pb, prev_pb)
        };
        for (j, point) in b.iter().enumerate().rev() {
            let pos = j as f64;
            if pos > lo_b && pos < hi_b {
                ring.push(*point);
            }
        }

        area += shoelace_area(&ring);
    }

    area
}

/// Dot product of the two curves' end-to-end displacements; negative
/// when they traverse the diagram in opposite directions
fn traversal_dot(a: &[(f64, f64)], b: &[(f64, f64)]) -> f64 {
    let da = (a[a.len() - 1].0 - a[0].0, a[a.len() - 1].1 - a[0].1);
    let db = (b[b.len() - 1].0 - b[0].0, b[b.len() - 1].1 - b[0].1);
    da.0 * db.0 + da.1 * db.1
}

/// Drop NaN/Inf vertices, pairing x with y
fn finite_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect()
}

/// Locate proper crossings between the two polylines, ordered along the
/// first curve, deduplicating shared-endpoint hits
fn find_crossings(a: &[(f64, f64)], b: &[(f64, f64)]) -> Vec<Crossing> {
    let mut crossings: Vec<Crossing> = Vec::new();
    for i in 0..a.len() - 1 {
        for j in 0..b.len() - 1 {
            if let Some(c) = segment_crossing(a[i], a[i + 1], b[j], b[j + 1], i, j) {
                crossings.push(c);
            }
        }
    }
    crossings.sort_by(|p, q| {
        p.pos_a
            .partial_cmp(&q.pos_a)
            .unwrap_or(core::cmp::Ordering::Equal)
    });
    crossings.dedup_by(|p, q| (p.pos_a - q.pos_a).abs() < 1e-9 && (p.pos_b - q.pos_b).abs() < 1e-9);
    crossings
}

/// Intersection of two segments in parametric form.
///
/// Collinear overlaps are deliberately skipped: they occur exactly when
/// the curves coincide, where every lobe is degenerate anyway.
fn segment_crossing(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
    i: usize,
    j: usize,
) -> Option<Crossing> {
    let d1 = (a2.0 - a1.0, a2.1 - a1.1);
    let d2 = (b2.0 - b1.0, b2.1 - b1.1);
    let denom = d1.0 * d2.1 - d1.1 * d2.0;
    if denom.abs() < 1e-12 {
        return None;
    }
    let r = (b1.0 - a1.0, b1.1 - a1.1);
    let s = (r.0 * d2.1 - r.1 * d2.0) / denom;
    let t = (r.0 * d1.1 - r.1 * d1.0) / denom;
    if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(Crossing {
        pos_a: i as f64 + s,
        pos_b: j as f64 + t,
        x: a1.0 + s * d1.0,
        y: a1.1 + s * d1.1,
    })
}

/// Absolute shoelace area of one simple ring
fn shoelace_area(ring: &[(f64, f64)]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0.0;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        doubled += x1 * y2 - x2 * y1;
    }
    libm::fabs(doubled) * 0.5
}
