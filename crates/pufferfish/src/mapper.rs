//! Geometric fisheye mapping.
//!
//! Generalized polar fisheye: every node is pushed along the ray from the focus through its
//! original position, relative to where that ray leaves the domain bounds. Topology is not
//! considered here.

use crate::geom::{EPSILON, GraphBox, GraphPoint};

/// Upper bound for the distance ratio, keeping the remap away from the boundary singularity.
pub const MAX_BETA: f64 = 0.99;

/// Maps a raw distance ratio through the fisheye function.
///
/// `((m + 1) * beta) / (m * beta + 1)`; strictly increasing in both `beta` and `m` for
/// `beta` in `(0, 1)`.
pub fn distort_ratio(beta: f64, m: f64) -> f64 {
    ((m + 1.0) * beta) / (m * beta + 1.0)
}

/// Point where the ray from `focus` through `through` leaves `bounds`.
///
/// Takes the nearest forward hit on the four bounding edges. When the ray has no forward hit
/// (the focus lies outside the bounds and points away) the point at a fixed distance along the
/// ray is used instead.
pub fn boundary_point(bounds: &GraphBox, focus: GraphPoint, through: GraphPoint) -> GraphPoint {
    let dir = through - focus;
    let len = dir.length();
    if len.is_nan() || len <= EPSILON {
        return focus;
    }

    let mut best_t = f64::INFINITY;
    // Vertical edges.
    if dir.x.abs() > EPSILON {
        for edge_x in [bounds.min.x, bounds.max.x] {
            let t = (edge_x - focus.x) / dir.x;
            let y = focus.y + dir.y * t;
            if t > EPSILON && y >= bounds.min.y - EPSILON && y <= bounds.max.y + EPSILON {
                best_t = best_t.min(t);
            }
        }
    }
    // Horizontal edges.
    if dir.y.abs() > EPSILON {
        for edge_y in [bounds.min.y, bounds.max.y] {
            let t = (edge_y - focus.y) / dir.y;
            let x = focus.x + dir.x * t;
            if t > EPSILON && x >= bounds.min.x - EPSILON && x <= bounds.max.x + EPSILON {
                best_t = best_t.min(t);
            }
        }
    }

    if best_t.is_finite() {
        focus + dir * best_t
    } else {
        let fallback = bounds.width().max(bounds.height()).max(1.0);
        focus + dir * (fallback / len)
    }
}

/// Moves a focus that lies outside `bounds` onto the nearest point of the box.
///
/// A focus in the outer padding would otherwise see the box's entry face as the boundary
/// for every ray, collapsing the nodes behind it onto that face.
pub fn clamp_focus(bounds: &GraphBox, focus: GraphPoint) -> GraphPoint {
    focus.clamp(bounds.min, bounds.max)
}

/// Fisheye position of a single point.
pub fn fisheye_point(
    bounds: &GraphBox,
    focus: GraphPoint,
    magnification: f64,
    original: GraphPoint,
) -> GraphPoint {
    let dist = (original - focus).length();
    if dist < EPSILON {
        return original;
    }

    let boundary = boundary_point(bounds, focus, original);
    let boundary_dist = (boundary - focus).length();
    let beta = (dist / boundary_dist.max(1.0)).min(MAX_BETA);
    let beta_prime = distort_ratio(beta, magnification);
    focus + (boundary - focus) * beta_prime
}

/// Target layout for `focus` / `magnification`, computed from the original positions only.
pub fn fisheye_targets(
    original: &[GraphPoint],
    bounds: &GraphBox,
    focus: GraphPoint,
    magnification: f64,
) -> Vec<GraphPoint> {
    original
        .iter()
        .map(|&p| fisheye_point(bounds, focus, magnification, p))
        .collect()
}
