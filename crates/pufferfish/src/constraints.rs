//! Constraint families driving the optimizer.
//!
//! Every constraint is a desired relative vector plus a weight. Pair constraints describe
//! `p[b] - p[a]`; temporal constraints describe an absolute anchor for a single node.

use crate::geom::{self, EPSILON, GraphPoint, GraphVector};
use crate::layout::{EdgeRecord, NodeRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairConstraint {
    pub a: usize,
    pub b: usize,
    /// Desired value of `p[b] - p[a]`.
    pub desired: GraphVector,
    pub weight: f64,
}

impl PairConstraint {
    /// Difference between the desired and the actual relative vector.
    pub fn error(&self, positions: &[GraphPoint]) -> GraphVector {
        self.desired - (positions[self.b] - positions[self.a])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalConstraint {
    pub node: usize,
    pub anchor: GraphPoint,
    pub weight: f64,
}

impl TemporalConstraint {
    pub fn error(&self, positions: &[GraphPoint]) -> GraphVector {
        self.anchor - positions[self.node]
    }
}

/// The three constraint families for one iteration.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    pub structure: Vec<PairConstraint>,
    pub readability: Vec<PairConstraint>,
    pub temporal: Vec<TemporalConstraint>,
}

impl ConstraintSet {
    pub fn len(&self) -> usize {
        self.structure.len() + self.readability.len() + self.temporal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Structure preservation: one constraint per edge, keeping the original edge direction
/// while adopting the edge length of the geometric target.
///
/// Self-loops and edges whose original endpoints coincide produce nothing.
pub fn build_structure(
    nodes: &[NodeRecord],
    edges: &[EdgeRecord],
    original: &[GraphPoint],
    target: &[GraphPoint],
    base_weight: f64,
    out: &mut Vec<PairConstraint>,
) {
    out.clear();
    if base_weight <= 0.0 {
        return;
    }
    for e in edges {
        if e.is_self_loop() {
            continue;
        }
        let orig = original[e.b] - original[e.a];
        let orig_len = orig.length();
        if orig_len < EPSILON {
            continue;
        }
        let target_len = (target[e.b] - target[e.a]).length();
        if !target_len.is_finite() {
            continue;
        }
        let importance = (nodes[e.a].importance_norm + nodes[e.b].importance_norm) / 2.0;
        out.push(PairConstraint {
            a: e.a,
            b: e.b,
            desired: orig * (target_len / orig_len),
            weight: base_weight * e.weight_norm * (1.0 + importance),
        });
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadabilityParams {
    pub focus: GraphPoint,
    pub focal_radius: f64,
    pub margin: f64,
    pub weight: f64,
}

/// Indices of the nodes whose current position lies within the focal radius.
pub fn focal_population(positions: &[GraphPoint], focus: GraphPoint, radius: f64) -> Vec<usize> {
    let radius_sq = radius * radius;
    positions
        .iter()
        .enumerate()
        .filter(|(_, p)| (**p - focus).square_length() <= radius_sq)
        .map(|(idx, _)| idx)
        .collect()
}

/// Non-overlap among the focal population: every pair closer than
/// `radius_a + radius_b + margin` gets a constraint separating it to exactly that distance.
pub fn build_readability(
    nodes: &[NodeRecord],
    current: &[GraphPoint],
    params: ReadabilityParams,
    out: &mut Vec<PairConstraint>,
) {
    out.clear();
    if params.weight <= 0.0 {
        return;
    }
    let focal = focal_population(current, params.focus, params.focal_radius);
    for (i, &a) in focal.iter().enumerate() {
        for &b in &focal[i + 1..] {
            let min_dist = nodes[a].radius + nodes[b].radius + params.margin;
            let delta = current[b] - current[a];
            let dist = delta.length();
            if dist >= min_dist {
                continue;
            }
            let dir = if dist > EPSILON {
                delta / dist
            } else {
                geom::fallback_direction(a, b)
            };
            let importance = (nodes[a].importance_norm + nodes[b].importance_norm) / 2.0;
            out.push(PairConstraint {
                a,
                b,
                desired: dir * min_dist,
                weight: params.weight * (1.0 + importance),
            });
        }
    }
}

/// Sweep cap for [`separate_focal_pairs`].
pub const MAX_SEPARATION_SWEEPS: usize = 32;

/// Projects every overlapping focal pair apart to exactly `radius_a + radius_b + margin`.
///
/// Each correction moves both nodes half the shortfall along their connecting line. Sweeps
/// repeat until a sweep finds no violation or [`MAX_SEPARATION_SWEEPS`] is reached. Returns
/// the number of corrections applied.
pub fn separate_focal_pairs(
    nodes: &[NodeRecord],
    positions: &mut [GraphPoint],
    params: ReadabilityParams,
) -> usize {
    if params.weight <= 0.0 {
        return 0;
    }
    let mut corrections = 0usize;
    for _ in 0..MAX_SEPARATION_SWEEPS {
        let focal = focal_population(positions, params.focus, params.focal_radius);
        let mut moved = false;
        for (i, &a) in focal.iter().enumerate() {
            for &b in &focal[i + 1..] {
                let min_dist = nodes[a].radius + nodes[b].radius + params.margin;
                let delta = positions[b] - positions[a];
                let dist = delta.length();
                if dist.is_nan() || dist >= min_dist - EPSILON {
                    continue;
                }
                let dir = if dist > EPSILON {
                    delta / dist
                } else {
                    geom::fallback_direction(a, b)
                };
                let push = dir * ((min_dist - dist) / 2.0);
                let next_a = positions[a] - push;
                let next_b = positions[b] + push;
                if !(geom::is_finite(next_a) && geom::is_finite(next_b)) {
                    continue;
                }
                positions[a] = next_a;
                positions[b] = next_b;
                corrections += 1;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    corrections
}

/// Temporal coherence: anchors each node to its position in the previous iteration.
///
/// Weight grows with the node's target distance from the focus, so the periphery barely
/// moves while the focal area stays free.
pub fn build_temporal(
    previous: &[GraphPoint],
    target: &[GraphPoint],
    focus: GraphPoint,
    max_focus_distance: f64,
    base_weight: f64,
    out: &mut Vec<TemporalConstraint>,
) {
    out.clear();
    if base_weight <= 0.0 {
        return;
    }
    let scale = max_focus_distance.max(EPSILON);
    for (node, (&anchor, &t)) in previous.iter().zip(target).enumerate() {
        let normalized = (t - focus).length() / scale;
        // Unknown distance: hold the node like the far periphery.
        let normalized = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            1.0
        };
        out.push(TemporalConstraint {
            node,
            anchor,
            weight: base_weight * normalized,
        });
    }
}
