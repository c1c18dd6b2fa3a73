//! Damped gradient solve over the three constraint families.
//!
//! The solve starts from the geometric target and relaxes it: structure constraints pull edges
//! back toward their original orientation, readability constraints separate overlapping focal
//! nodes, temporal constraints act as per-node friction against the previous iteration.

use crate::constraints::{
    self, ConstraintSet, PairConstraint, ReadabilityParams, TemporalConstraint,
};
use crate::geom::{self, GraphBox, GraphPoint, GraphVector};
use crate::layout::LayoutStore;
use crate::options::FisheyeOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolvePhase {
    #[default]
    Idle,
    Iterating,
    Converged,
    MaxIterationsReached,
}

/// Terminal state of a finished solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Converged,
    MaxIterationsReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub iterations: usize,
    /// Mean per-node displacement of every iteration, in order.
    pub mean_displacements: Vec<f64>,
    /// Node updates rejected because they produced a non-finite position.
    pub degenerate_nodes: usize,
    /// Overlapping focal pairs pushed apart after the gradient loop.
    pub separated_pairs: usize,
}

impl SolveReport {
    pub fn final_displacement(&self) -> f64 {
        self.mean_displacements.last().copied().unwrap_or(0.0)
    }
}

/// Inputs fixed for the duration of one solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveInput<'a> {
    pub target: &'a [GraphPoint],
    pub focus: GraphPoint,
}

fn focal_radius(bounds: &GraphBox, fraction: f64) -> f64 {
    bounds.width().max(bounds.height()) * fraction
}

fn max_focus_distance(bounds: &GraphBox) -> f64 {
    (bounds.max - bounds.min).length() / 2.0
}

#[derive(Debug, Default)]
pub struct Optimizer {
    phase: SolvePhase,
    constraints: ConstraintSet,
    forces: Vec<GraphVector>,
    weights: Vec<f64>,
    previous: Vec<GraphPoint>,
    before_step: Vec<GraphPoint>,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SolvePhase {
        self.phase
    }

    /// Constraints of the last iteration that ran.
    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Writes a relaxed layout for `input` into the store's current positions.
    ///
    /// Never fails: non-finite updates are dropped per node and counted in the report.
    pub fn solve(
        &mut self,
        store: &mut LayoutStore,
        input: SolveInput<'_>,
        opts: &FisheyeOptions,
    ) -> SolveReport {
        let n = store.len();
        let bounds = store.domain_bounds();
        let readability = ReadabilityParams {
            focus: input.focus,
            focal_radius: focal_radius(&bounds, opts.focal_radius_fraction),
            margin: opts.readability_margin,
            weight: opts.readability_weight,
        };
        let max_focus_distance = max_focus_distance(&bounds);

        self.phase = SolvePhase::Iterating;

        // Structure constraints only read the original and target layouts, both fixed here.
        constraints::build_structure(
            store.nodes(),
            store.edges(),
            store.original(),
            input.target,
            opts.structure_weight,
            &mut self.constraints.structure,
        );

        let mut degenerate_nodes = 0usize;
        {
            let current = store.current_mut();
            for (pos, &t) in current.iter_mut().zip(input.target) {
                if geom::is_finite(t) {
                    *pos = t;
                } else {
                    degenerate_nodes += 1;
                }
            }
        }
        self.previous.clear();
        self.previous.extend_from_slice(store.current());

        let max_iterations = opts.max_iterations.min(FisheyeOptions::MAX_ITERATIONS);
        let mut mean_displacements: Vec<f64> = Vec::with_capacity(max_iterations);
        let mut outcome = SolveOutcome::MaxIterationsReached;

        for _ in 0..max_iterations {
            constraints::build_readability(
                store.nodes(),
                store.current(),
                readability,
                &mut self.constraints.readability,
            );
            constraints::build_temporal(
                &self.previous,
                input.target,
                input.focus,
                max_focus_distance,
                opts.temporal_weight,
                &mut self.constraints.temporal,
            );

            self.accumulate_forces(store.current(), n);

            self.before_step.clear();
            self.before_step.extend_from_slice(store.current());

            let step = opts.step_size();
            let max_step = opts.max_node_displacement;
            let mut total_displacement = 0.0;
            let current = store.current_mut();
            for (idx, pos) in current.iter_mut().enumerate() {
                let mut delta = self.forces[idx] * step;
                let len = delta.length();
                if len > max_step {
                    delta = delta * (max_step / len);
                }
                let next = *pos + delta;
                if !geom::is_finite(next) {
                    degenerate_nodes += 1;
                    tracing::debug!(node = idx, "dropping non-finite position update");
                    continue;
                }
                total_displacement += (next - *pos).length();
                *pos = next;
            }

            std::mem::swap(&mut self.previous, &mut self.before_step);

            let mean = if n == 0 {
                0.0
            } else {
                total_displacement / n as f64
            };
            mean_displacements.push(mean);
            if mean < opts.convergence_threshold {
                outcome = SolveOutcome::Converged;
                break;
            }
        }

        // Structure terms can balance readability short of the minimum distance.
        let separated_pairs = {
            let (nodes, current) = store.nodes_and_current_mut();
            constraints::separate_focal_pairs(nodes, current, readability)
        };
        if separated_pairs > 0 {
            tracing::debug!(separated_pairs, "separated overlapping focal pairs");
        }

        self.phase = match outcome {
            SolveOutcome::Converged => SolvePhase::Converged,
            SolveOutcome::MaxIterationsReached => SolvePhase::MaxIterationsReached,
        };

        if degenerate_nodes > 0 {
            tracing::warn!(
                degenerate_nodes,
                "fisheye solve froze nodes with non-finite positions"
            );
        }

        let report = SolveReport {
            outcome,
            iterations: mean_displacements.len(),
            mean_displacements,
            degenerate_nodes,
            separated_pairs,
        };
        self.phase = SolvePhase::Idle;
        report
    }

    /// Weighted sum of constraint errors per node, normalized by the node's total weight once
    /// that exceeds 1 so that hubs take steps of the same scale as leaves.
    fn accumulate_forces(&mut self, positions: &[GraphPoint], n: usize) {
        self.forces.clear();
        self.forces.resize(n, geom::vector(0.0, 0.0));
        self.weights.clear();
        self.weights.resize(n, 0.0);

        let pairs = self
            .constraints
            .structure
            .iter()
            .chain(&self.constraints.readability);
        for c in pairs {
            apply_pair(c, positions, &mut self.forces, &mut self.weights);
        }
        for c in &self.constraints.temporal {
            apply_temporal(c, positions, &mut self.forces, &mut self.weights);
        }

        for (force, &w) in self.forces.iter_mut().zip(&self.weights) {
            if w > 1.0 {
                *force = *force / w;
            }
        }
    }
}

fn apply_pair(
    c: &PairConstraint,
    positions: &[GraphPoint],
    forces: &mut [GraphVector],
    weights: &mut [f64],
) {
    let err = c.error(positions);
    if !(err.x.is_finite() && err.y.is_finite()) {
        return;
    }
    let half = err * (c.weight / 2.0);
    forces[c.b] += half;
    forces[c.a] -= half;
    weights[c.a] += c.weight;
    weights[c.b] += c.weight;
}

fn apply_temporal(
    c: &TemporalConstraint,
    positions: &[GraphPoint],
    forces: &mut [GraphVector],
    weights: &mut [f64],
) {
    let err = c.error(positions);
    if !(err.x.is_finite() && err.y.is_finite()) {
        return;
    }
    forces[c.node] += err * c.weight;
    weights[c.node] += c.weight;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;
    use crate::graph::{Edge, Graph, Node};
    use crate::mapper;

    fn opts() -> FisheyeOptions {
        FisheyeOptions {
            max_iterations: 400,
            convergence_threshold: 1e-6,
            ..Default::default()
        }
    }

    #[test]
    fn solve_without_constraints_lands_on_target() {
        let g = Graph::new(
            vec![Node::new("a", -50.0, 0.0), Node::new("b", 50.0, 0.0)],
            vec![],
        );
        let mut store = LayoutStore::from_graph(g, 50.0).expect("store");
        let focus = point(-40.0, 0.0);
        let target = mapper::fisheye_targets(store.original(), &store.domain_bounds(), focus, 4.0);
        let mut opt = Optimizer::new();
        let report = opt.solve(
            &mut store,
            SolveInput {
                target: &target,
                focus,
            },
            &opts(),
        );
        assert_eq!(report.outcome, SolveOutcome::Converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(store.current(), target.as_slice());
        assert_eq!(opt.phase(), SolvePhase::Idle);
    }

    #[test]
    fn solve_pulls_edges_back_toward_original_orientation() {
        let g = Graph::new(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 100.0, 10.0)],
            vec![Edge::new("a", "b")],
        );
        let mut store = LayoutStore::from_graph(g, 50.0).expect("store");
        // A target that rotates the edge by 90 degrees.
        let target = vec![point(0.0, 0.0), point(0.0, 100.0)];
        let focus = point(-200.0, -200.0);
        let report = Optimizer::new().solve(
            &mut store,
            SolveInput {
                target: &target,
                focus,
            },
            &opts(),
        );
        let cur = store.current();
        let d = cur[1] - cur[0];
        let orig = store.original()[1] - store.original()[0];
        let cos = d.dot(orig) / (d.length() * orig.length());
        assert!(cos > 0.99, "edge not realigned: cos={cos}, report={report:?}");
        assert!((d.length() - 100.0).abs() < 1.0);
    }

    #[test]
    fn non_finite_targets_are_frozen_not_propagated() {
        let g = Graph::new(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0)],
            vec![Edge::new("a", "b")],
        );
        let mut store = LayoutStore::from_graph(g, 50.0).expect("store");
        let target = vec![point(f64::NAN, 0.0), point(20.0, 0.0)];
        let report = Optimizer::new().solve(
            &mut store,
            SolveInput {
                target: &target,
                focus: point(0.0, 0.0),
            },
            &opts(),
        );
        assert!(report.degenerate_nodes >= 1);
        assert!(store.current().iter().all(|p| geom::is_finite(*p)));
    }

    #[test]
    fn solve_stops_at_iteration_cap() {
        let g = Graph::new(
            vec![
                Node::new("a", 0.0, 0.0).with_radius(10.0),
                Node::new("b", 1.0, 0.0).with_radius(10.0),
            ],
            vec![],
        );
        let mut store = LayoutStore::from_graph(g, 50.0).expect("store");
        let target = store.original().to_vec();
        let capped = FisheyeOptions {
            max_iterations: 3,
            convergence_threshold: 1e-12,
            ..Default::default()
        };
        let report = Optimizer::new().solve(
            &mut store,
            SolveInput {
                target: &target,
                focus: point(0.5, 0.0),
            },
            &capped,
        );
        assert_eq!(report.outcome, SolveOutcome::MaxIterationsReached);
        assert_eq!(report.iterations, 3);
    }

    #[test]
    fn unsanitized_iteration_cap_is_bounded() {
        let g = Graph::new(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0)],
            vec![],
        );
        let mut store = LayoutStore::from_graph(g, 50.0).expect("store");
        let target = store.original().to_vec();
        let huge = FisheyeOptions {
            max_iterations: usize::MAX,
            ..Default::default()
        };
        let report = Optimizer::new().solve(
            &mut store,
            SolveInput {
                target: &target,
                focus: point(0.0, 0.0),
            },
            &huge,
        );
        assert_eq!(report.outcome, SolveOutcome::Converged);
        assert!(report.iterations <= FisheyeOptions::MAX_ITERATIONS);
    }

    #[test]
    fn edge_between_overlapping_focal_nodes_does_not_keep_them_overlapping() {
        let g = Graph::new(
            vec![
                Node::new("a", -0.5, 0.0).with_radius(5.0),
                Node::new("b", 0.5, 0.0).with_radius(5.0),
                Node::new("far", 200.0, 200.0),
            ],
            vec![Edge::new("a", "b")],
        );
        let mut store = LayoutStore::from_graph(g, 50.0).expect("store");
        let focus = point(0.0, 0.0);
        let target = mapper::fisheye_targets(store.original(), &store.domain_bounds(), focus, 1.0);
        let report = Optimizer::new().solve(
            &mut store,
            SolveInput {
                target: &target,
                focus,
            },
            &opts(),
        );
        assert!(report.separated_pairs >= 1, "{report:?}");
        let cur = store.current();
        let required = 5.0 + 5.0 + FisheyeOptions::DEFAULT_READABILITY_MARGIN;
        assert!((cur[1] - cur[0]).length() >= required - 1e-6);
    }
}
