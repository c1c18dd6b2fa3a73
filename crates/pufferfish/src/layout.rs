//! Layout store: the immutable original layout and the mutable current one.
//!
//! Nodes live in a dense arena; every per-iteration lookup goes through a `usize` index.
//! The `id -> index` map is only consulted at the API boundary.

use crate::error::Result;
use crate::geom::{self, GraphBox, GraphPoint};
use crate::graph::{Edge, Graph, Metadata, NodeKind};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: String,
    pub radius: f64,
    pub kind: NodeKind,
    pub importance: f64,
    /// `importance` divided by the layout's maximum importance, in `[0, 1]`.
    pub importance_norm: f64,
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub id: String,
    pub a: usize,
    pub b: usize,
    pub weight: f64,
    /// `weight` divided by the layout's maximum edge weight, in `(0, 1]`.
    pub weight_norm: f64,
}

impl EdgeRecord {
    pub fn is_self_loop(&self) -> bool {
        self.a == self.b
    }
}

#[derive(Debug, Clone)]
pub struct LayoutStore {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    id_to_idx: FxHashMap<String, usize>,
    original: Vec<GraphPoint>,
    current: Vec<GraphPoint>,
    domain_bounds: GraphBox,
}

impl LayoutStore {
    pub fn from_graph(graph: Graph, bounds_padding: f64) -> Result<Self> {
        graph.validate()?;
        let Graph { nodes: input, edges } = graph;

        let max_importance = input
            .iter()
            .map(|n| sanitize_non_negative(n.importance))
            .fold(0.0_f64, f64::max);

        let mut nodes: Vec<NodeRecord> = Vec::with_capacity(input.len());
        let mut original: Vec<GraphPoint> = Vec::with_capacity(input.len());
        let mut id_to_idx: FxHashMap<String, usize> = FxHashMap::default();
        id_to_idx.reserve(input.len());

        for (idx, n) in input.into_iter().enumerate() {
            let importance = sanitize_non_negative(n.importance);
            let importance_norm = if max_importance > 0.0 {
                importance / max_importance
            } else {
                0.0
            };
            id_to_idx.insert(n.id.clone(), idx);
            original.push(geom::point(n.x, n.y));
            nodes.push(NodeRecord {
                id: n.id,
                radius: sanitize_non_negative(n.radius),
                kind: n.kind,
                importance,
                importance_norm,
                metadata: n.metadata,
            });
        }

        let edges = Self::build_edges(&edges, &id_to_idx);

        // `validate` guarantees at least one node.
        let domain_bounds = geom::padded_bounds(&original, bounds_padding)
            .unwrap_or_else(|| GraphBox::new(geom::point(0.0, 0.0), geom::point(0.0, 0.0)));

        Ok(Self {
            nodes,
            edges,
            id_to_idx,
            current: original.clone(),
            original,
            domain_bounds,
        })
    }

    fn build_edges(input: &[Edge], id_to_idx: &FxHashMap<String, usize>) -> Vec<EdgeRecord> {
        let weights: Vec<f64> = input
            .iter()
            .map(|e| {
                if e.weight.is_finite() && e.weight > 0.0 {
                    e.weight
                } else {
                    1.0
                }
            })
            .collect();
        let max_weight = weights.iter().copied().fold(0.0_f64, f64::max);

        let mut edges: Vec<EdgeRecord> = Vec::with_capacity(input.len());
        for (e, weight) in input.iter().zip(weights) {
            let (Some(&a), Some(&b)) = (
                id_to_idx.get(e.source.as_str()),
                id_to_idx.get(e.target.as_str()),
            ) else {
                continue;
            };
            edges.push(EdgeRecord {
                id: e.render_id(),
                a,
                b,
                weight,
                weight_norm: weight / max_weight,
            });
        }
        edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }

    pub fn original(&self) -> &[GraphPoint] {
        &self.original
    }

    pub fn current(&self) -> &[GraphPoint] {
        &self.current
    }

    /// Mutable access for the optimizer, the only writer of the current layout.
    pub(crate) fn current_mut(&mut self) -> &mut [GraphPoint] {
        &mut self.current
    }

    pub(crate) fn nodes_and_current_mut(&mut self) -> (&[NodeRecord], &mut [GraphPoint]) {
        (&self.nodes, &mut self.current)
    }

    pub fn domain_bounds(&self) -> GraphBox {
        self.domain_bounds
    }

    pub fn position(&self, id: &str) -> Option<GraphPoint> {
        self.index_of(id).map(|idx| self.current[idx])
    }

    pub fn original_position(&self, id: &str) -> Option<GraphPoint> {
        self.index_of(id).map(|idx| self.original[idx])
    }

    pub fn restore_original(&mut self) {
        self.current.clone_from(&self.original);
    }

    /// Largest coordinate difference between the current and original layouts.
    pub fn max_deviation(&self) -> f64 {
        self.current
            .iter()
            .zip(&self.original)
            .map(|(c, o)| (c.x - o.x).abs().max((c.y - o.y).abs()))
            .fold(0.0, f64::max)
    }
}

fn sanitize_non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn store() -> LayoutStore {
        let g = Graph::new(
            vec![
                Node::new("a", 0.0, 0.0).with_importance(2.0),
                Node::new("b", 100.0, 40.0).with_importance(4.0).with_radius(-3.0),
                Node::new("c", -20.0, 10.0),
            ],
            vec![
                Edge::new("a", "b").with_weight(2.0),
                Edge::new("b", "c").with_weight(f64::NAN),
            ],
        );
        LayoutStore::from_graph(g, 10.0).expect("store")
    }

    #[test]
    fn from_graph_builds_index_and_bounds() {
        let s = store();
        assert_eq!(s.len(), 3);
        assert_eq!(s.index_of("b"), Some(1));
        assert_eq!(s.index_of("zzz"), None);
        assert_eq!(s.domain_bounds().min, geom::point(-30.0, -10.0));
        assert_eq!(s.domain_bounds().max, geom::point(110.0, 50.0));
        assert_eq!(s.current(), s.original());
    }

    #[test]
    fn from_graph_normalizes_importance_and_weights() {
        let s = store();
        assert_eq!(s.nodes()[0].importance_norm, 0.5);
        assert_eq!(s.nodes()[1].importance_norm, 1.0);
        assert_eq!(s.nodes()[1].radius, 0.0);
        assert_eq!(s.edges()[0].weight_norm, 1.0);
        assert_eq!(s.edges()[1].weight, 1.0);
        assert_eq!(s.edges()[1].weight_norm, 0.5);
        assert_eq!(s.edges()[1].id, "b->c");
    }

    #[test]
    fn restore_original_discards_current_changes() {
        let mut s = store();
        s.current_mut()[2] = geom::point(500.0, 500.0);
        assert!(s.max_deviation() > 0.0);
        s.restore_original();
        assert_eq!(s.max_deviation(), 0.0);
    }
}
