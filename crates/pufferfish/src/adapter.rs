//! Boundary with the rendering surface: screen/graph coordinate conversion and the
//! renderer-neutral element list.

use crate::geom::{self, GraphPoint, ScreenPoint, ScreenToGraph, ScreenVector};
use crate::graph::{Metadata, NodeKind};
use crate::layout::LayoutStore;
use serde::{Deserialize, Serialize};

/// Pan/zoom state of the rendering surface.
///
/// `screen = graph * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: ScreenVector,
    pub zoom: f64,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 1e-6;

    pub fn new(pan: ScreenVector, zoom: f64) -> Self {
        let zoom = if zoom.is_finite() {
            zoom.max(Self::MIN_ZOOM)
        } else {
            1.0
        };
        Self { pan, zoom }
    }

    pub fn identity() -> Self {
        Self::new(ScreenVector::zero(), 1.0)
    }

    pub fn screen_to_graph_transform(&self) -> ScreenToGraph {
        ScreenToGraph::translation(-self.pan.x, -self.pan.y)
            .then_scale(1.0 / self.zoom, 1.0 / self.zoom)
    }

    pub fn screen_to_graph(&self, p: ScreenPoint) -> GraphPoint {
        self.screen_to_graph_transform().transform_point(p)
    }

    pub fn graph_to_screen(&self, p: GraphPoint) -> ScreenPoint {
        geom::screen_point(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl From<GraphPoint> for Position {
    fn from(p: GraphPoint) -> Self {
        Self { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    pub position: Position,
    /// Diameter of the node circle.
    pub size: f64,
    pub kind: NodeKind,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Element list handed to the rendering surface after every apply/reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderElements {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderElements {
    /// Snapshot of the store's current layout.
    pub fn from_store(store: &LayoutStore) -> Self {
        let records = store.nodes();
        let nodes = records
            .iter()
            .zip(store.current())
            .map(|(n, &p)| RenderNode {
                id: n.id.clone(),
                position: p.into(),
                size: n.radius * 2.0,
                kind: n.kind,
                metadata: n.metadata.clone(),
            })
            .collect();
        let edges = store
            .edges()
            .iter()
            .map(|e| RenderEdge {
                id: e.id.clone(),
                source: records[e.a].id.clone(),
                target: records[e.b].id.clone(),
                weight: e.weight,
            })
            .collect();
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes": self.nodes,
            "edges": self.edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{point, screen_point};
    use crate::graph::{Edge, Graph, Node};

    #[test]
    fn screen_and_graph_conversions_are_inverse() {
        let vp = Viewport::new(ScreenVector::new(40.0, -10.0), 2.0);
        let g = vp.screen_to_graph(screen_point(140.0, 90.0));
        assert!((g.x - 50.0).abs() < 1e-12);
        assert!((g.y - 50.0).abs() < 1e-12);
        let s = vp.graph_to_screen(g);
        assert!((s.x - 140.0).abs() < 1e-12);
        assert!((s.y - 90.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_zoom_is_clamped() {
        assert_eq!(Viewport::new(ScreenVector::zero(), 0.0).zoom, Viewport::MIN_ZOOM);
        assert_eq!(Viewport::new(ScreenVector::zero(), f64::NAN).zoom, 1.0);
    }

    #[test]
    fn elements_mirror_store_and_serialize_to_neutral_shape() {
        let g = Graph::new(
            vec![
                Node::new("a", 1.0, 2.0)
                    .with_radius(3.0)
                    .with_metadata("label", serde_json::json!("A")),
                Node::new("b", 4.0, 5.0).with_kind(NodeKind::Supernode),
            ],
            vec![Edge::new("a", "b").with_weight(2.5)],
        );
        let store = LayoutStore::from_graph(g, 0.0).expect("store");
        let elements = RenderElements::from_store(&store);
        assert_eq!(elements.nodes.len(), 2);
        assert_eq!(elements.node("a").map(|n| n.size), Some(6.0));
        assert_eq!(
            elements.node("b").map(|n| n.position),
            Some(Position::from(point(4.0, 5.0)))
        );

        let json = elements.to_json();
        assert_eq!(json["nodes"][0]["position"]["x"], serde_json::json!(1.0));
        assert_eq!(json["nodes"][0]["metadata"]["label"], serde_json::json!("A"));
        assert_eq!(json["nodes"][1]["kind"], serde_json::json!("supernode"));
        assert_eq!(json["edges"][0]["id"], serde_json::json!("a->b"));
        assert_eq!(json["edges"][0]["weight"], serde_json::json!(2.5));
    }
}
