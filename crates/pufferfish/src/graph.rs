use crate::error::{InvalidInput, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Upstream metadata attached to a node, kept in payload order.
pub type Metadata = IndexMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Leaf,
    /// Aggregate of a cluster in the upstream hierarchy.
    Supernode,
}

/// A node as delivered by the layout backend. `x`/`y` are the laid-out center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub importance: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            radius: 0.0,
            kind: NodeKind::Leaf,
            importance: 0.0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default = "default_edge_weight")]
    pub weight: f64,
}

fn default_edge_weight() -> f64 {
    1.0
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            weight: 1.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Identifier used in rendered output: the upstream id, or `source->target`.
    pub fn render_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}->{}", self.source, self.target),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(InvalidInput::EmptyGraph.into());
        }

        let mut node_exists: FxHashSet<&str> = FxHashSet::default();
        node_exists.reserve(self.nodes.len());
        for n in &self.nodes {
            if !(n.x.is_finite() && n.y.is_finite()) {
                return Err(InvalidInput::NonFiniteCoordinate { id: n.id.clone() }.into());
            }
            if !node_exists.insert(n.id.as_str()) {
                return Err(InvalidInput::DuplicateNodeId { id: n.id.clone() }.into());
            }
        }

        for e in &self.edges {
            if !node_exists.contains(e.source.as_str()) || !node_exists.contains(e.target.as_str())
            {
                return Err(InvalidInput::MissingEndpoint {
                    edge_id: e.render_id(),
                    source_id: e.source.clone(),
                    target_id: e.target.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}
