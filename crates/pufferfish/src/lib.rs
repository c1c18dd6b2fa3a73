#![forbid(unsafe_code)]

//! Headless structure-aware fisheye distortion for precomputed graph layouts.
//!
//! `pufferfish` takes a node/edge layout produced upstream and, for every pointer position,
//! computes a focus+context view: the neighborhood of the focus is magnified, edges keep their
//! original orientation, nearby nodes do not overlap, and the periphery stays calm.
//!
//! The pipeline per update is: [`mapper`] (pure polar fisheye) -> [`constraints`] ->
//! [`optimizer`] (damped gradient relaxation) -> [`adapter::RenderElements`].

pub mod adapter;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod geom;
pub mod graph;
pub mod layout;
pub mod mapper;
pub mod optimizer;
pub mod options;

pub use adapter::{Position, RenderEdge, RenderElements, RenderNode, Viewport};
pub use engine::{FisheyeEngine, PointerEvent};
pub use error::{Error, InvalidInput, Result};
pub use geom::{GraphPoint, ScreenPoint};
pub use graph::{Edge, Graph, Metadata, Node, NodeKind};
pub use optimizer::{SolveOutcome, SolveReport};
pub use options::{FisheyeOptions, MAX_MAGNIFICATION, MIN_MAGNIFICATION};
