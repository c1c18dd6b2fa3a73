use crate::adapter::{RenderElements, Viewport};
use crate::error::{Error, InvalidInput, Result};
use crate::geom::{self, GraphPoint, ScreenPoint};
use crate::graph::{Edge, Graph, Node};
use crate::layout::LayoutStore;
use crate::mapper;
use crate::optimizer::{Optimizer, SolveInput, SolveReport};
use crate::options::{self, FisheyeOptions, MIN_MAGNIFICATION};
use std::time::Instant;

/// Interaction events forwarded by the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Move { screen: ScreenPoint },
    /// Recenter the focus on a node's original position.
    Click { node_id: String },
    Disable,
}

#[derive(Debug)]
struct Loaded {
    store: LayoutStore,
    elements: RenderElements,
}

/// Structure-aware fisheye engine for one graph view.
///
/// Owned by the caller's view state; all calls are synchronous and bounded.
#[derive(Debug)]
pub struct FisheyeEngine {
    opts: FisheyeOptions,
    loaded: Option<Loaded>,
    optimizer: Optimizer,
    focus: GraphPoint,
    magnification: f64,
    active: bool,
    last_apply: Option<Instant>,
    last_report: Option<SolveReport>,
}

impl Default for FisheyeEngine {
    fn default() -> Self {
        Self::new(FisheyeOptions::default())
    }
}

impl FisheyeEngine {
    pub fn new(opts: FisheyeOptions) -> Self {
        Self {
            opts: opts.sanitized(),
            loaded: None,
            optimizer: Optimizer::new(),
            focus: geom::point(0.0, 0.0),
            magnification: MIN_MAGNIFICATION,
            active: false,
            last_apply: None,
            last_report: None,
        }
    }

    pub fn options(&self) -> &FisheyeOptions {
        &self.opts
    }

    /// Loads a new graph, replacing any previous state.
    ///
    /// On error the engine keeps its previous graph.
    pub fn initialize(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<()> {
        let store = LayoutStore::from_graph(Graph::new(nodes, edges), self.opts.bounds_padding)?;
        let bounds = store.domain_bounds();
        tracing::info!(
            nodes = store.len(),
            edges = store.edges().len(),
            min_x = bounds.min.x,
            min_y = bounds.min.y,
            max_x = bounds.max.x,
            max_y = bounds.max.y,
            "fisheye engine initialized"
        );

        let elements = RenderElements::from_store(&store);
        self.focus = bounds.center();
        self.active = false;
        self.last_apply = None;
        self.last_report = None;
        self.loaded = Some(Loaded { store, elements });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_magnification(&self) -> f64 {
        self.magnification
    }

    pub fn focus(&self) -> GraphPoint {
        self.focus
    }

    /// Report of the most recent solve, if any ran since the last initialize/reset.
    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    pub fn layout(&self) -> Option<&LayoutStore> {
        self.loaded.as_ref().map(|l| &l.store)
    }

    /// The last emitted element list; empty before initialize.
    pub fn elements(&self) -> RenderElements {
        self.loaded
            .as_ref()
            .map(|l| l.elements.clone())
            .unwrap_or_default()
    }

    /// Throttled fisheye update using the wall clock.
    pub fn apply_fisheye(
        &mut self,
        focus: GraphPoint,
        magnification: f64,
    ) -> Result<RenderElements> {
        self.apply_fisheye_at(Instant::now(), focus, magnification)
    }

    /// Fisheye update with an explicit clock reading.
    ///
    /// Calls less than `min_interval` after the previous recomputation return the previous
    /// output unchanged.
    pub fn apply_fisheye_at(
        &mut self,
        now: Instant,
        focus: GraphPoint,
        magnification: f64,
    ) -> Result<RenderElements> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Err(Error::NotInitialized);
        };
        if !geom::is_finite(focus) {
            return Err(InvalidInput::NonFiniteFocus.into());
        }
        let Some(magnification) = options::clamp_magnification(magnification) else {
            return Err(InvalidInput::NonFiniteMagnification {
                value: magnification,
            }
            .into());
        };

        if let Some(last) = self.last_apply {
            if now.saturating_duration_since(last) < self.opts.min_interval {
                tracing::trace!("fisheye update throttled");
                return Ok(loaded.elements.clone());
            }
        }

        let started = Instant::now();
        let store = &mut loaded.store;
        let bounds = store.domain_bounds();
        let center = mapper::clamp_focus(&bounds, focus);
        let target = mapper::fisheye_targets(store.original(), &bounds, center, magnification);
        let report = self.optimizer.solve(
            store,
            SolveInput {
                target: &target,
                focus: center,
            },
            &self.opts,
        );
        tracing::debug!(
            outcome = ?report.outcome,
            iterations = report.iterations,
            final_displacement = report.final_displacement(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "fisheye solve finished"
        );

        loaded.elements = RenderElements::from_store(store);
        self.focus = focus;
        self.magnification = magnification;
        self.active = true;
        self.last_apply = Some(now);
        self.last_report = Some(report);
        Ok(loaded.elements.clone())
    }

    /// Restores the original layout and deactivates the fisheye.
    pub fn reset(&mut self) -> RenderElements {
        self.active = false;
        self.last_apply = None;
        self.last_report = None;
        let Some(loaded) = self.loaded.as_mut() else {
            return RenderElements::default();
        };
        loaded.store.restore_original();
        loaded.elements = RenderElements::from_store(&loaded.store);
        loaded.elements.clone()
    }

    /// Changes the magnification; recomputes at the current focus when active.
    pub fn set_magnification(&mut self, magnification: f64) -> Result<RenderElements> {
        if !self.active {
            let Some(m) = options::clamp_magnification(magnification) else {
                return Err(InvalidInput::NonFiniteMagnification {
                    value: magnification,
                }
                .into());
            };
            self.magnification = m;
            return Ok(self.elements());
        }
        // A deliberate parameter change is not subject to pointer-rate throttling.
        self.last_apply = None;
        self.apply_fisheye(self.focus, magnification)
    }

    /// Focus point for a click on `node_id`: the node's original position.
    pub fn node_focus(&self, node_id: &str) -> Result<GraphPoint> {
        let loaded = self.loaded.as_ref().ok_or(Error::NotInitialized)?;
        loaded.store.original_position(node_id).ok_or_else(|| {
            InvalidInput::UnknownNode {
                id: node_id.to_string(),
            }
            .into()
        })
    }

    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        viewport: &Viewport,
    ) -> Result<RenderElements> {
        match event {
            PointerEvent::Move { screen } => {
                let focus = viewport.screen_to_graph(screen);
                self.apply_fisheye(focus, self.magnification)
            }
            PointerEvent::Click { node_id } => {
                let focus = self.node_focus(&node_id)?;
                self.last_apply = None;
                self.apply_fisheye(focus, self.magnification)
            }
            PointerEvent::Disable => {
                if !self.is_initialized() {
                    return Err(Error::NotInitialized);
                }
                Ok(self.reset())
            }
        }
    }
}
