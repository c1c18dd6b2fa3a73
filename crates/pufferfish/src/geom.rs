#![forbid(unsafe_code)]

/// Coordinate space of the upstream layout (the space the engine distorts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSpace {}

/// Coordinate space of the rendering surface (pointer events, pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSpace {}

pub type GraphPoint = euclid::Point2D<f64, GraphSpace>;
pub type GraphVector = euclid::Vector2D<f64, GraphSpace>;
pub type GraphBox = euclid::Box2D<f64, GraphSpace>;

pub type ScreenPoint = euclid::Point2D<f64, ScreenSpace>;
pub type ScreenVector = euclid::Vector2D<f64, ScreenSpace>;

pub type ScreenToGraph = euclid::Transform2D<f64, ScreenSpace, GraphSpace>;

/// Distances below this are treated as coincident points.
pub const EPSILON: f64 = 1e-9;

pub fn point(x: f64, y: f64) -> GraphPoint {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> GraphVector {
    euclid::vec2(x, y)
}

pub fn screen_point(x: f64, y: f64) -> ScreenPoint {
    euclid::point2(x, y)
}

pub fn is_finite(p: GraphPoint) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Bounding box of `points`, inflated by `padding` on every side.
///
/// Returns `None` for an empty slice.
pub fn padded_bounds(points: &[GraphPoint], padding: f64) -> Option<GraphBox> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min = min.min(*p);
        max = max.max(*p);
    }
    Some(GraphBox::new(min, max).inflate(padding, padding))
}

/// Unit vector for a pair of coincident points.
///
/// Spreads pairs on a golden-angle spiral so that stacked nodes separate in different
/// directions and the result stays deterministic.
pub fn fallback_direction(a: usize, b: usize) -> GraphVector {
    let angle = ((a as f64) * 0.618_034 + (b as f64) * 0.414_214) * std::f64::consts::TAU;
    vector(angle.cos(), angle.sin())
}
