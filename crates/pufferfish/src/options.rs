use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_MAGNIFICATION: f64 = 1.0;
pub const MAX_MAGNIFICATION: f64 = 10.0;

/// Tunables for the fisheye engine.
///
/// Every field has a default, so a JSON document only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FisheyeOptions {
    /// Minimum time between two recomputations. Calls inside the window return the
    /// previous output.
    #[serde(rename = "min_interval_ms", with = "duration_ms")]
    pub min_interval: Duration,
    /// Padding added around the original layout's bounding box to form the domain bounds.
    pub bounds_padding: f64,
    /// Radius of the readability neighborhood, as a fraction of the domain's larger side.
    pub focal_radius_fraction: f64,
    /// Extra gap required between two node circles inside the focal radius.
    pub readability_margin: f64,
    pub structure_weight: f64,
    pub readability_weight: f64,
    pub temporal_weight: f64,
    pub learning_rate: f64,
    pub damping: f64,
    pub max_iterations: usize,
    /// Mean per-node displacement under which a solve counts as converged.
    pub convergence_threshold: f64,
    /// Per-iteration cap on how far a single node may move.
    pub max_node_displacement: f64,
}

impl FisheyeOptions {
    pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(16);
    pub const DEFAULT_BOUNDS_PADDING: f64 = 50.0;
    pub const DEFAULT_FOCAL_RADIUS_FRACTION: f64 = 0.25;
    pub const DEFAULT_READABILITY_MARGIN: f64 = 4.0;
    pub const DEFAULT_STRUCTURE_WEIGHT: f64 = 1.0;
    pub const DEFAULT_READABILITY_WEIGHT: f64 = 4.0;
    pub const DEFAULT_TEMPORAL_WEIGHT: f64 = 0.8;
    pub const DEFAULT_LEARNING_RATE: f64 = 0.5;
    pub const DEFAULT_DAMPING: f64 = 0.6;
    pub const DEFAULT_MAX_ITERATIONS: usize = 60;
    pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.01;
    pub const DEFAULT_MAX_NODE_DISPLACEMENT: f64 = 100.0;
    /// Upper bound for `max_iterations`; keeps a single update within a frame budget.
    pub const MAX_ITERATIONS: usize = 10_000;

    pub fn from_json_str(json: &str) -> Result<Self> {
        let opts: Self = serde_json::from_str(json)?;
        Ok(opts.sanitized())
    }

    /// Replaces values the solver cannot work with by their defaults.
    pub fn sanitized(mut self) -> Self {
        fn non_negative(v: f64, default: f64) -> f64 {
            if v.is_finite() && v >= 0.0 { v } else { default }
        }
        fn positive(v: f64, default: f64) -> f64 {
            if v.is_finite() && v > 0.0 { v } else { default }
        }

        self.bounds_padding = non_negative(self.bounds_padding, Self::DEFAULT_BOUNDS_PADDING);
        self.focal_radius_fraction =
            positive(self.focal_radius_fraction, Self::DEFAULT_FOCAL_RADIUS_FRACTION);
        self.readability_margin =
            non_negative(self.readability_margin, Self::DEFAULT_READABILITY_MARGIN);
        self.structure_weight = non_negative(self.structure_weight, Self::DEFAULT_STRUCTURE_WEIGHT);
        self.readability_weight =
            non_negative(self.readability_weight, Self::DEFAULT_READABILITY_WEIGHT);
        // The temporal term acts as friction on the previous step; above 1 it overshoots.
        self.temporal_weight =
            non_negative(self.temporal_weight, Self::DEFAULT_TEMPORAL_WEIGHT).min(1.0);
        self.learning_rate = positive(self.learning_rate, Self::DEFAULT_LEARNING_RATE).min(1.0);
        self.damping = positive(self.damping, Self::DEFAULT_DAMPING).min(1.0);
        if self.max_iterations == 0 {
            self.max_iterations = Self::DEFAULT_MAX_ITERATIONS;
        }
        self.max_iterations = self.max_iterations.min(Self::MAX_ITERATIONS);
        self.convergence_threshold =
            positive(self.convergence_threshold, Self::DEFAULT_CONVERGENCE_THRESHOLD);
        self.max_node_displacement =
            positive(self.max_node_displacement, Self::DEFAULT_MAX_NODE_DISPLACEMENT);
        self
    }

    /// Step multiplier applied to the accumulated force.
    pub fn step_size(&self) -> f64 {
        self.learning_rate * self.damping
    }
}

impl Default for FisheyeOptions {
    fn default() -> Self {
        Self {
            min_interval: Self::DEFAULT_MIN_INTERVAL,
            bounds_padding: Self::DEFAULT_BOUNDS_PADDING,
            focal_radius_fraction: Self::DEFAULT_FOCAL_RADIUS_FRACTION,
            readability_margin: Self::DEFAULT_READABILITY_MARGIN,
            structure_weight: Self::DEFAULT_STRUCTURE_WEIGHT,
            readability_weight: Self::DEFAULT_READABILITY_WEIGHT,
            temporal_weight: Self::DEFAULT_TEMPORAL_WEIGHT,
            learning_rate: Self::DEFAULT_LEARNING_RATE,
            damping: Self::DEFAULT_DAMPING,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            convergence_threshold: Self::DEFAULT_CONVERGENCE_THRESHOLD,
            max_node_displacement: Self::DEFAULT_MAX_NODE_DISPLACEMENT,
        }
    }
}

/// Clamps a magnification factor into the supported range.
///
/// Returns `None` for NaN, which has no meaningful clamp.
pub fn clamp_magnification(m: f64) -> Option<f64> {
    if m.is_nan() {
        return None;
    }
    Some(m.clamp(MIN_MAGNIFICATION, MAX_MAGNIFICATION))
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
