//! Pace-bounded uncertainty band for the bike course.
//!
//! Instead of a single projected dot, the band spans the positions the athlete
//! would have reached at a slow and a fast reference speed since their last
//! known bike crossing.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    projection::clamp_distance,
    route::{Route, RoutePoint},
    timing::elapsed_seconds,
};

/// The two reference speeds, in meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeedBandConfig {
    pub slow_mps: f64,
    pub fast_mps: f64,
}

impl SpeedBandConfig {
    /// Returns `None` unless `0 < slow < fast`.
    pub fn new(slow_mps: f64, fast_mps: f64) -> Option<Self> {
        (slow_mps > 0.0 && slow_mps < fast_mps && fast_mps.is_finite())
            .then_some(Self { slow_mps, fast_mps })
    }

    pub fn from_kmh(slow_kmh: f64, fast_kmh: f64) -> Option<Self> {
        Self::new(slow_kmh / 3.6, fast_kmh / 3.6)
    }
}

impl Default for SpeedBandConfig {
    fn default() -> Self {
        Self {
            slow_mps: 25.0 / 3.6,
            fast_mps: 35.0 / 3.6,
        }
    }
}

/// One end of a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct BandEdge {
    pub distance_covered: f64,
    pub point: RoutePoint,
}

/// A band between the slow and fast bound positions.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SpeedBand {
    pub slow: BandEdge,
    pub fast: BandEdge,
    /// Slow endpoint, the polyline vertices from the slow bound's vertex to the
    /// fast bound's vertex inclusive, then the fast endpoint. Empty when the
    /// band has collapsed.
    pub path: Vec<RoutePoint>,
}

impl SpeedBand {
    pub fn is_collapsed(&self) -> bool {
        self.path.is_empty()
    }
}

/// Computes the band for an athlete last seen at `start` with
/// `distance_offset_meters` already covered. `None` before the athlete starts.
pub fn speed_band(
    config: SpeedBandConfig,
    start: Option<OffsetDateTime>,
    now: OffsetDateTime,
    distance_offset_meters: f64,
    route: &Route,
) -> Option<SpeedBand> {
    let start = start?;
    if now < start {
        return None;
    }
    let elapsed = elapsed_seconds(start, now) as f64;
    let total = route.total_distance_meters();
    let bound = |speed: f64| clamp_distance(speed * elapsed + distance_offset_meters, total);

    let slow_distance = bound(config.slow_mps);
    let fast_distance = bound(config.fast_mps);
    let slow_fraction = route.render_fraction(slow_distance);
    let fast_fraction = route.render_fraction(fast_distance);

    let slow = BandEdge {
        distance_covered: slow_distance,
        point: route.point_at(slow_fraction),
    };
    let fast = BandEdge {
        distance_covered: fast_distance,
        point: route.point_at(fast_fraction),
    };

    let path = match (route.vertex_index(slow_fraction), route.vertex_index(fast_fraction)) {
        (Some(slow_index), Some(fast_index)) if slow_index < fast_index => {
            let mut path = Vec::with_capacity(fast_index - slow_index + 3);
            path.push(slow.point);
            path.extend_from_slice(&route.points()[slow_index..=fast_index]);
            path.push(fast.point);
            path
        }
        _ => Vec::new(),
    };

    Some(SpeedBand { slow, fast, path })
}
