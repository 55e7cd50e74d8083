//! Hand-drawn route polylines and lap arithmetic.
//!
//! Positions along a route are interpolated in vertex-index space: each of the
//! `N-1` polyline segments covers an equal share of the lap regardless of its
//! drawn length, since drawings carry no per-segment distance.

use geo::{BoundingRect, Coord, Line, LineString};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A coordinate in the route image's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct RoutePoint {
    pub x: f64,
    pub y: f64,
}

impl RoutePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<RoutePoint> for Coord<f64> {
    fn from(p: RoutePoint) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

impl From<Coord<f64>> for RoutePoint {
    fn from(c: Coord<f64>) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// The stored form of a discipline's route: the drawn points and how many
/// times the course is traversed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDrawing {
    #[serde(default)]
    pub points: Vec<RoutePoint>,
    #[serde(default = "default_lap_count")]
    pub lap_count: u32,
}

fn default_lap_count() -> u32 {
    1
}

/// Pixel-space extent of a route drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RouteBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// One discipline's course: a lap polyline, lap count and the distance of all
/// laps combined.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<RoutePoint>,
    lap_count: u32,
    total_distance_meters: f64,
}

impl Route {
    /// Builds a route. Lap counts below one become one; negative or non-finite
    /// distances become zero.
    pub fn new(points: Vec<RoutePoint>, lap_count: u32, total_distance_meters: f64) -> Self {
        let total_distance_meters = if total_distance_meters.is_finite() {
            total_distance_meters.max(0.0)
        } else {
            0.0
        };
        Self {
            points,
            lap_count: lap_count.max(1),
            total_distance_meters,
        }
    }

    pub fn from_drawing(drawing: &RouteDrawing, distance_km: f64) -> Self {
        Self::new(drawing.points.clone(), drawing.lap_count, distance_km * 1000.0)
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn lap_count(&self) -> u32 {
        self.lap_count
    }

    pub fn total_distance_meters(&self) -> f64 {
        self.total_distance_meters
    }

    /// A route needs at least two points before positions can be interpolated.
    pub fn is_configured(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn distance_per_lap(&self) -> f64 {
        self.total_distance_meters / f64::from(self.lap_count)
    }

    /// Where an unconfigured route places everyone: its first point, or the origin.
    pub fn anchor(&self) -> RoutePoint {
        self.points.first().copied().unwrap_or_default()
    }

    /// Progress within the current lap, in `[0, 1]`.
    pub fn lap_fraction(&self, distance_covered_meters: f64) -> f64 {
        let per_lap = self.distance_per_lap();
        if per_lap <= 0.0 || distance_covered_meters.is_nan() {
            return 0.0;
        }
        let in_lap = distance_covered_meters.rem_euclid(per_lap);
        (in_lap / per_lap).clamp(0.0, 1.0)
    }

    /// 1-based lap the athlete is on, bounded by the lap count.
    pub fn current_lap_number(&self, distance_covered_meters: f64) -> u32 {
        let per_lap = self.distance_per_lap();
        if per_lap <= 0.0 || distance_covered_meters.is_nan() {
            return 1;
        }
        let lap = (distance_covered_meters / per_lap).floor() + 1.0;
        lap.clamp(1.0, f64::from(self.lap_count)) as u32
    }

    /// Index of the polyline vertex at or before `fraction` of a lap.
    pub fn vertex_index(&self, fraction: f64) -> Option<usize> {
        if !self.is_configured() {
            return None;
        }
        let last = self.points.len() - 1;
        let scaled = clamp_fraction(fraction) * last as f64;
        Some((scaled.floor() as usize).min(last))
    }

    /// Maps a lap fraction to a point on the polyline.
    pub fn point_at(&self, fraction: f64) -> RoutePoint {
        if !self.is_configured() {
            return self.anchor();
        }
        let last = self.points.len() - 1;
        let scaled = clamp_fraction(fraction) * last as f64;
        let index = (scaled.floor() as usize).min(last);
        let segment_fraction = scaled - index as f64;

        let segment = Line::new(
            Coord::from(self.points[index]),
            Coord::from(self.points[(index + 1).min(last)]),
        );
        (segment.start + segment.delta() * segment_fraction).into()
    }

    /// Lap fraction used for drawing: [`Route::lap_fraction`], except that a
    /// completed course reads `1.0` instead of wrapping back to the lap start.
    pub fn render_fraction(&self, distance_covered_meters: f64) -> f64 {
        if self.total_distance_meters > 0.0 && distance_covered_meters >= self.total_distance_meters
        {
            1.0
        } else {
            self.lap_fraction(distance_covered_meters)
        }
    }

    /// Render position for a covered distance.
    pub fn position_at(&self, distance_covered_meters: f64) -> RoutePoint {
        self.point_at(self.render_fraction(distance_covered_meters))
    }

    pub fn bounds(&self) -> Option<RouteBounds> {
        let line: LineString<f64> = self.points.iter().copied().map(Coord::from).collect();
        line.bounding_rect().map(|rect| RouteBounds {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }
}

fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}
