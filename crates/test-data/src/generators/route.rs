//! Procedural route drawings in map pixel space.

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use race::route::{RouteDrawing, RoutePoint};

use crate::config::{Leg, RouteShape};

/// Configuration for route drawing.
#[derive(Debug, Clone)]
pub struct RouteGenConfig {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Number of vertices per drawn lap.
    pub vertex_count: usize,
    /// Standard deviation of vertex jitter, as a fraction of the canvas.
    pub jitter: f64,
}

impl Default for RouteGenConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            vertex_count: 16,
            jitter: 0.03,
        }
    }
}

/// Draws course polylines the way an organiser would click them on a map.
pub struct RouteGenerator {
    config: RouteGenConfig,
}

impl RouteGenerator {
    /// Creates a new route generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: RouteGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: RouteGenConfig) -> Self {
        Self { config }
    }

    /// Draws one lap of `leg` and tags it with the leg's lap count.
    pub fn generate(&self, leg: &Leg, rng: &mut impl Rng) -> RouteDrawing {
        let points = match leg.shape {
            RouteShape::Loop => self.loop_points(rng),
            RouteShape::OutAndBack => self.out_and_back_points(rng),
        };
        RouteDrawing {
            points,
            lap_count: leg.lap_count.max(1),
        }
    }

    fn loop_points(&self, rng: &mut impl Rng) -> Vec<RoutePoint> {
        let n = self.config.vertex_count.max(3);
        let (cx, cy) = (self.config.width / 2.0, self.config.height / 2.0);
        let (rx, ry) = (self.config.width * 0.35, self.config.height * 0.35);

        let mut points: Vec<RoutePoint> = (0..n)
            .map(|i| {
                let angle = TAU * i as f64 / n as f64;
                self.jittered(cx + rx * angle.cos(), cy + ry * angle.sin(), rng)
            })
            .collect();
        // Close the loop on the start line
        points.push(points[0]);
        points
    }

    fn out_and_back_points(&self, rng: &mut impl Rng) -> Vec<RoutePoint> {
        let half = (self.config.vertex_count / 2).max(2);
        let margin = self.config.width * 0.1;
        let step = (self.config.width - 2.0 * margin) / (half - 1) as f64;
        let mid_y = self.config.height / 2.0;

        let out: Vec<RoutePoint> = (0..half)
            .map(|i| self.jittered(margin + step * i as f64, mid_y, rng))
            .collect();
        let back = out.iter().rev().skip(1).copied();
        out.iter().copied().chain(back).collect()
    }

    fn jittered(&self, x: f64, y: f64, rng: &mut impl Rng) -> RoutePoint {
        let sigma = self.config.jitter * self.config.width.min(self.config.height);
        let (dx, dy) = match Normal::new(0.0, sigma) {
            Ok(normal) => (normal.sample(rng), normal.sample(rng)),
            Err(_) => (0.0, 0.0),
        };
        RoutePoint::new(
            (x + dx).clamp(0.0, self.config.width),
            (y + dy).clamp(0.0, self.config.height),
        )
    }
}

impl Default for RouteGenerator {
    fn default() -> Self {
        Self::new()
    }
}
