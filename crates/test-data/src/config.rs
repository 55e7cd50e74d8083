//! Configuration types for test data generation.

use race::checkpoint::Discipline;
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use serde::Serialize;

/// Shape of a procedurally drawn route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteShape {
    /// Closed loop that ends where it starts.
    Loop,
    /// Out along a wandering line, back the same way.
    OutAndBack,
}

/// Per-discipline course layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Leg {
    pub distance_km: f64,
    pub lap_count: u32,
    pub shape: RouteShape,
    /// Distance of the mid-course split, if the course has one.
    pub mid_split_km: Option<f64>,
}

/// A full triathlon course.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Course {
    pub name: &'static str,
    pub swim: Leg,
    pub bike: Leg,
    pub run: Leg,
}

impl Course {
    /// 750 m / 20 km / 5 km.
    pub const SPRINT: Course = Course {
        name: "Harbour Sprint",
        swim: Leg {
            distance_km: 0.75,
            lap_count: 1,
            shape: RouteShape::Loop,
            mid_split_km: None,
        },
        bike: Leg {
            distance_km: 20.0,
            lap_count: 2,
            shape: RouteShape::Loop,
            mid_split_km: Some(10.0),
        },
        run: Leg {
            distance_km: 5.0,
            lap_count: 1,
            shape: RouteShape::OutAndBack,
            mid_split_km: None,
        },
    };

    /// 1.5 km / 40 km / 10 km.
    pub const OLYMPIC: Course = Course {
        name: "Lakeside Olympic",
        swim: Leg {
            distance_km: 1.5,
            lap_count: 2,
            shape: RouteShape::Loop,
            mid_split_km: None,
        },
        bike: Leg {
            distance_km: 40.0,
            lap_count: 4,
            shape: RouteShape::Loop,
            mid_split_km: Some(20.0),
        },
        run: Leg {
            distance_km: 10.0,
            lap_count: 2,
            shape: RouteShape::OutAndBack,
            mid_split_km: Some(5.0),
        },
    };

    pub fn leg(&self, discipline: Discipline) -> Leg {
        match discipline {
            Discipline::Swim => self.swim,
            Discipline::Bike => self.bike,
            Discipline::Run => self.run,
        }
    }
}

/// Distribution for skill levels (used for predicted and actual times).
#[derive(Debug, Clone, Copy)]
pub enum SkillDistribution {
    /// Uniform distribution - equal probability across skill range.
    Uniform,
    /// Normal distribution with specified mean and std deviation.
    Normal { mean: f64, std_dev: f64 },
    /// Power-law distribution - few elite, many average.
    PowerLaw { alpha: f64 },
}

impl Default for SkillDistribution {
    fn default() -> Self {
        Self::power_law()
    }
}

impl SkillDistribution {
    /// Creates a power-law distribution with default parameters.
    pub fn power_law() -> Self {
        Self::PowerLaw { alpha: 2.0 }
    }

    /// Samples a time multiplier: below 1.0 is faster than the reference
    /// athlete, above 1.0 slower.
    pub fn sample_factor(&self, rng: &mut impl Rng) -> f64 {
        match *self {
            SkillDistribution::Uniform => rng.gen_range(0.7..1.5),

            SkillDistribution::Normal { mean, std_dev } => match Normal::new(mean, std_dev) {
                Ok(normal) => normal.sample(rng).clamp(0.5, 2.0),
                Err(_) => mean,
            },

            SkillDistribution::PowerLaw { alpha } => {
                // Log-normal with mean 1.0 and a heavy right tail
                let sigma = 0.4 / alpha.sqrt();
                let mu = -0.5 * sigma * sigma;
                match LogNormal::new(mu, sigma) {
                    Ok(log_normal) => log_normal.sample(rng).clamp(0.5, 3.0),
                    Err(_) => 1.0,
                }
            }
        }
    }
}
