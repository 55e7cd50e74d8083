//! Test data generation for race projection.
//!
//! This crate generates courses, athlete fields and checkpoint crossings to
//! support manual verification, simulations and integration testing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let scenario = ScenarioBuilder::new()
//!     .with_course(Course::SPRINT)
//!     .with_athletes(30)
//!     .with_skill_distribution(SkillDistribution::power_law())
//!     .with_cutoff(Duration::minutes(40))
//!     .build(&pool, &mut rng)
//!     .await?;
//! ```

pub mod builders;
pub mod config;
pub mod db;
pub mod generators;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{Scenario, ScenarioBuilder, ScenarioMetrics};
    pub use crate::config::{Course, Leg, RouteShape, SkillDistribution};
    pub use crate::db::{SeedError, Seeder};
    pub use crate::generators::{
        AthleteGenConfig, AthleteGenerator, RouteGenConfig, RouteGenerator, TimingGenConfig,
        TimingGenerator,
    };
}
