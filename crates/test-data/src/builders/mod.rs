//! Fluent builder APIs for race scenarios.
//!
//! The [`ScenarioBuilder`] puts together a course, a field of athletes and
//! their crossing timeline in one go.

mod scenario;

pub use scenario::{Scenario, ScenarioBuilder, ScenarioMetrics};
