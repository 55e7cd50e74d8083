//! Entity generators for test data.
//!
//! - [`RouteGenerator`]: Draw course polylines in map pixel space
//! - [`AthleteGenerator`]: Generate athletes with predicted discipline times
//! - [`TimingGenerator`]: Generate checkpoint crossings with day-form variance

pub mod athlete;
pub mod route;
pub mod timing;

pub use athlete::{AthleteGenConfig, AthleteGenerator};
pub use route::{RouteGenConfig, RouteGenerator};
pub use timing::{TimingGenConfig, TimingGenerator};
