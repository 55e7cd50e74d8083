//! Time-to-distance projection for one athlete on one discipline.
//!
//! A projection assumes the athlete holds their predicted pace from the last
//! known crossing. It is a pure function of its inputs and is recomputed on
//! every tick; nothing here is ever stored.

use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{route::Route, timing::elapsed_seconds};

/// Derived position state for one athlete on one discipline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ProjectionState {
    pub distance_covered: f64,
    /// 1-based lap number.
    pub lap_index: u32,
    pub fraction_of_lap: f64,
    pub has_started: bool,
    pub is_active: bool,
    pub is_finished: bool,
}

impl ProjectionState {
    pub fn not_started() -> Self {
        Self {
            distance_covered: 0.0,
            lap_index: 1,
            fraction_of_lap: 0.0,
            has_started: false,
            is_active: false,
            is_finished: false,
        }
    }

    /// State at `distance` meters on `route`, for an athlete who has started.
    pub fn at_distance(route: &Route, distance: f64) -> Self {
        let total = route.total_distance_meters();
        let distance_covered = clamp_distance(distance, total);
        Self {
            distance_covered,
            lap_index: route.current_lap_number(distance_covered),
            fraction_of_lap: route.lap_fraction(distance_covered),
            has_started: true,
            is_active: distance_covered < total,
            is_finished: distance_covered >= total,
        }
    }

    /// State of an athlete whose finish crossing has been recorded.
    pub fn completed(route: &Route) -> Self {
        Self::at_distance(route, route.total_distance_meters())
    }
}

/// Inputs of a single projection.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    /// Crossing time of the checkpoint projected from, if recorded.
    pub start: Option<OffsetDateTime>,
    pub predicted_duration_seconds: u32,
    pub route: &'a Route,
    pub now: OffsetDateTime,
    /// Distance already logged at the start checkpoint (mid-course splits).
    pub distance_offset_meters: f64,
}

/// Projects how far along `route` the athlete is at `now`.
///
/// Missing start times, a start in the future and a zero prediction all
/// yield [`ProjectionState::not_started`]. The result never leaves
/// `[0, total_distance]` and never decreases as `now` advances.
pub fn project(input: ProjectionInput<'_>) -> ProjectionState {
    let Some(start) = input.start else {
        return ProjectionState::not_started();
    };
    if input.now < start || input.predicted_duration_seconds == 0 {
        return ProjectionState::not_started();
    }

    let elapsed = elapsed_seconds(start, input.now) as f64;
    let total = input.route.total_distance_meters();
    let offset = if input.distance_offset_meters.is_finite() {
        input.distance_offset_meters
    } else {
        0.0
    };
    let raw = elapsed / f64::from(input.predicted_duration_seconds) * total + offset;

    ProjectionState::at_distance(input.route, raw)
}

/// Clamps into `[0, total]`, mapping NaN to zero.
pub(crate) fn clamp_distance(distance: f64, total: f64) -> f64 {
    if distance.is_nan() {
        return 0.0;
    }
    distance.clamp(0.0, total.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RoutePoint;
    use time::{Duration, macros::datetime};

    const T: OffsetDateTime = datetime!(2026-06-01 07:00:00 UTC);

    fn route(lap_count: u32) -> Route {
        Route::new(
            vec![
                RoutePoint::new(0.0, 0.0),
                RoutePoint::new(100.0, 0.0),
                RoutePoint::new(100.0, 100.0),
            ],
            lap_count,
            1500.0,
        )
    }

    fn input(route: &Route, start: Option<OffsetDateTime>, now: OffsetDateTime) -> ProjectionInput<'_> {
        ProjectionInput {
            start,
            predicted_duration_seconds: 1800,
            route,
            now,
            distance_offset_meters: 0.0,
        }
    }

    #[test]
    fn test_halfway_after_half_the_prediction() {
        let route = route(1);
        let state = project(input(&route, Some(T), T + Duration::seconds(900)));
        assert_eq!(state.distance_covered, 750.0);
        assert_eq!(state.fraction_of_lap, 0.5);
        assert_eq!(state.lap_index, 1);
        assert!(state.has_started && state.is_active && !state.is_finished);
    }

    #[test]
    fn test_clamps_long_after_predicted_finish() {
        let route = route(1);
        let state = project(input(&route, Some(T), T + Duration::seconds(5000)));
        assert_eq!(state.distance_covered, 1500.0);
        assert!(state.is_finished);
        assert!(!state.is_active);
    }

    #[test]
    fn test_not_started_cases() {
        let route = route(1);
        assert_eq!(project(input(&route, None, T)), ProjectionState::not_started());
        assert_eq!(
            project(input(&route, Some(T), T - Duration::seconds(1))),
            ProjectionState::not_started()
        );
        let zero_prediction = ProjectionInput {
            predicted_duration_seconds: 0,
            ..input(&route, Some(T), T + Duration::seconds(60))
        };
        let state = project(zero_prediction);
        assert_eq!(state, ProjectionState::not_started());
        assert!(state.distance_covered.is_finite());
    }

    #[test]
    fn test_start_instant_counts_as_started() {
        let route = route(1);
        let state = project(input(&route, Some(T), T));
        assert!(state.has_started);
        assert!(state.is_active);
        assert_eq!(state.distance_covered, 0.0);
    }

    #[test]
    fn test_offset_carries_forward() {
        let route = route(3);
        let state = project(ProjectionInput {
            distance_offset_meters: 1000.0,
            ..input(&route, Some(T), T + Duration::seconds(120))
        });
        // 120 / 1800 * 1500 = 100 m past the 1000 m split.
        assert_eq!(state.distance_covered, 1100.0);
        assert_eq!(state.lap_index, 3);
        assert!((state.fraction_of_lap - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let route = route(2);
        let mut previous = 0.0;
        for step in 0..500 {
            let now = T + Duration::milliseconds(step * 7_919);
            let state = project(input(&route, Some(T), now));
            assert!(state.distance_covered >= previous);
            assert!((0.0..=1500.0).contains(&state.distance_covered));
            previous = state.distance_covered;
        }
        assert_eq!(previous, 1500.0);
    }

    #[test]
    fn test_deterministic() {
        let route = route(2);
        let now = T + Duration::seconds(1234);
        assert_eq!(
            project(input(&route, Some(T), now)),
            project(input(&route, Some(T), now))
        );
    }
}
