//! Per-tick live state of a race.
//!
//! [`LiveEngine::compute`] turns a [`RaceSnapshot`] and an instant into
//! everything the map and leaderboard render. It is a pure function of its
//! inputs; running it twice on the same snapshot and instant gives the same
//! view.

use enum_map::EnumMap;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    checkpoint::{CheckpointType, Discipline},
    deviation::{DeviationReport, SegmentTimes, build_report},
    leaderboard::{Progress, rank},
    models::Athlete,
    projection::{ProjectionInput, ProjectionState, project},
    route::{Route, RouteBounds, RoutePoint},
    snapshot::RaceSnapshot,
    speed_band::{SpeedBand, SpeedBandConfig, speed_band},
};

/// Where an athlete is in the race as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Waiting,
    Swim,
    Transition,
    Bike,
    Run,
    Finished,
}

impl RaceStatus {
    /// Status right after crossing a checkpoint of the given type.
    pub fn after(checkpoint_type: CheckpointType) -> Self {
        match checkpoint_type.profile().leads_into {
            Some(Discipline::Swim) => RaceStatus::Swim,
            Some(Discipline::Bike) => RaceStatus::Bike,
            Some(Discipline::Run) => RaceStatus::Run,
            None if checkpoint_type == CheckpointType::Finish => RaceStatus::Finished,
            None => RaceStatus::Transition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DotStatus {
    Active,
    Finished,
}

/// Whole-race progress of one athlete.
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteProgress {
    pub status: RaceStatus,
    pub last_checkpoint: Option<CheckpointType>,
    pub last_crossing: Option<OffsetDateTime>,
    pub disciplines: EnumMap<Discipline, ProjectionState>,
    /// Bike anchor, kept for the speed band.
    pub bike_anchor: Option<(OffsetDateTime, f64)>,
    /// Checkpoint whose colour each discipline's dot is drawn in.
    pub dot_checkpoints: EnumMap<Discipline, CheckpointType>,
}

impl AthleteProgress {
    pub fn total_distance(&self) -> f64 {
        self.disciplines.values().map(|p| p.distance_covered).sum()
    }
}

impl Progress for AthleteProgress {
    fn has_started(&self) -> bool {
        self.status != RaceStatus::Waiting
    }

    fn distance_covered(&self) -> f64 {
        self.total_distance()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub participant_id: Uuid,
    pub name: String,
    /// `0` while waiting to start.
    pub rank: u32,
    pub status: RaceStatus,
    pub distance_covered: f64,
    pub last_checkpoint: Option<CheckpointType>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_crossing: Option<OffsetDateTime>,
}

/// A participant's marker on a discipline map.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dot {
    pub participant_id: Uuid,
    pub name: String,
    pub point: RoutePoint,
    pub rank: u32,
    pub status: DotStatus,
    pub color: String,
    pub distance_covered: f64,
    pub lap: u32,
    pub fraction_of_lap: f64,
    pub band: Option<SpeedBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SegmentView {
    pub discipline: Discipline,
    pub distance_meters: f64,
    pub lap_count: u32,
    pub configured: bool,
    pub bounds: Option<RouteBounds>,
    pub dots: Vec<Dot>,
    /// Participants yet to start this discipline.
    pub waiting: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LiveView {
    pub template_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    /// Ranked participants first, then those still waiting.
    pub leaderboard: Vec<LeaderboardEntry>,
    pub segments: Vec<SegmentView>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiveEngine {
    bands: SpeedBandConfig,
}

impl LiveEngine {
    pub fn new(bands: SpeedBandConfig) -> Self {
        Self { bands }
    }

    /// Whole-race progress of one athlete at `now`.
    pub fn athlete_progress(
        &self,
        snapshot: &RaceSnapshot,
        routes: &EnumMap<Discipline, Route>,
        athlete: &Athlete,
        now: OffsetDateTime,
    ) -> AthleteProgress {
        let latest = snapshot
            .latest_crossing(athlete.id)
            .map(|(c, at)| (c.checkpoint_type, at));

        let disciplines = EnumMap::from_fn(|discipline| {
            let route = &routes[discipline];
            if snapshot.is_past(athlete.id, discipline) {
                return ProjectionState::completed(route);
            }
            let Some(anchor) = snapshot.projection_anchor(athlete.id, discipline) else {
                return ProjectionState::not_started();
            };
            project(ProjectionInput {
                start: Some(anchor.at),
                predicted_duration_seconds: athlete.predicted.seconds(discipline).unwrap_or(0),
                route,
                now,
                distance_offset_meters: anchor.distance_offset_meters,
            })
        });

        let bike_anchor = snapshot
            .projection_anchor(athlete.id, Discipline::Bike)
            .map(|a| (a.at, a.distance_offset_meters));

        let dot_checkpoints = EnumMap::from_fn(|discipline: Discipline| {
            if snapshot.is_past(athlete.id, discipline) {
                discipline.finish_checkpoint()
            } else {
                snapshot
                    .projection_anchor(athlete.id, discipline)
                    .map_or(discipline.start_checkpoint(), |a| a.checkpoint_type)
            }
        });

        AthleteProgress {
            status: latest.map_or(RaceStatus::Waiting, |(t, _)| RaceStatus::after(t)),
            last_checkpoint: latest.map(|(t, _)| t),
            last_crossing: latest.map(|(_, at)| at),
            disciplines,
            bike_anchor,
            dot_checkpoints,
        }
    }

    /// Recomputes the full live view from scratch.
    pub fn compute(&self, snapshot: &RaceSnapshot, now: OffsetDateTime) -> LiveView {
        let routes = snapshot.routes();
        let progress: Vec<(&Athlete, AthleteProgress)> = snapshot
            .athletes
            .iter()
            .map(|a| (a, self.athlete_progress(snapshot, &routes, a, now)))
            .collect();

        let overall = rank(progress.iter().map(|(a, p)| (*a, p.clone())));
        let leaderboard = overall
            .iter()
            .map(|s| LeaderboardEntry {
                participant_id: s.id.id,
                name: s.id.name.clone(),
                rank: s.rank,
                status: s.progress.status,
                distance_covered: s.progress.total_distance(),
                last_checkpoint: s.progress.last_checkpoint,
                last_crossing: s.progress.last_crossing,
            })
            .collect();

        let segments = Discipline::ALL
            .into_iter()
            .map(|d| self.segment_view(d, &routes[d], &progress, now))
            .collect();

        tracing::debug!(
            template_id = %snapshot.template.id,
            athletes = snapshot.athletes.len(),
            crossings = snapshot.recorded.len(),
            "Recomputed live view"
        );

        LiveView {
            template_id: snapshot.template.id,
            generated_at: now,
            leaderboard,
            segments,
        }
    }

    fn segment_view(
        &self,
        discipline: Discipline,
        route: &Route,
        progress: &[(&Athlete, AthleteProgress)],
        now: OffsetDateTime,
    ) -> SegmentView {
        let standings = rank(
            progress
                .iter()
                .map(|(a, p)| ((*a, p), p.disciplines[discipline])),
        );

        let dots = standings
            .ranked
            .iter()
            .map(|s| {
                let (athlete, athlete_progress) = s.id;
                let state = s.progress;
                let status = if state.is_finished {
                    DotStatus::Finished
                } else {
                    DotStatus::Active
                };
                let band = match (discipline, athlete_progress.bike_anchor) {
                    (Discipline::Bike, Some((at, offset))) if status == DotStatus::Active => {
                        speed_band(self.bands, Some(at), now, offset, route)
                    }
                    _ => None,
                };
                Dot {
                    participant_id: athlete.id,
                    name: athlete.name.clone(),
                    point: route.position_at(state.distance_covered),
                    rank: s.rank,
                    status,
                    color: athlete_progress.dot_checkpoints[discipline].color().to_string(),
                    distance_covered: state.distance_covered,
                    lap: state.lap_index,
                    fraction_of_lap: state.fraction_of_lap,
                    band,
                }
            })
            .collect();

        SegmentView {
            discipline,
            distance_meters: route.total_distance_meters(),
            lap_count: route.lap_count(),
            configured: route.is_configured(),
            bounds: route.bounds(),
            dots,
            waiting: standings.waiting.iter().map(|s| s.id.0.id).collect(),
        }
    }

    /// Predicted-versus-actual table for one athlete, `None` for unknown athletes.
    pub fn deviations(&self, snapshot: &RaceSnapshot, athlete_id: Uuid) -> Option<DeviationReport> {
        let athlete = snapshot.athlete(athlete_id)?;
        let segments = EnumMap::from_fn(|d: Discipline| SegmentTimes {
            start: snapshot.time_at(athlete_id, d.start_checkpoint()),
            finish: snapshot.time_at(athlete_id, d.finish_checkpoint()),
            predicted_seconds: athlete.predicted.seconds(d),
            distance_meters: snapshot.template.distance_km(d) * 1000.0,
        });
        Some(build_report(athlete.id, &athlete.name, &segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::*;
    use time::Duration;

    fn minutes(m: i64) -> OffsetDateTime {
        GUN + Duration::minutes(m)
    }

    fn race() -> RaceSnapshot {
        snapshot(
            vec![athlete(1, "Ada"), athlete(2, "Ben"), athlete(3, "Cy")],
            vec![
                // Ada: out of the water, on the bike.
                crossing(1, CheckpointType::SwimStart, GUN),
                crossing(1, CheckpointType::SwimEnd, minutes(28)),
                crossing(1, CheckpointType::T1End, minutes(30)),
                // Ben: still swimming.
                crossing(2, CheckpointType::SwimStart, GUN),
                // Cy: no crossings yet.
            ],
        )
    }

    #[test]
    fn test_overall_leaderboard() {
        let view = LiveEngine::default().compute(&race(), minutes(40));
        let ranks: Vec<_> = view
            .leaderboard
            .iter()
            .map(|e| (e.name.as_str(), e.rank, e.status))
            .collect();
        assert_eq!(
            ranks,
            vec![
                ("Ada", 1, RaceStatus::Bike),
                ("Ben", 2, RaceStatus::Swim),
                ("Cy", 0, RaceStatus::Waiting),
            ]
        );
        // 1500 m swim plus 10 minutes of an 80-minute 40 km ride.
        assert_eq!(view.leaderboard[0].distance_covered, 1500.0 + 5000.0);
    }

    #[test]
    fn test_swim_segment_dots() {
        let view = LiveEngine::default().compute(&race(), minutes(15));
        let swim = &view.segments[0];
        assert_eq!(swim.discipline, Discipline::Swim);
        assert_eq!(swim.waiting, vec![athlete_id(3)]);
        // Ada's swim exit is recorded, so she sits on the finish whatever the clock says.
        assert_eq!(swim.dots[0].participant_id, athlete_id(1));
        assert_eq!(swim.dots[0].rank, 1);
        assert_eq!(swim.dots[1].rank, 2);
        assert_eq!(swim.dots[1].distance_covered, 750.0);
        assert_eq!(swim.dots[1].point, RoutePoint::new(50.0, 0.0));
        assert_eq!(swim.dots[1].color, CheckpointType::SwimStart.color());
    }

    #[test]
    fn test_finished_swim_sits_on_final_vertex() {
        let view = LiveEngine::default().compute(&race(), minutes(40));
        let ada = &view.segments[0].dots[0];
        assert_eq!(ada.status, DotStatus::Finished);
        assert_eq!(ada.distance_covered, 1500.0);
        assert_eq!(ada.point, RoutePoint::new(100.0, 0.0));
        // Drawn in the swim exit colour, not the T1 colour of her latest crossing.
        assert_eq!(ada.color, CheckpointType::SwimEnd.color());
        assert_eq!(view.segments[1].dots[0].color, CheckpointType::T1End.color());
    }

    #[test]
    fn test_bike_dot_carries_band() {
        let view = LiveEngine::default().compute(&race(), minutes(40));
        let bike = &view.segments[1];
        assert_eq!(bike.dots.len(), 1);
        let band = bike.dots[0].band.as_ref().unwrap();
        assert!(band.slow.distance_covered < band.fast.distance_covered);
        assert_eq!(bike.waiting, vec![athlete_id(2), athlete_id(3)]);
    }

    #[test]
    fn test_transition_between_disciplines() {
        let snap = snapshot(
            vec![athlete(1, "Ada")],
            vec![
                crossing(1, CheckpointType::SwimStart, GUN),
                crossing(1, CheckpointType::SwimEnd, minutes(28)),
            ],
        );
        let view = LiveEngine::default().compute(&snap, minutes(29));
        assert_eq!(view.leaderboard[0].status, RaceStatus::Transition);
        assert_eq!(view.leaderboard[0].distance_covered, 1500.0);
        assert_eq!(view.leaderboard[0].last_checkpoint, Some(CheckpointType::SwimEnd));
        assert!(view.segments[1].dots.is_empty());
    }

    #[test]
    fn test_bike_mid_split_reanchors() {
        let snap = snapshot(
            vec![athlete(1, "Ada")],
            vec![
                crossing(1, CheckpointType::SwimStart, GUN),
                crossing(1, CheckpointType::SwimEnd, minutes(28)),
                crossing(1, CheckpointType::T1End, minutes(30)),
                crossing(1, CheckpointType::BikeMid, minutes(60)),
            ],
        );
        // 20 km logged at the split, then 40 km per 80 minutes for 8 more minutes.
        let view = LiveEngine::default().compute(&snap, minutes(68));
        let bike = &view.segments[1].dots[0];
        assert!((bike.distance_covered - 24_000.0).abs() < 1e-6);
        assert_eq!(bike.color, CheckpointType::BikeMid.color());
        let band = bike.band.as_ref().unwrap();
        assert!(band.slow.distance_covered > 20_000.0);
    }

    #[test]
    fn test_compute_is_deterministic_and_monotonic() {
        let engine = LiveEngine::default();
        let snap = race();
        assert_eq!(engine.compute(&snap, minutes(33)), engine.compute(&snap, minutes(33)));

        let mut previous = 0.0;
        for m in 0..200 {
            let view = engine.compute(&snap, minutes(m));
            let ben = view
                .leaderboard
                .iter()
                .find(|e| e.participant_id == athlete_id(2))
                .unwrap();
            assert!(ben.distance_covered >= previous);
            previous = ben.distance_covered;
        }
    }

    #[test]
    fn test_missing_prediction_is_not_started() {
        let mut ada = athlete(1, "Ada");
        ada.predicted.swim = Some("soon".into());
        let snap = snapshot(vec![ada], vec![crossing(1, CheckpointType::SwimStart, GUN)]);
        let view = LiveEngine::default().compute(&snap, minutes(10));
        assert!(view.segments[0].dots.is_empty());
        assert_eq!(view.segments[0].waiting, vec![athlete_id(1)]);
        // The race status still follows the recorded crossing.
        assert_eq!(view.leaderboard[0].status, RaceStatus::Swim);
    }

    #[test]
    fn test_deviation_report_for_athlete() {
        let engine = LiveEngine::default();
        let report = engine.deviations(&race(), athlete_id(1)).unwrap();
        assert_eq!(report.rows[0].difference_formatted, "-00:02:00");
        assert!(report.rows[1].result.is_none());
        assert!(engine.deviations(&race(), Uuid::nil()).is_none());
    }

    #[test]
    fn test_status_after_checkpoint() {
        assert_eq!(RaceStatus::after(CheckpointType::SwimEnd), RaceStatus::Transition);
        assert_eq!(RaceStatus::after(CheckpointType::BikeMid), RaceStatus::Bike);
        assert_eq!(RaceStatus::after(CheckpointType::T2End), RaceStatus::Run);
        assert_eq!(RaceStatus::after(CheckpointType::Finish), RaceStatus::Finished);
    }
}
