//! Immutable view of one race's data, taken once per recomputation pass.

use std::collections::HashMap;

use enum_map::EnumMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    checkpoint::{CheckpointType, Discipline},
    models::{Athlete, Checkpoint, RaceTemplate, RecordedTime},
    route::Route,
};

/// Crossing times keyed by (athlete, checkpoint). Recording the same pair
/// again replaces the earlier time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedTimes {
    times: HashMap<(Uuid, Uuid), OffsetDateTime>,
}

impl RecordedTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a crossing, returning the time it replaced.
    pub fn upsert(&mut self, time: RecordedTime) -> Option<OffsetDateTime> {
        self.times
            .insert((time.athlete_id, time.checkpoint_id), time.actual_timestamp)
    }

    pub fn remove(&mut self, athlete_id: Uuid, checkpoint_id: Uuid) -> Option<OffsetDateTime> {
        self.times.remove(&(athlete_id, checkpoint_id))
    }

    pub fn get(&self, athlete_id: Uuid, checkpoint_id: Uuid) -> Option<OffsetDateTime> {
        self.times.get(&(athlete_id, checkpoint_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordedTime> + '_ {
        self.times
            .iter()
            .map(|(&(athlete_id, checkpoint_id), &actual_timestamp)| RecordedTime {
                athlete_id,
                checkpoint_id,
                actual_timestamp,
            })
    }
}

impl FromIterator<RecordedTime> for RecordedTimes {
    fn from_iter<I: IntoIterator<Item = RecordedTime>>(iter: I) -> Self {
        let mut times = RecordedTimes::new();
        for time in iter {
            times.upsert(time);
        }
        times
    }
}

/// Where a projection on one discipline starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionAnchor {
    pub at: OffsetDateTime,
    pub distance_offset_meters: f64,
    pub checkpoint_type: CheckpointType,
}

/// Everything the engine reads for one race.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceSnapshot {
    pub template: RaceTemplate,
    /// Sorted by `order_index`.
    pub checkpoints: Vec<Checkpoint>,
    pub athletes: Vec<Athlete>,
    pub recorded: RecordedTimes,
}

impl RaceSnapshot {
    pub fn new(
        template: RaceTemplate,
        mut checkpoints: Vec<Checkpoint>,
        athletes: Vec<Athlete>,
        recorded: impl IntoIterator<Item = RecordedTime>,
    ) -> Self {
        checkpoints.sort_by_key(|c| c.order_index);
        Self {
            template,
            checkpoints,
            athletes,
            recorded: recorded.into_iter().collect(),
        }
    }

    pub fn routes(&self) -> EnumMap<Discipline, Route> {
        EnumMap::from_fn(|d| self.template.route(d))
    }

    pub fn checkpoint(&self, checkpoint_id: Uuid) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.id == checkpoint_id)
    }

    pub fn athlete(&self, athlete_id: Uuid) -> Option<&Athlete> {
        self.athletes.iter().find(|a| a.id == athlete_id)
    }

    /// Recorded crossings of one athlete, in course order.
    pub fn crossings(
        &self,
        athlete_id: Uuid,
    ) -> impl Iterator<Item = (&Checkpoint, OffsetDateTime)> + '_ {
        self.checkpoints
            .iter()
            .filter_map(move |c| self.recorded.get(athlete_id, c.id).map(|t| (c, t)))
    }

    /// Crossing time at the first checkpoint of the given type.
    pub fn time_at(&self, athlete_id: Uuid, checkpoint_type: CheckpointType) -> Option<OffsetDateTime> {
        self.checkpoints
            .iter()
            .find(|c| c.checkpoint_type == checkpoint_type)
            .and_then(|c| self.recorded.get(athlete_id, c.id))
    }

    /// The furthest recorded crossing along the course.
    pub fn latest_crossing(&self, athlete_id: Uuid) -> Option<(&Checkpoint, OffsetDateTime)> {
        self.crossings(athlete_id).last()
    }

    /// Whether the athlete is past `discipline`: its finish, or anything after
    /// it, has been recorded.
    pub fn is_past(&self, athlete_id: Uuid, discipline: Discipline) -> bool {
        let finish = discipline.finish_checkpoint();
        self.crossings(athlete_id)
            .any(|(c, _)| c.checkpoint_type >= finish)
    }

    /// The crossing a projection on `discipline` should run from: the latest
    /// recorded mid-course split, falling back to the discipline start.
    pub fn projection_anchor(&self, athlete_id: Uuid, discipline: Discipline) -> Option<ProjectionAnchor> {
        let mid = self
            .crossings(athlete_id)
            .filter(|(c, _)| c.checkpoint_type.mid_of() == Some(discipline))
            .last()
            .map(|(c, at)| ProjectionAnchor {
                at,
                distance_offset_meters: c.distance_km.unwrap_or(0.0) * 1000.0,
                checkpoint_type: c.checkpoint_type,
            });

        mid.or_else(|| {
            let start = discipline.start_checkpoint();
            self.time_at(athlete_id, start).map(|at| ProjectionAnchor {
                at,
                distance_offset_meters: 0.0,
                checkpoint_type: start,
            })
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use time::Duration;

    #[test]
    fn test_recording_twice_overwrites() {
        let mut times = RecordedTimes::new();
        let first = crossing(1, CheckpointType::SwimStart, GUN);
        let corrected = crossing(1, CheckpointType::SwimStart, GUN + Duration::seconds(4));
        assert_eq!(times.upsert(first), None);
        assert_eq!(times.upsert(corrected), Some(GUN));
        assert_eq!(times.len(), 1);
        assert_eq!(
            times.get(athlete_id(1), checkpoint_id(CheckpointType::SwimStart)),
            Some(GUN + Duration::seconds(4))
        );
        assert_eq!(
            times.remove(athlete_id(1), checkpoint_id(CheckpointType::SwimStart)),
            Some(GUN + Duration::seconds(4))
        );
        assert!(times.is_empty());
    }

    #[test]
    fn test_checkpoints_sorted_on_construction() {
        let mut shuffled = checkpoints();
        shuffled.reverse();
        let snap = RaceSnapshot::new(template(), shuffled, vec![], vec![]);
        let order: Vec<_> = snap.checkpoints.iter().map(|c| c.order_index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_anchor_prefers_latest_mid_split() {
        let t1 = GUN + Duration::minutes(35);
        let mid = GUN + Duration::minutes(75);
        let snap = snapshot(
            vec![athlete(1, "Ada")],
            vec![
                crossing(1, CheckpointType::SwimStart, GUN),
                crossing(1, CheckpointType::SwimEnd, GUN + Duration::minutes(31)),
                crossing(1, CheckpointType::T1End, t1),
                crossing(1, CheckpointType::BikeMid, mid),
            ],
        );

        let anchor = snap.projection_anchor(athlete_id(1), Discipline::Bike).unwrap();
        assert_eq!(anchor.at, mid);
        assert_eq!(anchor.distance_offset_meters, 20_000.0);
        assert_eq!(anchor.checkpoint_type, CheckpointType::BikeMid);

        let swim = snap.projection_anchor(athlete_id(1), Discipline::Swim).unwrap();
        assert_eq!(swim.at, GUN);
        assert_eq!(swim.distance_offset_meters, 0.0);
        assert!(snap.projection_anchor(athlete_id(1), Discipline::Run).is_none());
    }

    #[test]
    fn test_is_past_tolerates_missed_finish() {
        // Swim exit was never recorded, but the athlete is already on the bike.
        let snap = snapshot(
            vec![athlete(1, "Ada")],
            vec![
                crossing(1, CheckpointType::SwimStart, GUN),
                crossing(1, CheckpointType::T1End, GUN + Duration::minutes(36)),
            ],
        );
        assert!(snap.is_past(athlete_id(1), Discipline::Swim));
        assert!(!snap.is_past(athlete_id(1), Discipline::Bike));
        let (latest, _) = snap.latest_crossing(athlete_id(1)).unwrap();
        assert_eq!(latest.checkpoint_type, CheckpointType::T1End);
    }
}
