//! Fluent builder for constructing race scenarios.

use std::time::Instant;

use rand::Rng;
use race::{
    checkpoint::{CheckpointType, Discipline},
    models::{Checkpoint, RaceTemplate, RecordedTime},
    snapshot::RaceSnapshot,
    store::{MemoryStore, RaceStore},
};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use crate::config::{Course, SkillDistribution};
use crate::db::{SeedError, Seeder};
use crate::generators::{
    athlete::{AthleteGenConfig, AthleteGenerator},
    route::RouteGenerator,
    timing::{TimingGenConfig, TimingGenerator},
};

/// A generated race: its data as of the cutoff, plus every crossing the race
/// will eventually produce.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Template, checkpoints, athletes and the crossings recorded up to the cutoff.
    pub snapshot: RaceSnapshot,
    /// All crossings of the race, ordered by time.
    pub timeline: Vec<RecordedTime>,
    pub gun: OffsetDateTime,
    /// Metrics from scenario generation (populated if metrics tracking enabled).
    pub metrics: Option<ScenarioMetrics>,
}

impl Scenario {
    pub fn template_id(&self) -> Uuid {
        self.snapshot.template.id
    }

    /// Crossings with `from < timestamp <= to`.
    pub fn crossings_between(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> impl Iterator<Item = &RecordedTime> + '_ {
        self.timeline
            .iter()
            .filter(move |t| t.actual_timestamp > from && t.actual_timestamp <= to)
    }

    /// When the last athlete crosses the finish, if anyone finishes at all.
    pub fn last_crossing(&self) -> Option<OffsetDateTime> {
        self.timeline.last().map(|t| t.actual_timestamp)
    }

    /// Loads the race into an in-memory store with no crossings, for replaying
    /// the timeline tick by tick.
    pub async fn seed_memory_empty(&self, store: &MemoryStore) {
        let mut snapshot = self.snapshot.clone();
        snapshot.recorded = Default::default();
        store.insert_race(snapshot).await;
    }

    /// Records the timeline crossings in `(from, to]` through any store.
    pub async fn replay(
        &self,
        store: &dyn RaceStore,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<usize, race::errors::AppError> {
        let mut count = 0;
        for time in self.crossings_between(from, to) {
            store.upsert_recorded_time(self.template_id(), *time).await?;
            count += 1;
        }
        Ok(count)
    }
}

/// Performance metrics from scenario generation.
#[derive(Debug, Clone)]
pub struct ScenarioMetrics {
    /// Time spent generating data (milliseconds).
    pub generation_time_ms: u64,
    /// Time spent seeding database (milliseconds, 0 if build_data used).
    pub seeding_time_ms: u64,
    pub athlete_count: usize,
    /// Crossings recorded up to the cutoff.
    pub recorded_count: usize,
    /// Crossings in the full timeline.
    pub timeline_count: usize,
}

/// Builder for creating complete race scenarios.
///
/// # Example
///
/// ```rust,ignore
/// let scenario = ScenarioBuilder::new()
///     .with_course(Course::OLYMPIC)
///     .with_athletes(40)
///     .with_cutoff(Duration::minutes(95))
///     .build(&pool, &mut rng)
///     .await?;
/// ```
pub struct ScenarioBuilder {
    course: Course,
    athlete_count: usize,
    athlete_config: AthleteGenConfig,
    timing_config: TimingGenConfig,
    gun: OffsetDateTime,
    /// Only crossings up to `gun + cutoff` are recorded in the snapshot.
    cutoff: Option<Duration>,
    track_metrics: bool,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    /// Creates a new scenario builder with default settings.
    pub fn new() -> Self {
        Self {
            course: Course::OLYMPIC,
            athlete_count: 20,
            athlete_config: AthleteGenConfig::default(),
            timing_config: TimingGenConfig::default(),
            gun: datetime!(2026-06-01 07:00:00 UTC),
            cutoff: None,
            track_metrics: false,
        }
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.course = course;
        self
    }

    /// Sets the number of athletes to generate.
    pub fn with_athletes(mut self, count: usize) -> Self {
        self.athlete_count = count;
        self
    }

    /// Sets the skill distribution for predicted times.
    pub fn with_skill_distribution(mut self, dist: SkillDistribution) -> Self {
        self.athlete_config.skill_distribution = dist;
        self
    }

    pub fn with_athlete_config(mut self, config: AthleteGenConfig) -> Self {
        self.athlete_config = config;
        self
    }

    pub fn with_timing_config(mut self, config: TimingGenConfig) -> Self {
        self.timing_config = config;
        self
    }

    /// Sets the start gun time.
    pub fn with_gun(mut self, gun: OffsetDateTime) -> Self {
        self.gun = gun;
        self
    }

    /// Records only crossings up to `elapsed` after the gun.
    pub fn with_cutoff(mut self, elapsed: Duration) -> Self {
        self.cutoff = Some(elapsed);
        self
    }

    /// Enables metrics tracking.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.track_metrics = enabled;
        self
    }

    /// Generates the scenario without touching any database.
    pub fn build_data(&self, rng: &mut impl Rng) -> Scenario {
        let started = self.track_metrics.then(Instant::now);

        let template_id = random_uuid(rng);
        let routes = RouteGenerator::new();
        let template = RaceTemplate {
            id: template_id,
            name: self.course.name.to_string(),
            swim_distance_km: self.course.swim.distance_km,
            bike_distance_km: self.course.bike.distance_km,
            run_distance_km: self.course.run.distance_km,
            swim_route: routes.generate(&self.course.swim, rng),
            bike_route: routes.generate(&self.course.bike, rng),
            run_route: routes.generate(&self.course.run, rng),
        };
        let checkpoints = self.checkpoints(template_id, rng);

        let athlete_gen = AthleteGenerator::with_config(self.athlete_config.clone());
        let athletes =
            athlete_gen.generate_batch(template_id, &self.course, self.athlete_count, rng);

        let timing_gen = TimingGenerator::with_config(self.timing_config.clone());
        let mut timeline: Vec<RecordedTime> = athletes
            .iter()
            .flat_map(|athlete| {
                timing_gen.generate(
                    athlete,
                    &checkpoints,
                    &self.course,
                    self.gun,
                    |d| athlete_gen.config().reference_seconds(&self.course, d),
                    rng,
                )
            })
            .collect();
        timeline.sort_by_key(|t| t.actual_timestamp);

        let cutoff = self.cutoff.map(|c| self.gun + c);
        let recorded: Vec<RecordedTime> = timeline
            .iter()
            .filter(|t| cutoff.is_none_or(|c| t.actual_timestamp <= c))
            .copied()
            .collect();

        let metrics = started.map(|s| ScenarioMetrics {
            generation_time_ms: s.elapsed().as_millis() as u64,
            seeding_time_ms: 0,
            athlete_count: athletes.len(),
            recorded_count: recorded.len(),
            timeline_count: timeline.len(),
        });

        Scenario {
            snapshot: RaceSnapshot::new(template, checkpoints, athletes, recorded),
            timeline,
            gun: self.gun,
            metrics,
        }
    }

    /// Generates the scenario and seeds it into Postgres.
    pub async fn build(&self, pool: &PgPool, rng: &mut impl Rng) -> Result<Scenario, SeedError> {
        let mut scenario = self.build_data(rng);

        let started = Instant::now();
        let seeder = Seeder::new(pool.clone());
        // Same seed, same ids: start from a clean race
        seeder.clear_race(scenario.template_id()).await?;
        seeder.seed_scenario(&scenario).await?;
        if let Some(metrics) = scenario.metrics.as_mut() {
            metrics.seeding_time_ms = started.elapsed().as_millis() as u64;
        }

        Ok(scenario)
    }

    /// Every checkpoint type in course order; mid splits only where the course has one.
    fn checkpoints(&self, template_id: Uuid, rng: &mut impl Rng) -> Vec<Checkpoint> {
        let mid = |discipline: Discipline| self.course.leg(discipline).mid_split_km;
        let types = [
            (CheckpointType::SwimStart, None),
            (CheckpointType::SwimEnd, None),
            (CheckpointType::T1End, None),
            (CheckpointType::BikeMid, mid(Discipline::Bike)),
            (CheckpointType::T2End, None),
            (CheckpointType::RunMid, mid(Discipline::Run)),
            (CheckpointType::Finish, None),
        ];

        types
            .into_iter()
            .filter(|(t, km)| t.is_segment_boundary() || km.is_some())
            .enumerate()
            .map(|(i, (checkpoint_type, distance_km))| Checkpoint {
                id: random_uuid(rng),
                template_id,
                checkpoint_type,
                order_index: i as i32,
                distance_km,
            })
            .collect()
    }

    // ========================================================================
    // Pre-built scenarios
    // ========================================================================

    /// A sprint race caught halfway: some athletes on the bike, some running.
    pub fn sprint_race() -> Self {
        Self::new()
            .with_course(Course::SPRINT)
            .with_athletes(12)
            .with_cutoff(Duration::minutes(45))
    }

    /// An olympic-distance race with a full field, before the gun.
    pub fn olympic_race() -> Self {
        Self::new()
            .with_course(Course::OLYMPIC)
            .with_athletes(40)
            .with_cutoff(Duration::ZERO)
    }

    /// A race where predictions and crossings go missing.
    pub fn patchy_data_race() -> Self {
        Self::new()
            .with_course(Course::SPRINT)
            .with_athletes(15)
            .with_athlete_config(AthleteGenConfig {
                missing_prediction_rate: 0.1,
                ..Default::default()
            })
            .with_timing_config(TimingGenConfig {
                missed_crossing_rate: 0.1,
                ..Default::default()
            })
            .with_cutoff(Duration::minutes(60))
    }
}

fn random_uuid(rng: &mut impl Rng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid()
}
