//! Checkpoint crossing generation.
//!
//! Actual times follow each athlete's predictions, scaled by a day-form
//! factor so some athletes beat their prediction and others fall behind.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use race::{
    checkpoint::{CheckpointType, Discipline},
    models::{Athlete, Checkpoint, RecordedTime},
};
use time::{Duration, OffsetDateTime};

use crate::config::Course;

/// Configuration for crossing generation.
#[derive(Debug, Clone)]
pub struct TimingGenConfig {
    /// Coefficient of variation for day-form.
    pub day_form_variance: f64,
    /// Transition time range, seconds.
    pub transition_range: (f64, f64),
    /// Spread of the swim start behind the gun, seconds.
    pub start_spread: f64,
    /// Probability that a single crossing is missed by the timing desk.
    pub missed_crossing_rate: f64,
}

impl Default for TimingGenConfig {
    fn default() -> Self {
        Self {
            day_form_variance: 0.06,
            transition_range: (60.0, 180.0),
            start_spread: 20.0,
            missed_crossing_rate: 0.0,
        }
    }
}

/// Generates the crossings an athlete would produce over a race.
pub struct TimingGenerator {
    config: TimingGenConfig,
}

impl TimingGenerator {
    /// Creates a new timing generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: TimingGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: TimingGenConfig) -> Self {
        Self { config }
    }

    /// Full crossing timeline for one athlete, in course order.
    ///
    /// Disciplines without a usable prediction fall back to `fallback_seconds`.
    pub fn generate(
        &self,
        athlete: &Athlete,
        checkpoints: &[Checkpoint],
        course: &Course,
        gun: OffsetDateTime,
        fallback_seconds: impl Fn(Discipline) -> f64,
        rng: &mut impl Rng,
    ) -> Vec<RecordedTime> {
        let start = gun + seconds(rng.gen_range(0.0..=self.config.start_spread.max(0.0)));

        let mut durations = [0.0; 3];
        for (slot, discipline) in durations.iter_mut().zip(Discipline::ALL) {
            let predicted = athlete
                .predicted
                .seconds(discipline)
                .map(f64::from)
                .unwrap_or_else(|| fallback_seconds(discipline));
            *slot = predicted * self.sample_day_form(rng);
        }
        let [swim, bike, run] = durations;
        let (t_lo, t_hi) = self.config.transition_range;
        let t1 = rng.gen_range(t_lo..=t_hi.max(t_lo));
        let t2 = rng.gen_range(t_lo..=t_hi.max(t_lo));

        let swim_end = start + seconds(swim);
        let t1_end = swim_end + seconds(t1);
        let t2_end = t1_end + seconds(bike + t2);
        let finish = t2_end + seconds(run);

        let at = |checkpoint: &Checkpoint| -> OffsetDateTime {
            let mid = |from: OffsetDateTime, duration: f64, discipline: Discipline| {
                let leg_km = course.leg(discipline).distance_km;
                let fraction = match checkpoint.distance_km {
                    Some(km) if leg_km > 0.0 => (km / leg_km).clamp(0.0, 1.0),
                    _ => 0.5,
                };
                from + seconds(duration * fraction)
            };
            match checkpoint.checkpoint_type {
                CheckpointType::SwimStart => start,
                CheckpointType::SwimEnd => swim_end,
                CheckpointType::T1End => t1_end,
                CheckpointType::BikeMid => mid(t1_end, bike, Discipline::Bike),
                CheckpointType::T2End => t2_end,
                CheckpointType::RunMid => mid(t2_end, run, Discipline::Run),
                CheckpointType::Finish => finish,
            }
        };

        checkpoints
            .iter()
            .filter(|_| rng.r#gen::<f64>() >= self.config.missed_crossing_rate)
            .map(|checkpoint| RecordedTime {
                athlete_id: athlete.id,
                checkpoint_id: checkpoint.id,
                actual_timestamp: at(checkpoint),
            })
            .collect()
    }

    fn sample_day_form(&self, rng: &mut impl Rng) -> f64 {
        match Normal::new(1.0, self.config.day_form_variance) {
            Ok(normal) => normal.sample(rng).clamp(0.8, 1.3),
            Err(_) => 1.0,
        }
    }
}

impl Default for TimingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn seconds(value: f64) -> Duration {
    Duration::milliseconds((value * 1000.0).round() as i64)
}
