//! Athlete generation with predicted discipline durations.

use fake::{Fake, faker::name::en::Name};
use rand::Rng;
use race::{
    checkpoint::Discipline,
    models::{Athlete, PredictedDurations},
    timing::format_duration,
};
use uuid::Uuid;

use crate::config::{Course, SkillDistribution};

/// Configuration for athlete generation.
#[derive(Debug, Clone)]
pub struct AthleteGenConfig {
    /// Distribution of performance levels.
    pub skill_distribution: SkillDistribution,
    /// Reference swim pace, seconds per 100 m.
    pub swim_pace_per_100m: f64,
    /// Reference bike speed, km/h.
    pub bike_speed_kmh: f64,
    /// Reference run pace, seconds per km.
    pub run_pace_per_km: f64,
    /// Probability that a prediction is left blank.
    pub missing_prediction_rate: f64,
}

impl Default for AthleteGenConfig {
    fn default() -> Self {
        Self {
            skill_distribution: SkillDistribution::power_law(),
            swim_pace_per_100m: 120.0,
            bike_speed_kmh: 30.0,
            run_pace_per_km: 300.0,
            missing_prediction_rate: 0.0,
        }
    }
}

impl AthleteGenConfig {
    /// Reference-athlete time for `discipline` on `course`, in seconds.
    pub fn reference_seconds(&self, course: &Course, discipline: Discipline) -> f64 {
        let km = course.leg(discipline).distance_km;
        match discipline {
            Discipline::Swim => km * 10.0 * self.swim_pace_per_100m,
            Discipline::Bike => km / self.bike_speed_kmh * 3600.0,
            Discipline::Run => km * self.run_pace_per_km,
        }
    }
}

/// Generates race entrants for testing.
pub struct AthleteGenerator {
    config: AthleteGenConfig,
}

impl AthleteGenerator {
    /// Creates a new athlete generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: AthleteGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: AthleteGenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AthleteGenConfig {
        &self.config
    }

    /// Generates a single athlete entered in `template_id`.
    ///
    /// One skill factor is drawn per athlete and shared across disciplines,
    /// with a small per-discipline spread so swimmers and runners differ.
    pub fn generate(&self, template_id: Uuid, course: &Course, rng: &mut impl Rng) -> Athlete {
        let id = uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid();
        let name: String = Name().fake_with_rng(rng);
        let skill = self.config.skill_distribution.sample_factor(rng);

        let mut predict = |discipline: Discipline| -> Option<String> {
            if rng.r#gen::<f64>() < self.config.missing_prediction_rate {
                return None;
            }
            let spread = rng.gen_range(0.92..1.08);
            let seconds = self.config.reference_seconds(course, discipline) * skill * spread;
            Some(format_duration(seconds.round() as u64))
        };

        Athlete {
            id,
            template_id,
            name,
            predicted: PredictedDurations {
                swim: predict(Discipline::Swim),
                bike: predict(Discipline::Bike),
                run: predict(Discipline::Run),
            },
        }
    }

    /// Generates `count` athletes.
    pub fn generate_batch(
        &self,
        template_id: Uuid,
        course: &Course,
        count: usize,
        rng: &mut impl Rng,
    ) -> Vec<Athlete> {
        (0..count)
            .map(|_| self.generate(template_id, course, rng))
            .collect()
    }
}

impl Default for AthleteGenerator {
    fn default() -> Self {
        Self::new()
    }
}
