//! Database seeding utilities.

use race::{
    checkpoint::Discipline,
    models::{Athlete, Checkpoint, RaceTemplate, RecordedTime},
};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::builders::Scenario;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Route drawing could not be encoded: {0}")]
    Route(#[from] serde_json::Error),
}

/// Database seeder for inserting generated test data.
pub struct Seeder {
    pool: PgPool,
    batch_size: usize,
}

impl Seeder {
    /// Creates a new seeder with the given database pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: 50,
        }
    }

    /// Seeds a whole scenario: template, checkpoints, athletes and the
    /// crossings recorded so far.
    pub async fn seed_scenario(&self, scenario: &Scenario) -> Result<(), SeedError> {
        let snapshot = &scenario.snapshot;
        self.seed_template(&snapshot.template).await?;
        self.seed_checkpoints(&snapshot.checkpoints).await?;
        self.seed_athletes(&snapshot.athletes).await?;
        let recorded: Vec<RecordedTime> = snapshot.recorded.iter().collect();
        self.seed_recorded_times(&recorded).await?;
        Ok(())
    }

    /// Seeds a race template.
    pub async fn seed_template(&self, template: &RaceTemplate) -> Result<(), SeedError> {
        info!("Seeding race template {}", template.name);

        sqlx::query(
            r#"
            INSERT INTO race_templates (id, name, swim_distance_km, bike_distance_km,
                                        run_distance_km, swim_route, bike_route, run_route)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.swim_distance_km)
        .bind(template.bike_distance_km)
        .bind(template.run_distance_km)
        .bind(serde_json::to_value(template.drawing(Discipline::Swim))?)
        .bind(serde_json::to_value(template.drawing(Discipline::Bike))?)
        .bind(serde_json::to_value(template.drawing(Discipline::Run))?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seeds checkpoints.
    pub async fn seed_checkpoints(&self, checkpoints: &[Checkpoint]) -> Result<(), SeedError> {
        for checkpoint in checkpoints {
            sqlx::query(
                r#"
                INSERT INTO checkpoints (id, template_id, checkpoint_type, order_index, distance_km)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(checkpoint.id)
            .bind(checkpoint.template_id)
            .bind(checkpoint.checkpoint_type)
            .bind(checkpoint.order_index)
            .bind(checkpoint.distance_km)
            .execute(&self.pool)
            .await?;
        }

        info!("Seeded {} checkpoints", checkpoints.len());
        Ok(())
    }

    /// Seeds athletes.
    pub async fn seed_athletes(&self, athletes: &[Athlete]) -> Result<(), SeedError> {
        info!("Seeding {} athletes...", athletes.len());

        for chunk in athletes.chunks(self.batch_size) {
            self.insert_athlete_batch(chunk).await?;
        }

        info!("Seeded {} athletes", athletes.len());
        Ok(())
    }

    /// Inserts a batch of athletes.
    async fn insert_athlete_batch(&self, athletes: &[Athlete]) -> Result<(), SeedError> {
        for athlete in athletes {
            sqlx::query(
                r#"
                INSERT INTO athletes (id, template_id, name, predicted_swim, predicted_bike,
                                      predicted_run, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, NOW())
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(athlete.id)
            .bind(athlete.template_id)
            .bind(&athlete.name)
            .bind(athlete.predicted.raw(Discipline::Swim))
            .bind(athlete.predicted.raw(Discipline::Bike))
            .bind(athlete.predicted.raw(Discipline::Run))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Seeds recorded crossings, overwriting earlier times for the same pair.
    pub async fn seed_recorded_times(&self, times: &[RecordedTime]) -> Result<(), SeedError> {
        info!("Seeding {} recorded times...", times.len());

        for (i, time) in times.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO recorded_times (athlete_id, checkpoint_id, actual_timestamp)
                VALUES ($1, $2, $3)
                ON CONFLICT (athlete_id, checkpoint_id)
                DO UPDATE SET actual_timestamp = EXCLUDED.actual_timestamp, updated_at = NOW()
                "#,
            )
            .bind(time.athlete_id)
            .bind(time.checkpoint_id)
            .bind(time.actual_timestamp)
            .execute(&self.pool)
            .await?;

            if (i + 1) % self.batch_size == 0 {
                info!("  Seeded {}/{} recorded times", i + 1, times.len());
            }
        }

        info!("Seeded {} recorded times", times.len());
        Ok(())
    }

    /// Removes a race and everything hanging off it.
    pub async fn clear_race(&self, template_id: Uuid) -> Result<(), SeedError> {
        sqlx::query("DELETE FROM race_templates WHERE id = $1")
            .bind(template_id)
            .execute(&self.pool)
            .await?;
        info!("Cleared race {template_id}");
        Ok(())
    }
}
