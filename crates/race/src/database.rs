use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{Athlete, Checkpoint, RaceTemplate, RecordedTime, UpsertOutcome},
    snapshot::RaceSnapshot,
    store::RaceStore,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_template(&self, id: Uuid) -> Result<Option<RaceTemplate>, AppError> {
        let template = sqlx::query_as(
            r#"
            SELECT id, name, swim_distance_km, bike_distance_km, run_distance_km,
                   swim_route, bike_route, run_route
            FROM race_templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    pub async fn get_checkpoints(&self, template_id: Uuid) -> Result<Vec<Checkpoint>, AppError> {
        let checkpoints = sqlx::query_as(
            r#"
            SELECT id, template_id, checkpoint_type, order_index, distance_km
            FROM checkpoints
            WHERE template_id = $1
            ORDER BY order_index
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(checkpoints)
    }

    pub async fn get_athletes(&self, template_id: Uuid) -> Result<Vec<Athlete>, AppError> {
        let athletes = sqlx::query_as(
            r#"
            SELECT id, template_id, name, predicted_swim, predicted_bike, predicted_run
            FROM athletes
            WHERE template_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(athletes)
    }

    pub async fn get_recorded_times(&self, template_id: Uuid) -> Result<Vec<RecordedTime>, AppError> {
        let times = sqlx::query_as(
            r#"
            SELECT rt.athlete_id, rt.checkpoint_id, rt.actual_timestamp
            FROM recorded_times rt
            JOIN checkpoints c ON c.id = rt.checkpoint_id
            WHERE c.template_id = $1
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(times)
    }
}

#[async_trait]
impl RaceStore for Database {
    async fn load_snapshot(&self, template_id: Uuid) -> Result<RaceSnapshot, AppError> {
        let template = self
            .get_template(template_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let checkpoints = self.get_checkpoints(template_id).await?;
        let athletes = self.get_athletes(template_id).await?;
        let times = self.get_recorded_times(template_id).await?;

        Ok(RaceSnapshot::new(template, checkpoints, athletes, times))
    }

    async fn upsert_recorded_time(
        &self,
        template_id: Uuid,
        time: RecordedTime,
    ) -> Result<UpsertOutcome, AppError> {
        // xmax is zero only for freshly inserted rows.
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO recorded_times (athlete_id, checkpoint_id, actual_timestamp)
            SELECT $1, c.id, $3
            FROM checkpoints c
            WHERE c.id = $2 AND c.template_id = $4
            ON CONFLICT (athlete_id, checkpoint_id)
            DO UPDATE SET actual_timestamp = EXCLUDED.actual_timestamp, updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(time.athlete_id)
        .bind(time.checkpoint_id)
        .bind(time.actual_timestamp)
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(true) => Ok(UpsertOutcome::Inserted),
            Some(false) => Ok(UpsertOutcome::Corrected),
            None => Err(AppError::NotFound),
        }
    }

    async fn delete_recorded_time(
        &self,
        template_id: Uuid,
        athlete_id: Uuid,
        checkpoint_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM recorded_times rt
            USING checkpoints c
            WHERE rt.checkpoint_id = c.id
              AND c.template_id = $1
              AND rt.athlete_id = $2
              AND rt.checkpoint_id = $3
            "#,
        )
        .bind(template_id)
        .bind(athlete_id)
        .bind(checkpoint_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
