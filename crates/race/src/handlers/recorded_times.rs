//! Timing desk handlers: record, correct and remove checkpoint crossings.

use axum::{
    Extension,
    extract::Path,
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    errors::AppError,
    models::{RecordedTime, UpsertOutcome},
    store::SharedStore,
    timing::parse_timestamp,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordTimeRequest {
    pub athlete_id: Uuid,
    pub checkpoint_id: Uuid,
    /// RFC 3339, or `HH:MM:SS` (UTC) on the current day.
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordTimeResponse {
    pub outcome: UpsertOutcome,
    pub recorded: RecordedTime,
}

/// Record a crossing, replacing any earlier time for the same athlete and checkpoint.
#[utoipa::path(
    put,
    path = "/races/{id}/recorded-times",
    tag = "recorded-times",
    params(
        ("id" = Uuid, Path, description = "Race template ID")
    ),
    request_body = RecordTimeRequest,
    responses(
        (status = 201, description = "Crossing recorded", body = RecordTimeResponse),
        (status = 200, description = "Existing crossing corrected", body = RecordTimeResponse),
        (status = 400, description = "Invalid timestamp or checkpoint"),
        (status = 404, description = "Race or athlete not found")
    )
)]
pub async fn put_recorded_time(
    Extension(store): Extension<SharedStore>,
    Extension(clock): Extension<SharedClock>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordTimeRequest>,
) -> Result<(StatusCode, Json<RecordTimeResponse>), AppError> {
    let snapshot = store.load_snapshot(id).await?;
    if snapshot.athlete(req.athlete_id).is_none() {
        return Err(AppError::NotFound);
    }
    let checkpoint = snapshot
        .checkpoint(req.checkpoint_id)
        .ok_or(AppError::UnknownCheckpoint(req.checkpoint_id))?;
    let actual_timestamp = parse_timestamp(&req.timestamp, clock.now().date())
        .ok_or_else(|| AppError::InvalidTimestamp(req.timestamp.clone()))?;

    let recorded = RecordedTime {
        athlete_id: req.athlete_id,
        checkpoint_id: req.checkpoint_id,
        actual_timestamp,
    };
    let outcome = store.upsert_recorded_time(id, recorded).await?;

    tracing::info!(
        race_id = %id,
        athlete_id = %recorded.athlete_id,
        checkpoint = ?checkpoint.checkpoint_type,
        ?outcome,
        "Recorded crossing"
    );

    let status = match outcome {
        UpsertOutcome::Inserted => StatusCode::CREATED,
        UpsertOutcome::Corrected => StatusCode::OK,
    };
    Ok((status, Json(RecordTimeResponse { outcome, recorded })))
}

/// Remove a recorded crossing.
#[utoipa::path(
    delete,
    path = "/races/{id}/recorded-times/{athlete_id}/{checkpoint_id}",
    tag = "recorded-times",
    params(
        ("id" = Uuid, Path, description = "Race template ID"),
        ("athlete_id" = Uuid, Path, description = "Athlete ID"),
        ("checkpoint_id" = Uuid, Path, description = "Checkpoint ID")
    ),
    responses(
        (status = 204, description = "Crossing removed"),
        (status = 404, description = "No such crossing")
    )
)]
pub async fn delete_recorded_time(
    Extension(store): Extension<SharedStore>,
    Path((id, athlete_id, checkpoint_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    if !store
        .delete_recorded_time(id, athlete_id, checkpoint_id)
        .await?
    {
        return Err(AppError::NotFound);
    }

    tracing::info!(race_id = %id, %athlete_id, %checkpoint_id, "Removed crossing");
    Ok(StatusCode::NO_CONTENT)
}
