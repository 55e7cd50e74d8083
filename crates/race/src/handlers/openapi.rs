//! OpenAPI document for the race API.

use axum::{http::header, response::IntoResponse};
use utoipa::OpenApi;

use crate::{
    checkpoint::{CheckpointType, Discipline},
    deviation::{DeviationReport, DeviationResult, DeviationRow, Direction, SegmentPhase},
    errors::AppError,
    live::{Dot, DotStatus, LeaderboardEntry, LiveView, RaceStatus, SegmentView},
    models::{RecordedTime, UpsertOutcome},
    route::{RouteBounds, RoutePoint},
    speed_band::{BandEdge, SpeedBand},
};

use super::{
    __path_delete_recorded_time, __path_get_athlete_deviations, __path_get_leaderboard,
    __path_get_live_view, __path_health_check, __path_put_recorded_time, RecordTimeRequest,
    RecordTimeResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Race API", description = "Live progress projection for swim/bike/run races"),
    paths(
        health_check,
        get_live_view,
        get_leaderboard,
        get_athlete_deviations,
        put_recorded_time,
        delete_recorded_time,
    ),
    components(schemas(
        LiveView,
        SegmentView,
        Dot,
        LeaderboardEntry,
        RaceStatus,
        DotStatus,
        Discipline,
        CheckpointType,
        RoutePoint,
        RouteBounds,
        SpeedBand,
        BandEdge,
        DeviationReport,
        DeviationRow,
        DeviationResult,
        Direction,
        SegmentPhase,
        RecordedTime,
        UpsertOutcome,
        RecordTimeRequest,
        RecordTimeResponse,
    ))
)]
pub struct ApiDoc;

/// Serves the OpenAPI document.
pub async fn openapi_json() -> Result<impl IntoResponse, AppError> {
    let body = ApiDoc::openapi().to_json().map_err(|e| {
        tracing::error!("Failed to serialize OpenAPI document: {e}");
        AppError::Internal
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
