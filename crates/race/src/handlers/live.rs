//! Live view, leaderboard and deviation handlers.

use axum::{
    Extension,
    extract::{Path, Query},
    response::Json,
};
use serde::Deserialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    deviation::DeviationReport,
    errors::AppError,
    live::{LeaderboardEntry, LiveEngine, LiveView},
    poller::LiveFeed,
    store::SharedStore,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LiveQuery {
    /// RFC 3339 instant to compute the view at. Defaults to now.
    pub at: Option<String>,
}

impl LiveQuery {
    fn instant(&self, clock: &SharedClock) -> Result<OffsetDateTime, AppError> {
        match self.at.as_deref() {
            Some(raw) => OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|_| AppError::InvalidTimestamp(raw.to_string())),
            None => Ok(clock.now()),
        }
    }
}

/// Projected positions, per-discipline dots and the overall leaderboard.
///
/// Without `at`, a race followed by the background poller is answered from its
/// last published view.
#[utoipa::path(
    get,
    path = "/races/{id}/live",
    tag = "live",
    params(
        ("id" = Uuid, Path, description = "Race template ID"),
        LiveQuery
    ),
    responses(
        (status = 200, description = "Live race state", body = LiveView),
        (status = 400, description = "Invalid timestamp"),
        (status = 404, description = "Race not found")
    )
)]
pub async fn get_live_view(
    Extension(store): Extension<SharedStore>,
    Extension(clock): Extension<SharedClock>,
    Extension(engine): Extension<LiveEngine>,
    Extension(feed): Extension<Option<LiveFeed>>,
    Path(id): Path<Uuid>,
    Query(query): Query<LiveQuery>,
) -> Result<Json<LiveView>, AppError> {
    if query.at.is_none() {
        if let Some(view) = feed.as_ref().and_then(|feed| feed.latest(id)) {
            return Ok(Json(LiveView::clone(&view)));
        }
    }
    let at = query.instant(&clock)?;
    let snapshot = store.load_snapshot(id).await?;
    Ok(Json(engine.compute(&snapshot, at)))
}

/// Overall standings right now; athletes yet to start come last with rank 0.
#[utoipa::path(
    get,
    path = "/races/{id}/leaderboard",
    tag = "live",
    params(
        ("id" = Uuid, Path, description = "Race template ID")
    ),
    responses(
        (status = 200, description = "Overall leaderboard", body = Vec<LeaderboardEntry>),
        (status = 404, description = "Race not found")
    )
)]
pub async fn get_leaderboard(
    Extension(store): Extension<SharedStore>,
    Extension(clock): Extension<SharedClock>,
    Extension(engine): Extension<LiveEngine>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let snapshot = store.load_snapshot(id).await?;
    Ok(Json(engine.compute(&snapshot, clock.now()).leaderboard))
}

/// Predicted versus actual discipline times for one athlete.
#[utoipa::path(
    get,
    path = "/races/{id}/athletes/{athlete_id}/deviations",
    tag = "live",
    params(
        ("id" = Uuid, Path, description = "Race template ID"),
        ("athlete_id" = Uuid, Path, description = "Athlete ID")
    ),
    responses(
        (status = 200, description = "Deviation report", body = DeviationReport),
        (status = 404, description = "Race or athlete not found")
    )
)]
pub async fn get_athlete_deviations(
    Extension(store): Extension<SharedStore>,
    Extension(engine): Extension<LiveEngine>,
    Path((id, athlete_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeviationReport>, AppError> {
    let snapshot = store.load_snapshot(id).await?;
    let report = engine
        .deviations(&snapshot, athlete_id)
        .ok_or(AppError::NotFound)?;
    Ok(Json(report))
}
