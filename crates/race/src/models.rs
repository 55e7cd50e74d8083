use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    checkpoint::{CheckpointType, Discipline},
    route::{Route, RouteDrawing},
    timing::try_parse_duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RaceTemplate {
    pub id: Uuid,
    pub name: String,
    pub swim_distance_km: f64,
    pub bike_distance_km: f64,
    pub run_distance_km: f64,
    #[sqlx(json)]
    pub swim_route: RouteDrawing,
    #[sqlx(json)]
    pub bike_route: RouteDrawing,
    #[sqlx(json)]
    pub run_route: RouteDrawing,
}

impl RaceTemplate {
    pub fn distance_km(&self, discipline: Discipline) -> f64 {
        match discipline {
            Discipline::Swim => self.swim_distance_km,
            Discipline::Bike => self.bike_distance_km,
            Discipline::Run => self.run_distance_km,
        }
    }

    pub fn drawing(&self, discipline: Discipline) -> &RouteDrawing {
        match discipline {
            Discipline::Swim => &self.swim_route,
            Discipline::Bike => &self.bike_route,
            Discipline::Run => &self.run_route,
        }
    }

    pub fn route(&self, discipline: Discipline) -> Route {
        Route::from_drawing(self.drawing(discipline), self.distance_km(discipline))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Checkpoint {
    pub id: Uuid,
    pub template_id: Uuid,
    pub checkpoint_type: CheckpointType,
    pub order_index: i32,
    /// Distance into the discipline, for mid-course checkpoints.
    pub distance_km: Option<f64>,
}

/// Predicted discipline durations as entered, `H:MM:SS`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PredictedDurations {
    #[sqlx(rename = "predicted_swim")]
    pub swim: Option<String>,
    #[sqlx(rename = "predicted_bike")]
    pub bike: Option<String>,
    #[sqlx(rename = "predicted_run")]
    pub run: Option<String>,
}

impl PredictedDurations {
    pub fn raw(&self, discipline: Discipline) -> Option<&str> {
        match discipline {
            Discipline::Swim => self.swim.as_deref(),
            Discipline::Bike => self.bike.as_deref(),
            Discipline::Run => self.run.as_deref(),
        }
    }

    /// Predicted seconds, or `None` when the entry is missing, malformed or zero.
    pub fn seconds(&self, discipline: Discipline) -> Option<u32> {
        let raw = self.raw(discipline)?;
        match try_parse_duration(raw) {
            Ok(0) => None,
            Ok(secs) => Some(secs),
            Err(e) => {
                tracing::debug!("Ignoring {discipline} prediction: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Athlete {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    #[sqlx(flatten)]
    #[serde(default)]
    pub predicted: PredictedDurations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecordedTime {
    pub athlete_id: Uuid,
    pub checkpoint_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub actual_timestamp: OffsetDateTime,
}

/// Whether a write created a crossing or corrected an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Corrected,
}
