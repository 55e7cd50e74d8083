//! HTTP request handlers for the race API.
//!
//! This module re-exports handlers from focused submodules organized by domain.

pub mod live;
pub mod openapi;
pub mod recorded_times;
pub mod stats;

// Re-export handlers from submodules (including utoipa __path types for OpenAPI)
pub use live::{
    __path_get_athlete_deviations, __path_get_leaderboard, __path_get_live_view, LiveQuery,
    get_athlete_deviations, get_leaderboard, get_live_view,
};
pub use openapi::{ApiDoc, openapi_json};
pub use recorded_times::{
    __path_delete_recorded_time, __path_put_recorded_time, RecordTimeRequest, RecordTimeResponse,
    delete_recorded_time, put_recorded_time,
};
pub use stats::{__path_health_check, health_check};
