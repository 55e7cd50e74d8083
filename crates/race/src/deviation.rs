//! Predicted-versus-actual analytics for completed disciplines.
//!
//! Deviations are computed only from recorded start and finish crossings; a
//! missing crossing makes the deviation absent rather than zero.

use enum_map::EnumMap;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    checkpoint::Discipline,
    timing::{SENTINEL, elapsed_seconds, format_duration, format_signed},
};

/// Lifecycle of one athlete on one discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPhase {
    NotStarted,
    InProgress,
    Completed,
}

impl SegmentPhase {
    /// A recorded finish completes the segment for good; corrections move the
    /// timestamp but never the phase.
    pub fn from_times(start: Option<OffsetDateTime>, finish: Option<OffsetDateTime>) -> Self {
        match (start, finish) {
            (_, Some(_)) => SegmentPhase::Completed,
            (Some(_), None) => SegmentPhase::InProgress,
            (None, None) => SegmentPhase::NotStarted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Direction {
    #[serde(rename = "faster")]
    Faster,
    #[serde(rename = "slower")]
    Slower,
    #[serde(rename = "on-pace")]
    OnPace,
}

impl Direction {
    pub fn from_difference(difference_seconds: i64) -> Self {
        match difference_seconds.signum() {
            -1 => Direction::Faster,
            1 => Direction::Slower,
            _ => Direction::OnPace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviationResult {
    pub actual_elapsed: i64,
    pub predicted_elapsed: i64,
    /// Actual minus predicted; negative is ahead of prediction.
    pub difference_seconds: i64,
    pub direction: Direction,
}

/// Compares a recorded segment against its prediction.
///
/// `None` unless both crossings are recorded and a prediction exists.
pub fn analyze(
    start: Option<OffsetDateTime>,
    finish: Option<OffsetDateTime>,
    predicted_seconds: Option<u32>,
) -> Option<DeviationResult> {
    let (start, finish) = (start?, finish?);
    let predicted_elapsed = i64::from(predicted_seconds.filter(|p| *p > 0)?);
    let actual_elapsed = elapsed_seconds(start, finish);
    let difference_seconds = actual_elapsed - predicted_elapsed;
    Some(DeviationResult {
        actual_elapsed,
        predicted_elapsed,
        difference_seconds,
        direction: Direction::from_difference(difference_seconds),
    })
}

/// Shifts the original predicted total by the deviations of completed
/// segments. In-progress segments have no deviation and contribute nothing.
pub fn adjusted_predicted_total<'a>(
    original_total_seconds: u64,
    completed: impl IntoIterator<Item = &'a DeviationResult>,
) -> i64 {
    let shift: i64 = completed.into_iter().map(|d| d.difference_seconds).sum();
    original_total_seconds as i64 + shift
}

/// What is known about one athlete on one discipline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SegmentTimes {
    pub start: Option<OffsetDateTime>,
    pub finish: Option<OffsetDateTime>,
    pub predicted_seconds: Option<u32>,
    pub distance_meters: f64,
}

/// One line of the deviation table.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeviationRow {
    pub segment: Discipline,
    pub phase: SegmentPhase,
    pub predicted: String,
    pub actual: String,
    pub difference_formatted: String,
    pub direction: Option<Direction>,
    pub predicted_pace: Option<String>,
    pub actual_pace: Option<String>,
    pub result: Option<DeviationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeviationReport {
    pub participant_id: Uuid,
    pub name: String,
    pub rows: Vec<DeviationRow>,
    pub original_predicted_total: String,
    pub adjusted_predicted_total: String,
    /// Sum of completed deviations, signed.
    pub adjustment: String,
    /// Swim start plus the adjusted total, once the swim start is recorded.
    #[serde(with = "time::serde::rfc3339::option")]
    pub projected_finish: Option<OffsetDateTime>,
}

pub fn build_report(
    participant_id: Uuid,
    name: &str,
    segments: &EnumMap<Discipline, SegmentTimes>,
) -> DeviationReport {
    let mut rows = Vec::with_capacity(Discipline::ALL.len());
    let mut completed = Vec::new();
    let mut original_total: u64 = 0;

    for (discipline, times) in segments {
        let predicted_seconds = times.predicted_seconds.filter(|p| *p > 0);
        if let Some(p) = predicted_seconds {
            original_total += u64::from(p);
        }
        let result = analyze(times.start, times.finish, predicted_seconds);
        if let Some(r) = result {
            completed.push(r);
        }
        let pace = discipline.pace();

        rows.push(DeviationRow {
            segment: discipline,
            phase: SegmentPhase::from_times(times.start, times.finish),
            predicted: predicted_seconds
                .map(|p| format_duration(u64::from(p)))
                .unwrap_or_else(|| SENTINEL.to_string()),
            actual: result
                .and_then(|r| u64::try_from(r.actual_elapsed).ok())
                .map(format_duration)
                .unwrap_or_else(|| SENTINEL.to_string()),
            difference_formatted: result
                .map(|r| format_signed(r.difference_seconds))
                .unwrap_or_else(|| SENTINEL.to_string()),
            direction: result.map(|r| r.direction),
            predicted_pace: predicted_seconds
                .and_then(|p| pace.format(times.distance_meters, f64::from(p))),
            actual_pace: result
                .and_then(|r| pace.format(times.distance_meters, r.actual_elapsed as f64)),
            result,
        });
    }

    let adjusted = adjusted_predicted_total(original_total, &completed);
    let adjustment = adjusted - original_total as i64;
    let projected_finish = segments[Discipline::Swim]
        .start
        .filter(|_| original_total > 0)
        .map(|start| start + Duration::seconds(adjusted));

    DeviationReport {
        participant_id,
        name: name.to_string(),
        rows,
        original_predicted_total: format_duration(original_total),
        adjusted_predicted_total: format_signed(adjusted)
            .trim_start_matches('+')
            .to_string(),
        adjustment: format_signed(adjustment),
        projected_finish,
    }
}
