//! Checkpoint types, disciplines, and the table that drives per-type behaviour.

use std::{fmt, sync::LazyLock};

use enum_map::{Enum, EnumMap, enum_map};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the three timed disciplines of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Swim,
    Bike,
    Run,
}

impl Discipline {
    pub const ALL: [Discipline; 3] = [Discipline::Swim, Discipline::Bike, Discipline::Run];

    /// Checkpoint whose crossing starts this discipline.
    pub fn start_checkpoint(self) -> CheckpointType {
        match self {
            Discipline::Swim => CheckpointType::SwimStart,
            Discipline::Bike => CheckpointType::T1End,
            Discipline::Run => CheckpointType::T2End,
        }
    }

    /// Checkpoint whose crossing completes this discipline.
    pub fn finish_checkpoint(self) -> CheckpointType {
        match self {
            Discipline::Swim => CheckpointType::SwimEnd,
            Discipline::Bike => CheckpointType::T2End,
            Discipline::Run => CheckpointType::Finish,
        }
    }

    pub fn pace(self) -> PaceFormula {
        match self {
            Discipline::Swim => PaceFormula::PerHundredMeters,
            Discipline::Bike => PaceFormula::KilometersPerHour,
            Discipline::Run => PaceFormula::PerKilometer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::Swim => "swim",
            Discipline::Bike => "bike",
            Discipline::Run => "run",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named points in the race sequence where a crossing time can be recorded.
///
/// Variants are declared in course order, so `Ord` compares race progress.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Enum,
    Serialize,
    Deserialize,
    ToSchema,
    sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "checkpoint_type", rename_all = "snake_case")]
pub enum CheckpointType {
    SwimStart,
    SwimEnd,
    #[serde(rename = "t1_end")]
    #[sqlx(rename = "t1_end")]
    T1End,
    BikeMid,
    #[serde(rename = "t2_end")]
    #[sqlx(rename = "t2_end")]
    T2End,
    RunMid,
    Finish,
}

/// Static behaviour attached to a checkpoint type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointProfile {
    /// Marker colour used by the map renderer.
    pub color: &'static str,
    /// Discipline an athlete is on right after crossing, `None` in transition or after the finish.
    pub leads_into: Option<Discipline>,
    /// Whether the checkpoint starts or ends a discipline (mid-course splits do not).
    pub is_segment_boundary: bool,
}

static PROFILES: LazyLock<EnumMap<CheckpointType, CheckpointProfile>> = LazyLock::new(|| {
    enum_map! {
        CheckpointType::SwimStart => CheckpointProfile {
            color: "#0284c7",
            leads_into: Some(Discipline::Swim),
            is_segment_boundary: true,
        },
        CheckpointType::SwimEnd => CheckpointProfile {
            color: "#7c3aed",
            leads_into: None,
            is_segment_boundary: true,
        },
        CheckpointType::T1End => CheckpointProfile {
            color: "#16a34a",
            leads_into: Some(Discipline::Bike),
            is_segment_boundary: true,
        },
        CheckpointType::BikeMid => CheckpointProfile {
            color: "#22c55e",
            leads_into: Some(Discipline::Bike),
            is_segment_boundary: false,
        },
        CheckpointType::T2End => CheckpointProfile {
            color: "#ea580c",
            leads_into: Some(Discipline::Run),
            is_segment_boundary: true,
        },
        CheckpointType::RunMid => CheckpointProfile {
            color: "#f97316",
            leads_into: Some(Discipline::Run),
            is_segment_boundary: false,
        },
        CheckpointType::Finish => CheckpointProfile {
            color: "#dc2626",
            leads_into: None,
            is_segment_boundary: true,
        },
    }
});

impl CheckpointType {
    pub fn profile(self) -> CheckpointProfile {
        PROFILES[self]
    }

    pub fn color(self) -> &'static str {
        self.profile().color
    }

    pub fn is_segment_boundary(self) -> bool {
        self.profile().is_segment_boundary
    }

    /// The discipline this checkpoint splits mid-course, if it is a mid checkpoint.
    pub fn mid_of(self) -> Option<Discipline> {
        let profile = self.profile();
        if profile.is_segment_boundary {
            None
        } else {
            profile.leads_into
        }
    }
}

/// How a discipline expresses pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceFormula {
    /// `m:ss /100m`
    PerHundredMeters,
    /// `xx.x km/h`
    KilometersPerHour,
    /// `m:ss /km`
    PerKilometer,
}

impl PaceFormula {
    /// Formats the pace for covering `distance_meters` in `seconds`.
    pub fn format(self, distance_meters: f64, seconds: f64) -> Option<String> {
        if !(distance_meters > 0.0 && seconds > 0.0) {
            return None;
        }
        let formatted = match self {
            PaceFormula::PerHundredMeters => {
                format!("{} /100m", minutes_seconds(seconds * 100.0 / distance_meters))
            }
            PaceFormula::KilometersPerHour => {
                format!("{:.1} km/h", distance_meters / seconds * 3.6)
            }
            PaceFormula::PerKilometer => {
                format!("{} /km", minutes_seconds(seconds * 1000.0 / distance_meters))
            }
        };
        Some(formatted)
    }
}

fn minutes_seconds(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
