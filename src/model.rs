//! Data models for Wattscope.
//!
//! Everything here is a plain value: samples, aggregated points, anomaly
//! records, and alert feed entries are created fresh on each pipeline run
//! and never mutated. The only long-lived structure is the
//! [`crate::store::SampleStore`] owned by the calling application.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Round a kWh value to 1 decimal place.
///
/// This is the system's defined precision: every summed consumption value
/// is rounded at the point of aggregation, not only at display time.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One energy observation: a room's consumption for one hour.
///
/// `hour` and `day` are derived from the timestamp at construction so that
/// detectors and aggregators never re-parse dates in their inner loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// When the observation was taken (UTC, hour-aligned in practice).
    pub timestamp: DateTime<Utc>,

    /// Consumption in kWh. Non-negative.
    pub consumption: f64,

    /// Identifier of the room the meter belongs to.
    pub room_id: String,

    /// Display label for the room.
    pub room_name: String,

    /// Hour of day (0-23), derived from `timestamp`.
    pub hour: u32,

    /// Calendar date, derived from `timestamp`.
    pub day: NaiveDate,
}

impl Sample {
    /// Build a sample, deriving `hour` and `day` from the timestamp.
    pub fn new(
        timestamp: DateTime<Utc>,
        consumption: f64,
        room_id: impl Into<String>,
        room_name: impl Into<String>,
    ) -> Self {
        Self {
            hour: timestamp.hour(),
            day: timestamp.date_naive(),
            timestamp,
            consumption,
            room_id: room_id.into(),
            room_name: room_name.into(),
        }
    }
}

/// Ingestion-boundary shape for a sample, with a string timestamp.
///
/// Used when an external caller supplies a dataset (POST /samples).
/// Records with unparseable timestamps or negative consumption are dropped
/// silently: degenerate input is never an error in this system.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    /// RFC 3339 timestamp string.
    pub timestamp: String,

    /// Consumption in kWh.
    pub consumption: f64,

    /// Room identifier.
    pub room_id: String,

    /// Optional display label; defaults to the room id.
    #[serde(default)]
    pub room_name: Option<String>,
}

impl RawSample {
    /// Parse into a [`Sample`], or `None` if the record is malformed.
    pub fn parse(self) -> Option<Sample> {
        if !self.consumption.is_finite() || self.consumption < 0.0 {
            return None;
        }
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()?
            .with_timezone(&Utc);
        let room_name = self.room_name.unwrap_or_else(|| self.room_id.clone());
        Some(Sample::new(timestamp, self.consumption, self.room_id, room_name))
    }
}

/// One point of a scope series fed to the anomaly detectors.
///
/// Scope reduction (campus/building sums, room pass-through) produces these;
/// they keep only what detection needs: a timestamp, a consumption value,
/// and an optional display location for alert messages.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub consumption: f64,
    pub location: Option<String>,
}

impl SeriesPoint {
    /// Hour of day (0-23).
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// One granularity bucket's total consumption.
///
/// Bucket keys are zero-padded ISO-like strings (`2024-03-07T14:00:00+00:00`,
/// `2024-03-07`, `2024-03`, `2024`), so lexicographic order is chronological
/// order and scope+bucket uniquely identifies a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPoint {
    /// Bucket key (hour timestamp, day, week start, month, or year).
    pub bucket: String,

    /// Sum of constituent samples' consumption, rounded to 1 decimal.
    pub consumption: f64,

    /// Set when the point is scoped to a building.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,

    /// Set when the point is scoped to a room.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

/// Alert severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank: high alerts first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        })
    }
}

/// The kind of anomaly a detection rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    /// A single reading far above the scope's mean.
    Spike,
    /// Usage outside the 08:00-18:00 working window.
    AfterHours,
    /// Weekend usage out of proportion to weekday usage.
    Weekend,
    /// Sustained high deep-night load (idle equipment).
    WastefulPattern,
    /// Average consumption drifting upward over the period.
    BaselineCreep,
}

impl AnomalyKind {
    /// Wire slug, matching the serde representation.
    pub fn slug(&self) -> &'static str {
        match self {
            AnomalyKind::Spike => "spike",
            AnomalyKind::AfterHours => "after-hours",
            AnomalyKind::Weekend => "weekend",
            AnomalyKind::WastefulPattern => "wasteful-pattern",
            AnomalyKind::BaselineCreep => "baseline-creep",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::Spike => "Spike",
            AnomalyKind::AfterHours => "After-hours",
            AnomalyKind::Weekend => "Weekend",
            AnomalyKind::WastefulPattern => "Wasteful pattern",
            AnomalyKind::BaselineCreep => "Baseline creep",
        }
    }
}

impl FromStr for AnomalyKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spike" => Ok(AnomalyKind::Spike),
            "after-hours" => Ok(AnomalyKind::AfterHours),
            "weekend" => Ok(AnomalyKind::Weekend),
            "wasteful-pattern" => Ok(AnomalyKind::WastefulPattern),
            "baseline-creep" => Ok(AnomalyKind::BaselineCreep),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// Error for an unrecognized anomaly kind slug.
#[derive(Debug, Error)]
#[error("unknown anomaly kind '{0}'")]
pub struct ParseKindError(String);

/// Numeric evidence attached to an anomaly, one shape per rule.
///
/// This replaces the duck-typed "record with optional fields" of a loosely
/// typed implementation: downstream code reads waste and cost through the
/// accessors instead of probing synonymous field names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub enum AnomalyEvidence {
    /// A single sample above the spike threshold.
    Spike {
        consumption: f64,
        average: f64,
        percentage_above: f64,
    },

    /// A single after-hours sample above the expected level.
    AfterHoursSample { consumption: f64, hour: u32 },

    /// Aggregate after-hours excess over the working-hours mean.
    AfterHoursExcess {
        avg_working: f64,
        avg_after: f64,
        percentage_higher: f64,
        total_waste: f64,
        estimated_cost: f64,
    },

    /// Weekend usage out of proportion to weekday usage.
    WeekendExcess {
        avg_weekday: f64,
        avg_weekend: f64,
        percentage_of_weekday: f64,
        total_waste: f64,
        estimated_cost: f64,
    },

    /// Sustained deep-night load above the absolute threshold.
    NightLoad { avg_night: f64 },

    /// Upward drift between the first and second half of the period.
    Creep {
        avg_first: f64,
        avg_second: f64,
        percentage_increase: f64,
        extra_consumption: f64,
        estimated_cost: f64,
    },
}

impl AnomalyEvidence {
    /// Estimated wasted energy in kWh, when the rule quantifies one.
    pub fn waste_kwh(&self) -> Option<f64> {
        match self {
            AnomalyEvidence::AfterHoursExcess { total_waste, .. } => Some(*total_waste),
            AnomalyEvidence::WeekendExcess { total_waste, .. } => Some(*total_waste),
            AnomalyEvidence::Creep {
                extra_consumption, ..
            } => Some(*extra_consumption),
            _ => None,
        }
    }

    /// Estimated cost of the waste, when the rule quantifies one.
    pub fn estimated_cost(&self) -> Option<f64> {
        match self {
            AnomalyEvidence::AfterHoursExcess { estimated_cost, .. }
            | AnomalyEvidence::WeekendExcess { estimated_cost, .. }
            | AnomalyEvidence::Creep { estimated_cost, .. } => Some(*estimated_cost),
            _ => None,
        }
    }

    /// The triggering sample's consumption, for per-sample rules.
    pub fn consumption(&self) -> Option<f64> {
        match self {
            AnomalyEvidence::Spike { consumption, .. }
            | AnomalyEvidence::AfterHoursSample { consumption, .. } => Some(*consumption),
            _ => None,
        }
    }
}

/// One detected issue, produced fresh on every detection run.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyRecord {
    /// Which rule fired.
    #[serde(rename = "type")]
    pub kind: AnomalyKind,

    /// Severity per the rule's split.
    pub severity: Severity,

    /// Human-readable description.
    pub message: String,

    /// Suggested remediation, when the rule carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    /// When the triggering sample was observed, for per-sample rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Display location, when known at detection time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Rule-specific numeric evidence.
    pub evidence: AnomalyEvidence,
}

/// The spatial granularity of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Campus,
    Building,
    Room,
}

impl ScopeKind {
    /// Wire slug, matching the serde representation.
    pub fn slug(&self) -> &'static str {
        match self {
            ScopeKind::Campus => "campus",
            ScopeKind::Building => "building",
            ScopeKind::Room => "room",
        }
    }
}

impl FromStr for ScopeKind {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campus" => Ok(ScopeKind::Campus),
            "building" => Ok(ScopeKind::Building),
            "room" => Ok(ScopeKind::Room),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

/// Error for an unrecognized scope name.
#[derive(Debug, Error)]
#[error("unknown scope '{0}', expected campus, building, or room")]
pub struct ParseScopeError(String);

/// A fully resolved aggregation scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// All samples, summed per timestamp.
    Campus,
    /// Samples belonging to one building's rooms.
    Building(String),
    /// One room's raw series.
    Room(String),
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Campus => ScopeKind::Campus,
            Scope::Building(_) => ScopeKind::Building,
            Scope::Room(_) => ScopeKind::Room,
        }
    }
}

/// The temporal bucket size for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Per-hour buckets, windowed to the last 24 hours.
    Hourly,
    /// Per-day buckets, windowed to the last 7 days.
    Daily,
    /// Sunday-anchored week buckets, windowed to the last 4 weeks.
    Weekly,
    /// Calendar-month buckets, unwindowed.
    Monthly,
    /// Calendar-year buckets, unwindowed.
    Yearly,
}

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Granularity::Hourly),
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "yearly" => Ok(Granularity::Yearly),
            other => Err(ParseGranularityError(other.to_string())),
        }
    }
}

/// Error for an unrecognized granularity name.
#[derive(Debug, Error)]
#[error("unknown granularity '{0}', expected hourly, daily, weekly, monthly, or yearly")]
pub struct ParseGranularityError(String);

/// An anomaly record normalized into the cross-scope alert feed.
#[derive(Debug, Clone, Serialize)]
pub struct AlertFeedEntry {
    /// Deterministic id: `scope:entity:kind:unix-timestamp:ordinal`.
    ///
    /// Every component comes from a controlled vocabulary (enum slugs,
    /// structure ids, numeric timestamp), so the delimiter cannot collide
    /// with field content. Stable for identical inputs.
    pub id: String,

    /// Which scope's series produced the alert.
    pub scope: ScopeKind,

    /// Building or room id; `None` for campus-wide alerts.
    pub entity_id: Option<String>,

    /// Display name of the affected location.
    pub location: String,

    /// The alert time; defaulted to the scope series' latest sample time
    /// when the underlying anomaly has none.
    pub timestamp: DateTime<Utc>,

    /// Which rule fired.
    #[serde(rename = "type")]
    pub kind: AnomalyKind,

    pub severity: Severity,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    pub evidence: AnomalyEvidence,
}

/// Summary statistics over a scope series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    /// Total consumption, kWh.
    pub total: f64,

    /// Mean consumption per point, kWh.
    pub average: f64,

    /// Highest single point, kWh.
    pub max: f64,

    /// Lowest single point, kWh.
    pub min: f64,

    /// Hour of day (0-23) with the highest average consumption.
    pub peak_hour: u32,

    /// Average consumption during the peak hour, kWh.
    pub peak_hour_average: f64,
}
