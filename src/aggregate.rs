//! Aggregation: scope reduction and granularity bucketing.
//!
//! Scope reduction sums samples sharing a timestamp at campus or building
//! level (room scope is the unfiltered per-room series). Granularity
//! bucketing sums into hour/day/week/month/year buckets with the reference
//! windows (hourly = last 24 h, daily = last 7 days, weekly = last 4 weeks,
//! monthly and yearly unwindowed). Every summed value is rounded to
//! 1 decimal at the point of aggregation.
//!
//! Empty input scopes yield empty sequences, never errors.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::campus::CampusStructure;
use crate::model::{AggregatedPoint, Granularity, Sample, Scope, SeriesPoint, UsageSummary, round1};

/// Campus-wide series: all samples sharing a timestamp, summed.
pub fn campus_series(samples: &[Sample]) -> Vec<SeriesPoint> {
    let mut by_timestamp: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for sample in samples {
        *by_timestamp.entry(sample.timestamp).or_insert(0.0) += sample.consumption;
    }

    by_timestamp
        .into_iter()
        .map(|(timestamp, consumption)| SeriesPoint {
            timestamp,
            consumption: round1(consumption),
            location: None,
        })
        .collect()
}

/// One building's series: its rooms' samples summed per timestamp.
///
/// A building with zero matching samples yields an empty series.
pub fn building_series(
    samples: &[Sample],
    campus: &CampusStructure,
    building_id: &str,
) -> Vec<SeriesPoint> {
    let location = campus.building_by_id(building_id).map(|b| b.name.clone());

    let mut by_timestamp: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for sample in samples {
        if campus.room_in_building(&sample.room_id, building_id) {
            *by_timestamp.entry(sample.timestamp).or_insert(0.0) += sample.consumption;
        }
    }

    by_timestamp
        .into_iter()
        .map(|(timestamp, consumption)| SeriesPoint {
            timestamp,
            consumption: round1(consumption),
            location: location.clone(),
        })
        .collect()
}

/// One room's raw series, chronologically sorted.
pub fn room_series(samples: &[Sample], room_id: &str) -> Vec<SeriesPoint> {
    let mut series: Vec<SeriesPoint> = samples
        .iter()
        .filter(|s| s.room_id == room_id)
        .map(|s| SeriesPoint {
            timestamp: s.timestamp,
            consumption: s.consumption,
            location: Some(s.room_name.clone()),
        })
        .collect();
    series.sort_by_key(|p| p.timestamp);
    series
}

/// Resolve a scope to its detection series.
pub fn scope_series(
    samples: &[Sample],
    campus: &CampusStructure,
    scope: &Scope,
) -> Vec<SeriesPoint> {
    match scope {
        Scope::Campus => campus_series(samples),
        Scope::Building(id) => building_series(samples, campus, id),
        Scope::Room(id) => room_series(samples, id),
    }
}

/// The bucket key a sample falls into for a granularity.
///
/// Keys are zero-padded ISO-like strings, so lexicographic comparison is
/// chronological comparison.
fn bucket_key(sample: &Sample, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hourly => sample.timestamp.to_rfc3339(),
        Granularity::Daily => sample.day.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            // Sunday-anchored week start.
            let week_start = sample.day.week(Weekday::Sun).first_day();
            week_start.format("%Y-%m-%d").to_string()
        }
        Granularity::Monthly => sample.day.format("%Y-%m").to_string(),
        Granularity::Yearly => sample.day.format("%Y").to_string(),
    }
}

/// The rolling window applied before bucketing, if the granularity has one.
fn window_start(granularity: Granularity, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match granularity {
        Granularity::Hourly => Some(now - Duration::hours(24)),
        Granularity::Daily => Some(now - Duration::days(7)),
        Granularity::Weekly => Some(now - Duration::days(28)),
        Granularity::Monthly | Granularity::Yearly => None,
    }
}

/// Aggregate samples at a scope and granularity into ordered bucket totals.
///
/// `now` anchors the rolling windows; passing it explicitly keeps the
/// function pure and the output reproducible.
pub fn aggregate(
    samples: &[Sample],
    campus: &CampusStructure,
    scope: &Scope,
    granularity: Granularity,
    now: DateTime<Utc>,
) -> Vec<AggregatedPoint> {
    let since = window_start(granularity, now);

    let in_scope = |sample: &Sample| match scope {
        Scope::Campus => true,
        Scope::Building(id) => campus.room_in_building(&sample.room_id, id),
        Scope::Room(id) => sample.room_id == *id,
    };

    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for sample in samples {
        if let Some(since) = since {
            if sample.timestamp < since {
                continue;
            }
        }
        if !in_scope(sample) {
            continue;
        }
        *buckets.entry(bucket_key(sample, granularity)).or_insert(0.0) += sample.consumption;
    }

    let (building_id, room_id) = match scope {
        Scope::Campus => (None, None),
        Scope::Building(id) => (Some(id.clone()), None),
        Scope::Room(id) => (None, Some(id.clone())),
    };

    buckets
        .into_iter()
        .map(|(bucket, consumption)| AggregatedPoint {
            bucket,
            consumption: round1(consumption),
            building_id: building_id.clone(),
            room_id: room_id.clone(),
        })
        .collect()
}

/// Summary statistics over a scope series; `None` when the series is empty.
pub fn usage_summary(series: &[SeriesPoint]) -> Option<UsageSummary> {
    if series.is_empty() {
        return None;
    }

    let total: f64 = series.iter().map(|p| p.consumption).sum();
    let average = total / series.len() as f64;
    let max = series.iter().map(|p| p.consumption).fold(f64::MIN, f64::max);
    let min = series.iter().map(|p| p.consumption).fold(f64::MAX, f64::min);

    // Average per hour of day, then pick the peak.
    let mut hourly: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for point in series {
        let entry = hourly.entry(point.hour()).or_insert((0.0, 0));
        entry.0 += point.consumption;
        entry.1 += 1;
    }

    let mut peak_hour = 0;
    let mut peak_hour_average = 0.0;
    for (hour, (sum, count)) in hourly {
        let avg = sum / f64::from(count);
        if avg > peak_hour_average {
            peak_hour_average = avg;
            peak_hour = hour;
        }
    }

    Some(UsageSummary {
        total: round1(total),
        average: round1(average),
        max: round1(max),
        min: round1(min),
        peak_hour,
        peak_hour_average: round1(peak_hour_average),
    })
}

/// Total consumption for one building over a granularity window.
#[derive(Debug, Clone, Serialize)]
pub struct BuildingTotal {
    pub building_id: String,
    pub building_name: String,
    pub consumption: f64,
}

/// Total consumption for one room over a granularity window.
#[derive(Debug, Clone, Serialize)]
pub struct RoomTotal {
    pub room_id: String,
    pub room_name: String,
    pub consumption: f64,
}

/// Per-building totals for the breakdown view, sorted descending.
///
/// Buildings with no samples in the window appear with zero consumption.
pub fn building_totals(
    samples: &[Sample],
    campus: &CampusStructure,
    granularity: Granularity,
    now: DateTime<Utc>,
) -> Vec<BuildingTotal> {
    let mut totals: Vec<BuildingTotal> = campus
        .buildings
        .iter()
        .map(|building| {
            let consumption: f64 = aggregate(
                samples,
                campus,
                &Scope::Building(building.id.clone()),
                granularity,
                now,
            )
            .iter()
            .map(|p| p.consumption)
            .sum();

            BuildingTotal {
                building_id: building.id.clone(),
                building_name: building.name.clone(),
                consumption: round1(consumption),
            }
        })
        .collect();

    totals.sort_by(|a, b| b.consumption.total_cmp(&a.consumption));
    totals
}

/// Per-room totals within one building, sorted descending.
///
/// An unknown building yields an empty list.
pub fn room_totals(
    samples: &[Sample],
    campus: &CampusStructure,
    building_id: &str,
    granularity: Granularity,
    now: DateTime<Utc>,
) -> Vec<RoomTotal> {
    let Some(building) = campus.building_by_id(building_id) else {
        return Vec::new();
    };

    let mut totals: Vec<RoomTotal> = building
        .rooms
        .iter()
        .map(|room| {
            let consumption: f64 = aggregate(
                samples,
                campus,
                &Scope::Room(room.id.clone()),
                granularity,
                now,
            )
            .iter()
            .map(|p| p.consumption)
            .sum();

            RoomTotal {
                room_id: room.id.clone(),
                room_name: room.name.clone(),
                consumption: round1(consumption),
            }
        })
        .collect();

    totals.sort_by(|a, b| b.consumption.total_cmp(&a.consumption));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn sample(time: &str, consumption: f64, room_id: &str) -> Sample {
        Sample::new(ts(time), consumption, room_id, room_id)
    }

    #[test]
    fn test_campus_series_sums_per_timestamp() {
        let samples = vec![
            sample("2024-03-07T10:00:00Z", 5.0, "eng-lab1"),
            sample("2024-03-07T10:00:00Z", 7.0, "lib-admin"),
            sample("2024-03-07T11:00:00Z", 3.0, "eng-lab1"),
        ];

        let series = campus_series(&samples);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].consumption, 12.0);
        assert_eq!(series[1].consumption, 3.0);
        assert!(series[0].timestamp < series[1].timestamp);
    }

    #[test]
    fn test_building_series_filters_rooms() {
        let campus = CampusStructure::default();
        let samples = vec![
            sample("2024-03-07T10:00:00Z", 5.0, "eng-lab1"),
            sample("2024-03-07T10:00:00Z", 7.0, "lib-admin"),
        ];

        let series = building_series(&samples, &campus, "engineering");

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].consumption, 5.0);
        assert_eq!(series[0].location.as_deref(), Some("Engineering Block"));
    }

    #[test]
    fn test_empty_building_yields_empty_series() {
        let campus = CampusStructure::default();
        let samples = vec![sample("2024-03-07T10:00:00Z", 5.0, "eng-lab1")];

        assert!(building_series(&samples, &campus, "hostel").is_empty());
        assert!(
            aggregate(
                &samples,
                &campus,
                &Scope::Building("hostel".to_string()),
                Granularity::Daily,
                ts("2024-03-07T12:00:00Z"),
            )
            .is_empty()
        );
    }

    #[test]
    fn test_hourly_aggregation_conserves_sum() {
        let campus = CampusStructure::default();
        let now = ts("2024-03-07T12:00:00Z");
        let samples = vec![
            sample("2024-03-07T09:00:00Z", 5.2, "eng-lab1"),
            sample("2024-03-07T09:00:00Z", 4.4, "lib-admin"),
            sample("2024-03-07T10:00:00Z", 6.1, "eng-lab1"),
        ];

        let points = aggregate(&samples, &campus, &Scope::Campus, Granularity::Hourly, now);

        let input_sum: f64 = samples.iter().map(|s| s.consumption).sum();
        let output_sum: f64 = points.iter().map(|p| p.consumption).sum();
        let tolerance = 0.1 * points.len() as f64;
        assert!((input_sum - output_sum).abs() <= tolerance);
    }

    #[test]
    fn test_hourly_window_excludes_old_samples() {
        let campus = CampusStructure::default();
        let now = ts("2024-03-07T12:00:00Z");
        let samples = vec![
            sample("2024-03-05T09:00:00Z", 50.0, "eng-lab1"),
            sample("2024-03-07T10:00:00Z", 6.0, "eng-lab1"),
        ];

        let points = aggregate(&samples, &campus, &Scope::Campus, Granularity::Hourly, now);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].consumption, 6.0);
    }

    #[test]
    fn test_daily_buckets_sorted_and_rounded() {
        let campus = CampusStructure::default();
        let now = ts("2024-03-07T23:00:00Z");
        let samples = vec![
            sample("2024-03-07T10:00:00Z", 1.25, "eng-lab1"),
            sample("2024-03-06T10:00:00Z", 2.0, "eng-lab1"),
            sample("2024-03-07T11:00:00Z", 1.11, "eng-lab1"),
        ];

        let points = aggregate(&samples, &campus, &Scope::Campus, Granularity::Daily, now);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].bucket, "2024-03-06");
        assert_eq!(points[1].bucket, "2024-03-07");
        assert_eq!(points[1].consumption, 2.4); // 2.36 rounded
    }

    #[test]
    fn test_weekly_bucket_is_sunday_anchored() {
        // 2024-03-07 is a Thursday; its week starts Sunday 2024-03-03.
        let s = sample("2024-03-07T10:00:00Z", 1.0, "eng-lab1");
        assert_eq!(bucket_key(&s, Granularity::Weekly), "2024-03-03");

        // A Sunday is its own week start.
        let s = sample("2024-03-03T10:00:00Z", 1.0, "eng-lab1");
        assert_eq!(bucket_key(&s, Granularity::Weekly), "2024-03-03");
    }

    #[test]
    fn test_monthly_and_yearly_keys() {
        let s = sample("2024-03-07T10:00:00Z", 1.0, "eng-lab1");
        assert_eq!(bucket_key(&s, Granularity::Monthly), "2024-03");
        assert_eq!(bucket_key(&s, Granularity::Yearly), "2024");
        assert_eq!(s.day, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    }

    #[test]
    fn test_bucket_ordering_is_monotonic() {
        let campus = CampusStructure::default();
        let now = ts("2024-03-07T23:00:00Z");
        let samples: Vec<Sample> = (1..=6)
            .map(|d| sample(&format!("2024-03-0{d}T10:00:00Z"), 1.0, "eng-lab1"))
            .collect();

        for granularity in [
            Granularity::Hourly,
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Yearly,
        ] {
            let points = aggregate(&samples, &campus, &Scope::Campus, granularity, now);
            for pair in points.windows(2) {
                assert!(pair[0].bucket < pair[1].bucket);
            }
        }
    }

    #[test]
    fn test_usage_summary_empty_is_none() {
        assert!(usage_summary(&[]).is_none());
    }

    #[test]
    fn test_usage_summary_peak_hour() {
        let series = vec![
            SeriesPoint {
                timestamp: ts("2024-03-06T09:00:00Z"),
                consumption: 10.0,
                location: None,
            },
            SeriesPoint {
                timestamp: ts("2024-03-07T09:00:00Z"),
                consumption: 20.0,
                location: None,
            },
            SeriesPoint {
                timestamp: ts("2024-03-07T14:00:00Z"),
                consumption: 40.0,
                location: None,
            },
        ];

        let summary = usage_summary(&series).unwrap();

        assert_eq!(summary.total, 70.0);
        assert_eq!(summary.max, 40.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.peak_hour, 14);
        assert_eq!(summary.peak_hour_average, 40.0);
    }

    #[test]
    fn test_building_totals_sorted_descending() {
        let campus = CampusStructure::default();
        let now = ts("2024-03-07T12:00:00Z");
        let samples = vec![
            sample("2024-03-07T10:00:00Z", 5.0, "eng-lab1"),
            sample("2024-03-07T10:00:00Z", 50.0, "lib-admin"),
        ];

        let totals = building_totals(&samples, &campus, Granularity::Daily, now);

        assert_eq!(totals.len(), 4);
        assert_eq!(totals[0].building_id, "library");
        assert_eq!(totals[0].consumption, 50.0);
        assert_eq!(totals[3].consumption, 0.0);
    }

    #[test]
    fn test_room_totals_unknown_building_empty() {
        let campus = CampusStructure::default();
        let now = ts("2024-03-07T12:00:00Z");
        assert!(room_totals(&[], &campus, "no-such", Granularity::Daily, now).is_empty());
    }
}
