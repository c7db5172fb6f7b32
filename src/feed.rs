//! The unified cross-scope alert feed.
//!
//! Runs the alert-profile detector over the campus series, every building's
//! series, and every room's series, normalizes the results into one shape,
//! and sorts them into a single feed: severity first, most recent first,
//! with ties keeping campus -> buildings -> rooms concatenation order.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::aggregate::{building_series, campus_series, room_series};
use crate::detect::{DetectorConfig, detect_alerts};
use crate::model::{AlertFeedEntry, AnomalyRecord, ScopeKind, SeriesPoint};
use crate::store::SampleStore;

/// Scope metadata attached to a batch of raw anomaly records.
struct ScopeMeta<'a> {
    scope: ScopeKind,
    entity_id: Option<&'a str>,
    location: &'a str,
    fallback_timestamp: Option<DateTime<Utc>>,
}

/// Normalize one scope's anomalies into feed entries.
///
/// The id is `scope:entity:kind:unix-timestamp:ordinal`; the ordinal keeps
/// same-type same-timestamp duplicates unique, and every other component is
/// an enum slug or structure id, so identical inputs always produce
/// identical ids.
fn normalize(alerts: Vec<AnomalyRecord>, meta: &ScopeMeta<'_>) -> Vec<AlertFeedEntry> {
    let fallback = meta.fallback_timestamp.unwrap_or_else(Utc::now);

    alerts
        .into_iter()
        .enumerate()
        .map(|(index, alert)| {
            let timestamp = alert.timestamp.unwrap_or(fallback);
            let entity = meta.entity_id.unwrap_or("campus");
            let id = format!(
                "{}:{}:{}:{}:{}",
                meta.scope.slug(),
                entity,
                alert.kind.slug(),
                timestamp.timestamp(),
                index
            );

            AlertFeedEntry {
                id,
                scope: meta.scope,
                entity_id: meta.entity_id.map(str::to_string),
                location: alert
                    .location
                    .unwrap_or_else(|| meta.location.to_string()),
                timestamp,
                kind: alert.kind,
                severity: alert.severity,
                message: alert.message,
                recommendation: alert.recommendation,
                evidence: alert.evidence,
            }
        })
        .collect()
}

fn last_timestamp(series: &[SeriesPoint]) -> Option<DateTime<Utc>> {
    series.last().map(|p| p.timestamp)
}

/// Build the unified alert feed across campus, building, and room scopes.
///
/// An empty store yields an empty feed. Each scope's series is detected
/// independently, so a room-level anomaly only shows up at building level
/// if the building's aggregated series crosses the threshold on its own.
pub fn build_feed(store: &SampleStore, config: &DetectorConfig) -> Vec<AlertFeedEntry> {
    if store.is_empty() {
        return Vec::new();
    }

    let samples = store.samples();
    let campus = store.campus();

    let series = campus_series(samples);
    let mut feed = normalize(
        detect_alerts(&series, config),
        &ScopeMeta {
            scope: ScopeKind::Campus,
            entity_id: None,
            location: "Campus",
            fallback_timestamp: last_timestamp(&series),
        },
    );

    for building in &campus.buildings {
        let series = building_series(samples, campus, &building.id);
        feed.extend(normalize(
            detect_alerts(&series, config),
            &ScopeMeta {
                scope: ScopeKind::Building,
                entity_id: Some(&building.id),
                location: &building.name,
                fallback_timestamp: last_timestamp(&series),
            },
        ));
    }

    for room in campus.rooms() {
        let series = room_series(samples, &room.id);
        feed.extend(normalize(
            detect_alerts(&series, config),
            &ScopeMeta {
                scope: ScopeKind::Room,
                entity_id: Some(&room.id),
                location: &room.name,
                fallback_timestamp: last_timestamp(&series),
            },
        ));
    }

    // Stable sort: ties keep campus -> buildings -> rooms order.
    feed.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });

    debug!(alert_count = feed.len(), "Alert feed built");
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campus::CampusStructure;
    use crate::model::{Sample, Severity};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn sample(time: &str, consumption: f64, room_id: &str, room_name: &str) -> Sample {
        Sample::new(ts(time), consumption, room_id, room_name)
    }

    /// A dataset where one room spikes hard enough to alert at room scope.
    fn spiky_store() -> SampleStore {
        let campus = CampusStructure::default();
        let mut samples = Vec::new();

        // A quiet working-hours baseline for two rooms in one building.
        for day in 4..8 {
            for hour in 8..18 {
                let time = format!("2024-03-{day:02}T{hour:02}:00:00Z");
                samples.push(sample(&time, 10.0, "eng-lab1", "Computer Lab 1"));
                samples.push(sample(&time, 10.0, "eng-lab2", "Electronics Lab"));
            }
        }

        // One reading far above the lab's mean.
        samples.push(sample(
            "2024-03-07T15:00:00Z",
            200.0,
            "eng-lab1",
            "Computer Lab 1",
        ));

        SampleStore::new(campus, samples)
    }

    #[test]
    fn test_empty_store_empty_feed() {
        let store = SampleStore::new(CampusStructure::default(), vec![]);
        assert!(build_feed(&store, &DetectorConfig::basic()).is_empty());
    }

    #[test]
    fn test_feed_is_deterministic() {
        let store = spiky_store();
        let config = DetectorConfig::basic();

        let first = build_feed(&store, &config);
        let second = build_feed(&store, &config);

        assert!(!first.is_empty());
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.timestamp, b.timestamp);
        }
    }

    #[test]
    fn test_feed_ordering() {
        let feed = build_feed(&spiky_store(), &DetectorConfig::basic());

        for pair in feed.windows(2) {
            let rank_a = pair[0].severity.rank();
            let rank_b = pair[1].severity.rank();
            assert!(rank_a <= rank_b);
            if rank_a == rank_b {
                assert!(pair[0].timestamp >= pair[1].timestamp);
            }
        }
    }

    #[test]
    fn test_room_spike_reported_at_room_scope() {
        let feed = build_feed(&spiky_store(), &DetectorConfig::basic());

        let room_spikes: Vec<_> = feed
            .iter()
            .filter(|e| e.scope == ScopeKind::Room && e.entity_id.as_deref() == Some("eng-lab1"))
            .collect();
        assert!(!room_spikes.is_empty());
        assert_eq!(room_spikes[0].severity, Severity::High);
        assert_eq!(room_spikes[0].location, "Computer Lab 1");
    }

    #[test]
    fn test_scope_isolation() {
        // 200 kWh over a 10 kWh room baseline spikes the room, but summed
        // with its sibling room the building series may or may not cross
        // the threshold on its own; the room alert must not be copied up.
        let feed = build_feed(&spiky_store(), &DetectorConfig::basic());

        let building_entries: Vec<_> = feed
            .iter()
            .filter(|e| e.scope == ScopeKind::Building)
            .collect();

        // Building mean is 25 with one 220 reading, so the building series
        // does cross 1.5x independently here. What must hold is that the
        // building entry is its own detection, tagged with building
        // identity, not a copy of the room alert.
        for entry in building_entries {
            assert_eq!(entry.entity_id.as_deref(), Some("engineering"));
            assert_eq!(entry.location, "Engineering Block");
        }
    }

    #[test]
    fn test_quiet_building_produces_no_entries() {
        let feed = build_feed(&spiky_store(), &DetectorConfig::basic());
        assert!(
            !feed
                .iter()
                .any(|e| e.entity_id.as_deref() == Some("hostel"))
        );
    }

    #[test]
    fn test_ids_unique() {
        let feed = build_feed(&spiky_store(), &DetectorConfig::basic());
        let mut ids: Vec<&str> = feed.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), feed.len());
    }
}
