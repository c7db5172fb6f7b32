//! The sample store: the dataset every core call operates over.
//!
//! There is no module-level singleton and no persistence. The calling
//! application owns one `SampleStore`, passes it into aggregation,
//! detection, and feed building, and replaces its samples wholesale on
//! each live-update tick or ingestion request.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::campus::CampusStructure;
use crate::model::{RawSample, Sample};

/// The canonical collection of energy samples plus the campus structure
/// they are scoped against.
#[derive(Debug, Clone)]
pub struct SampleStore {
    campus: CampusStructure,
    samples: Vec<Sample>,
}

impl SampleStore {
    /// Create a store over the given campus with an initial dataset.
    pub fn new(campus: CampusStructure, samples: Vec<Sample>) -> Self {
        Self { campus, samples }
    }

    pub fn campus(&self) -> &CampusStructure {
        &self.campus
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Replace the dataset wholesale (live tick or re-ingestion).
    pub fn replace_samples(&mut self, samples: Vec<Sample>) {
        self.samples = samples;
    }

    /// Replace the dataset from raw records, dropping malformed ones.
    ///
    /// Returns how many records were kept. Records with unparseable
    /// timestamps or negative consumption are filtered out silently.
    pub fn ingest(&mut self, raw: Vec<RawSample>) -> usize {
        let total = raw.len();
        let samples: Vec<Sample> = raw.into_iter().filter_map(RawSample::parse).collect();
        let kept = samples.len();
        if kept < total {
            debug!(dropped = total - kept, "Dropped malformed sample records");
        }
        self.samples = samples;
        kept
    }

    /// Samples belonging to one building's rooms, via the precomputed index.
    pub fn samples_for_building(&self, building_id: &str) -> Vec<&Sample> {
        self.samples
            .iter()
            .filter(|s| self.campus.room_in_building(&s.room_id, building_id))
            .collect()
    }

    /// One room's samples.
    pub fn samples_for_room(&self, room_id: &str) -> Vec<&Sample> {
        self.samples.iter().filter(|s| s.room_id == room_id).collect()
    }

    /// The most recent sample timestamp in the dataset, if any.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_building_and_room_filters() {
        let campus = CampusStructure::default();
        let samples = vec![
            Sample::new(ts("2024-03-07T10:00:00Z"), 5.0, "eng-lab1", "Computer Lab 1"),
            Sample::new(ts("2024-03-07T10:00:00Z"), 7.0, "lib-admin", "Admin Office"),
            Sample::new(ts("2024-03-07T11:00:00Z"), 9.0, "eng-lab1", "Computer Lab 1"),
        ];
        let store = SampleStore::new(campus, samples);

        assert_eq!(store.samples_for_building("engineering").len(), 2);
        assert_eq!(store.samples_for_building("library").len(), 1);
        assert_eq!(store.samples_for_building("hostel").len(), 0);
        assert_eq!(store.samples_for_room("eng-lab1").len(), 2);
    }

    #[test]
    fn test_latest_timestamp() {
        let campus = CampusStructure::default();
        let mut store = SampleStore::new(campus, vec![]);
        assert!(store.latest_timestamp().is_none());

        store.replace_samples(vec![
            Sample::new(ts("2024-03-07T10:00:00Z"), 5.0, "eng-lab1", "Computer Lab 1"),
            Sample::new(ts("2024-03-07T12:00:00Z"), 5.0, "eng-lab1", "Computer Lab 1"),
        ]);
        assert_eq!(store.latest_timestamp(), Some(ts("2024-03-07T12:00:00Z")));
    }

    #[test]
    fn test_ingest_filters_malformed() {
        let campus = CampusStructure::default();
        let mut store = SampleStore::new(campus, vec![]);

        let kept = store.ingest(vec![
            RawSample {
                timestamp: "2024-03-07T10:00:00Z".to_string(),
                consumption: 5.0,
                room_id: "eng-lab1".to_string(),
                room_name: None,
            },
            RawSample {
                timestamp: "yesterday-ish".to_string(),
                consumption: 5.0,
                room_id: "eng-lab1".to_string(),
                room_name: None,
            },
        ]);

        assert_eq!(kept, 1);
        assert_eq!(store.len(), 1);
    }
}
