//! CSV export of the alert feed.
//!
//! Columns are `timestamp,location,type,severity,scope,message`. Every
//! field is double-quoted with embedded quotes doubled, so messages with
//! commas or quotes survive a round trip through any CSV reader.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::AlertFeedEntry;

const HEADER: &str = "\"timestamp\",\"location\",\"type\",\"severity\",\"scope\",\"message\"";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render the alert feed as CSV, preserving feed order.
///
/// The `type` column carries the kind's wire slug rather than the display
/// label, so exported rows can be re-keyed against the API without a
/// reverse label lookup.
pub fn alerts_to_csv(feed: &[AlertFeedEntry]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for entry in feed {
        let row = [
            entry
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            entry.location.clone(),
            entry.kind.slug().to_string(),
            entry.severity.to_string(),
            entry.scope.slug().to_string(),
            entry.message.clone(),
        ];
        let quoted: Vec<String> = row.iter().map(|f| quote(f)).collect();
        out.push_str(&quoted.join(","));
        out.push('\n');
    }

    out
}

/// Download filename for an export generated at `now`: `alerts-YYYY-MM-DD.csv`.
pub fn csv_filename(now: DateTime<Utc>) -> String {
    format!("alerts-{}.csv", now.format("%Y-%m-%d"))
}
