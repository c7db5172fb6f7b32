//! Rule-based anomaly detection over a single scope's series.
//!
//! Two detection profiles exist in the field for nominally the same rules,
//! with different thresholds and cost constants. They are kept as named
//! configurations rather than merged:
//!
//! - [`DetectorConfig::basic`]: the alert-feed profile. Flags individual
//!   samples (spikes at 1.5x the mean, after-hours samples once the night
//!   mean clears the gate, one deep-night load alert) and dedupes by
//!   (kind, location, timestamp).
//! - [`DetectorConfig::extended`]: the reporting profile. Aggregate rules
//!   (after-hours excess, weekend excess, baseline creep) plus a capped
//!   spike list with per-spike excess cost.
//!
//! Every ratio rule that needs two non-empty partitions returns no anomaly
//! when either partition is empty; degenerate input never produces NaN.

use chrono::{Datelike, DateTime, Utc, Weekday};
use serde::Serialize;
use std::collections::HashSet;

use crate::model::{AnomalyEvidence, AnomalyKind, AnomalyRecord, Severity, SeriesPoint, round1};

/// Working hours: 08:00 (inclusive) to 18:00 (exclusive).
const WORKING_START: u32 = 8;
const WORKING_END: u32 = 18;

/// Deep night for the wasteful-pattern rule: 22:00 to 06:00.
const DEEP_NIGHT_START: u32 = 22;
const DEEP_NIGHT_END: u32 = 6;

/// Thresholds and the cost rate for the detection rules.
///
/// All comparisons use simple arithmetic means. The rate is explicit and
/// applied consistently wherever a rule costs its waste estimate.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Cost of one kWh, applied to every waste estimate.
    pub rate_per_kwh: f64,

    /// A sample is a spike when above `mean * spike_ratio`.
    pub spike_ratio: f64,

    /// When false, spike severity splits at 100% over the mean instead of
    /// being fixed high.
    pub spike_fixed_high: bool,

    /// Basic profile: night mean must exceed this fraction of the working
    /// mean before individual after-hours samples are flagged.
    pub after_hours_night_gate: f64,

    /// Basic profile: an after-hours sample is flagged when above this
    /// fraction of the working mean.
    pub after_hours_sample_ratio: f64,

    /// Extended profile: after-hours mean must exceed the working mean by
    /// this many percent.
    pub after_hours_excess_pct: f64,

    /// Weekend mean as a percentage of the weekday mean above which the
    /// weekend rule fires.
    pub weekend_ratio_pct: f64,

    /// Absolute deep-night mean (kWh) above which the wasteful-pattern
    /// rule fires.
    pub night_load_kwh: f64,

    /// Percentage increase between period halves above which baseline
    /// creep fires.
    pub creep_increase_pct: f64,

    /// Minimum series length for the baseline-creep rule.
    pub creep_min_points: usize,

    /// Cap on the extended profile's spike list.
    pub max_spikes: usize,

    /// Dedupe alerts by (kind, location, timestamp).
    pub dedupe: bool,
}

impl DetectorConfig {
    /// The alert-feed profile: per-sample alerts, 1.5x spike threshold,
    /// deduped output.
    pub fn basic() -> Self {
        Self {
            rate_per_kwh: 8.0,
            spike_ratio: 1.5,
            spike_fixed_high: true,
            after_hours_night_gate: 0.5,
            after_hours_sample_ratio: 0.4,
            after_hours_excess_pct: 20.0,
            weekend_ratio_pct: 30.0,
            night_load_kwh: 30.0,
            creep_increase_pct: 10.0,
            creep_min_points: 14,
            max_spikes: 5,
            dedupe: true,
        }
    }

    /// The reporting profile: aggregate rules, 2.0x spike threshold,
    /// severity split on spikes, no dedup.
    pub fn extended() -> Self {
        Self {
            spike_ratio: 2.0,
            spike_fixed_high: false,
            dedupe: false,
            ..Self::basic()
        }
    }

    /// Override the cost rate.
    pub fn with_rate(mut self, rate_per_kwh: f64) -> Self {
        self.rate_per_kwh = rate_per_kwh;
        self
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::basic()
    }
}

fn mean(points: &[&SeriesPoint]) -> f64 {
    points.iter().map(|p| p.consumption).sum::<f64>() / points.len() as f64
}

fn is_working_hour(hour: u32) -> bool {
    (WORKING_START..WORKING_END).contains(&hour)
}

fn is_deep_night(hour: u32) -> bool {
    hour >= DEEP_NIGHT_START || hour < DEEP_NIGHT_END
}

/// Flag individual samples above `mean * spike_ratio`.
pub fn spike_alerts(series: &[SeriesPoint], config: &DetectorConfig) -> Vec<AnomalyRecord> {
    if series.is_empty() {
        return Vec::new();
    }

    let avg: f64 = series.iter().map(|p| p.consumption).sum::<f64>() / series.len() as f64;
    let threshold = avg * config.spike_ratio;

    series
        .iter()
        .filter(|p| p.consumption > threshold)
        .map(|p| {
            let percentage_above = ((p.consumption / avg - 1.0) * 100.0).round();
            let severity = if config.spike_fixed_high || percentage_above > 100.0 {
                Severity::High
            } else {
                Severity::Medium
            };

            AnomalyRecord {
                kind: AnomalyKind::Spike,
                severity,
                message: format!(
                    "Abnormal spike detected: {} kWh ({}% above average)",
                    p.consumption, percentage_above
                ),
                recommendation: None,
                timestamp: Some(p.timestamp),
                location: p.location.clone(),
                evidence: AnomalyEvidence::Spike {
                    consumption: p.consumption,
                    average: round1(avg),
                    percentage_above,
                },
            }
        })
        .collect()
}

/// Flag individual after-hours samples once the night mean clears the gate.
///
/// Night here is 18:00-06:00; the comparison baseline is the 08:00-18:00
/// working mean. Either partition being empty means no anomaly.
pub fn after_hours_alerts(series: &[SeriesPoint], config: &DetectorConfig) -> Vec<AnomalyRecord> {
    let daytime: Vec<&SeriesPoint> = series.iter().filter(|p| is_working_hour(p.hour())).collect();
    let night: Vec<&SeriesPoint> = series
        .iter()
        .filter(|p| p.hour() >= WORKING_END || p.hour() < DEEP_NIGHT_END)
        .collect();

    if daytime.is_empty() || night.is_empty() {
        return Vec::new();
    }

    let avg_daytime = mean(&daytime);
    let avg_night = mean(&night);

    if avg_night <= avg_daytime * config.after_hours_night_gate {
        return Vec::new();
    }

    night
        .iter()
        .filter(|p| p.consumption > avg_daytime * config.after_hours_sample_ratio)
        .map(|p| AnomalyRecord {
            kind: AnomalyKind::AfterHours,
            severity: Severity::Medium,
            message: format!(
                "High after-hours usage: {} kWh at {}:00 (likely idle systems or unnecessary lighting)",
                p.consumption,
                p.hour()
            ),
            recommendation: None,
            timestamp: Some(p.timestamp),
            location: p.location.clone(),
            evidence: AnomalyEvidence::AfterHoursSample {
                consumption: p.consumption,
                hour: p.hour(),
            },
        })
        .collect()
}

/// One alert when the deep-night (22:00-06:00) mean exceeds the absolute
/// threshold: consistently high late-night load points at idle equipment.
pub fn night_load_alerts(series: &[SeriesPoint], config: &DetectorConfig) -> Vec<AnomalyRecord> {
    let night: Vec<&SeriesPoint> = series.iter().filter(|p| is_deep_night(p.hour())).collect();
    if night.is_empty() {
        return Vec::new();
    }

    let avg_night = mean(&night);
    if avg_night <= config.night_load_kwh {
        return Vec::new();
    }

    vec![AnomalyRecord {
        kind: AnomalyKind::WastefulPattern,
        severity: Severity::Medium,
        message: format!(
            "Consistently high late-night usage (avg {} kWh). Check for idle equipment, \
             servers, or HVAC systems running unnecessarily.",
            avg_night.round()
        ),
        recommendation: None,
        timestamp: None,
        location: night[0].location.clone(),
        evidence: AnomalyEvidence::NightLoad {
            avg_night: round1(avg_night),
        },
    }]
}

/// Run the alert-feed rules: spikes, after-hours samples, night load.
///
/// Output is deduped by (kind, location, timestamp) when the config asks
/// for it, then stably sorted by severity rank. Ties keep rule order.
pub fn detect_alerts(series: &[SeriesPoint], config: &DetectorConfig) -> Vec<AnomalyRecord> {
    let mut alerts = spike_alerts(series, config);
    alerts.extend(after_hours_alerts(series, config));
    alerts.extend(night_load_alerts(series, config));

    if config.dedupe {
        let mut seen: HashSet<(AnomalyKind, Option<String>, Option<DateTime<Utc>>)> =
            HashSet::new();
        alerts.retain(|a| seen.insert((a.kind, a.location.clone(), a.timestamp)));
    }

    alerts.sort_by_key(|a| a.severity.rank());
    alerts
}

/// Aggregate after-hours rule: after-hours mean more than
/// `after_hours_excess_pct` percent above the working mean.
///
/// Waste is the after-hours excess over an expected level of 20% of the
/// working mean, summed per sample.
pub fn after_hours_excess(
    series: &[SeriesPoint],
    config: &DetectorConfig,
) -> Option<AnomalyRecord> {
    let working: Vec<&SeriesPoint> = series.iter().filter(|p| is_working_hour(p.hour())).collect();
    let after: Vec<&SeriesPoint> = series.iter().filter(|p| !is_working_hour(p.hour())).collect();

    if working.is_empty() || after.is_empty() {
        return None;
    }

    let avg_working = mean(&working);
    let avg_after = mean(&after);
    let percentage_higher = (avg_after / avg_working - 1.0) * 100.0;

    if percentage_higher <= config.after_hours_excess_pct {
        return None;
    }

    let expected = avg_working * 0.2;
    let total_waste: f64 = after
        .iter()
        .map(|p| (p.consumption - expected).max(0.0))
        .sum();
    let estimated_cost = total_waste * config.rate_per_kwh;

    let severity = if percentage_higher > 50.0 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(AnomalyRecord {
        kind: AnomalyKind::AfterHours,
        severity,
        message: format!(
            "After-hours usage is {}% higher than working hours",
            percentage_higher.round()
        ),
        recommendation: Some(
            "Consider implementing automated shutdown procedures after 6 PM".to_string(),
        ),
        timestamp: None,
        location: None,
        evidence: AnomalyEvidence::AfterHoursExcess {
            avg_working: round1(avg_working),
            avg_after: round1(avg_after),
            percentage_higher: percentage_higher.round(),
            total_waste: round1(total_waste),
            estimated_cost: estimated_cost.round(),
        },
    })
}

/// Weekend rule: weekend mean above `weekend_ratio_pct` percent of the
/// weekday mean. Expected weekend usage is 20% of the weekday mean.
pub fn weekend_excess(series: &[SeriesPoint], config: &DetectorConfig) -> Option<AnomalyRecord> {
    let is_weekend =
        |p: &SeriesPoint| matches!(p.timestamp.weekday(), Weekday::Sat | Weekday::Sun);

    let weekday: Vec<&SeriesPoint> = series.iter().filter(|p| !is_weekend(p)).collect();
    let weekend: Vec<&SeriesPoint> = series.iter().filter(|p| is_weekend(p)).collect();

    if weekday.is_empty() || weekend.is_empty() {
        return None;
    }

    let avg_weekday = mean(&weekday);
    let avg_weekend = mean(&weekend);
    let percentage_of_weekday = avg_weekend / avg_weekday * 100.0;

    if percentage_of_weekday <= config.weekend_ratio_pct {
        return None;
    }

    let total_weekend: f64 = weekend.iter().map(|p| p.consumption).sum();
    let expected = avg_weekday * 0.2 * weekend.len() as f64;
    let total_waste = (total_weekend - expected).max(0.0);
    let estimated_cost = total_waste * config.rate_per_kwh;

    let severity = if percentage_of_weekday > 50.0 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(AnomalyRecord {
        kind: AnomalyKind::Weekend,
        severity,
        message: format!(
            "Weekend usage is {}% of weekday usage",
            percentage_of_weekday.round()
        ),
        recommendation: Some("Review weekend operations and consider power-saving modes".to_string()),
        timestamp: None,
        location: None,
        evidence: AnomalyEvidence::WeekendExcess {
            avg_weekday: round1(avg_weekday),
            avg_weekend: round1(avg_weekend),
            percentage_of_weekday: percentage_of_weekday.round(),
            total_waste: round1(total_waste),
            estimated_cost: estimated_cost.round(),
        },
    })
}

/// Baseline-creep rule: the chronological second half of the series runs
/// more than `creep_increase_pct` percent above the first half.
///
/// Needs at least `creep_min_points` points to split meaningfully.
pub fn baseline_creep(series: &[SeriesPoint], config: &DetectorConfig) -> Option<AnomalyRecord> {
    if series.len() < config.creep_min_points {
        return None;
    }

    let mut sorted: Vec<&SeriesPoint> = series.iter().collect();
    sorted.sort_by_key(|p| p.timestamp);

    let midpoint = sorted.len() / 2;
    let (first_half, second_half) = sorted.split_at(midpoint);

    let avg_first = mean(&first_half.to_vec());
    let avg_second = mean(&second_half.to_vec());
    if avg_first <= 0.0 {
        return None;
    }

    let percentage_increase = (avg_second / avg_first - 1.0) * 100.0;
    if percentage_increase <= config.creep_increase_pct {
        return None;
    }

    let extra_consumption = (avg_second - avg_first) * second_half.len() as f64;
    let estimated_cost = extra_consumption * config.rate_per_kwh;

    let severity = if percentage_increase > 20.0 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(AnomalyRecord {
        kind: AnomalyKind::BaselineCreep,
        severity,
        message: format!(
            "Baseline consumption increased by {}% over time",
            percentage_increase.round()
        ),
        recommendation: Some("Audit equipment for degradation or unauthorized additions".to_string()),
        timestamp: None,
        location: None,
        evidence: AnomalyEvidence::Creep {
            avg_first: round1(avg_first),
            avg_second: round1(avg_second),
            percentage_increase: percentage_increase.round(),
            extra_consumption: round1(extra_consumption),
            estimated_cost: estimated_cost.round(),
        },
    })
}

/// One entry of the extended profile's spike list.
#[derive(Debug, Clone, Serialize)]
pub struct SpikeEvent {
    pub timestamp: DateTime<Utc>,
    pub consumption: f64,
    pub average: f64,
    pub percentage_above: f64,
    pub estimated_excess_cost: f64,
}

/// Samples above `mean * spike_ratio`, capped at `max_spikes`, with the
/// excess over the mean costed per spike.
pub fn spike_events(series: &[SeriesPoint], config: &DetectorConfig) -> Vec<SpikeEvent> {
    if series.is_empty() {
        return Vec::new();
    }

    let avg: f64 = series.iter().map(|p| p.consumption).sum::<f64>() / series.len() as f64;
    let threshold = avg * config.spike_ratio;

    series
        .iter()
        .filter(|p| p.consumption > threshold)
        .take(config.max_spikes)
        .map(|p| SpikeEvent {
            timestamp: p.timestamp,
            consumption: round1(p.consumption),
            average: round1(avg),
            percentage_above: ((p.consumption / avg - 1.0) * 100.0).round(),
            estimated_excess_cost: ((p.consumption - avg) * config.rate_per_kwh).round(),
        })
        .collect()
}

/// Aggregate waste and cost totals over a detection run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    /// Sum of the anomalies' waste estimates, kWh.
    pub total_waste: f64,

    /// Sum of the anomalies' cost estimates.
    pub total_cost: f64,

    pub anomaly_count: usize,
    pub spike_count: usize,
}

/// Output of the combined detection entrypoint.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub anomalies: Vec<AnomalyRecord>,
    pub spikes: Vec<SpikeEvent>,
    pub summary: DetectionSummary,
}

impl DetectionReport {
    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty() || !self.spikes.is_empty()
    }
}

/// Run every aggregate rule plus the spike list and total up waste/cost.
///
/// Empty or single-point input returns an empty report, never an error.
pub fn detect_all(series: &[SeriesPoint], config: &DetectorConfig) -> DetectionReport {
    let anomalies: Vec<AnomalyRecord> = [
        after_hours_excess(series, config),
        weekend_excess(series, config),
        baseline_creep(series, config),
    ]
    .into_iter()
    .flatten()
    .collect();

    let spikes = spike_events(series, config);

    let total_waste: f64 = anomalies
        .iter()
        .filter_map(|a| a.evidence.waste_kwh())
        .sum();
    let total_cost: f64 = anomalies
        .iter()
        .filter_map(|a| a.evidence.estimated_cost())
        .sum();

    let summary = DetectionSummary {
        total_waste: round1(total_waste),
        total_cost: total_cost.round(),
        anomaly_count: anomalies.len(),
        spike_count: spikes.len(),
    };

    DetectionReport {
        anomalies,
        spikes,
        summary,
    }
}

/// Overall waste status for the overview card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteStatus {
    Normal,
    Warning,
    Critical,
}

/// Waste status plus a one-line message.
#[derive(Debug, Clone, Serialize)]
pub struct WasteOverview {
    pub status: WasteStatus,
    pub message: String,
}

/// Derive the overview card's status from a detection report.
pub fn waste_status(report: &DetectionReport) -> WasteOverview {
    if !report.has_anomalies() {
        return WasteOverview {
            status: WasteStatus::Normal,
            message: "No significant anomalies detected".to_string(),
        };
    }

    let high_count = report
        .anomalies
        .iter()
        .filter(|a| a.severity == Severity::High)
        .count();

    if high_count > 0 {
        let plural = if high_count > 1 { "s" } else { "" };
        return WasteOverview {
            status: WasteStatus::Critical,
            message: format!("{high_count} critical waste pattern{plural} detected"),
        };
    }

    let count = report.anomalies.len();
    let noun = if count == 1 { "anomaly" } else { "anomalies" };
    WasteOverview {
        status: WasteStatus::Warning,
        message: format!("{count} {noun} detected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn point(time: &str, consumption: f64) -> SeriesPoint {
        SeriesPoint {
            timestamp: ts(time),
            consumption,
            location: Some("Computer Lab 1".to_string()),
        }
    }

    // Weekdays in March 2024: the 4th is a Monday.
    fn weekday_point(day: u32, hour: u32, consumption: f64) -> SeriesPoint {
        point(&format!("2024-03-{day:02}T{hour:02}:00:00Z"), consumption)
    }

    #[test]
    fn test_detect_all_empty_input() {
        let report = detect_all(&[], &DetectorConfig::extended());

        assert!(!report.has_anomalies());
        assert!(report.anomalies.is_empty());
        assert_eq!(report.summary.total_waste, 0.0);
        assert_eq!(report.summary.total_cost, 0.0);
    }

    #[test]
    fn test_detect_all_single_sample() {
        let series = vec![weekday_point(4, 10, 50.0)];
        let report = detect_all(&series, &DetectorConfig::extended());

        assert!(!report.has_anomalies());
    }

    #[test]
    fn test_spike_threshold_exactly_one() {
        // 9 samples of 10 and 1 of 30: mean 12, threshold 18, only the 30
        // crosses it. 150% above the mean puts it at high either way.
        let mut series: Vec<SeriesPoint> = (0..9).map(|h| weekday_point(4, h + 8, 10.0)).collect();
        series.push(weekday_point(4, 17, 30.0));

        let alerts = spike_alerts(&series, &DetectorConfig::basic());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AnomalyKind::Spike);
        assert_eq!(alerts[0].severity, Severity::High);
        match alerts[0].evidence {
            AnomalyEvidence::Spike {
                consumption,
                percentage_above,
                ..
            } => {
                assert_eq!(consumption, 30.0);
                assert_eq!(percentage_above, 150.0);
            }
            _ => panic!("expected spike evidence"),
        }
    }

    #[test]
    fn test_spike_severity_split_without_fixed_high() {
        // One sample at just over 1.5x the mean: above threshold but under
        // 100% over the mean, so medium under the split.
        let mut series: Vec<SeriesPoint> = (0..19).map(|h| weekday_point(4, h % 24, 10.0)).collect();
        series.push(weekday_point(5, 10, 18.0));

        let config = DetectorConfig {
            spike_fixed_high: false,
            ..DetectorConfig::basic()
        };
        let alerts = spike_alerts(&series, &config);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_after_hours_excess_forty_percent_is_medium() {
        // Working mean 50, after-hours mean 70: 40% higher, over the 20%
        // threshold but under the 50% high split.
        let mut series: Vec<SeriesPoint> = (4..16).map(|d| weekday_point(d, 10, 50.0)).collect();
        series.extend((4..16).map(|d| weekday_point(d, 20, 70.0)));

        let anomaly = after_hours_excess(&series, &DetectorConfig::extended()).unwrap();

        assert_eq!(anomaly.kind, AnomalyKind::AfterHours);
        assert_eq!(anomaly.severity, Severity::Medium);
        match anomaly.evidence {
            AnomalyEvidence::AfterHoursExcess {
                percentage_higher,
                total_waste,
                ..
            } => {
                assert_eq!(percentage_higher, 40.0);
                // Expected level is 20% of 50 = 10; waste = 12 * (70 - 10).
                assert_eq!(total_waste, 720.0);
            }
            _ => panic!("expected after-hours evidence"),
        }
    }

    #[test]
    fn test_after_hours_excess_requires_both_partitions() {
        let series: Vec<SeriesPoint> = (4..16).map(|d| weekday_point(d, 10, 50.0)).collect();
        assert!(after_hours_excess(&series, &DetectorConfig::extended()).is_none());
    }

    #[test]
    fn test_after_hours_alerts_gate_and_sample_filter() {
        // Day mean 50; night mean 30 clears the 50% gate, and only night
        // samples above 0.4 * 50 = 20 are flagged.
        let series = vec![
            weekday_point(4, 10, 50.0),
            weekday_point(4, 11, 50.0),
            weekday_point(4, 20, 45.0),
            weekday_point(4, 2, 15.0),
        ];

        let alerts = after_hours_alerts(&series, &DetectorConfig::basic());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AnomalyKind::AfterHours);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_weekend_excess_fires() {
        // 2024-03-09/10 are a weekend. Weekday mean 100, weekend mean 60:
        // 60% of weekday, over both the 30% threshold and the 50% split.
        let mut series: Vec<SeriesPoint> = (4..9).map(|d| weekday_point(d, 10, 100.0)).collect();
        series.push(weekday_point(9, 10, 60.0));
        series.push(weekday_point(10, 10, 60.0));

        let anomaly = weekend_excess(&series, &DetectorConfig::extended()).unwrap();

        assert_eq!(anomaly.kind, AnomalyKind::Weekend);
        assert_eq!(anomaly.severity, Severity::High);
        match anomaly.evidence {
            AnomalyEvidence::WeekendExcess {
                percentage_of_weekday,
                total_waste,
                ..
            } => {
                assert_eq!(percentage_of_weekday, 60.0);
                // 120 total weekend - expected 100 * 0.2 * 2 = 80.
                assert_eq!(total_waste, 80.0);
            }
            _ => panic!("expected weekend evidence"),
        }
    }

    #[test]
    fn test_weekend_quiet_no_anomaly() {
        let mut series: Vec<SeriesPoint> = (4..9).map(|d| weekday_point(d, 10, 100.0)).collect();
        series.push(weekday_point(9, 10, 20.0)); // 20% of weekday mean

        assert!(weekend_excess(&series, &DetectorConfig::extended()).is_none());
    }

    #[test]
    fn test_baseline_creep_needs_minimum_points() {
        let series: Vec<SeriesPoint> = (0..13).map(|i| weekday_point(4, i, 10.0)).collect();
        assert!(baseline_creep(&series, &DetectorConfig::extended()).is_none());
    }

    #[test]
    fn test_baseline_creep_fires_high_over_twenty_percent() {
        // First half at 10, second half at 13: 30% increase.
        let mut series: Vec<SeriesPoint> = (0..7)
            .map(|d| point(&format!("2024-03-{:02}T10:00:00Z", d + 1), 10.0))
            .collect();
        series.extend((0..7).map(|d| point(&format!("2024-03-{:02}T10:00:00Z", d + 8), 13.0)));

        let anomaly = baseline_creep(&series, &DetectorConfig::extended()).unwrap();

        assert_eq!(anomaly.kind, AnomalyKind::BaselineCreep);
        assert_eq!(anomaly.severity, Severity::High);
        match anomaly.evidence {
            AnomalyEvidence::Creep {
                percentage_increase,
                extra_consumption,
                ..
            } => {
                assert_eq!(percentage_increase, 30.0);
                assert_eq!(extra_consumption, 21.0); // 3 kWh * 7 points
            }
            _ => panic!("expected creep evidence"),
        }
    }

    #[test]
    fn test_night_load_alert_fires_once() {
        let series = vec![
            weekday_point(4, 23, 35.0),
            weekday_point(4, 2, 40.0),
            weekday_point(4, 10, 100.0),
        ];

        let alerts = night_load_alerts(&series, &DetectorConfig::basic());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AnomalyKind::WastefulPattern);
        match alerts[0].evidence {
            AnomalyEvidence::NightLoad { avg_night } => assert_eq!(avg_night, 37.5),
            _ => panic!("expected night-load evidence"),
        }
    }

    #[test]
    fn test_night_load_below_threshold_quiet() {
        let series = vec![weekday_point(4, 23, 10.0), weekday_point(4, 2, 12.0)];
        assert!(night_load_alerts(&series, &DetectorConfig::basic()).is_empty());
    }

    #[test]
    fn test_detect_alerts_sorted_by_severity() {
        // A spike (high) plus after-hours samples (medium); the spike must
        // come first regardless of rule order.
        let series = vec![
            weekday_point(4, 10, 50.0),
            weekday_point(4, 11, 50.0),
            weekday_point(4, 20, 45.0),
            weekday_point(4, 21, 300.0),
        ];

        let alerts = detect_alerts(&series, &DetectorConfig::basic());

        assert!(!alerts.is_empty());
        assert_eq!(alerts[0].severity, Severity::High);
        for pair in alerts.windows(2) {
            assert!(pair[0].severity.rank() <= pair[1].severity.rank());
        }
    }

    #[test]
    fn test_detect_all_summary_totals() {
        let mut series: Vec<SeriesPoint> = (4..16).map(|d| weekday_point(d, 10, 50.0)).collect();
        series.extend((4..16).map(|d| weekday_point(d, 20, 70.0)));

        let config = DetectorConfig::extended();
        let report = detect_all(&series, &config);

        assert!(report.has_anomalies());
        assert!(report.summary.total_waste > 0.0);
        assert_eq!(
            report.summary.total_cost,
            (report.summary.total_waste * config.rate_per_kwh).round()
        );
        assert_eq!(report.summary.anomaly_count, report.anomalies.len());
    }

    #[test]
    fn test_waste_status_levels() {
        let normal = detect_all(&[], &DetectorConfig::extended());
        assert_eq!(waste_status(&normal).status, WasteStatus::Normal);

        // Mon-Fri only, so only the medium after-hours rule fires.
        let mut series: Vec<SeriesPoint> = (4..9).map(|d| weekday_point(d, 10, 50.0)).collect();
        series.extend((4..9).map(|d| weekday_point(d, 20, 70.0)));
        let warning = detect_all(&series, &DetectorConfig::extended());
        assert_eq!(waste_status(&warning).status, WasteStatus::Warning);
    }
}
