//! Derived, human-facing insights over detection output.
//!
//! Nothing here detects anything new: every function is a pure derivation
//! over a built alert feed or a detection report, recomputed on demand.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::detect::{DetectionReport, DetectionSummary};
use crate::model::{AlertFeedEntry, AnomalyEvidence, AnomalyKind, Severity};

/// Remediation playbook keyed by the dominant alert type.
pub fn recommended_steps(kind: Option<AnomalyKind>) -> &'static [&'static str] {
    match kind {
        Some(AnomalyKind::Spike) => &[
            "Confirm meter readings and isolate the affected zone.",
            "Throttle high-draw equipment for 30-60 minutes.",
            "Schedule a follow-up inspection during peak hour.",
        ],
        Some(AnomalyKind::AfterHours) => &[
            "Check idle HVAC and lighting schedules for overrides.",
            "Shut down non-critical loads after closing time.",
            "Notify facilities if usage persists overnight.",
        ],
        Some(AnomalyKind::WastefulPattern) => &[
            "Audit equipment with steady overnight draw.",
            "Reduce base load with power management profiles.",
            "Plan a maintenance window for aging devices.",
        ],
        _ => &[
            "Verify the sensor stream for anomalies.",
            "Escalate to facilities if pattern repeats.",
        ],
    }
}

/// Focus areas and quick actions derived from the current alert window.
#[derive(Debug, Clone, Serialize)]
pub struct ActionSummary {
    /// Location with the most alerts.
    pub top_location: String,

    /// Most frequent alert type, as a display label.
    pub top_type: String,

    /// Hour of day with the most spike alerts, as `HH:00`.
    pub peak_spike_hour: String,

    /// Location with the highest average consumption across its alerts.
    pub highest_load: String,

    /// Playbook steps for the top alert type.
    pub steps: Vec<String>,
}

/// Count occurrences preserving first-seen order, so ties break
/// deterministically on insertion order.
fn count_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(key, _)| *key == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

// max_by_key keeps the last maximum; ties must go to the first-seen key.
fn top_of(counts: &[(&str, usize)]) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &(key, n) in counts {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((key, n));
        }
    }
    best.map(|(key, _)| key.to_string())
}

/// Summarize an alert feed (or a filtered view of one) into focus areas.
pub fn action_summary(feed: &[AlertFeedEntry]) -> ActionSummary {
    let default_steps = |kind| {
        recommended_steps(kind)
            .iter()
            .map(|s| s.to_string())
            .collect()
    };

    if feed.is_empty() {
        return ActionSummary {
            top_location: "No alerts yet".to_string(),
            top_type: "N/A".to_string(),
            peak_spike_hour: "N/A".to_string(),
            highest_load: "N/A".to_string(),
            steps: default_steps(None),
        };
    }

    let location_counts = count_in_order(feed.iter().map(|e| e.location.as_str()));
    let type_counts = count_in_order(feed.iter().map(|e| e.kind.slug()));

    let top_location = top_of(&location_counts).unwrap_or_else(|| "N/A".to_string());
    let top_kind = top_of(&type_counts).and_then(|slug| slug.parse::<AnomalyKind>().ok());

    // Highest average consumption among alerts that carry a reading.
    let mut load_by_location: Vec<(&str, f64, usize)> = Vec::new();
    for entry in feed {
        if let Some(consumption) = entry.evidence.consumption() {
            match load_by_location
                .iter_mut()
                .find(|(key, _, _)| *key == entry.location)
            {
                Some((_, total, count)) => {
                    *total += consumption;
                    *count += 1;
                }
                None => load_by_location.push((&entry.location, consumption, 1)),
            }
        }
    }
    let highest_load = load_by_location
        .iter()
        .max_by(|a, b| (a.1 / a.2 as f64).total_cmp(&(b.1 / b.2 as f64)))
        .map(|(location, total, count)| {
            format!("{} ({:.1} kWh avg)", location, total / *count as f64)
        })
        .unwrap_or_else(|| "N/A".to_string());

    // Hour of day with the most spike alerts.
    let mut spike_hours: BTreeMap<u32, usize> = BTreeMap::new();
    for entry in feed.iter().filter(|e| e.kind == AnomalyKind::Spike) {
        use chrono::Timelike;
        *spike_hours.entry(entry.timestamp.hour()).or_insert(0) += 1;
    }
    let mut peak: Option<(u32, usize)> = None;
    for (&hour, &n) in &spike_hours {
        if peak.is_none_or(|(_, m)| n > m) {
            peak = Some((hour, n));
        }
    }
    let peak_spike_hour = peak
        .map(|(hour, _)| format!("{hour:02}:00"))
        .unwrap_or_else(|| "N/A".to_string());

    ActionSummary {
        top_location,
        top_type: top_kind.map_or_else(|| "Alert".to_string(), |k| k.label().to_string()),
        peak_spike_hour,
        highest_load,
        steps: default_steps(top_kind),
    }
}

/// Extrapolated savings from a detection summary.
///
/// Assumes the analyzed data spans one week: daily waste is weekly waste
/// over 7, projected to 30-day months and 12-month years at the given rate.
#[derive(Debug, Clone, Serialize)]
pub struct PotentialSavings {
    pub weekly_waste: f64,
    pub weekly_cost: f64,
    pub monthly_savings: f64,
    pub yearly_savings: f64,
    pub message: String,
}

/// Project the summary's waste into monthly and yearly savings.
pub fn potential_savings(summary: &DetectionSummary, rate_per_kwh: f64) -> PotentialSavings {
    let daily_waste = summary.total_waste / 7.0;
    let monthly_savings = (daily_waste * 30.0 * rate_per_kwh).round();
    let yearly_savings = monthly_savings * 12.0;

    PotentialSavings {
        weekly_waste: crate::model::round1(summary.total_waste),
        weekly_cost: summary.total_cost,
        monthly_savings,
        yearly_savings,
        message: format!(
            "By addressing these issues, you could save approximately {monthly_savings} per month or {yearly_savings} per year."
        ),
    }
}

/// The kind of space a location name suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationKind {
    Lab,
    Hostel,
    Lecture,
    Library,
    Office,
    General,
}

fn infer_location_kind(name: &str) -> LocationKind {
    if name.contains("Lab") {
        LocationKind::Lab
    } else if name.contains("Hostel") || name.contains("Floor") {
        LocationKind::Hostel
    } else if name.contains("Lecture") {
        LocationKind::Lecture
    } else if name.contains("Library") || name.contains("Reading") {
        LocationKind::Library
    } else if name.contains("Office") || name.contains("Admin") {
        LocationKind::Office
    } else {
        LocationKind::General
    }
}

/// A titled list of efficiency tips for one kind of space.
#[derive(Debug, Clone, Serialize)]
pub struct LocationRecommendation {
    pub title: String,
    pub tips: Vec<&'static str>,
}

/// Canned efficiency tips for a location, keyed by what its display name
/// suggests the space is.
pub fn location_recommendations(location_name: &str) -> LocationRecommendation {
    let (title, tips): (&str, &[&str]) = match infer_location_kind(location_name) {
        LocationKind::Lab => (
            "Computer Lab Best Practices",
            &[
                "Enable hibernate mode after 15 minutes of inactivity",
                "Use thin clients instead of full PCs where possible (60% energy savings)",
                "Install smart power strips to eliminate phantom loads",
                "Schedule automatic shutdowns at 9 PM on weekdays, 6 PM on weekends",
            ],
        ),
        LocationKind::Hostel => (
            "Hostel Energy Management",
            &[
                "Implement floor-wise power monitoring and display dashboards",
                "Run monthly energy-saving competitions with incentives",
                "Restrict high-power appliances (heaters, kettles) with smart meters",
                "Install solar water heaters to reduce electric geysers load",
            ],
        ),
        LocationKind::Lecture => (
            "Lecture Hall Optimization",
            &[
                "Install occupancy sensors for automatic lighting control",
                "Use natural ventilation when outdoor temperature is 20-25 C",
                "Pre-cool halls 30 minutes before class, then raise AC temp by 2 C",
                "Ensure projectors and audio systems auto-off after 15 minutes",
            ],
        ),
        LocationKind::Library => (
            "Library Energy Efficiency",
            &[
                "Use LED task lighting instead of full overhead lighting",
                "Zone HVAC by occupancy (reading rooms vs storage areas)",
                "Implement daylight harvesting with automated dimming",
                "Set computer sleep timers to 10 minutes",
            ],
        ),
        LocationKind::Office => (
            "Office Area Efficiency",
            &[
                "Encourage last-one-out protocols to check all equipment is off",
                "Replace desktop computers with laptops (70% less energy)",
                "Set printer/copier sleep timers to 5 minutes",
                "Use smart thermostats with presence detection",
            ],
        ),
        LocationKind::General => (
            "Campus-Wide Recommendations",
            &[
                "Upgrade to LED lighting campus-wide (saves 75% on lighting costs)",
                "Install solar panels on building rooftops (aim for 30% renewable energy)",
                "Conduct quarterly energy audits to identify new inefficiencies",
                "Launch campus-wide awareness campaigns and track improvements",
            ],
        ),
    };

    LocationRecommendation {
        title: title.to_string(),
        tips: tips.to_vec(),
    }
}

/// A finding/impact/action card derived from a detection report.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub title: String,
    pub finding: String,
    pub impact: String,
    pub action: String,

    /// `None` for the all-clear card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Turn a detection report into display-ready insight cards.
pub fn report_insights(report: &DetectionReport) -> Vec<Insight> {
    if !report.has_anomalies() {
        return vec![Insight {
            title: "Optimal Energy Usage".to_string(),
            finding: "Your energy consumption patterns are within normal ranges.".to_string(),
            impact: "No significant waste or inefficiencies detected.".to_string(),
            action: "Continue monitoring and maintain current practices.".to_string(),
            severity: None,
        }];
    }

    let mut insights = Vec::new();

    for anomaly in &report.anomalies {
        let action = anomaly
            .recommendation
            .clone()
            .unwrap_or_else(|| "Investigate the affected location.".to_string());

        let insight = match &anomaly.evidence {
            AnomalyEvidence::AfterHoursExcess {
                avg_working,
                avg_after,
                percentage_higher,
                total_waste,
                estimated_cost,
            } => Insight {
                title: "High After-Hours Consumption".to_string(),
                finding: format!(
                    "After-hours usage is {percentage_higher}% higher than working hours \
                     ({avg_after} kWh vs {avg_working} kWh)."
                ),
                impact: format!(
                    "Estimated waste: {total_waste} kWh = {estimated_cost} in energy loss."
                ),
                action,
                severity: Some(anomaly.severity),
            },
            AnomalyEvidence::WeekendExcess {
                percentage_of_weekday,
                total_waste,
                estimated_cost,
                ..
            } => Insight {
                title: "Excessive Weekend Usage".to_string(),
                finding: format!(
                    "Weekend consumption is {percentage_of_weekday}% of weekday levels, \
                     suggesting unnecessary equipment running."
                ),
                impact: format!("Estimated waste: {total_waste} kWh = {estimated_cost}."),
                action,
                severity: Some(anomaly.severity),
            },
            AnomalyEvidence::Creep {
                avg_first,
                avg_second,
                percentage_increase,
                extra_consumption,
                estimated_cost,
            } => Insight {
                title: "Rising Baseline Consumption".to_string(),
                finding: format!(
                    "Energy consumption has increased by {percentage_increase}% over the \
                     period (from {avg_first} to {avg_second} kWh)."
                ),
                impact: format!(
                    "Extra consumption: {extra_consumption} kWh = {estimated_cost}."
                ),
                action,
                severity: Some(anomaly.severity),
            },
            _ => continue,
        };
        insights.push(insight);
    }

    let top_spike = report
        .spikes
        .iter()
        .max_by(|a, b| a.consumption.total_cmp(&b.consumption));
    if let Some(top_spike) = top_spike {
        insights.push(Insight {
            title: "Consumption Spikes Detected".to_string(),
            finding: format!(
                "{} spike(s) found. Peak spike: {} kWh ({}% above average).",
                report.spikes.len(),
                top_spike.consumption,
                top_spike.percentage_above
            ),
            impact: "Spikes indicate faulty equipment, unauthorized high-power devices, or \
                     HVAC issues."
                .to_string(),
            action: "Investigate equipment logs during spike times. Check for malfunctioning \
                     AC units or unauthorized heaters."
                .to_string(),
            severity: Some(Severity::High),
        });
    }

    insights
}
