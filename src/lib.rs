//! Wattscope - campus energy monitoring: aggregation, anomaly detection,
//! and alert feeds over hourly meter samples.
//!
//! # Overview
//!
//! Wattscope ingests hourly consumption samples keyed by room, rolls them
//! up across a fixed campus hierarchy (campus, building, room) and five
//! time granularities, and runs rule-based anomaly detection over each
//! scope's series: spikes, after-hours usage, weekend excess, wasteful
//! night load, and baseline creep. Detected anomalies feed a unified
//! cross-scope alert feed, CSV export, and derived insights with savings
//! projections.
//!
//! Everything is recomputed from the current sample set on demand; there
//! is no persistence layer and no incremental state. Degenerate input
//! (empty scopes, single samples, missing partitions) yields empty output,
//! never an error.
//!
//! # Modules
//!
//! - [`model`]: Samples, series points, anomaly records, alert entries
//! - [`campus`]: The static campus/building/room hierarchy
//! - [`store`]: The in-memory sample store and ingestion boundary
//! - [`aggregate`]: Scope reduction and granularity bucketing
//! - [`detect`]: The detection rules and profiles
//! - [`feed`]: The unified cross-scope alert feed
//! - [`insights`]: Action summaries, savings projections, insight cards
//! - [`export`]: CSV export of the alert feed
//! - [`generate`]: Synthetic meter data and the live tick
//! - [`api`]: HTTP API handlers

pub mod aggregate;
pub mod api;
pub mod campus;
pub mod detect;
pub mod export;
pub mod feed;
pub mod generate;
pub mod insights;
pub mod model;
pub mod store;
