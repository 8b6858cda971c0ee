//! Prometheus metrics for snapshot processing and indexer fetches

use once_cell::sync::Lazy;
use prometheus::{
    register_gauge_vec, register_int_counter_vec, Encoder, GaugeVec, IntCounterVec, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;

use crate::orderbook::{OrderBookState, SnapshotAnomaly};

pub static SNAPSHOTS_APPLIED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "deepbook_snapshots_applied_total",
        "order book snapshots that replaced the previous one",
        &["pool"]
    )
    .expect("register deepbook_snapshots_applied_total")
});

pub static SNAPSHOT_ANOMALIES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "deepbook_snapshot_anomalies_total",
        "data-quality anomalies found in order book snapshots",
        &["pool", "kind"]
    )
    .expect("register deepbook_snapshot_anomalies_total")
});

pub static FETCH_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "deepbook_fetch_errors_total",
        "failed indexer requests",
        &["endpoint"]
    )
    .expect("register deepbook_fetch_errors_total")
});

pub static SPREAD_PERCENT: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "deepbook_spread_percent",
        "current spread as a percent of the best bid",
        &["pool"]
    )
    .expect("register deepbook_spread_percent")
});

/// Record a freshly applied snapshot
pub fn record_snapshot(state: &OrderBookState) {
    SNAPSHOTS_APPLIED
        .with_label_values(&[state.pool_name.as_str()])
        .inc();

    for anomaly in &state.view.anomalies {
        record_anomaly(&state.pool_name, anomaly);
    }

    if let Some(percent) = state.metrics.spread.and_then(|s| s.percent.to_f64()) {
        SPREAD_PERCENT
            .with_label_values(&[state.pool_name.as_str()])
            .set(percent);
    }
}

pub fn record_anomaly(pool_name: &str, anomaly: &SnapshotAnomaly) {
    SNAPSHOT_ANOMALIES
        .with_label_values(&[pool_name, anomaly.kind()])
        .inc();
}

pub fn record_fetch_error(endpoint: &str) {
    FETCH_ERRORS.with_label_values(&[endpoint]).inc();
}

/// Render every registered metric in the text exposition format
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}
