//! Detection utilities for behavioral time series.
//!
//! This module provides tools for detecting:
//! - Linear trends and their direction
//! - Anomalies outside IQR bounds

mod anomaly;
mod trend;

pub use anomaly::{
    detect_anomalies, detect_anomalies_at, detect_metric_anomalies, AnomalyConfig,
    AnomalyDirection, AnomalyRecord, AnomalyReport, MetricAnomalies,
};
pub use trend::{
    classify_slope, detect_metric_trend, detect_trend, SlopeScale, TrendConfig, TrendDirection,
    TrendResult,
};
