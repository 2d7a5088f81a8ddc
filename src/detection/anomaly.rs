//! IQR-based anomaly detection.
//!
//! Values below `Q1 - m * IQR` are drops, values above `Q3 + m * IQR` are
//! spikes. Bounds are reported even when nothing is flagged.

use crate::core::{Metric, Observation};
use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for anomaly detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// IQR multiplier `m`.
    pub iqr_multiplier: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5, // Standard IQR multiplier
        }
    }
}

impl AnomalyConfig {
    /// Use the specified IQR multiplier.
    pub fn iqr(multiplier: f64) -> Self {
        Self {
            iqr_multiplier: multiplier,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(AnalyticsError::invalid(
                "anomaly_iqr_multiplier",
                self.iqr_multiplier,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Side of the bounds an anomaly falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyDirection {
    Spike,
    Drop,
}

impl fmt::Display for AnomalyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyDirection::Spike => f.write_str("spike"),
            AnomalyDirection::Drop => f.write_str("drop"),
        }
    }
}

/// A single out-of-bounds value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Position in the input series.
    pub index: usize,
    pub timestamp: Option<DateTime<Utc>>,
    pub value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub direction: AnomalyDirection,
}

/// Bounds and flagged values for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub anomalies: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    /// Get the number of anomalies detected.
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }

    /// Check if a specific index was flagged.
    pub fn is_anomaly(&self, index: usize) -> bool {
        self.anomalies.iter().any(|a| a.index == index)
    }

    pub fn spikes(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.anomalies
            .iter()
            .filter(|a| a.direction == AnomalyDirection::Spike)
    }

    pub fn drops(&self) -> impl Iterator<Item = &AnomalyRecord> {
        self.anomalies
            .iter()
            .filter(|a| a.direction == AnomalyDirection::Drop)
    }
}

/// Anomaly report for one observation metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnomalies {
    pub metric: Metric,
    pub report: AnomalyReport,
}

/// Detect anomalies in a series.
pub fn detect_anomalies(series: &[f64], config: &AnomalyConfig) -> Result<AnomalyReport> {
    detect(series, None, config)
}

/// Detect anomalies, attaching the matching timestamp to each record.
pub fn detect_anomalies_at(
    timestamps: &[DateTime<Utc>],
    values: &[f64],
    config: &AnomalyConfig,
) -> Result<AnomalyReport> {
    if timestamps.len() != values.len() {
        return Err(AnalyticsError::DimensionMismatch {
            expected: values.len(),
            got: timestamps.len(),
        });
    }
    detect(values, Some(timestamps), config)
}

/// Run detection independently for each metric of an observation table.
pub fn detect_metric_anomalies(
    observations: &[Observation],
    metrics: &[Metric],
    config: &AnomalyConfig,
) -> Result<Vec<MetricAnomalies>> {
    let timestamps: Vec<DateTime<Utc>> = observations.iter().map(|o| o.timestamp).collect();
    metrics
        .iter()
        .map(|&metric| {
            let report = detect(&metric.series(observations), Some(&timestamps), config)?;
            Ok(MetricAnomalies { metric, report })
        })
        .collect()
}

fn detect(
    series: &[f64],
    timestamps: Option<&[DateTime<Utc>]>,
    config: &AnomalyConfig,
) -> Result<AnomalyReport> {
    config.validate()?;

    let mut sorted: Vec<f64> = series.iter().filter(|x| x.is_finite()).copied().collect();
    if sorted.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            needed: 1,
            got: 0,
        });
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = crate::utils::quantile_sorted(&sorted, 0.25);
    let q3 = crate::utils::quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower_bound = q1 - config.iqr_multiplier * iqr;
    let upper_bound = q3 + config.iqr_multiplier * iqr;

    let anomalies: Vec<AnomalyRecord> = series
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let direction = if value < lower_bound {
                AnomalyDirection::Drop
            } else if value > upper_bound {
                AnomalyDirection::Spike
            } else {
                return None;
            };
            Some(AnomalyRecord {
                index,
                timestamp: timestamps.map(|ts| ts[index]),
                value,
                lower_bound,
                upper_bound,
                direction,
            })
        })
        .collect();

    tracing::debug!(
        n = series.len(),
        lower_bound,
        upper_bound,
        anomalies = anomalies.len(),
        "Anomaly detection complete"
    );

    Ok(AnomalyReport {
        q1,
        q3,
        iqr,
        lower_bound,
        upper_bound,
        anomalies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    #[test]
    fn flags_spike_and_drop() {
        let mut series: Vec<f64> = (0..100).map(|i| 10.0 + (i as f64 * 0.1).sin()).collect();
        series[50] = 100.0;
        series[75] = -50.0;

        let report = detect_anomalies(&series, &AnomalyConfig::default()).unwrap();

        assert!(report.is_anomaly(50));
        assert!(report.is_anomaly(75));
        assert_eq!(report.spikes().count(), 1);
        assert_eq!(report.drops().count(), 1);
        let drop = report.drops().next().unwrap();
        assert_eq!(drop.index, 75);
        assert!(drop.value < drop.lower_bound);
    }

    #[test]
    fn bounds_follow_iqr_formula() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let report = detect_anomalies(&series, &AnomalyConfig::default()).unwrap();

        assert_relative_eq!(report.q1, 3.0, epsilon = 1e-10);
        assert_relative_eq!(report.q3, 7.0, epsilon = 1e-10);
        assert_relative_eq!(report.iqr, 4.0, epsilon = 1e-10);
        assert_relative_eq!(report.lower_bound, -3.0, epsilon = 1e-10);
        assert_relative_eq!(report.upper_bound, 13.0, epsilon = 1e-10);
        assert_eq!(report.anomaly_count(), 0);
    }

    #[test]
    fn constant_series_has_no_anomalies() {
        let report = detect_anomalies(&[5.0; 50], &AnomalyConfig::default()).unwrap();
        assert_eq!(report.iqr, 0.0);
        assert_eq!(report.lower_bound, report.upper_bound);
        assert_eq!(report.anomaly_count(), 0);
    }

    #[test]
    fn short_series_never_fails() {
        let report = detect_anomalies(&[1.0, 2.0], &AnomalyConfig::default()).unwrap();
        assert_relative_eq!(report.q1, 1.25, epsilon = 1e-10);
        assert_relative_eq!(report.q3, 1.75, epsilon = 1e-10);

        let single = detect_anomalies(&[3.0], &AnomalyConfig::default()).unwrap();
        assert_eq!(single.anomaly_count(), 0);
    }

    #[test]
    fn empty_series_is_an_error() {
        assert_eq!(
            detect_anomalies(&[], &AnomalyConfig::default()),
            Err(AnalyticsError::InsufficientData { needed: 1, got: 0 })
        );
    }

    #[test]
    fn negative_multiplier_rejected() {
        assert!(detect_anomalies(&[1.0, 2.0], &AnomalyConfig::iqr(-1.0)).is_err());
    }

    #[test]
    fn larger_multiplier_flags_less() {
        let mut series: Vec<f64> = (0..40).map(|i| (i % 10) as f64).collect();
        series.push(20.0);
        let tight = detect_anomalies(&series, &AnomalyConfig::iqr(1.0)).unwrap();
        let loose = detect_anomalies(&series, &AnomalyConfig::iqr(3.0)).unwrap();
        assert!(tight.anomaly_count() >= loose.anomaly_count());
        assert!(tight.is_anomaly(40));
        assert!(!loose.is_anomaly(40));
    }

    #[test]
    fn timestamps_are_attached() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..10).map(|i| base + Duration::days(i)).collect();
        let mut values = vec![10.0; 10];
        values[7] = 500.0;

        let report = detect_anomalies_at(&timestamps, &values, &AnomalyConfig::default()).unwrap();
        assert_eq!(report.anomalies[0].timestamp, Some(timestamps[7]));

        assert!(detect_anomalies_at(&timestamps[..3], &values, &AnomalyConfig::default()).is_err());
    }

    #[test]
    fn direction_display() {
        assert_eq!(AnomalyDirection::Spike.to_string(), "spike");
        assert_eq!(AnomalyDirection::Drop.to_string(), "drop");
    }
}
