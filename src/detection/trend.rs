//! Linear trend detection.
//!
//! Fits `y = slope * t + intercept` by ordinary least squares over the time
//! index and classifies the direction against fixed thresholds.

use crate::core::{Metric, Observation};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity compared against the direction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeScale {
    /// Raw per-step slope, in the units of the series.
    #[default]
    Absolute,
    /// Growth over the whole window as a percentage of the series mean.
    RelativeToMean,
}

/// Direction thresholds for trend classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Values strictly above this are upward.
    pub upward_threshold: f64,
    /// Values strictly below this are downward.
    pub downward_threshold: f64,
    pub scale: SlopeScale,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            upward_threshold: 5.0,
            downward_threshold: -5.0,
            scale: SlopeScale::Absolute,
        }
    }
}

impl TrendConfig {
    /// Classify on `growth_rate_pct` instead of the raw slope.
    pub fn relative() -> Self {
        Self {
            scale: SlopeScale::RelativeToMean,
            ..Default::default()
        }
    }

    /// Set both thresholds symmetrically around zero.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.upward_threshold = threshold.abs();
        self.downward_threshold = -threshold.abs();
        self
    }

    pub fn scale(mut self, scale: SlopeScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.upward_threshold.is_finite() || !self.downward_threshold.is_finite() {
            return Err(AnalyticsError::invalid(
                "trend.thresholds",
                format!("({}, {})", self.downward_threshold, self.upward_threshold),
                "thresholds must be finite",
            ));
        }
        if self.downward_threshold > self.upward_threshold {
            return Err(AnalyticsError::invalid(
                "trend.downward_threshold",
                self.downward_threshold,
                format!(
                    "must not exceed upward_threshold ({})",
                    self.upward_threshold
                ),
            ));
        }
        Ok(())
    }
}

/// Classified direction of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

impl TrendDirection {
    pub fn name(self) -> &'static str {
        match self {
            TrendDirection::Upward => "upward",
            TrendDirection::Downward => "downward",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fitted trend line and its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub slope: f64,
    pub intercept: f64,
    /// Trend line evaluated at every index.
    pub fitted: Vec<f64>,
    /// `slope * (n - 1) / mean * 100`, or 0 when the mean is 0.
    pub growth_rate_pct: f64,
    /// Coefficient of determination of the fit.
    pub r_squared: f64,
    pub direction: TrendDirection,
}

/// Classify a value against the configured thresholds (strict comparisons).
pub fn classify_slope(value: f64, config: &TrendConfig) -> TrendDirection {
    if value > config.upward_threshold {
        TrendDirection::Upward
    } else if value < config.downward_threshold {
        TrendDirection::Downward
    } else {
        TrendDirection::Stable
    }
}

/// Fit a linear trend to a series indexed `0..n`.
pub fn detect_trend(series: &[f64], config: &TrendConfig) -> Result<TrendResult> {
    config.validate()?;
    let n = series.len();
    if n == 0 {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }

    let mean_y = crate::utils::mean(series);
    if n == 1 {
        return Ok(TrendResult {
            slope: 0.0,
            intercept: series[0],
            fitted: vec![series[0]],
            growth_rate_pct: 0.0,
            r_squared: 0.0,
            direction: TrendDirection::Stable,
        });
    }

    let mean_x = (n - 1) as f64 / 2.0;
    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (i, &y) in series.iter().enumerate() {
        let dx = i as f64 - mean_x;
        ss_xx += dx * dx;
        ss_xy += dx * (y - mean_y);
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let fitted: Vec<f64> = (0..n).map(|i| slope * i as f64 + intercept).collect();

    let ss_yy: f64 = series.iter().map(|&y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = series
        .iter()
        .zip(&fitted)
        .map(|(&y, &f)| (y - f).powi(2))
        .sum();
    let r_squared = if ss_yy.abs() < 1e-10 {
        0.0
    } else {
        1.0 - ss_res / ss_yy
    };

    let growth_rate_pct = crate::utils::safe_div(slope * (n - 1) as f64, mean_y) * 100.0;

    let classified = match config.scale {
        SlopeScale::Absolute => slope,
        SlopeScale::RelativeToMean => growth_rate_pct,
    };
    let direction = classify_slope(classified, config);

    tracing::debug!(
        n,
        slope,
        growth_rate_pct,
        direction = direction.name(),
        "Trend detection complete"
    );

    Ok(TrendResult {
        slope,
        intercept,
        fitted,
        growth_rate_pct,
        r_squared,
        direction,
    })
}

/// Fit a trend to one metric of an observation table.
pub fn detect_metric_trend(
    observations: &[Observation],
    metric: Metric,
    config: &TrendConfig,
) -> Result<TrendResult> {
    detect_trend(&metric.series(observations), config)
}
