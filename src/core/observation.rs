//! Daily traffic observations and the metrics that can be read from them.

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of daily web-analytics traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Start of the day this row covers (UTC midnight).
    pub timestamp: DateTime<Utc>,
    pub sessions: u64,
    pub users: u64,
    pub new_users: u64,
    pub pageviews: u64,
    /// Average session duration in seconds.
    pub avg_duration: f64,
    /// Share of single-page sessions, in `[0, 1]`.
    pub bounce_rate: f64,
    pub conversions: u64,
    pub revenue: f64,
}

impl Observation {
    /// Read a metric as `f64`.
    pub fn metric(&self, metric: Metric) -> f64 {
        metric.value(self)
    }

    /// Check the row invariants, naming the first field that violates one.
    pub fn validate(&self) -> Result<()> {
        if self.users > self.sessions {
            return Err(AnalyticsError::invalid(
                "users",
                self.users,
                format!("exceeds sessions ({})", self.sessions),
            ));
        }
        if self.new_users > self.users {
            return Err(AnalyticsError::invalid(
                "new_users",
                self.new_users,
                format!("exceeds users ({})", self.users),
            ));
        }
        if self.conversions > self.sessions {
            return Err(AnalyticsError::invalid(
                "conversions",
                self.conversions,
                format!("exceeds sessions ({})", self.sessions),
            ));
        }
        if !(0.0..=1.0).contains(&self.bounce_rate) {
            return Err(AnalyticsError::invalid(
                "bounce_rate",
                self.bounce_rate,
                "must lie in [0, 1]",
            ));
        }
        if !self.avg_duration.is_finite() || self.avg_duration < 0.0 {
            return Err(AnalyticsError::invalid(
                "avg_duration",
                self.avg_duration,
                "must be a non-negative number",
            ));
        }
        if !self.revenue.is_finite() || self.revenue < 0.0 {
            return Err(AnalyticsError::invalid(
                "revenue",
                self.revenue,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Validate an externally supplied observation table.
///
/// Reports the first violating row with its index in the parameter name.
pub fn validate_observations(observations: &[Observation]) -> Result<()> {
    for (row, obs) in observations.iter().enumerate() {
        obs.validate().map_err(|err| match err {
            AnalyticsError::InvalidParameter {
                name,
                value,
                reason,
            } => AnalyticsError::InvalidParameter {
                name: format!("observations[{}].{}", row, name),
                value,
                reason,
            },
            other => other,
        })?;
    }
    Ok(())
}

/// Numeric column of an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sessions,
    Users,
    NewUsers,
    Pageviews,
    AvgDuration,
    BounceRate,
    Conversions,
    Revenue,
}

impl Metric {
    /// All metrics in schema order.
    pub const ALL: [Metric; 8] = [
        Metric::Sessions,
        Metric::Users,
        Metric::NewUsers,
        Metric::Pageviews,
        Metric::AvgDuration,
        Metric::BounceRate,
        Metric::Conversions,
        Metric::Revenue,
    ];

    /// Column name used in feature matrices and reports.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Sessions => "sessions",
            Metric::Users => "users",
            Metric::NewUsers => "new_users",
            Metric::Pageviews => "pageviews",
            Metric::AvgDuration => "avg_duration",
            Metric::BounceRate => "bounce_rate",
            Metric::Conversions => "conversions",
            Metric::Revenue => "revenue",
        }
    }

    /// Read this metric from an observation.
    pub fn value(self, obs: &Observation) -> f64 {
        match self {
            Metric::Sessions => obs.sessions as f64,
            Metric::Users => obs.users as f64,
            Metric::NewUsers => obs.new_users as f64,
            Metric::Pageviews => obs.pageviews as f64,
            Metric::AvgDuration => obs.avg_duration,
            Metric::BounceRate => obs.bounce_rate,
            Metric::Conversions => obs.conversions as f64,
            Metric::Revenue => obs.revenue,
        }
    }

    /// Extract the metric as a series, one value per observation.
    pub fn series(self, observations: &[Observation]) -> Vec<f64> {
        observations.iter().map(|o| self.value(o)).collect()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
