//! Engine-wide configuration.
//!
//! [`AnalyticsConfig`] is the single configuration surface; the component
//! configs are derived from it so every analysis in one run sees the same
//! seed and thresholds.

use crate::clustering::{ClusterConfig, MAX_CLUSTERS, MIN_CLUSTERS};
use crate::detection::{AnomalyConfig, TrendConfig};
use crate::error::{AnalyticsError, Result};
use crate::generator::{DailyGeneratorConfig, EcommerceConfig};
use crate::segmentation::{ClvConfig, ClvTierCuts, RfmThresholds};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration for generation and analysis.
///
/// Missing fields take their defaults when loaded from JSON:
///
/// ```
/// use anofox_analytics::config::AnalyticsConfig;
///
/// let config = AnalyticsConfig::from_json_str(r#"{ "seed": 7, "cluster_count": 4 }"#).unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.cluster_count, 4);
/// assert_eq!(config.clv_horizon_periods, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub seed: u64,
    /// Days of data to generate.
    pub period_length: i64,
    /// Last generated day; today (UTC) when unset.
    pub end_date: Option<NaiveDate>,
    /// Behavioral clusters, in `[2, 5]`.
    pub cluster_count: usize,
    pub anomaly_iqr_multiplier: f64,
    pub clv_horizon_periods: u32,
    pub base_conversion_rate: f64,
    pub add_to_cart_rate: f64,
    pub abandonment_rate: f64,
    pub trend: TrendConfig,
    pub rfm: RfmThresholds,
    pub clv_tiers: ClvTierCuts,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            period_length: 90,
            end_date: None,
            cluster_count: 3,
            anomaly_iqr_multiplier: 1.5,
            clv_horizon_periods: 12,
            base_conversion_rate: 0.03,
            add_to_cart_rate: 0.15,
            abandonment_rate: 0.70,
            trend: TrendConfig::default(),
            rfm: RfmThresholds::default(),
            clv_tiers: ClvTierCuts::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalyticsError::invalid("config", "<json>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn period_length(mut self, days: i64) -> Self {
        self.period_length = days;
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn cluster_count(mut self, k: usize) -> Self {
        self.cluster_count = k;
        self
    }

    pub fn anomaly_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.anomaly_iqr_multiplier = multiplier;
        self
    }

    pub fn clv_horizon_periods(mut self, periods: u32) -> Self {
        self.clv_horizon_periods = periods;
        self
    }

    pub fn trend(mut self, trend: TrendConfig) -> Self {
        self.trend = trend;
        self
    }

    /// Report the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.period_length <= 0 {
            return Err(AnalyticsError::invalid(
                "period_length",
                self.period_length,
                "must be at least one day",
            ));
        }
        if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&self.cluster_count) {
            return Err(AnalyticsError::invalid(
                "cluster_count",
                self.cluster_count,
                format!("must lie in [{}, {}]", MIN_CLUSTERS, MAX_CLUSTERS),
            ));
        }
        self.anomaly().validate()?;
        self.clv().validate()?;
        for (name, rate) in [
            ("base_conversion_rate", self.base_conversion_rate),
            ("add_to_cart_rate", self.add_to_cart_rate),
            ("abandonment_rate", self.abandonment_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AnalyticsError::invalid(name, rate, "must lie in [0, 1]"));
            }
        }
        self.trend.validate()
    }

    pub fn daily_generator(&self) -> DailyGeneratorConfig {
        let config = DailyGeneratorConfig::default()
            .period_length(self.period_length)
            .seed(self.seed);
        match self.end_date {
            Some(date) => config.end_date(date),
            None => config,
        }
    }

    pub fn ecommerce(&self) -> EcommerceConfig {
        EcommerceConfig::default()
            .traffic(self.daily_generator())
            .base_conversion_rate(self.base_conversion_rate)
            .add_to_cart_rate(self.add_to_cart_rate)
            .abandonment_rate(self.abandonment_rate)
    }

    pub fn anomaly(&self) -> AnomalyConfig {
        AnomalyConfig::iqr(self.anomaly_iqr_multiplier)
    }

    pub fn clv(&self) -> ClvConfig {
        ClvConfig::default()
            .horizon(self.clv_horizon_periods)
            .tier_cuts(self.clv_tiers.clone())
    }

    /// Clustering settings ordered by `volume_feature`.
    pub fn clustering(&self, volume_feature: &str) -> ClusterConfig {
        ClusterConfig::default()
            .k(self.cluster_count)
            .seed(self.seed)
            .volume_feature(volume_feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::SlopeScale;

    #[test]
    fn defaults_are_valid() {
        let config = AnalyticsConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cluster_count, 3);
        assert_eq!(config.anomaly().iqr_multiplier, 1.5);
        assert_eq!(config.clv().horizon_periods, 12);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = AnalyticsConfig::from_json_str(
            r#"{ "period_length": 30, "trend": { "scale": "relative_to_mean" } }"#,
        )
        .unwrap();
        assert_eq!(config.period_length, 30);
        assert_eq!(config.seed, 42);
        assert_eq!(config.trend.scale, SlopeScale::RelativeToMean);
        assert_eq!(config.trend.upward_threshold, 5.0);
    }

    #[test]
    fn malformed_json_is_invalid_parameter() {
        let err = AnalyticsConfig::from_json_str("{ seed: }").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidParameter { ref name, .. } if name == "config"));
    }

    #[test]
    fn first_bad_field_is_reported() {
        let cases = [
            (AnalyticsConfig::default().cluster_count(1), "cluster_count"),
            (AnalyticsConfig::default().cluster_count(6), "cluster_count"),
            (AnalyticsConfig::default().period_length(0), "period_length"),
            (
                AnalyticsConfig::default().anomaly_iqr_multiplier(-1.0),
                "anomaly_iqr_multiplier",
            ),
            (
                AnalyticsConfig::default().clv_horizon_periods(0),
                "clv_horizon_periods",
            ),
        ];
        for (config, field) in cases {
            match config.validate() {
                Err(AnalyticsError::InvalidParameter { name, .. }) => assert_eq!(name, field),
                other => panic!("expected invalid {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn derived_configs_share_the_seed() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let config = AnalyticsConfig::default().seed(9).period_length(30).end_date(date);

        let daily = config.daily_generator();
        assert_eq!(daily.seed, 9);
        assert_eq!(daily.period_length, 30);
        assert_eq!(daily.end_date, Some(date));

        let shop = config.ecommerce();
        assert_eq!(shop.traffic, daily);
        assert_eq!(shop.abandonment_rate, 0.70);

        let clustering = config.clustering("revenue");
        assert_eq!(clustering.seed, 9);
        assert_eq!(clustering.k, 3);
        assert_eq!(clustering.volume_feature, "revenue");
    }
}
