//! Customer lifetime value estimation.
//!
//! `predicted = avg_order_value * purchase_frequency * horizon_periods`, where
//! the purchase frequency is orders per observed period. Purchasing customers
//! are then bucketed into value tiers by population quantile.

use crate::core::{CustomerAggregate, SegmentAssignment};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value tier of a purchasing customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueTier {
    Low,
    Medium,
    High,
    Vip,
}

impl ValueTier {
    pub const ALL: [ValueTier; 4] = [
        ValueTier::Low,
        ValueTier::Medium,
        ValueTier::High,
        ValueTier::Vip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueTier::Low => "Low Value",
            ValueTier::Medium => "Medium Value",
            ValueTier::High => "High Value",
            ValueTier::Vip => "VIP",
        }
    }
}

impl fmt::Display for ValueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Population shares of the upper tiers, counted from the top.
///
/// Whatever is left after VIP, High and Medium is Low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClvTierCuts {
    pub vip_share: f64,
    pub high_share: f64,
    pub medium_share: f64,
}

impl Default for ClvTierCuts {
    fn default() -> Self {
        Self {
            vip_share: 0.10,
            high_share: 0.20,
            medium_share: 0.30,
        }
    }
}

impl ClvTierCuts {
    pub fn validate(&self) -> Result<()> {
        for (name, share) in [
            ("clv.tier_cuts.vip_share", self.vip_share),
            ("clv.tier_cuts.high_share", self.high_share),
            ("clv.tier_cuts.medium_share", self.medium_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(AnalyticsError::invalid(name, share, "must lie in [0, 1]"));
            }
        }
        let total = self.vip_share + self.high_share + self.medium_share;
        if total > 1.0 + 1e-12 {
            return Err(AnalyticsError::invalid(
                "clv.tier_cuts",
                total,
                "tier shares must not sum above 1",
            ));
        }
        Ok(())
    }

    /// Minimum total CLV for VIP, High and Medium, from the population.
    fn thresholds(&self, sorted: &[f64]) -> [f64; 3] {
        let vip = 1.0 - self.vip_share;
        let high = vip - self.high_share;
        let medium = high - self.medium_share;
        [
            crate::utils::quantile_sorted(sorted, vip),
            crate::utils::quantile_sorted(sorted, high),
            crate::utils::quantile_sorted(sorted, medium),
        ]
    }
}

/// CLV estimation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClvConfig {
    /// Projection horizon in periods.
    pub horizon_periods: u32,
    /// Length of one period in days.
    pub period_days: f64,
    pub tier_cuts: ClvTierCuts,
}

impl Default for ClvConfig {
    fn default() -> Self {
        Self {
            horizon_periods: 12,
            period_days: 30.0,
            tier_cuts: ClvTierCuts::default(),
        }
    }
}

impl ClvConfig {
    pub fn horizon(mut self, periods: u32) -> Self {
        self.horizon_periods = periods;
        self
    }

    pub fn tier_cuts(mut self, cuts: ClvTierCuts) -> Self {
        self.tier_cuts = cuts;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon_periods == 0 {
            return Err(AnalyticsError::invalid(
                "clv_horizon_periods",
                self.horizon_periods,
                "must be at least 1",
            ));
        }
        if !self.period_days.is_finite() || self.period_days <= 0.0 {
            return Err(AnalyticsError::invalid(
                "clv.period_days",
                self.period_days,
                "must be positive",
            ));
        }
        self.tier_cuts.validate()
    }
}

/// Lifetime value of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerValue {
    pub customer_id: String,
    pub historical_clv: f64,
    pub predicted_clv: f64,
    pub total_clv: f64,
    /// Orders per period.
    pub purchase_frequency: f64,
    /// `None` for customers without purchase history.
    pub tier: Option<ValueTier>,
    pub no_purchase_history: bool,
}

/// Count and value of one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSummary {
    pub tier: ValueTier,
    pub customer_count: usize,
    pub total_clv: f64,
}

/// Result of CLV estimation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClvReport {
    /// One entry per input customer, in input order.
    pub customers: Vec<CustomerValue>,
    /// Tiers from Low to VIP.
    pub tiers: Vec<TierSummary>,
    pub no_purchase_count: usize,
}

impl ClvReport {
    pub fn assignments(&self) -> Vec<SegmentAssignment> {
        self.customers
            .iter()
            .map(|c| SegmentAssignment {
                entity_id: c.customer_id.clone(),
                segment_label: c
                    .tier
                    .map_or("No Purchase", |t| t.name())
                    .to_string(),
                cluster_id: None,
            })
            .collect()
    }
}

/// Orders per period; a customer active within a single day counts as one period.
pub fn purchase_frequency(customer: &CustomerAggregate, period_days: f64) -> f64 {
    let mut observed_periods = customer.active_span_days() as f64 / period_days;
    if observed_periods == 0.0 {
        observed_periods = 1.0;
    }
    crate::utils::safe_div(customer.order_count as f64, observed_periods)
}

/// Projected value of one customer over the configured horizon.
///
/// Customers without orders cannot be projected.
pub fn predict_customer_clv(customer: &CustomerAggregate, config: &ClvConfig) -> Result<f64> {
    if customer.order_count == 0 {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(customer.avg_order_value
        * purchase_frequency(customer, config.period_days)
        * config.horizon_periods as f64)
}

/// Estimate historical and predicted CLV and assign value tiers.
pub fn estimate_clv(customers: &[CustomerAggregate], config: &ClvConfig) -> Result<ClvReport> {
    config.validate()?;

    let mut values: Vec<CustomerValue> = Vec::with_capacity(customers.len());
    for customer in customers {
        let value = match predict_customer_clv(customer, config) {
            Ok(predicted) => CustomerValue {
                customer_id: customer.customer_id.clone(),
                historical_clv: customer.total_revenue,
                predicted_clv: predicted,
                total_clv: customer.total_revenue + predicted,
                purchase_frequency: purchase_frequency(customer, config.period_days),
                tier: None,
                no_purchase_history: false,
            },
            Err(AnalyticsError::InsufficientData { .. }) => CustomerValue {
                customer_id: customer.customer_id.clone(),
                historical_clv: customer.total_revenue,
                predicted_clv: 0.0,
                total_clv: customer.total_revenue,
                purchase_frequency: 0.0,
                tier: None,
                no_purchase_history: true,
            },
            Err(other) => return Err(other),
        };
        values.push(value);
    }

    let mut purchasing: Vec<f64> = values
        .iter()
        .filter(|v| !v.no_purchase_history)
        .map(|v| v.total_clv)
        .collect();
    purchasing.sort_by(f64::total_cmp);

    if !purchasing.is_empty() {
        let [vip, high, medium] = config.tier_cuts.thresholds(&purchasing);
        for value in values.iter_mut().filter(|v| !v.no_purchase_history) {
            value.tier = Some(if value.total_clv >= vip && config.tier_cuts.vip_share > 0.0 {
                ValueTier::Vip
            } else if value.total_clv >= high && config.tier_cuts.high_share > 0.0 {
                ValueTier::High
            } else if value.total_clv >= medium && config.tier_cuts.medium_share > 0.0 {
                ValueTier::Medium
            } else {
                ValueTier::Low
            });
        }
    }

    let tiers: Vec<TierSummary> = ValueTier::ALL
        .iter()
        .map(|&tier| {
            let members = values.iter().filter(|v| v.tier == Some(tier));
            let (count, total) = members.fold((0, 0.0), |(n, s), v| (n + 1, s + v.total_clv));
            TierSummary {
                tier,
                customer_count: count,
                total_clv: crate::utils::round_cents(total),
            }
        })
        .collect();

    let no_purchase_count = values.iter().filter(|v| v.no_purchase_history).count();
    if no_purchase_count > 0 {
        tracing::warn!(
            customers = no_purchase_count,
            "Customers without purchase history reported with zero predicted CLV"
        );
    }
    tracing::debug!(
        customers = values.len(),
        horizon = config.horizon_periods,
        "CLV estimation complete"
    );

    Ok(ClvReport {
        customers: values,
        tiers,
        no_purchase_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn customer(id: &str, span_days: i64, orders: usize, revenue: f64) -> CustomerAggregate {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CustomerAggregate {
            customer_id: id.to_string(),
            first_seen: first,
            last_seen: first + Duration::days(span_days),
            order_count: orders,
            total_revenue: revenue,
            avg_order_value: crate::utils::safe_div(revenue, orders as f64),
            days_since_last_order: 3,
        }
    }

    #[test]
    fn predicted_clv_formula() {
        // 4 orders over 60 days = 2 per 30-day period, AOV 50, 12 periods
        let c = customer("C1", 60, 4, 200.0);
        let predicted = predict_customer_clv(&c, &ClvConfig::default()).unwrap();
        assert_relative_eq!(predicted, 50.0 * 2.0 * 12.0, epsilon = 1e-9);
    }

    #[test]
    fn single_day_customer_counts_one_period() {
        let c = customer("C1", 0, 1, 80.0);
        assert_relative_eq!(purchase_frequency(&c, 30.0), 1.0, epsilon = 1e-12);
        let predicted = predict_customer_clv(&c, &ClvConfig::default().horizon(6)).unwrap();
        assert_relative_eq!(predicted, 480.0, epsilon = 1e-9);
    }

    #[test]
    fn same_day_repeat_orders_count_one_period() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let c = CustomerAggregate {
            last_seen: first + Duration::hours(1),
            first_seen: first,
            ..customer("C1", 0, 2, 100.0)
        };

        assert_relative_eq!(purchase_frequency(&c, 30.0), 2.0, epsilon = 1e-12);
        let predicted = predict_customer_clv(&c, &ClvConfig::default()).unwrap();
        assert_relative_eq!(predicted, 1200.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_orders_cannot_be_predicted() {
        let c = customer("C0", 10, 0, 0.0);
        assert_eq!(
            predict_customer_clv(&c, &ClvConfig::default()),
            Err(AnalyticsError::InsufficientData { needed: 1, got: 0 })
        );
    }

    #[test]
    fn zero_orders_are_flagged_not_fatal() {
        let customers = vec![customer("C0", 10, 0, 0.0), customer("C1", 30, 2, 100.0)];
        let report = estimate_clv(&customers, &ClvConfig::default()).unwrap();

        let none = &report.customers[0];
        assert!(none.no_purchase_history);
        assert_eq!(none.predicted_clv, 0.0);
        assert_eq!(none.tier, None);
        assert_eq!(report.no_purchase_count, 1);
        assert_eq!(report.assignments()[0].segment_label, "No Purchase");

        assert_eq!(report.customers[1].tier, Some(ValueTier::Vip));
    }

    #[test]
    fn tiers_follow_population_shares() {
        let customers: Vec<CustomerAggregate> = (1..=100)
            .map(|i| customer(&format!("C{:03}", i), 30, 1, i as f64))
            .collect();
        let report = estimate_clv(&customers, &ClvConfig::default()).unwrap();

        let count = |tier: ValueTier| {
            report
                .tiers
                .iter()
                .find(|t| t.tier == tier)
                .map(|t| t.customer_count)
                .unwrap()
        };
        assert_eq!(count(ValueTier::Vip), 10);
        assert_eq!(count(ValueTier::High), 20);
        assert_eq!(count(ValueTier::Medium), 30);
        assert_eq!(count(ValueTier::Low), 40);
        assert_eq!(report.customers[99].tier, Some(ValueTier::Vip));
        assert_eq!(report.customers[0].tier, Some(ValueTier::Low));
    }

    #[test]
    fn totals_add_historical_and_predicted() {
        let customers = vec![customer("C1", 90, 3, 150.0)];
        let report = estimate_clv(&customers, &ClvConfig::default()).unwrap();
        let v = &report.customers[0];
        assert_relative_eq!(v.historical_clv, 150.0, epsilon = 1e-9);
        assert_relative_eq!(v.total_clv, v.historical_clv + v.predicted_clv, epsilon = 1e-9);
        assert_relative_eq!(v.purchase_frequency, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_configuration_rejected() {
        assert!(ClvConfig::default().horizon(0).validate().is_err());
        let cuts = ClvTierCuts {
            vip_share: 0.5,
            high_share: 0.4,
            medium_share: 0.3,
        };
        assert!(ClvConfig::default().tier_cuts(cuts).validate().is_err());
        let negative = ClvTierCuts {
            vip_share: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn empty_population() {
        let report = estimate_clv(&[], &ClvConfig::default()).unwrap();
        assert!(report.customers.is_empty());
        assert!(report.tiers.iter().all(|t| t.customer_count == 0));
    }
}
