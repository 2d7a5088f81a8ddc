//! One-call analysis runs over traffic, customer and e-commerce data.
//!
//! Each run validates the configuration first, derives the component configs
//! from it and returns owned results; inputs are never modified.

use crate::analysis::{
    cart_abandonment, product_performance, CartAbandonmentReport, ProductPerformance,
};
use crate::clustering::{cluster_behavior, BehaviorClusters};
use crate::config::AnalyticsConfig;
use crate::core::{
    aggregate_customers, aggregate_customers_with_sessions, validate_observations,
    CustomerAggregate, Metric, Observation, Product, Transaction,
};
use crate::detection::{
    detect_metric_anomalies, detect_metric_trend, MetricAnomalies, TrendResult,
};
use crate::error::Result;
use crate::generator::EcommerceDataset;
use crate::segmentation::{estimate_clv, score_rfm, ClvReport, RfmReport};
use crate::transform::{CustomerFeature, FeatureMatrix};
use serde::{Deserialize, Serialize};

/// Daily metrics clustered into activity levels.
pub const TRAFFIC_FEATURES: [Metric; 4] = [
    Metric::Sessions,
    Metric::Users,
    Metric::Conversions,
    Metric::Revenue,
];

/// Results of [`analyze_traffic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficAnalytics {
    /// Trend of daily sessions.
    pub trend: TrendResult,
    /// One report per [`Metric`], in [`Metric::ALL`] order.
    pub anomalies: Vec<MetricAnomalies>,
    /// Days grouped by activity over [`TRAFFIC_FEATURES`].
    pub clusters: BehaviorClusters,
}

impl TrafficAnalytics {
    pub fn anomalies_for(&self, metric: Metric) -> Option<&MetricAnomalies> {
        self.anomalies.iter().find(|a| a.metric == metric)
    }
}

/// Results of [`analyze_customers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAnalytics {
    pub customers: Vec<CustomerAggregate>,
    pub rfm: RfmReport,
    pub clv: ClvReport,
    /// Purchasing customers by activity; `None` with fewer customers than clusters.
    pub clusters: Option<BehaviorClusters>,
}

/// Results of [`analyze_ecommerce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcommerceAnalytics {
    pub traffic: TrafficAnalytics,
    pub customers: CustomerAnalytics,
    pub cart_abandonment: CartAbandonmentReport,
    pub products: Vec<ProductPerformance>,
}

/// Trend, anomaly and activity analysis of a daily observation table.
pub fn analyze_traffic(
    observations: &[Observation],
    config: &AnalyticsConfig,
) -> Result<TrafficAnalytics> {
    config.validate()?;
    validate_observations(observations)?;

    let trend = detect_metric_trend(observations, Metric::Sessions, &config.trend)?;
    let anomalies = detect_metric_anomalies(observations, &Metric::ALL, &config.anomaly())?;
    let features = FeatureMatrix::from_observations(observations, &TRAFFIC_FEATURES);
    let clusters = cluster_behavior(&features, &config.clustering(Metric::Sessions.name()))?;

    tracing::debug!(
        days = observations.len(),
        direction = trend.direction.name(),
        anomalies = anomalies.iter().map(|a| a.report.anomaly_count()).sum::<usize>(),
        clusters = clusters.clusters.len(),
        "Traffic analysis complete"
    );
    Ok(TrafficAnalytics {
        trend,
        anomalies,
        clusters,
    })
}

/// RFM, CLV and activity clustering of the customers in a transaction table.
pub fn analyze_customers(
    transactions: &[Transaction],
    config: &AnalyticsConfig,
) -> Result<CustomerAnalytics> {
    config.validate()?;
    analyze_aggregates(aggregate_customers(transactions, None), config)
}

/// Full analysis of a generated e-commerce dataset.
///
/// Customers include browse-only visitors, who are scored by RFM and reported
/// without purchase history by CLV.
pub fn analyze_ecommerce(
    dataset: &EcommerceDataset,
    catalog: &[Product],
    config: &AnalyticsConfig,
) -> Result<EcommerceAnalytics> {
    let traffic = analyze_traffic(&dataset.observations, config)?;
    let customers = analyze_aggregates(
        aggregate_customers_with_sessions(&dataset.sessions, &dataset.transactions, None),
        config,
    )?;
    Ok(EcommerceAnalytics {
        traffic,
        customers,
        cart_abandonment: cart_abandonment(&dataset.sessions),
        products: product_performance(&dataset.transactions, catalog),
    })
}

fn analyze_aggregates(
    customers: Vec<CustomerAggregate>,
    config: &AnalyticsConfig,
) -> Result<CustomerAnalytics> {
    let rfm = score_rfm(&customers, &config.rfm);
    let clv = estimate_clv(&customers, &config.clv())?;

    let purchasing: Vec<CustomerAggregate> = customers
        .iter()
        .filter(|c| c.has_orders())
        .cloned()
        .collect();
    let clusters = if purchasing.len() >= config.cluster_count {
        let features = FeatureMatrix::from_customers(&purchasing, &CustomerFeature::ALL);
        Some(cluster_behavior(
            &features,
            &config.clustering(CustomerFeature::OrderCount.name()),
        )?)
    } else {
        tracing::debug!(
            purchasing = purchasing.len(),
            k = config.cluster_count,
            "Too few purchasing customers to cluster"
        );
        None
    };

    tracing::debug!(
        customers = customers.len(),
        segments = rfm.segments.len(),
        no_purchase = clv.no_purchase_count,
        "Customer analysis complete"
    );
    Ok(CustomerAnalytics {
        customers,
        rfm,
        clv,
        clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::generator::{default_catalog, generate_ecommerce, generate_observations};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn config() -> AnalyticsConfig {
        AnalyticsConfig::default()
            .period_length(60)
            .end_date(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap())
    }

    #[test]
    fn traffic_analysis_covers_every_metric() {
        let obs = generate_observations(&config().daily_generator()).unwrap();
        let result = analyze_traffic(&obs, &config()).unwrap();

        assert_eq!(result.anomalies.len(), Metric::ALL.len());
        assert!(result.anomalies_for(Metric::Revenue).is_some());
        assert_eq!(result.trend.fitted.len(), 60);
        assert_eq!(result.clusters.assignments.len(), 60);
        assert_eq!(result.clusters.clusters.len(), 3);
    }

    #[test]
    fn traffic_analysis_rejects_bad_rows() {
        let mut obs = generate_observations(&config().daily_generator()).unwrap();
        obs[3].users = obs[3].sessions + 1;
        assert!(matches!(
            analyze_traffic(&obs, &config()),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn invalid_config_fails_first() {
        let obs = generate_observations(&config().daily_generator()).unwrap();
        assert!(matches!(
            analyze_traffic(&obs, &config().cluster_count(9)),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn few_customers_are_not_clustered() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let lines = vec![
            Transaction::new("T1", "C1", ts, "P001", 1, 79.99),
            Transaction::new("T2", "C2", ts, "P002", 1, 199.99),
        ];
        let result = analyze_customers(&lines, &config()).unwrap();

        assert_eq!(result.customers.len(), 2);
        assert_eq!(result.rfm.scores.len(), 2);
        assert_eq!(result.clv.customers.len(), 2);
        assert!(result.clusters.is_none());
    }

    #[test]
    fn ecommerce_analysis_end_to_end() {
        let mut shop = config().period_length(30).ecommerce();
        shop.traffic = shop.traffic.base_rate(150.0).growth_amount(10.0).noise_std(10.0);
        shop.customer_pool_size = 400;
        let catalog = default_catalog();
        let dataset = generate_ecommerce(&shop, &catalog).unwrap();

        let result = analyze_ecommerce(&dataset, &catalog, &config()).unwrap();

        let visitors: std::collections::HashSet<_> =
            dataset.sessions.iter().map(|s| &s.customer_id).collect();
        assert_eq!(result.customers.customers.len(), visitors.len());
        let rfm = &result.customers.rfm;
        assert_eq!(rfm.scores.len() + rfm.unscored.len(), visitors.len());
        assert_eq!(rfm.unscored.len(), result.customers.clv.no_purchase_count);
        assert!(result.customers.clv.no_purchase_count > 0);
        assert_eq!(
            result.cart_abandonment.total_carts,
            dataset.cart_events.len()
        );
        let sold: u64 = result.products.iter().map(|p| p.units_sold).sum();
        let lines: u64 = dataset.transactions.iter().map(|t| t.quantity as u64).sum();
        assert_eq!(sold, lines);

        let clusters = result.customers.clusters.expect("enough buyers to cluster");
        let buyers = result
            .customers
            .customers
            .iter()
            .filter(|c| c.has_orders())
            .count();
        assert_eq!(clusters.assignments.len(), buyers);
        assert_eq!(rfm.scores.len(), buyers);
    }
}
