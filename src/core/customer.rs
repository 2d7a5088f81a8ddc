//! Customer-level aggregation and segment assignments.

use super::commerce::{Session, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-customer summary derived from the transaction table.
///
/// Recomputed on every analytics run; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Number of distinct transaction ids.
    pub order_count: usize,
    pub total_revenue: f64,
    /// `total_revenue / order_count`, or 0 without orders.
    pub avg_order_value: f64,
    /// Whole days between the last activity and the reference date.
    pub days_since_last_order: i64,
}

impl CustomerAggregate {
    /// Whether the customer has ever completed a purchase.
    pub fn has_orders(&self) -> bool {
        self.order_count > 0
    }

    /// Whole days between first and last activity; same-day activity spans 0.
    pub fn active_span_days(&self) -> i64 {
        (self.last_seen - self.first_seen).num_days().max(0)
    }
}

/// Label given to an entity by one analytic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAssignment {
    pub entity_id: String,
    pub segment_label: String,
    /// Only set when the segment came from clustering.
    pub cluster_id: Option<usize>,
}

#[derive(Default)]
struct Accumulator {
    first_seen: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
    last_order: Option<DateTime<Utc>>,
    orders: BTreeSet<String>,
    revenue: f64,
}

impl Accumulator {
    fn touch(&mut self, at: DateTime<Utc>) {
        self.first_seen = Some(self.first_seen.map_or(at, |f| f.min(at)));
        self.last_seen = Some(self.last_seen.map_or(at, |l| l.max(at)));
    }

    fn finish(self, customer_id: String, as_of: DateTime<Utc>) -> Option<CustomerAggregate> {
        let first_seen = self.first_seen?;
        let last_seen = self.last_seen?;
        let order_count = self.orders.len();
        let reference = self.last_order.unwrap_or(last_seen);
        let total_revenue = crate::utils::round_cents(self.revenue);
        Some(CustomerAggregate {
            customer_id,
            first_seen,
            last_seen,
            order_count,
            total_revenue,
            avg_order_value: crate::utils::round_cents(crate::utils::safe_div(
                total_revenue,
                order_count as f64,
            )),
            days_since_last_order: (as_of - reference).num_days().max(0),
        })
    }
}

/// Aggregate transactions into one row per customer, sorted by customer id.
///
/// `as_of` defaults to the latest transaction timestamp.
pub fn aggregate_customers(
    transactions: &[Transaction],
    as_of: Option<DateTime<Utc>>,
) -> Vec<CustomerAggregate> {
    aggregate_customers_with_sessions(&[], transactions, as_of)
}

/// Aggregate sessions and transactions; browsing-only customers get `order_count = 0`.
///
/// For customers without orders, recency is measured from their last session.
/// `as_of` defaults to the latest timestamp seen in either table.
pub fn aggregate_customers_with_sessions(
    sessions: &[Session],
    transactions: &[Transaction],
    as_of: Option<DateTime<Utc>>,
) -> Vec<CustomerAggregate> {
    let mut acc: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for session in sessions {
        acc.entry(session.customer_id.as_str())
            .or_default()
            .touch(session.started_at);
    }

    for line in transactions {
        let entry = acc.entry(line.customer_id.as_str()).or_default();
        entry.touch(line.timestamp);
        entry.last_order = Some(entry.last_order.map_or(line.timestamp, |l| l.max(line.timestamp)));
        entry.orders.insert(line.transaction_id.clone());
        entry.revenue += line.revenue;
    }

    let latest = sessions
        .iter()
        .map(|s| s.started_at)
        .chain(transactions.iter().map(|t| t.timestamp))
        .max();
    let Some(as_of) = as_of.or(latest) else {
        return Vec::new();
    };

    let customers: Vec<CustomerAggregate> = acc
        .into_iter()
        .filter_map(|(id, a)| a.finish(id.to_string(), as_of))
        .collect();

    tracing::debug!(
        customers = customers.len(),
        transactions = transactions.len(),
        sessions = sessions.len(),
        "Customer aggregation complete"
    );

    customers
}
