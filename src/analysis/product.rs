//! Product performance from transaction lines.

use crate::core::{Product, Transaction};
use crate::utils::{round_cents, safe_div};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sales figures for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_id: String,
    /// Catalog name and category; empty when the product is not in the catalog.
    pub name: String,
    pub category: String,
    pub units_sold: u64,
    pub revenue: f64,
    /// Distinct orders containing the product.
    pub order_count: usize,
    /// Share of total revenue over all products, in `[0, 1]`.
    pub revenue_share: f64,
    pub avg_quantity_per_order: f64,
}

#[derive(Default)]
struct ProductTally<'a> {
    units: u64,
    revenue: f64,
    orders: BTreeSet<&'a str>,
}

/// Per-product sales, sorted by revenue descending then product id.
///
/// Products that never sold are omitted.
pub fn product_performance(
    transactions: &[Transaction],
    catalog: &[Product],
) -> Vec<ProductPerformance> {
    let mut tallies: BTreeMap<&str, ProductTally> = BTreeMap::new();
    for t in transactions {
        let tally = tallies.entry(t.product_id.as_str()).or_default();
        tally.units += t.quantity as u64;
        tally.revenue += t.revenue;
        tally.orders.insert(t.transaction_id.as_str());
    }

    let total_revenue: f64 = tallies.values().map(|t| t.revenue).sum();
    let lookup: BTreeMap<&str, &Product> = catalog.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut rows: Vec<ProductPerformance> = tallies
        .into_iter()
        .map(|(id, t)| {
            let (name, category) = lookup
                .get(id)
                .map(|p| (p.name.clone(), p.category.clone()))
                .unwrap_or_default();
            ProductPerformance {
                product_id: id.to_string(),
                name,
                category,
                units_sold: t.units,
                revenue: round_cents(t.revenue),
                order_count: t.orders.len(),
                revenue_share: safe_div(t.revenue, total_revenue),
                avg_quantity_per_order: safe_div(t.units as f64, t.orders.len() as f64),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    tracing::debug!(
        products = rows.len(),
        lines = transactions.len(),
        "Product performance computed"
    );
    rows
}
