//! Cart abandonment analysis.

use crate::core::{Channel, Device, Session};
use crate::utils::safe_div;
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Abandonment counts for one group of cart sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbandonmentBreakdown<K> {
    pub key: K,
    pub total_carts: usize,
    pub abandoned_carts: usize,
    /// `abandoned_carts / total_carts`.
    pub abandonment_rate: f64,
}

/// Cart abandonment overall and by device, channel and hour of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartAbandonmentReport {
    pub total_carts: usize,
    pub abandoned_carts: usize,
    /// 0 when no session added to cart.
    pub abandonment_rate: f64,
    pub by_device: Vec<AbandonmentBreakdown<Device>>,
    pub by_channel: Vec<AbandonmentBreakdown<Channel>>,
    /// Keyed by the UTC hour the session started.
    pub by_hour: Vec<AbandonmentBreakdown<u32>>,
}

#[derive(Default)]
struct Tally {
    total: usize,
    abandoned: usize,
}

impl Tally {
    fn add(&mut self, abandoned: bool) {
        self.total += 1;
        if abandoned {
            self.abandoned += 1;
        }
    }
}

fn breakdown<K: Ord>(groups: BTreeMap<K, Tally>) -> Vec<AbandonmentBreakdown<K>> {
    groups
        .into_iter()
        .map(|(key, t)| AbandonmentBreakdown {
            key,
            total_carts: t.total,
            abandoned_carts: t.abandoned,
            abandonment_rate: safe_div(t.abandoned as f64, t.total as f64),
        })
        .collect()
}

/// Summarize abandonment over sessions that added to cart.
///
/// Groups only list keys that have at least one cart, in key order.
pub fn cart_abandonment(sessions: &[Session]) -> CartAbandonmentReport {
    let mut overall = Tally::default();
    let mut by_device: BTreeMap<Device, Tally> = BTreeMap::new();
    let mut by_channel: BTreeMap<Channel, Tally> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, Tally> = BTreeMap::new();

    for s in sessions.iter().filter(|s| s.added_to_cart) {
        overall.add(s.cart_abandoned);
        by_device.entry(s.device).or_default().add(s.cart_abandoned);
        by_channel.entry(s.channel).or_default().add(s.cart_abandoned);
        by_hour
            .entry(s.started_at.hour())
            .or_default()
            .add(s.cart_abandoned);
    }

    let report = CartAbandonmentReport {
        total_carts: overall.total,
        abandoned_carts: overall.abandoned,
        abandonment_rate: safe_div(overall.abandoned as f64, overall.total as f64),
        by_device: breakdown(by_device),
        by_channel: breakdown(by_channel),
        by_hour: breakdown(by_hour),
    };
    tracing::debug!(
        sessions = sessions.len(),
        carts = report.total_carts,
        abandoned = report.abandoned_carts,
        "Cart abandonment analysed"
    );
    report
}
