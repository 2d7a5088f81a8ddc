//! Recency / frequency / monetary scoring.
//!
//! Each dimension is scored 1-5 by quintile over the current customer
//! population, then a named segment is picked by a fixed precedence of rules.

use crate::core::{CustomerAggregate, SegmentAssignment};
use crate::utils::{quantile_sorted, stable_rank_order};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named RFM segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RfmSegment {
    Champions,
    LoyalCustomers,
    NewCustomers,
    AtRisk,
    Lost,
    BigSpenders,
    Promising,
}

impl RfmSegment {
    /// All segments in rule precedence order.
    pub const ALL: [RfmSegment; 7] = [
        RfmSegment::Champions,
        RfmSegment::LoyalCustomers,
        RfmSegment::NewCustomers,
        RfmSegment::AtRisk,
        RfmSegment::Lost,
        RfmSegment::BigSpenders,
        RfmSegment::Promising,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RfmSegment::Champions => "Champions",
            RfmSegment::LoyalCustomers => "Loyal Customers",
            RfmSegment::NewCustomers => "New Customers",
            RfmSegment::AtRisk => "At Risk",
            RfmSegment::Lost => "Lost",
            RfmSegment::BigSpenders => "Big Spenders",
            RfmSegment::Promising => "Promising",
        }
    }
}

impl fmt::Display for RfmSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Score thresholds of the segment rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfmThresholds {
    /// Champions: R, F and M all at least this.
    pub champion_min: u8,
    /// Loyal Customers: R, F and M all at least this.
    pub loyal_min: u8,
    /// New Customers: R at least this...
    pub new_recency_min: u8,
    /// ...and F at most this.
    pub new_frequency_max: u8,
    /// At Risk: R at most this...
    pub at_risk_recency_max: u8,
    /// ...and F and M at least this.
    pub at_risk_value_min: u8,
    /// Lost: R and F both at most this.
    pub lost_max: u8,
    /// Big Spenders: M at least this.
    pub big_spender_min: u8,
}

impl Default for RfmThresholds {
    fn default() -> Self {
        Self {
            champion_min: 4,
            loyal_min: 3,
            new_recency_min: 4,
            new_frequency_max: 2,
            at_risk_recency_max: 2,
            at_risk_value_min: 3,
            lost_max: 2,
            big_spender_min: 4,
        }
    }
}

impl RfmThresholds {
    /// Pick the first matching segment.
    pub fn classify(&self, r: u8, f: u8, m: u8) -> RfmSegment {
        if r >= self.champion_min && f >= self.champion_min && m >= self.champion_min {
            RfmSegment::Champions
        } else if r >= self.loyal_min && f >= self.loyal_min && m >= self.loyal_min {
            RfmSegment::LoyalCustomers
        } else if r >= self.new_recency_min && f <= self.new_frequency_max {
            RfmSegment::NewCustomers
        } else if r <= self.at_risk_recency_max
            && f >= self.at_risk_value_min
            && m >= self.at_risk_value_min
        {
            RfmSegment::AtRisk
        } else if r <= self.lost_max && f <= self.lost_max {
            RfmSegment::Lost
        } else if m >= self.big_spender_min {
            RfmSegment::BigSpenders
        } else {
            RfmSegment::Promising
        }
    }
}

/// Scores of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfmScore {
    pub customer_id: String,
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
    /// `recency + frequency + monetary`.
    pub rfm_score: u8,
    pub segment: RfmSegment,
}

/// Customer count and revenue of one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmSegmentSummary {
    pub segment: RfmSegment,
    pub customer_count: usize,
    pub total_revenue: f64,
}

/// Result of RFM scoring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RfmReport {
    /// One entry per purchasing customer, in input order.
    pub scores: Vec<RfmScore>,
    /// Non-empty segments, sorted by revenue descending.
    pub segments: Vec<RfmSegmentSummary>,
    /// Ids of customers without orders, in input order.
    pub unscored: Vec<String>,
}

impl RfmReport {
    pub fn segment_of(&self, customer_id: &str) -> Option<RfmSegment> {
        self.scores
            .iter()
            .find(|s| s.customer_id == customer_id)
            .map(|s| s.segment)
    }

    pub fn assignments(&self) -> Vec<SegmentAssignment> {
        self.scores
            .iter()
            .map(|s| SegmentAssignment {
                entity_id: s.customer_id.clone(),
                segment_label: s.segment.name().to_string(),
                cluster_id: None,
            })
            .collect()
    }
}

/// Score 1-5 by quintile of the population.
///
/// Uses quantile bins when the five bins have distinct edges; otherwise ties
/// make quantile binning ambiguous and scores follow stable rank order.
pub fn quintile_scores(values: &[f64]) -> Vec<u8> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let edges: Vec<f64> = (0..=5)
        .map(|i| quantile_sorted(&sorted, i as f64 / 5.0))
        .collect();

    if edges.windows(2).all(|w| w[0] < w[1]) {
        values
            .iter()
            .map(|&v| edges[1..5].iter().filter(|&&e| v > e).count() as u8 + 1)
            .collect()
    } else {
        let mut scores = vec![1u8; n];
        for (rank, &idx) in stable_rank_order(values).iter().enumerate() {
            scores[idx] = (rank * 5 / n) as u8 + 1;
        }
        scores
    }
}

/// Score purchasing customers and assign segments.
///
/// Quintiles are taken over buyers only; customers without orders are listed
/// in [`RfmReport::unscored`] and never receive a segment.
pub fn score_rfm(customers: &[CustomerAggregate], thresholds: &RfmThresholds) -> RfmReport {
    let (buyers, browsers): (Vec<&CustomerAggregate>, Vec<&CustomerAggregate>) =
        customers.iter().partition(|c| c.has_orders());
    let unscored: Vec<String> = browsers.iter().map(|c| c.customer_id.clone()).collect();
    if buyers.is_empty() {
        return RfmReport {
            unscored,
            ..RfmReport::default()
        };
    }

    let recency: Vec<f64> = buyers
        .iter()
        .map(|c| c.days_since_last_order as f64)
        .collect();
    let frequency: Vec<f64> = buyers.iter().map(|c| c.order_count as f64).collect();
    let monetary: Vec<f64> = buyers.iter().map(|c| c.total_revenue).collect();

    let r_scores = quintile_scores(&recency);
    let f_scores = quintile_scores(&frequency);
    let m_scores = quintile_scores(&monetary);

    let scores: Vec<RfmScore> = buyers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            // fewer days since the last order is better
            let r = 6 - r_scores[i];
            let f = f_scores[i];
            let m = m_scores[i];
            RfmScore {
                customer_id: c.customer_id.clone(),
                recency: r,
                frequency: f,
                monetary: m,
                rfm_score: r + f + m,
                segment: thresholds.classify(r, f, m),
            }
        })
        .collect();

    let mut segments: Vec<RfmSegmentSummary> = RfmSegment::ALL
        .iter()
        .filter_map(|&segment| {
            let members: Vec<usize> = scores
                .iter()
                .enumerate()
                .filter(|(_, s)| s.segment == segment)
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                return None;
            }
            Some(RfmSegmentSummary {
                segment,
                customer_count: members.len(),
                total_revenue: crate::utils::round_cents(
                    members.iter().map(|&i| buyers[i].total_revenue).sum(),
                ),
            })
        })
        .collect();
    segments.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));

    tracing::debug!(
        customers = scores.len(),
        unscored = unscored.len(),
        segments = segments.len(),
        "RFM scoring complete"
    );

    RfmReport {
        scores,
        segments,
        unscored,
    }
}
