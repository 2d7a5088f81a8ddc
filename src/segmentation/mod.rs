//! Rule-based customer segmentation.
//!
//! Both analytics consume the customer-level aggregate produced by
//! [`crate::core::aggregate_customers`].

pub mod clv;
pub mod rfm;

pub use clv::{
    estimate_clv, predict_customer_clv, purchase_frequency, ClvConfig, ClvReport, ClvTierCuts,
    CustomerValue, TierSummary, ValueTier,
};
pub use rfm::{
    quintile_scores, score_rfm, RfmReport, RfmScore, RfmSegment, RfmSegmentSummary, RfmThresholds,
};
