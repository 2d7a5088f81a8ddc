//! # anofox-analytics
//!
//! Behavioral analytics engine for web-traffic and e-commerce data.
//!
//! Generates internally consistent synthetic datasets (daily observations,
//! sessions, carts and transactions) and derives decision-ready metrics from
//! them: RFM segments, customer lifetime value tiers, linear trends, IQR
//! anomalies and k-means activity clusters.
//!
//! ```
//! use anofox_analytics::prelude::*;
//!
//! let config = AnalyticsConfig::default().period_length(60);
//! let days = generate_observations(&config.daily_generator()).unwrap();
//! let traffic = analyze_traffic(&days, &config).unwrap();
//! assert_eq!(traffic.clusters.assignments.len(), 60);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod clustering;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod segmentation;
pub mod transform;
pub mod utils;

pub use error::{AnalyticsError, Result};

pub mod prelude {
    pub use crate::config::AnalyticsConfig;
    pub use crate::core::{CustomerAggregate, Metric, Observation, SegmentAssignment, Transaction};
    pub use crate::error::{AnalyticsError, Result};
    pub use crate::generator::{
        default_catalog, generate_ecommerce, generate_observations, DailyGeneratorConfig,
        EcommerceConfig,
    };
    pub use crate::pipeline::{analyze_customers, analyze_ecommerce, analyze_traffic};
}
