//! Utility functions shared by the analytics components.

pub mod stats;

pub use stats::{
    mean, median, population_std, population_variance, quantile, quantile_sorted, round_cents,
    safe_div, stable_rank_order,
};
