//! Synthetic behavioral data.
//!
//! [`generate_observations`] produces daily web-traffic rows;
//! [`generate_ecommerce`] expands daily traffic into sessions, carts and
//! transactions over a product catalog.
//!
//! # Example
//!
//! ```
//! use anofox_analytics::generator::{generate_observations, DailyGeneratorConfig};
//!
//! let config = DailyGeneratorConfig::default().period_length(30).seed(1);
//! let days = generate_observations(&config).unwrap();
//! assert_eq!(days.len(), 30);
//! assert!(days.iter().all(|d| d.users <= d.sessions));
//! ```

mod catalog;
mod daily;
mod ecommerce;

pub use catalog::default_catalog;
pub use daily::{generate_observations, weekday_factor, DailyGeneratorConfig, WEEKDAY_FACTORS};
pub use ecommerce::{generate_ecommerce, EcommerceConfig, EcommerceDataset};
