//! Feature preparation for distance-based algorithms.
//!
//! # Example
//!
//! ```
//! use anofox_analytics::transform::{FeatureMatrix, StandardScaler};
//!
//! let features = FeatureMatrix::new(
//!     vec!["sessions".to_string(), "revenue".to_string()],
//!     vec![vec![100.0, 900.0], vec![200.0, 1500.0], vec![300.0, 2400.0]],
//! )
//! .unwrap();
//!
//! let (scaler, scaled) = StandardScaler::fit_transform(&features).unwrap();
//! assert!(scaler.degenerate_columns().is_empty());
//! assert_eq!(scaled.n_rows(), 3);
//! ```

pub mod scale;

pub use scale::{ColumnScale, CustomerFeature, FeatureMatrix, StandardScaler};
