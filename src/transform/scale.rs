//! Feature matrices and z-score scaling.
//!
//! Distance-based algorithms (k-means) are run on standardized features so that
//! revenue-scale columns do not drown out count-scale ones.

use crate::core::{CustomerAggregate, Metric, Observation};
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};

/// Columns with a standard deviation below this are treated as constant.
const MIN_STD: f64 = 1e-10;

/// Row-major numeric table with named columns and row ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    ids: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create a matrix; row ids default to the row index.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for row in &rows {
            if row.len() != columns.len() {
                return Err(AnalyticsError::DimensionMismatch {
                    expected: columns.len(),
                    got: row.len(),
                });
            }
        }
        let ids = (0..rows.len()).map(|i| i.to_string()).collect();
        Ok(Self { columns, ids, rows })
    }

    /// Replace the row ids.
    pub fn with_ids(mut self, ids: Vec<String>) -> Result<Self> {
        if ids.len() != self.rows.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.rows.len(),
                got: ids.len(),
            });
        }
        self.ids = ids;
        Ok(self)
    }

    /// One row per observation, one column per metric; ids are RFC 3339 dates.
    pub fn from_observations(observations: &[Observation], metrics: &[Metric]) -> Self {
        Self {
            columns: metrics.iter().map(|m| m.name().to_string()).collect(),
            ids: observations
                .iter()
                .map(|o| o.timestamp.date_naive().to_string())
                .collect(),
            rows: observations
                .iter()
                .map(|o| metrics.iter().map(|m| m.value(o)).collect())
                .collect(),
        }
    }

    /// One row per customer, one column per feature; ids are customer ids.
    pub fn from_customers(customers: &[CustomerAggregate], features: &[CustomerFeature]) -> Self {
        Self {
            columns: features.iter().map(|f| f.name().to_string()).collect(),
            ids: customers.iter().map(|c| c.customer_id.clone()).collect(),
            rows: customers
                .iter()
                .map(|c| features.iter().map(|f| f.value(c)).collect())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy out one column.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[index]).collect()
    }

    fn with_rows(&self, rows: Vec<Vec<f64>>) -> Self {
        Self {
            columns: self.columns.clone(),
            ids: self.ids.clone(),
            rows,
        }
    }
}

/// Numeric column of a [`CustomerAggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerFeature {
    OrderCount,
    TotalRevenue,
    AvgOrderValue,
    DaysSinceLastOrder,
}

impl CustomerFeature {
    pub const ALL: [CustomerFeature; 4] = [
        CustomerFeature::OrderCount,
        CustomerFeature::TotalRevenue,
        CustomerFeature::AvgOrderValue,
        CustomerFeature::DaysSinceLastOrder,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CustomerFeature::OrderCount => "order_count",
            CustomerFeature::TotalRevenue => "total_revenue",
            CustomerFeature::AvgOrderValue => "avg_order_value",
            CustomerFeature::DaysSinceLastOrder => "days_since_last_order",
        }
    }

    pub fn value(self, customer: &CustomerAggregate) -> f64 {
        match self {
            CustomerFeature::OrderCount => customer.order_count as f64,
            CustomerFeature::TotalRevenue => customer.total_revenue,
            CustomerFeature::AvgOrderValue => customer.avg_order_value,
            CustomerFeature::DaysSinceLastOrder => customer.days_since_last_order as f64,
        }
    }
}

/// Mean and population standard deviation of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

impl ColumnScale {
    /// Constant columns cannot be standardized.
    pub fn is_degenerate(&self) -> bool {
        self.std.is_nan() || self.std < MIN_STD
    }
}

/// Fitted z-score scaler that can be replayed on new data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ColumnScale>,
}

impl StandardScaler {
    /// Compute per-column mean and population std.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self> {
        if matrix.is_empty() {
            return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
        }
        let params = matrix
            .columns
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let column = matrix.column(j);
                ColumnScale {
                    name: name.clone(),
                    mean: crate::utils::mean(&column),
                    std: crate::utils::population_std(&column),
                }
            })
            .collect();
        Ok(Self { params })
    }

    /// Fit and transform in one step.
    pub fn fit_transform(matrix: &FeatureMatrix) -> Result<(Self, FeatureMatrix)> {
        let scaler = Self::fit(matrix)?;
        let scaled = scaler.transform(matrix)?;
        Ok((scaler, scaled))
    }

    pub fn params(&self) -> &[ColumnScale] {
        &self.params
    }

    /// Names of the zero-variance columns.
    pub fn degenerate_columns(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.is_degenerate())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Report the first zero-variance column as an error.
    pub fn require_variance(&self) -> Result<()> {
        match self.params.iter().find(|p| p.is_degenerate()) {
            Some(p) => Err(AnalyticsError::DegenerateFeature {
                column: p.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Standardize a matrix with the fitted parameters.
    ///
    /// Degenerate columns come out as 0 for every row.
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.check_width(matrix)?;
        let rows = matrix
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.params)
                    .map(|(&x, p)| {
                        if p.is_degenerate() {
                            0.0
                        } else {
                            (x - p.mean) / p.std
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(matrix.with_rows(rows))
    }

    /// Map standardized values back to the original scale.
    pub fn inverse_transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.check_width(matrix)?;
        let rows = matrix
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.params)
                    .map(|(&z, p)| {
                        if p.is_degenerate() {
                            p.mean
                        } else {
                            z * p.std + p.mean
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(matrix.with_rows(rows))
    }

    fn check_width(&self, matrix: &FeatureMatrix) -> Result<()> {
        if matrix.n_cols() != self.params.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.params.len(),
                got: matrix.n_cols(),
            });
        }
        Ok(())
    }
}
