//! E-commerce entities: catalog products, sessions, cart events and transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Unit price, always positive.
    pub price: f64,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
        }
    }
}

/// Device a session was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Device {
    Desktop,
    Mobile,
    Tablet,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Desktop, Device::Mobile, Device::Tablet];

    pub fn name(self) -> &'static str {
        match self {
            Device::Desktop => "Desktop",
            Device::Mobile => "Mobile",
            Device::Tablet => "Tablet",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Acquisition channel of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    OrganicSearch,
    PaidSearch,
    SocialMedia,
    Direct,
    Email,
    Referral,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::OrganicSearch,
        Channel::PaidSearch,
        Channel::SocialMedia,
        Channel::Direct,
        Channel::Email,
        Channel::Referral,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::OrganicSearch => "Organic Search",
            Channel::PaidSearch => "Paid Search",
            Channel::SocialMedia => "Social Media",
            Channel::Direct => "Direct",
            Channel::Email => "Email",
            Channel::Referral => "Referral",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One visit to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub customer_id: String,
    pub started_at: DateTime<Utc>,
    pub device: Device,
    pub channel: Channel,
    pub is_returning: bool,
    /// At least one page per session.
    pub pages_viewed: u32,
    pub duration_secs: u32,
    pub added_to_cart: bool,
    /// Only set for carts that did not convert.
    pub cart_abandoned: bool,
    /// Implies `added_to_cart`.
    pub converted: bool,
}

/// What happened to a cart after products were added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOutcome {
    Purchased,
    Abandoned,
    /// Neither purchased nor abandoned within the session.
    Open,
}

/// Add-to-cart activity of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEvent {
    pub session_id: String,
    pub customer_id: String,
    pub timestamp: DateTime<Utc>,
    pub product_ids: Vec<String>,
    pub outcome: CartOutcome,
}

/// One purchased line. Lines of the same purchase share a `transaction_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: String,
    pub timestamp: DateTime<Utc>,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    /// `quantity * unit_price`, rounded to cents.
    pub revenue: f64,
}

impl Transaction {
    /// Build a line, deriving `revenue` from quantity and unit price.
    pub fn new(
        transaction_id: impl Into<String>,
        customer_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        product_id: impl Into<String>,
        quantity: u32,
        unit_price: f64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            customer_id: customer_id.into(),
            timestamp,
            product_id: product_id.into(),
            quantity,
            unit_price,
            revenue: crate::utils::round_cents(quantity as f64 * unit_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn transaction_revenue_is_quantity_times_price() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let line = Transaction::new("T00000001", "C000001", ts, "P002", 3, 199.99);
        assert!((line.revenue - 599.97).abs() < 1e-9);
    }

    #[test]
    fn transaction_survives_json_with_cents() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let line = Transaction::new("T00000001", "C000001", ts, "P004", 2, 12.99);
        let json = serde_json::to_string(&line).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, line);
        assert!(json.contains("25.98"));
    }

    #[test]
    fn enum_names() {
        assert_eq!(Device::Tablet.to_string(), "Tablet");
        assert_eq!(Channel::OrganicSearch.to_string(), "Organic Search");
    }
}
