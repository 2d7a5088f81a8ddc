//! Built-in product catalog.

use crate::core::Product;

const DEFAULT_PRODUCTS: [(&str, &str, &str, f64); 15] = [
    ("P001", "Wireless Headphones", "Electronics", 79.99),
    ("P002", "Smart Watch", "Electronics", 199.99),
    ("P003", "Laptop Stand", "Accessories", 34.99),
    ("P004", "USB-C Cable", "Accessories", 12.99),
    ("P005", "Mechanical Keyboard", "Electronics", 129.99),
    ("P006", "Ergonomic Mouse", "Electronics", 49.99),
    ("P007", "Phone Case", "Accessories", 19.99),
    ("P008", "Screen Protector", "Accessories", 9.99),
    ("P009", "Portable Charger", "Electronics", 39.99),
    ("P010", "Bluetooth Speaker", "Electronics", 89.99),
    ("P011", "Webcam HD", "Electronics", 69.99),
    ("P012", "Desk Lamp", "Accessories", 29.99),
    ("P013", "Monitor 27\"", "Electronics", 299.99),
    ("P014", "Laptop Sleeve", "Accessories", 24.99),
    ("P015", "Cable Organizer", "Accessories", 14.99),
];

/// Fifteen electronics and accessories products.
pub fn default_catalog() -> Vec<Product> {
    DEFAULT_PRODUCTS
        .iter()
        .map(|&(id, name, category, price)| Product::new(id, name, category, price))
        .collect()
}
