//! Session and transaction reports: cart abandonment and product performance.

mod cart;
mod product;

pub use cart::{cart_abandonment, AbandonmentBreakdown, CartAbandonmentReport};
pub use product::{product_performance, ProductPerformance};
