//! Core records shared by the generator and the analytics components.

mod commerce;
mod customer;
mod observation;

pub use commerce::{CartEvent, CartOutcome, Channel, Device, Product, Session, Transaction};
pub use customer::{
    aggregate_customers, aggregate_customers_with_sessions, CustomerAggregate, SegmentAssignment,
};
pub use observation::{validate_observations, Metric, Observation};
