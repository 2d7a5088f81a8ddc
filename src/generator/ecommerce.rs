//! E-commerce dataset generator: sessions, carts and transactions.
//!
//! Daily session counts come from the traffic generator. Each session is then
//! expanded into a visitor, device, channel and optional cart; converted carts
//! become transactions. The per-day [`Observation`] rows of the dataset are
//! recomputed from the generated sessions so both views agree.

use super::daily::{generate_observations, DailyGeneratorConfig};
use crate::core::{
    CartEvent, CartOutcome, Channel, Device, Observation, Product, Session, Transaction,
};
use crate::error::{AnalyticsError, Result};
use crate::utils::round_cents;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Exp;
use std::collections::{BTreeSet, HashSet};

const MAX_CART_PRODUCTS: usize = 3;
const MIN_SESSION_SECS: u32 = 10;
const SECONDS_PER_DAY: i64 = 86_400;

/// E-commerce generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcommerceConfig {
    /// Daily session volume.
    pub traffic: DailyGeneratorConfig,
    /// Purchase probability per session.
    pub base_conversion_rate: f64,
    /// Add-to-cart probability per session.
    pub add_to_cart_rate: f64,
    /// Probability that a cart which did not convert is abandoned.
    pub abandonment_rate: f64,
    pub customer_pool_size: usize,
    /// Share of sessions drawn from the returning sub-pool.
    pub returning_share: f64,
    /// Largest quantity of one product in an order.
    pub max_quantity: u32,
    pub mean_pages_viewed: f64,
    pub mean_duration_secs: f64,
    /// Desktop, mobile, tablet weights.
    pub device_mix: [f64; 3],
    /// Weights in [`Channel::ALL`] order.
    pub channel_mix: [f64; 6],
}

impl Default for EcommerceConfig {
    fn default() -> Self {
        Self {
            traffic: DailyGeneratorConfig::default(),
            base_conversion_rate: 0.03,
            add_to_cart_rate: 0.15,
            abandonment_rate: 0.70,
            customer_pool_size: 5_000,
            returning_share: 0.3,
            max_quantity: 2,
            mean_pages_viewed: 3.0,
            mean_duration_secs: 180.0,
            device_mix: [0.45, 0.40, 0.15],
            channel_mix: [0.30, 0.25, 0.20, 0.15, 0.05, 0.05],
        }
    }
}

impl EcommerceConfig {
    pub fn traffic(mut self, traffic: DailyGeneratorConfig) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn base_conversion_rate(mut self, rate: f64) -> Self {
        self.base_conversion_rate = rate;
        self
    }

    pub fn add_to_cart_rate(mut self, rate: f64) -> Self {
        self.add_to_cart_rate = rate;
        self
    }

    pub fn abandonment_rate(mut self, rate: f64) -> Self {
        self.abandonment_rate = rate;
        self
    }

    pub fn customer_pool_size(mut self, size: usize) -> Self {
        self.customer_pool_size = size;
        self
    }

    pub fn returning_share(mut self, share: f64) -> Self {
        self.returning_share = share;
        self
    }

    pub fn max_quantity(mut self, max_quantity: u32) -> Self {
        self.max_quantity = max_quantity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.traffic.validate()?;
        for (name, rate) in [
            ("base_conversion_rate", self.base_conversion_rate),
            ("add_to_cart_rate", self.add_to_cart_rate),
            ("abandonment_rate", self.abandonment_rate),
            ("returning_share", self.returning_share),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AnalyticsError::invalid(name, rate, "must lie in [0, 1]"));
            }
        }
        if self.customer_pool_size == 0 {
            return Err(AnalyticsError::invalid(
                "customer_pool_size",
                self.customer_pool_size,
                "must be at least 1",
            ));
        }
        if self.max_quantity == 0 {
            return Err(AnalyticsError::invalid(
                "max_quantity",
                self.max_quantity,
                "must be at least 1",
            ));
        }
        Ok(())
    }

    fn returning_pool_size(&self) -> usize {
        let size = (self.customer_pool_size as f64 * self.returning_share).round() as usize;
        size.clamp(1, self.customer_pool_size)
    }
}

/// A generated multi-entity dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcommerceDataset {
    /// One row per day, derived from `sessions`.
    pub observations: Vec<Observation>,
    pub sessions: Vec<Session>,
    /// One event per session that added to cart.
    pub cart_events: Vec<CartEvent>,
    /// One row per purchased product line.
    pub transactions: Vec<Transaction>,
}

impl EcommerceDataset {
    /// Number of distinct orders.
    pub fn order_count(&self) -> usize {
        self.transactions
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Samplers built once from a validated config.
struct SessionSampler {
    device: WeightedIndex<f64>,
    channel: WeightedIndex<f64>,
    pages: Exp,
    duration: Exp,
}

impl SessionSampler {
    fn new(config: &EcommerceConfig) -> Result<Self> {
        let device = WeightedIndex::new(config.device_mix).map_err(|e| {
            AnalyticsError::invalid("device_mix", format!("{:?}", config.device_mix), e.to_string())
        })?;
        let channel = WeightedIndex::new(config.channel_mix).map_err(|e| {
            AnalyticsError::invalid(
                "channel_mix",
                format!("{:?}", config.channel_mix),
                e.to_string(),
            )
        })?;
        let pages = mean_exp("mean_pages_viewed", config.mean_pages_viewed)?;
        let duration = mean_exp("mean_duration_secs", config.mean_duration_secs)?;
        Ok(Self {
            device,
            channel,
            pages,
            duration,
        })
    }
}

fn mean_exp(name: &str, mean: f64) -> Result<Exp> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(AnalyticsError::invalid(name, mean, "must be positive"));
    }
    Exp::new(1.0 / mean).map_err(|e| AnalyticsError::invalid(name, mean, e.to_string()))
}

fn validate_catalog(catalog: &[Product]) -> Result<()> {
    if catalog.is_empty() {
        return Err(AnalyticsError::invalid(
            "catalog",
            0,
            "at least one product is required",
        ));
    }
    if let Some(p) = catalog
        .iter()
        .find(|p| !p.price.is_finite() || p.price <= 0.0)
    {
        return Err(AnalyticsError::invalid(
            format!("catalog[{}].price", p.id),
            p.price,
            "must be positive",
        ));
    }
    Ok(())
}

/// Generate sessions, cart events and transactions over the configured period.
pub fn generate_ecommerce(config: &EcommerceConfig, catalog: &[Product]) -> Result<EcommerceDataset> {
    config.validate()?;
    validate_catalog(catalog)?;
    let sampler = SessionSampler::new(config)?;

    let traffic = generate_observations(&config.traffic)?;
    let mut rng = StdRng::seed_from_u64(config.traffic.seed.wrapping_add(1));
    let returning_pool = config.returning_pool_size();

    let mut dataset = EcommerceDataset {
        observations: Vec::with_capacity(traffic.len()),
        sessions: Vec::new(),
        cart_events: Vec::new(),
        transactions: Vec::new(),
    };
    let mut seen_customers: HashSet<String> = HashSet::new();
    let mut order_seq = 0usize;

    for day in &traffic {
        let day_start = dataset.sessions.len();
        let mut day_users = BTreeSet::new();
        let mut day_new_users = 0u64;

        for _ in 0..day.sessions {
            let pool = if rng.gen_bool(config.returning_share) {
                returning_pool
            } else {
                config.customer_pool_size
            };
            let customer_id = format!("C{:06}", rng.gen_range(0..pool) + 1);
            let is_returning = !seen_customers.insert(customer_id.clone());
            if day_users.insert(customer_id.clone()) && !is_returning {
                day_new_users += 1;
            }

            let started_at = day.timestamp + Duration::seconds(rng.gen_range(0..SECONDS_PER_DAY));
            let device = Device::ALL[rng.sample(&sampler.device)];
            let channel = Channel::ALL[rng.sample(&sampler.channel)];
            let pages_viewed = (rng.sample(&sampler.pages) as u32).max(1);
            let duration_secs = (rng.sample(&sampler.duration) as u32).max(MIN_SESSION_SECS);
            let added_to_cart = rng.gen_bool(config.add_to_cart_rate);

            dataset.sessions.push(Session {
                session_id: format!("S{:08}", dataset.sessions.len() + 1),
                customer_id,
                started_at,
                device,
                channel,
                is_returning,
                pages_viewed,
                duration_secs,
                added_to_cart,
                cart_abandoned: false,
                converted: false,
            });
        }

        let day_sessions = &mut dataset.sessions[day_start..];
        let carts = day_sessions.iter().filter(|s| s.added_to_cart).count();
        let purchases = day_sessions
            .iter()
            .filter(|_| rng.gen_bool(config.base_conversion_rate))
            .count()
            .min(carts);

        let mut day_revenue = 0.0;
        for (cart_index, session) in day_sessions
            .iter_mut()
            .filter(|s| s.added_to_cart)
            .enumerate()
        {
            let cart_size = rng.gen_range(1..=MAX_CART_PRODUCTS.min(catalog.len()));
            let products: Vec<&Product> = catalog.choose_multiple(&mut rng, cart_size).collect();
            let finished_at = session.started_at + Duration::seconds(session.duration_secs as i64);

            let outcome = if cart_index < purchases {
                session.converted = true;
                order_seq += 1;
                let transaction_id = format!("T{:08}", order_seq);
                for product in &products {
                    let line = Transaction::new(
                        transaction_id.clone(),
                        session.customer_id.clone(),
                        finished_at,
                        product.id.clone(),
                        rng.gen_range(1..=config.max_quantity),
                        product.price,
                    );
                    day_revenue += line.revenue;
                    dataset.transactions.push(line);
                }
                CartOutcome::Purchased
            } else if rng.gen_bool(config.abandonment_rate) {
                session.cart_abandoned = true;
                CartOutcome::Abandoned
            } else {
                CartOutcome::Open
            };

            dataset.cart_events.push(CartEvent {
                session_id: session.session_id.clone(),
                customer_id: session.customer_id.clone(),
                timestamp: finished_at,
                product_ids: products.iter().map(|p| p.id.clone()).collect(),
                outcome,
            });
        }

        dataset.observations.push(summarize_day(
            day.timestamp,
            &dataset.sessions[day_start..],
            day_users.len() as u64,
            day_new_users,
            day_revenue,
        ));
    }

    tracing::debug!(
        days = dataset.observations.len(),
        sessions = dataset.sessions.len(),
        carts = dataset.cart_events.len(),
        transactions = dataset.transactions.len(),
        orders = order_seq,
        "Generated e-commerce dataset"
    );
    Ok(dataset)
}

/// Daily observation consistent with the day's sessions.
fn summarize_day(
    timestamp: DateTime<Utc>,
    sessions: &[Session],
    users: u64,
    new_users: u64,
    revenue: f64,
) -> Observation {
    let n = sessions.len();
    let (avg_duration, bounce_rate) = if n == 0 {
        (0.0, 0.0)
    } else {
        let total_secs: u64 = sessions.iter().map(|s| s.duration_secs as u64).sum();
        let bounces = sessions.iter().filter(|s| s.pages_viewed == 1).count();
        (total_secs as f64 / n as f64, bounces as f64 / n as f64)
    };

    Observation {
        timestamp,
        sessions: n as u64,
        users,
        new_users,
        pageviews: sessions.iter().map(|s| s.pages_viewed as u64).sum(),
        avg_duration,
        bounce_rate,
        conversions: sessions.iter().filter(|s| s.converted).count() as u64,
        revenue: round_cents(revenue),
    }
}
