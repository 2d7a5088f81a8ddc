//! Daily web-traffic observation generator.
//!
//! Sessions follow a linear trend plus a weekly pattern plus Gaussian noise;
//! every other field is derived from the day's session count so the row
//! invariants of [`Observation`] always hold.

use crate::core::Observation;
use crate::error::{AnalyticsError, Result};
use crate::utils::round_cents;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// Relative weekly pattern indexed by `t mod 7`, so the phase is fixed to the
/// first generated day. Five busy days then two quiet ones; the factors sum
/// to zero.
pub const WEEKDAY_FACTORS: [f64; 7] = [0.4, 0.6, 0.6, 0.5, 0.3, -1.1, -1.3];

/// Daily generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyGeneratorConfig {
    /// Number of days to generate. Signed so that bad input can be reported.
    pub period_length: i64,
    pub seed: u64,
    /// Sessions per day at the start of the period.
    pub base_rate: f64,
    /// Sessions added by the end of the period.
    pub growth_amount: f64,
    /// Scale of the weekly pattern.
    pub weekly_amplitude: f64,
    pub noise_std: f64,
    /// Last generated day; today (UTC) when unset.
    pub end_date: Option<NaiveDate>,
}

impl Default for DailyGeneratorConfig {
    fn default() -> Self {
        Self {
            period_length: 90,
            seed: 42,
            base_rate: 1000.0,
            growth_amount: 200.0,
            weekly_amplitude: 150.0,
            noise_std: 50.0,
            end_date: None,
        }
    }
}

impl DailyGeneratorConfig {
    pub fn period_length(mut self, days: i64) -> Self {
        self.period_length = days;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn base_rate(mut self, base_rate: f64) -> Self {
        self.base_rate = base_rate;
        self
    }

    pub fn growth_amount(mut self, growth_amount: f64) -> Self {
        self.growth_amount = growth_amount;
        self
    }

    pub fn weekly_amplitude(mut self, amplitude: f64) -> Self {
        self.weekly_amplitude = amplitude;
        self
    }

    pub fn noise_std(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_length <= 0 {
            return Err(AnalyticsError::invalid(
                "period_length",
                self.period_length,
                "must be at least one day",
            ));
        }
        if !self.base_rate.is_finite() || self.base_rate < 0.0 {
            return Err(AnalyticsError::invalid(
                "base_rate",
                self.base_rate,
                "must be a non-negative number",
            ));
        }
        if !self.growth_amount.is_finite() {
            return Err(AnalyticsError::invalid(
                "growth_amount",
                self.growth_amount,
                "must be finite",
            ));
        }
        if !self.weekly_amplitude.is_finite() {
            return Err(AnalyticsError::invalid(
                "weekly_amplitude",
                self.weekly_amplitude,
                "must be finite",
            ));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(AnalyticsError::invalid(
                "noise_std",
                self.noise_std,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }

    /// Calendar days covered by the period, oldest first.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        self.validate()?;
        let end = self.end_date.unwrap_or_else(|| Utc::now().date_naive());
        let start = end - Duration::days(self.period_length - 1);
        Ok((0..self.period_length)
            .map(|t| start + Duration::days(t))
            .collect())
    }

    /// Expected sessions for day `t` before noise.
    pub fn expected_sessions(&self, t: usize) -> f64 {
        let trend = self.base_rate + self.growth_amount * t as f64 / self.period_length as f64;
        trend + self.weekly_amplitude * weekday_factor(t)
    }
}

/// Weekly pattern factor for day `t` of the period.
pub fn weekday_factor(t: usize) -> f64 {
    WEEKDAY_FACTORS[t % 7]
}

/// Generate one observation per day of the configured period.
///
/// The same config, seed included, always yields the same rows, and the
/// session counts do not depend on `end_date`.
pub fn generate_observations(config: &DailyGeneratorConfig) -> Result<Vec<Observation>> {
    let dates = config.dates()?;
    let noise = if config.noise_std > 0.0 {
        let normal = Normal::new(0.0, config.noise_std)
            .map_err(|e| AnalyticsError::invalid("noise_std", config.noise_std, e.to_string()))?;
        Some(normal)
    } else {
        None
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let observations: Vec<Observation> = dates
        .iter()
        .enumerate()
        .map(|(t, &date)| {
            let eps = noise.as_ref().map_or(0.0, |n| rng.sample(n));
            let sessions = (config.expected_sessions(t) + eps).round().max(0.0) as u64;
            derive_observation(&mut rng, date, sessions)
        })
        .collect();

    tracing::debug!(
        days = observations.len(),
        seed = config.seed,
        "Generated daily observations"
    );
    Ok(observations)
}

/// Fill the dependent fields of a day from its session count.
fn derive_observation(rng: &mut StdRng, date: NaiveDate, sessions: u64) -> Observation {
    let s = sessions as f64;
    let users = ((s * rng.gen_range(0.6..0.8)).round() as u64).min(sessions);
    let new_users = ((users as f64 * rng.gen_range(0.3..0.5)).round() as u64).min(users);
    let pageviews = (s * rng.gen_range(2.5..4.0)).round() as u64;
    let bounce_rate = rng.gen_range(0.35..0.65);
    let avg_duration = rng.gen_range(120.0..300.0);
    let conversions = ((s * rng.gen_range(0.01..0.05)).round() as u64).min(sessions);
    let revenue = round_cents(conversions as f64 * rng.gen_range(50.0..200.0));

    Observation {
        timestamp: date.and_time(NaiveTime::MIN).and_utc(),
        sessions,
        users,
        new_users,
        pageviews,
        avg_duration,
        bounce_rate,
        conversions,
        revenue,
    }
}
