//! Plausible demo calendar for when live data is unavailable.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;

use crate::calendar::builder::window_dates;
use crate::models::DailyCounts;

/// Generator settings for synthetic contribution counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticGenerator {
    /// Chance that a Monday-Friday is active (0.0-1.0)
    pub weekday_probability: f64,
    /// Chance that a Saturday or Sunday is active (0.0-1.0)
    pub weekend_probability: f64,
    /// Active days draw a count uniformly from `1..=max_count`
    pub max_count: u32,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self {
            weekday_probability: 0.7,
            weekend_probability: 0.4,
            max_count: 12,
            seed: None,
        }
    }
}

impl SyntheticGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Counts for every day of the window ending at `today`.
    pub fn generate(&self, today: NaiveDate) -> DailyCounts {
        let mut rng = match self.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        let max_count = self.max_count.max(1);

        window_dates(today)
            .map(|date| {
                let probability = if is_weekend(date) {
                    self.weekend_probability
                } else {
                    self.weekday_probability
                };
                let count = if rng.gen_bool(probability.clamp(0.0, 1.0)) {
                    rng.gen_range(1..=max_count)
                } else {
                    0
                };
                (date, count)
            })
            .collect()
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
