//! Quartile-based intensity levels.
//!
//! Thresholds come from the distribution of non-zero days only, so the scale
//! adapts to each user's activity range.

use crate::models::ContributionCalendar;

/// Highest intensity level.
pub const MAX_LEVEL: u8 = 4;

/// Upper bounds of levels 1, 2 and 3. Counts above `q3` are level 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quartiles {
    pub q1: u32,
    pub q2: u32,
    pub q3: u32,
}

impl Quartiles {
    /// Floor-indexed 25th/50th/75th percentiles of the non-zero counts.
    ///
    /// Returns `None` when every count is zero.
    pub fn from_counts<I>(counts: I) -> Option<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut active: Vec<u32> = counts.into_iter().filter(|&c| c > 0).collect();
        if active.is_empty() {
            return None;
        }
        active.sort_unstable();

        let n = active.len();
        Some(Self {
            q1: active[n / 4],
            q2: active[n / 2],
            q3: active[n * 3 / 4],
        })
    }

    pub fn level_for(&self, count: u32) -> u8 {
        match count {
            0 => 0,
            c if c <= self.q1 => 1,
            c if c <= self.q2 => 2,
            c if c <= self.q3 => 3,
            _ => MAX_LEVEL,
        }
    }
}

/// Assign every day its level relative to the calendar's non-zero days.
pub fn classify_levels(mut calendar: ContributionCalendar) -> ContributionCalendar {
    let quartiles = Quartiles::from_counts(calendar.days().map(|d| d.count));

    for day in calendar.days.values_mut() {
        day.level = quartiles.map_or(0, |q| q.level_for(day.count));
    }

    calendar
}
