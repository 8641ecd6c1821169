//! Week-column grid and month labels for heat-map rendering.

use chrono::Datelike;
use serde::Serialize;

use crate::models::{ContributionCalendar, ContributionDay};

/// One column of the heat map, Sunday first. Empty slots fall outside the calendar.
pub type WeekColumn = [Option<ContributionDay>; 7];

/// Month name placed above the column where that month starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthLabel {
    pub name: String,
    pub week_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarLayout {
    pub weeks: Vec<WeekColumn>,
    pub months: Vec<MonthLabel>,
}

impl CalendarLayout {
    pub fn from_calendar(calendar: &ContributionCalendar) -> Self {
        let mut weeks: Vec<WeekColumn> = Vec::new();

        for day in calendar.days() {
            let slot = day.date.weekday().num_days_from_sunday() as usize;
            if slot == 0 || weeks.is_empty() {
                weeks.push([None; 7]);
            }
            if let Some(week) = weeks.last_mut() {
                week[slot] = Some(*day);
            }
        }

        let months = month_labels(&weeks);
        Self { weeks, months }
    }

    /// Plain-text heat map: a month header and one row per weekday.
    pub fn render(&self) -> String {
        const GLYPHS: [char; 5] = ['·', '░', '▒', '▓', '█'];
        const ROW_NAMES: [&str; 7] = ["   ", "Mon", "   ", "Wed", "   ", "Fri", "   "];

        let mut header = vec![' '; self.weeks.len()];
        let mut next_free = 0;
        for label in &self.months {
            let start = label.week_index.max(next_free);
            for (offset, ch) in label.name.chars().enumerate() {
                if let Some(cell) = header.get_mut(start + offset) {
                    *cell = ch;
                }
            }
            next_free = start + label.name.chars().count() + 1;
        }

        let mut out = format!("    {}\n", header.iter().collect::<String>().trim_end());
        for (slot, name) in ROW_NAMES.iter().enumerate() {
            let row: String = self
                .weeks
                .iter()
                .map(|week| match week[slot] {
                    Some(day) => GLYPHS[usize::from(day.level).min(GLYPHS.len() - 1)],
                    None => ' ',
                })
                .collect();
            out.push_str(&format!("{} {}\n", name, row.trim_end()));
        }
        out
    }
}

fn month_labels(weeks: &[WeekColumn]) -> Vec<MonthLabel> {
    let mut labels = Vec::new();
    let mut last_month = None;

    for (week_index, week) in weeks.iter().enumerate() {
        let Some(first) = week.iter().flatten().next() else {
            continue;
        };
        let month = (first.date.year(), first.date.month());
        if last_month != Some(month) {
            labels.push(MonthLabel {
                name: first.date.format("%b").to_string(),
                week_index,
            });
            last_month = Some(month);
        }
    }

    labels
}
