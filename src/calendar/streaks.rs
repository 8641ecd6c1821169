//! Current and longest contribution streaks.

use crate::models::ContributionCalendar;

/// Streak lengths in days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    /// Trailing run of active days ending at the most recent day.
    pub current: u32,
    /// Longest run of active days anywhere.
    pub longest: u32,
}

/// Fold newest-first activity flags into streak lengths.
///
/// The current streak only grows while no inactive day has been seen, so an
/// inactive most recent day yields zero regardless of earlier runs.
pub fn streaks_from_activity<I>(newest_first: I) -> Streaks
where
    I: IntoIterator<Item = bool>,
{
    let (streaks, _, _) = newest_first.into_iter().fold(
        (Streaks::default(), true, 0u32),
        |(streaks, trailing, run), active| {
            if !active {
                return (streaks, false, 0);
            }
            let run = run + 1;
            let current = if trailing { run } else { streaks.current };
            (
                Streaks {
                    current,
                    longest: streaks.longest.max(run),
                },
                trailing,
                run,
            )
        },
    );
    streaks
}

pub fn analyze_streaks(calendar: &ContributionCalendar) -> Streaks {
    streaks_from_activity(calendar.days().rev().map(|d| d.count > 0))
}
