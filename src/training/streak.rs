//! Daily practice streaks.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::attempt::Attempt;

/// Days shown in the streak calendar, ending today.
pub const CALENDAR_DAYS: i64 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub active: bool,
}

// == Streak ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Streak {
    /// Consecutive active days ending today, or yesterday if today has no attempt yet
    pub current: u32,
    pub longest: u32,
    pub practiced_today: bool,
    pub calendar: Vec<CalendarDay>,
}

/// UTC dates with at least one attempt.
pub fn active_days(attempts: &[Attempt]) -> BTreeSet<NaiveDate> {
    attempts.iter().map(|a| a.created_at.date_naive()).collect()
}

/// Streak summary as of `today`.
pub fn streak(attempts: &[Attempt], today: NaiveDate) -> Streak {
    let days = active_days(attempts);
    let practiced_today = days.contains(&today);

    let mut current = 0;
    let mut cursor = if practiced_today {
        Some(today)
    } else {
        today.pred_opt()
    };
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        current += 1;
        cursor = day.pred_opt();
    }

    let calendar = (0..CALENDAR_DAYS)
        .rev()
        .map(|back| today - Duration::days(back))
        .map(|date| CalendarDay {
            date,
            active: days.contains(&date),
        })
        .collect();

    Streak {
        current,
        longest: longest_run(&days),
        practiced_today,
        calendar,
    }
}

fn longest_run(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
