//! Answer accuracy over the recent window.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::attempt::Attempt;
use super::pitch::{Difficulty, Note};

/// Calendar days covered, including today.
pub const WINDOW_DAYS: i64 = 7;

/// Notes listed under "most missed".
pub const MOST_MISSED_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Tally {
    pub attempts: u32,
    pub correct: u32,
    pub accuracy: f64,
}

impl Tally {
    fn add(&mut self, correct: bool) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
        self.accuracy = f64::from(self.correct) / f64::from(self.attempts);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyAccuracy {
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedNote {
    pub note: Note,
    pub misses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAccuracy {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub tally: Tally,
}

// == Accuracy ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accuracy {
    pub window_days: i64,
    pub overall: Tally,
    pub by_difficulty: Vec<DifficultyAccuracy>,
    pub most_missed: Vec<MissedNote>,
    /// One entry per day in the window, oldest first
    pub daily: Vec<DailyAccuracy>,
}

/// Accuracy for attempts made in the last [`WINDOW_DAYS`] days as of `now`.
pub fn accuracy(attempts: &[Attempt], now: DateTime<Utc>) -> Accuracy {
    let today = now.date_naive();
    let start = today - Duration::days(WINDOW_DAYS - 1);

    let mut overall = Tally::default();
    let mut by_difficulty: BTreeMap<Difficulty, Tally> = Difficulty::ALL
        .into_iter()
        .map(|d| (d, Tally::default()))
        .collect();
    let mut daily: BTreeMap<NaiveDate, Tally> = (0..WINDOW_DAYS)
        .map(|offset| (start + Duration::days(offset), Tally::default()))
        .collect();
    let mut misses: BTreeMap<Note, u32> = BTreeMap::new();

    for attempt in attempts {
        let day = attempt.created_at.date_naive();
        if day < start || day > today {
            continue;
        }

        overall.add(attempt.correct);
        by_difficulty
            .entry(attempt.difficulty)
            .or_default()
            .add(attempt.correct);
        daily.entry(day).or_default().add(attempt.correct);
        if !attempt.correct {
            *misses.entry(attempt.target).or_default() += 1;
        }
    }

    let mut most_missed: Vec<MissedNote> = misses
        .into_iter()
        .map(|(note, misses)| MissedNote { note, misses })
        .collect();
    // stable sort keeps note order among ties
    most_missed.sort_by(|a, b| b.misses.cmp(&a.misses));
    most_missed.truncate(MOST_MISSED_LIMIT);

    Accuracy {
        window_days: WINDOW_DAYS,
        overall,
        by_difficulty: by_difficulty
            .into_iter()
            .map(|(difficulty, tally)| DifficultyAccuracy { difficulty, tally })
            .collect(),
        most_missed,
        daily: daily
            .into_iter()
            .map(|(date, tally)| DailyAccuracy { date, tally })
            .collect(),
    }
}
