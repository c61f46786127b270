//! XP and levels.
//!
//! Every attempt earns a tenth of its score as XP. Players start at level 1,
//! and advancing from level `L` costs `100 * (L + 1)` XP.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::attempt::Attempt;

/// XP earned for a score.
pub fn xp_for_score(score: u32) -> u64 {
    u64::from(score / 10)
}

/// XP needed to advance from `level` to the next.
pub fn xp_to_advance(level: u32) -> u64 {
    100 * (u64::from(level) + 1)
}

// == Level ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub level: u32,
    /// XP earned since reaching `level`
    pub xp: u64,
    /// XP the current level requires in total
    pub xp_to_next: u64,
}

/// Resolves total XP into a level.
pub fn level_for(total_xp: u64) -> Level {
    let mut level = 1;
    let mut remaining = total_xp;
    while remaining >= xp_to_advance(level) {
        remaining -= xp_to_advance(level);
        level += 1;
    }
    Level {
        level,
        xp: remaining,
        xp_to_next: xp_to_advance(level),
    }
}

// == Progress ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next: u64,
    pub xp_remaining: u64,
    pub total_xp: u64,
    pub xp_today: u64,
    pub xp_this_week: u64,
}

/// Progress as of `now`; "this week" is the last 7 calendar days including today.
pub fn progress(attempts: &[Attempt], now: DateTime<Utc>) -> Progress {
    let today = now.date_naive();
    let week_start = today - Duration::days(6);

    let mut total_xp = 0;
    let mut xp_today = 0;
    let mut xp_this_week = 0;
    for attempt in attempts {
        let xp = xp_for_score(attempt.score);
        let day = attempt.created_at.date_naive();
        total_xp += xp;
        if day == today {
            xp_today += xp;
        }
        if day >= week_start && day <= today {
            xp_this_week += xp;
        }
    }

    let level = level_for(total_xp);
    Progress {
        level: level.level,
        xp: level.xp,
        xp_to_next: level.xp_to_next,
        xp_remaining: level.xp_to_next - level.xp,
        total_xp,
        xp_today,
        xp_this_week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::pitch::{Difficulty, Note};

    fn attempt(score: u32, days_ago: i64, now: DateTime<Utc>) -> Attempt {
        Attempt {
            id: format!("a{}", days_ago),
            created_at: now - Duration::days(days_ago),
            difficulty: Difficulty::Easy,
            target: Note::C,
            answer: Some(Note::C),
            correct: score == 100,
            score,
            elapsed_ms: None,
        }
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_for(0), Level { level: 1, xp: 0, xp_to_next: 200 });
        assert_eq!(level_for(199).level, 1);
        assert_eq!(level_for(200), Level { level: 2, xp: 0, xp_to_next: 300 });
        // 200 + 300 reaches level 3; 240 more leaves 160 to go
        assert_eq!(level_for(740), Level { level: 3, xp: 240, xp_to_next: 400 });
    }

    #[test]
    fn test_xp_per_score() {
        assert_eq!(xp_for_score(100), 10);
        assert_eq!(xp_for_score(40), 4);
        assert_eq!(xp_for_score(0), 0);
    }

    #[test]
    fn test_progress_windows() {
        let now = Utc::now();
        let attempts = vec![
            attempt(100, 0, now),
            attempt(40, 0, now),
            attempt(100, 3, now),
            attempt(100, 10, now),
        ];

        let p = progress(&attempts, now);
        assert_eq!(p.total_xp, 34);
        assert_eq!(p.xp_today, 14);
        assert_eq!(p.xp_this_week, 24);
        assert_eq!(p.level, 1);
        assert_eq!(p.xp_remaining, 200 - 34);
    }
}
