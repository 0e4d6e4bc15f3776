//! Daily streak evaluation.

use chrono::NaiveDate;

/// Result of evaluating the streak at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakChange {
    pub streak: u32,
    pub last_active: NaiveDate,
    /// The streak grew by one this session.
    pub extended: bool,
    /// A gap broke the streak this session.
    pub reset: bool,
}

/// Pure streak continuation rule over `(last_active, today)`.
///
/// A return on the following calendar day extends the streak by one; a gap
/// of more than one day resets it to zero; a repeat call on the same day
/// changes nothing, which makes session start idempotent within a day. A
/// missing `last_active` (first run) keeps the streak and stamps today.
#[must_use]
pub fn evaluate(streak: u32, last_active: Option<NaiveDate>, today: NaiveDate) -> StreakChange {
    let Some(last) = last_active else {
        return StreakChange {
            streak,
            last_active: today,
            extended: false,
            reset: false,
        };
    };

    let days = (today - last).num_days();
    if days == 1 {
        StreakChange {
            streak: streak.saturating_add(1),
            last_active: today,
            extended: true,
            reset: false,
        }
    } else if days > 1 {
        StreakChange {
            streak: 0,
            last_active: today,
            extended: false,
            reset: true,
        }
    } else {
        // Same day, or a clock that moved backwards: nothing advances and
        // the recorded day never moves into the past.
        StreakChange {
            streak,
            last_active: last.max(today),
            extended: false,
            reset: false,
        }
    }
}
