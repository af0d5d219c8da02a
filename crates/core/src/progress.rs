//! Read-side derivations over the session collection.
//!
//! These read the stored `completed` flag directly; they never re-derive it.

use std::fmt;

use crate::model::{Session, WeekId};

/// Overall curriculum progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    #[must_use]
    pub fn of(sessions: &[Session]) -> Self {
        let total = sessions.len();
        let completed = sessions.iter().filter(|s| s.is_completed()).count();
        Self {
            completed,
            total,
            percent: rounded_percent(completed, total),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} sessions completed ({}%)",
            self.completed, self.total, self.percent
        )
    }
}

/// `round(100 * part / whole)` with halves rounded up; `0` when `whole` is zero.
#[must_use]
pub fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    let pct = (200 * part + whole) / (2 * whole);
    u8::try_from(pct).unwrap_or(100)
}

/// First session in storage order that is not yet completed.
///
/// `None` means everything is caught up.
#[must_use]
pub fn next_session(sessions: &[Session]) -> Option<&Session> {
    sessions.iter().find(|s| !s.is_completed())
}

/// Distinct curriculum weeks, ascending.
#[must_use]
pub fn course_weeks(sessions: &[Session]) -> Vec<WeekId> {
    let mut weeks: Vec<WeekId> = sessions.iter().map(Session::week).collect();
    weeks.sort_unstable();
    weeks.dedup();
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SessionDay, SessionId, Task};

    fn session(id: &str, week: u32, done: bool) -> Session {
        let task = if done { Task::done("x") } else { Task::new("x") };
        Session::new(
            SessionId::new(id),
            WeekId::new(week),
            SessionDay::Friday,
            "t",
            "t",
            vec![task],
        )
        .unwrap()
    }

    #[test]
    fn empty_collection_is_zero_percent() {
        let progress = Progress::of(&[]);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.to_string(), "0 of 0 sessions completed (0%)");
        assert!(!progress.is_finished());
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(rounded_percent(1, 2), 50);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(3, 3), 100);
    }

    #[test]
    fn next_session_follows_storage_order() {
        let sessions = vec![
            session("a", 2, true),
            session("b", 1, false),
            session("c", 1, false),
        ];
        assert_eq!(next_session(&sessions).unwrap().id().as_str(), "b");
    }

    #[test]
    fn all_caught_up_has_no_next_session() {
        let sessions = vec![session("a", 1, true)];
        assert!(next_session(&sessions).is_none());
        assert!(Progress::of(&sessions).is_finished());
    }

    #[test]
    fn course_weeks_are_distinct_and_sorted() {
        let sessions = vec![session("a", 3, false), session("b", 1, false), session("c", 3, true)];
        assert_eq!(course_weeks(&sessions), vec![WeekId::new(1), WeekId::new(3)]);
    }
}
