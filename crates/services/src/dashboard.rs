use std::sync::Arc;

use serde::Serialize;
use storage::repository::StorageError;
use storage::store::VersionedStore;
use study_core::model::Session;
use study_core::progress::{Progress, next_session};

/// The session a learner should pick up next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextSession {
    pub id: String,
    pub week: u32,
    pub day: String,
    pub title: String,
    pub topic: String,
    pub phase: Option<String>,
}

impl From<&Session> for NextSession {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            week: session.week().value(),
            day: session.day().to_string(),
            title: session.title().to_owned(),
            topic: session.topic().to_owned(),
            phase: session.phase().map(str::to_owned),
        }
    }
}

/// Phase label shown once every session is done.
pub const JOURNEY_COMPLETED: &str = "Journey Completed!";

/// Home screen summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub summary: String,
    /// `None` once every session is completed.
    pub next: Option<NextSession>,
}

impl Dashboard {
    #[must_use]
    pub fn from_sessions(sessions: &[Session]) -> Self {
        let progress = Progress::of(sessions);
        Self {
            completed: progress.completed,
            total: progress.total,
            percent: progress.percent,
            summary: progress.to_string(),
            next: next_session(sessions).map(NextSession::from),
        }
    }

    #[must_use]
    pub fn all_caught_up(&self) -> bool {
        self.next.is_none()
    }

    /// Phase of the next session, or [`JOURNEY_COMPLETED`] when none is left.
    ///
    /// `None` when the next session's catalog entry names no phase.
    #[must_use]
    pub fn current_phase(&self) -> Option<&str> {
        match &self.next {
            Some(next) => next.phase.as_deref(),
            None => Some(JOURNEY_COMPLETED),
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<VersionedStore>,
}

impl DashboardService {
    #[must_use]
    pub fn new(store: Arc<VersionedStore>) -> Self {
        Self { store }
    }

    /// Build the dashboard from the stored sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if sessions cannot be read.
    pub async fn overview(&self) -> Result<Dashboard, StorageError> {
        let sessions = self.store.get_sessions().await?;
        Ok(Dashboard::from_sessions(&sessions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{SessionDay, SessionId, Task, WeekId};

    #[test]
    fn empty_collection_reports_zero() {
        let dashboard = Dashboard::from_sessions(&[]);
        assert_eq!(dashboard.percent, 0);
        assert_eq!(dashboard.summary, "0 of 0 sessions completed (0%)");
        assert!(dashboard.all_caught_up());
        assert_eq!(dashboard.current_phase(), Some("Journey Completed!"));
    }

    #[test]
    fn next_session_is_first_incomplete() {
        let done = Session::new(
            SessionId::new("a"),
            WeekId::new(1),
            SessionDay::Friday,
            "Week 1",
            "Done",
            vec![Task::done("x")],
        )
        .unwrap();
        let open = Session::new(
            SessionId::new("b"),
            WeekId::new(1),
            SessionDay::Saturday,
            "Week 1",
            "Open",
            vec![Task::new("x")],
        )
        .unwrap()
        .with_phase("Phase 2: Networking");

        let dashboard = Dashboard::from_sessions(&[done, open]);
        assert_eq!(dashboard.current_phase(), Some("Phase 2: Networking"));
        let next = dashboard.next.unwrap();
        assert_eq!(next.id, "b");
        assert_eq!(next.day, "Saturday");
        assert_eq!(dashboard.summary, "1 of 2 sessions completed (50%)");
    }

    #[test]
    fn next_session_without_phase_has_no_current_phase() {
        let open = Session::new(
            SessionId::new("c"),
            WeekId::new(2),
            SessionDay::Friday,
            "Week 2",
            "Open",
            vec![Task::new("x")],
        )
        .unwrap();

        let dashboard = Dashboard::from_sessions(&[open]);
        assert!(!dashboard.all_caught_up());
        assert_eq!(dashboard.current_phase(), None);
    }
}
