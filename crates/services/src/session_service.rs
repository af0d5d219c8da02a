use std::sync::Arc;

use storage::store::VersionedStore;
use study_core::model::{Session, SessionId, SessionPatch, Task};
use tracing::debug;

use crate::error::SessionServiceError;

/// Result of changing one checklist item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskToggle {
    pub session_id: SessionId,
    pub index: usize,
    pub task_completed: bool,
    pub session_completed: bool,
}

/// Session detail operations: checklist changes and journal saves.
///
/// Every mutation loads the stored session, changes the working copy, and
/// writes it back through `VersionedStore::update_session`.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<VersionedStore>,
}

impl SessionService {
    #[must_use]
    pub fn new(store: Arc<VersionedStore>) -> Self {
        Self { store }
    }

    /// All sessions in storage order.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the store cannot be read.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, SessionServiceError> {
        Ok(self.store.get_sessions().await?)
    }

    /// Fetch a session by id. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if the store cannot be read.
    pub async fn find_session(&self, id: &SessionId) -> Result<Option<Session>, SessionServiceError> {
        Ok(self.store.find_session(id).await?)
    }

    async fn load(&self, id: &SessionId) -> Result<Session, SessionServiceError> {
        self.store
            .find_session(id)
            .await?
            .ok_or_else(|| SessionServiceError::NotFound(id.clone()))
    }

    /// Set the task at `index` to `completed` and persist the re-derived session.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` for an unknown session,
    /// `SessionServiceError::Session` for an out-of-range index, and
    /// `SessionServiceError::Storage` if persistence fails.
    pub async fn set_task(
        &self,
        id: &SessionId,
        index: usize,
        completed: bool,
    ) -> Result<TaskToggle, SessionServiceError> {
        let mut session = self.load(id).await?;
        session.set_task_completed(index, completed)?;
        self.commit_task(session, index).await
    }

    /// Flip the task at `index` and persist the re-derived session.
    ///
    /// # Errors
    ///
    /// Same as [`SessionService::set_task`].
    pub async fn toggle_task(
        &self,
        id: &SessionId,
        index: usize,
    ) -> Result<TaskToggle, SessionServiceError> {
        let mut session = self.load(id).await?;
        session.toggle_task(index)?;
        self.commit_task(session, index).await
    }

    async fn commit_task(
        &self,
        session: Session,
        index: usize,
    ) -> Result<TaskToggle, SessionServiceError> {
        let toggle = TaskToggle {
            session_id: session.id().clone(),
            index,
            task_completed: session.tasks().get(index).is_some_and(Task::is_completed),
            session_completed: session.is_completed(),
        };
        self.write_tasks(session).await?;

        debug!(
            session = %toggle.session_id,
            index,
            task_completed = toggle.task_completed,
            session_completed = toggle.session_completed,
            "task updated"
        );
        Ok(toggle)
    }

    async fn write_tasks(&self, session: Session) -> Result<(), SessionServiceError> {
        let id = session.id().clone();
        let patch = SessionPatch::new(id.clone()).with_tasks(session.tasks().to_vec());
        if self.store.update_session(patch).await? {
            Ok(())
        } else {
            Err(SessionServiceError::NotFound(id))
        }
    }

    /// Save the notes, issues and fixes fields of a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` for an unknown session and
    /// `SessionServiceError::Storage` if persistence fails.
    pub async fn save_journal(
        &self,
        id: &SessionId,
        notes: &str,
        issues: &str,
        fixes: &str,
    ) -> Result<(), SessionServiceError> {
        let patch = SessionPatch::new(id.clone()).with_journal(notes, issues, fixes);
        if self.store.update_session(patch).await? {
            debug!(session = %id, "journal saved");
            Ok(())
        } else {
            Err(SessionServiceError::NotFound(id.clone()))
        }
    }
}
