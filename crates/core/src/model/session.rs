use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{SessionId, WeekId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session id cannot be empty")]
    EmptyId,

    #[error("task index {index} is out of range for a session with {len} tasks")]
    TaskIndexOutOfRange { index: usize, len: usize },

    #[error("patch for session {found} cannot be applied to session {expected}")]
    IdMismatch { expected: SessionId, found: SessionId },
}

//
// ─── TASK ──────────────────────────────────────────────────────────────────────
//

/// One checklist item inside a session.
///
/// Tasks have no identity of their own; they are addressed by their position
/// in the owning session's task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    text: String,
    #[serde(default)]
    completed: bool,
}

impl Task {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }

    /// Creates a task that is already checked off.
    #[must_use]
    pub fn done(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: true,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Session completion rule: a session is complete iff every task is complete.
///
/// An empty checklist is vacuously complete.
#[must_use]
pub fn derive_completion(tasks: &[Task]) -> bool {
    tasks.iter().all(Task::is_completed)
}

//
// ─── DAY ───────────────────────────────────────────────────────────────────────
//

/// Day of the week a session is scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl SessionDay {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionDay::Monday => "Monday",
            SessionDay::Tuesday => "Tuesday",
            SessionDay::Wednesday => "Wednesday",
            SessionDay::Thursday => "Thursday",
            SessionDay::Friday => "Friday",
            SessionDay::Saturday => "Saturday",
            SessionDay::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for SessionDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A scheduled curriculum session with its checklist and journal fields.
///
/// `completed` is derived from the task list. It is recomputed on every task
/// mutation and on every merged patch, never assigned directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    week: WeekId,
    day: SessionDay,
    title: String,
    topic: String,
    /// Curriculum phase the session belongs to, when the catalog names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phase: Option<String>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    deliverables: Vec<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    issues: String,
    #[serde(default)]
    fixes: String,
    #[serde(default)]
    links: Vec<String>,
}

impl Session {
    /// Creates a session with an empty journal.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyId` if the id is blank.
    pub fn new(
        id: SessionId,
        week: WeekId,
        day: SessionDay,
        title: impl Into<String>,
        topic: impl Into<String>,
        tasks: Vec<Task>,
    ) -> Result<Self, SessionError> {
        if id.is_blank() {
            return Err(SessionError::EmptyId);
        }
        let completed = derive_completion(&tasks);
        Ok(Self {
            id,
            week,
            day,
            title: title.into(),
            topic: topic.into(),
            phase: None,
            tasks,
            deliverables: Vec::new(),
            completed,
            notes: String::new(),
            issues: String::new(),
            fixes: String::new(),
            links: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_deliverables(mut self, deliverables: Vec<String>) -> Self {
        self.deliverables = deliverables;
        self
    }

    #[must_use]
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn week(&self) -> WeekId {
        self.week
    }

    #[must_use]
    pub fn day(&self) -> SessionDay {
        self.day
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn deliverables(&self) -> &[String] {
        &self.deliverables
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn issues(&self) -> &str {
        &self.issues
    }

    #[must_use]
    pub fn fixes(&self) -> &str {
        &self.fixes
    }

    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Returns `(completed_tasks, total_tasks)`.
    #[must_use]
    pub fn task_counts(&self) -> (usize, usize) {
        let done = self.tasks.iter().filter(|t| t.is_completed()).count();
        (done, self.tasks.len())
    }

    /// True when the stored `completed` flag agrees with the task list.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.completed == derive_completion(&self.tasks)
    }

    /// Sets one task's state and re-derives session completion.
    ///
    /// Returns the session's completion state after the change.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TaskIndexOutOfRange` if `index` does not address a task.
    pub fn set_task_completed(
        &mut self,
        index: usize,
        completed: bool,
    ) -> Result<bool, SessionError> {
        let len = self.tasks.len();
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(SessionError::TaskIndexOutOfRange { index, len })?;
        task.completed = completed;
        self.rederive_completion();
        Ok(self.completed)
    }

    /// Flips one task's state and re-derives session completion.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TaskIndexOutOfRange` if `index` does not address a task.
    pub fn toggle_task(&mut self, index: usize) -> Result<bool, SessionError> {
        let current = self
            .tasks
            .get(index)
            .map(Task::is_completed)
            .ok_or(SessionError::TaskIndexOutOfRange {
                index,
                len: self.tasks.len(),
            })?;
        self.set_task_completed(index, !current)
    }

    /// Shallow-merges `patch` over this session.
    ///
    /// Fields present in the patch replace the stored ones; absent fields are
    /// kept. Completion is re-derived from the merged task list afterwards, so
    /// a patch can never carry a stale `completed` flag into storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IdMismatch` if the patch targets another session.
    pub fn apply_patch(&mut self, patch: SessionPatch) -> Result<(), SessionError> {
        if patch.id != self.id {
            return Err(SessionError::IdMismatch {
                expected: self.id.clone(),
                found: patch.id,
            });
        }

        let SessionPatch {
            id: _,
            week,
            day,
            title,
            topic,
            phase,
            tasks,
            deliverables,
            notes,
            issues,
            fixes,
            links,
        } = patch;

        if let Some(week) = week {
            self.week = week;
        }
        if let Some(day) = day {
            self.day = day;
        }
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(topic) = topic {
            self.topic = topic;
        }
        if phase.is_some() {
            self.phase = phase;
        }
        if let Some(tasks) = tasks {
            self.tasks = tasks;
        }
        if let Some(deliverables) = deliverables {
            self.deliverables = deliverables;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }
        if let Some(issues) = issues {
            self.issues = issues;
        }
        if let Some(fixes) = fixes {
            self.fixes = fixes;
        }
        if let Some(links) = links {
            self.links = links;
        }

        self.rederive_completion();
        Ok(())
    }

    pub(crate) fn rederive_completion(&mut self) {
        self.completed = derive_completion(&self.tasks);
    }
}

//
// ─── PATCH ─────────────────────────────────────────────────────────────────────
//

/// Partial update for a stored session, addressed by id.
///
/// Carries no `completed` field; completion comes from the merged tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPatch {
    id: SessionId,
    pub week: Option<WeekId>,
    pub day: Option<SessionDay>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub phase: Option<String>,
    pub tasks: Option<Vec<Task>>,
    pub deliverables: Option<Vec<String>>,
    pub notes: Option<String>,
    pub issues: Option<String>,
    pub fixes: Option<String>,
    pub links: Option<Vec<String>>,
}

impl SessionPatch {
    /// An empty patch for the given session.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            week: None,
            day: None,
            title: None,
            topic: None,
            phase: None,
            tasks: None,
            deliverables: None,
            notes: None,
            issues: None,
            fixes: None,
            links: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    #[must_use]
    pub fn with_journal(
        mut self,
        notes: impl Into<String>,
        issues: impl Into<String>,
        fixes: impl Into<String>,
    ) -> Self {
        self.notes = Some(notes.into());
        self.issues = Some(issues.into());
        self.fixes = Some(fixes.into());
        self
    }
}

/// A full working copy converts into a patch that carries every field.
impl From<Session> for SessionPatch {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            week: Some(session.week),
            day: Some(session.day),
            title: Some(session.title),
            topic: Some(session.topic),
            phase: session.phase,
            tasks: Some(session.tasks),
            deliverables: Some(session.deliverables),
            notes: Some(session.notes),
            issues: Some(session.issues),
            fixes: Some(session.fixes),
            links: Some(session.links),
        }
    }
}

impl From<&Session> for SessionPatch {
    fn from(session: &Session) -> Self {
        Self::from(session.clone())
    }
}
