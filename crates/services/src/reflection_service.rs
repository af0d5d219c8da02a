use std::sync::Arc;

use storage::store::VersionedStore;
use study_core::Clock;
use study_core::model::{Reflection, UpsertOutcome, WeekId, most_recent_first};
use study_core::progress::course_weeks;

use crate::error::ReflectionServiceError;

/// Draft of a weekly reflection as typed by the learner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionDraft {
    pub understood: String,
    pub confused: String,
    pub questions: String,
}

#[derive(Clone)]
pub struct ReflectionService {
    clock: Clock,
    store: Arc<VersionedStore>,
}

impl ReflectionService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<VersionedStore>) -> Self {
        Self { clock, store }
    }

    /// Weeks a reflection can be written for: every curriculum week, ascending.
    ///
    /// # Errors
    ///
    /// Returns `ReflectionServiceError::Storage` if sessions cannot be read.
    pub async fn week_options(&self) -> Result<Vec<WeekId>, ReflectionServiceError> {
        let sessions = self.store.get_sessions().await?;
        Ok(course_weeks(&sessions))
    }

    /// Validate the draft, stamp it with the current time, and upsert it.
    ///
    /// # Errors
    ///
    /// Returns `ReflectionServiceError::Reflection` if the draft is empty,
    /// `ReflectionServiceError::UnknownWeek` if no session is scheduled that
    /// week, or `ReflectionServiceError::Storage` if persistence fails.
    pub async fn save(
        &self,
        week: WeekId,
        draft: ReflectionDraft,
    ) -> Result<(Reflection, UpsertOutcome), ReflectionServiceError> {
        let reflection = Reflection::new(
            week,
            self.clock.now(),
            draft.understood,
            draft.confused,
            draft.questions,
        )?;
        if !self.week_options().await?.contains(&week) {
            return Err(ReflectionServiceError::UnknownWeek(week));
        }
        let outcome = self.store.save_reflection(reflection.clone()).await?;
        Ok((reflection, outcome))
    }

    /// Past reflections, latest week first.
    ///
    /// # Errors
    ///
    /// Returns `ReflectionServiceError::Storage` if reflections cannot be read.
    pub async fn past_reflections(&self) -> Result<Vec<Reflection>, ReflectionServiceError> {
        let reflections = self.store.get_reflections().await?;
        Ok(most_recent_first(reflections))
    }
}
