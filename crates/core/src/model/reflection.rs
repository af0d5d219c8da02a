use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::WeekId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReflectionError {
    #[error("a reflection needs at least one of understood or confused")]
    Empty,
}

/// A learner's end-of-week reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    week_id: WeekId,
    date: DateTime<Utc>,
    #[serde(default)]
    understood: String,
    #[serde(default)]
    confused: String,
    #[serde(default)]
    questions: String,
}

impl Reflection {
    /// Build a reflection for `week_id` written at `date`.
    ///
    /// # Errors
    ///
    /// Returns `ReflectionError::Empty` when both `understood` and `confused` are blank.
    pub fn new(
        week_id: WeekId,
        date: DateTime<Utc>,
        understood: impl Into<String>,
        confused: impl Into<String>,
        questions: impl Into<String>,
    ) -> Result<Self, ReflectionError> {
        let understood = understood.into();
        let confused = confused.into();
        if understood.trim().is_empty() && confused.trim().is_empty() {
            return Err(ReflectionError::Empty);
        }
        Ok(Self {
            week_id,
            date,
            understood,
            confused,
            questions: questions.into(),
        })
    }

    #[must_use]
    pub fn week_id(&self) -> WeekId {
        self.week_id
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub fn understood(&self) -> &str {
        &self.understood
    }

    #[must_use]
    pub fn confused(&self) -> &str {
        &self.confused
    }

    #[must_use]
    pub fn questions(&self) -> &str {
        &self.questions
    }
}

/// What an upsert did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Insert `reflection`, replacing any existing entry for the same week.
///
/// Existing entries keep their position; new weeks are appended.
pub fn upsert_reflection(reflections: &mut Vec<Reflection>, reflection: Reflection) -> UpsertOutcome {
    match reflections
        .iter_mut()
        .find(|existing| existing.week_id == reflection.week_id)
    {
        Some(slot) => {
            *slot = reflection;
            UpsertOutcome::Replaced
        }
        None => {
            reflections.push(reflection);
            UpsertOutcome::Inserted
        }
    }
}

/// Display order for past reflections: latest week first.
#[must_use]
pub fn most_recent_first(mut reflections: Vec<Reflection>) -> Vec<Reflection> {
    reflections.sort_by(|a, b| b.week_id.cmp(&a.week_id));
    reflections
}
