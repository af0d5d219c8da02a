//! Versioned session/reflection store over a key/value medium.

use std::sync::Arc;

use study_core::model::{
    Reflection, Session, SessionId, SessionPatch, UpsertOutcome, fallback_catalog,
    upsert_reflection, validate_catalog,
};
use study_core::version::{VersionDecision, reconcile_version};
use tracing::{debug, info, warn};

use crate::repository::{KeyValueMedium, StorageError};
use crate::seed::{SeedError, SeedSource};

/// Key of the JSON array of sessions.
pub const SESSIONS_KEY: &str = "study_sessions";
/// Key of the JSON array of weekly reflections.
pub const REFLECTIONS_KEY: &str = "weekly_reflections";
/// Key of the plain-string schema tag guarding `SESSIONS_KEY`.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Bump to discard every stored session collection on next load.
pub const CURRENT_SCHEMA_VERSION: &str = "2";

/// Where a freshly seeded collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOrigin {
    Source,
    Fallback,
}

/// What `VersionedStore::init` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub version: VersionDecision,
    pub seeded: Option<SeedOrigin>,
}

/// Sole owner of the durable session, reflection and version records.
///
/// Values handed out are working copies; nothing is persisted until it is
/// written back through one of the store's operations.
#[derive(Clone)]
pub struct VersionedStore {
    medium: Arc<dyn KeyValueMedium>,
    seed: Arc<dyn SeedSource>,
    expected_version: String,
}

impl VersionedStore {
    #[must_use]
    pub fn new(medium: Arc<dyn KeyValueMedium>, seed: Arc<dyn SeedSource>) -> Self {
        Self {
            medium,
            seed,
            expected_version: CURRENT_SCHEMA_VERSION.to_owned(),
        }
    }

    #[must_use]
    pub fn with_expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = version.into();
        self
    }

    #[must_use]
    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }

    /// Reconcile the schema tag and make sure a session collection exists.
    ///
    /// Safe to call on every start. Seed failures are logged and replaced by
    /// the built-in catalog; they never surface here.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read or written.
    pub async fn init(&self) -> Result<InitReport, StorageError> {
        let stored = self.medium.read(SCHEMA_VERSION_KEY).await?;
        let version = reconcile_version(stored.as_deref(), &self.expected_version);

        if version == VersionDecision::Reseed {
            info!(
                stored = stored.as_deref().unwrap_or("<none>"),
                expected = %self.expected_version,
                "schema version changed; discarding stored sessions"
            );
            self.medium.remove(SESSIONS_KEY).await?;
            self.medium
                .write(SCHEMA_VERSION_KEY, &self.expected_version)
                .await?;
        }

        let seeded = if self.medium.read(SESSIONS_KEY).await?.is_none() {
            let (sessions, origin) = match self.fetch_seed().await {
                Ok(sessions) => {
                    info!(count = sessions.len(), "seeded sessions from source");
                    (sessions, SeedOrigin::Source)
                }
                Err(err) => {
                    warn!(error = %err, "seed fetch failed; using built-in catalog");
                    (fallback_catalog(), SeedOrigin::Fallback)
                }
            };
            self.save_sessions(&sessions).await?;
            Some(origin)
        } else {
            None
        };

        Ok(InitReport { version, seeded })
    }

    async fn fetch_seed(&self) -> Result<Vec<Session>, SeedError> {
        let sessions = self.seed.fetch_sessions().await?;
        Ok(validate_catalog(sessions)?)
    }

    /// All stored sessions in storage order; empty when none are stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium fails or the stored value is unreadable.
    pub async fn get_sessions(&self) -> Result<Vec<Session>, StorageError> {
        self.read_list(SESSIONS_KEY).await
    }

    /// Look up one session by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium fails or the stored value is unreadable.
    pub async fn find_session(&self, id: &SessionId) -> Result<Option<Session>, StorageError> {
        let sessions = self.get_sessions().await?;
        Ok(sessions.into_iter().find(|s| s.id() == id))
    }

    /// Replace the whole session collection in one write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save_sessions(&self, sessions: &[Session]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(sessions)?;
        self.medium.write(SESSIONS_KEY, &raw).await?;
        debug!(count = sessions.len(), "sessions saved");
        Ok(())
    }

    /// Shallow-merge `patch` over the stored session with the same id.
    ///
    /// Returns `false` without writing anything when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium fails.
    pub async fn update_session(
        &self,
        patch: impl Into<SessionPatch> + Send,
    ) -> Result<bool, StorageError> {
        let patch = patch.into();
        let mut sessions = self.get_sessions().await?;
        let Some(slot) = sessions.iter_mut().find(|s| s.id() == patch.id()) else {
            debug!(id = %patch.id(), "update skipped; session not stored");
            return Ok(false);
        };
        slot.apply_patch(patch)
            .map_err(|e| StorageError::Conflict(e.to_string()))?;
        self.save_sessions(&sessions).await?;
        Ok(true)
    }

    /// All stored reflections in storage order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium fails or the stored value is unreadable.
    pub async fn get_reflections(&self) -> Result<Vec<Reflection>, StorageError> {
        self.read_list(REFLECTIONS_KEY).await
    }

    /// Insert or replace the reflection for its week.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium fails.
    pub async fn save_reflection(
        &self,
        reflection: Reflection,
    ) -> Result<UpsertOutcome, StorageError> {
        let mut reflections = self.get_reflections().await?;
        let week = reflection.week_id();
        let outcome = upsert_reflection(&mut reflections, reflection);
        let raw = serde_json::to_string(&reflections)?;
        self.medium.write(REFLECTIONS_KEY, &raw).await?;
        debug!(week = %week, ?outcome, "reflection saved");
        Ok(outcome)
    }

    /// Return the store to its first-run state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium fails.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.medium
            .remove_all(&[SESSIONS_KEY, REFLECTIONS_KEY, SCHEMA_VERSION_KEY])
            .await?;
        warn!("all study data cleared");
        Ok(())
    }

    async fn read_list<T>(&self, key: &str) -> Result<Vec<T>, StorageError>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.medium.read(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryMedium;
    use crate::seed::StaticSeedSource;
    use study_core::model::{SessionDay, Task, WeekId};
    use study_core::time::fixed_now;

    fn session(id: &str, tasks: usize) -> Session {
        Session::new(
            SessionId::new(id),
            WeekId::new(1),
            SessionDay::Friday,
            "Week",
            format!("Topic {id}"),
            (0..tasks).map(|i| Task::new(format!("task {i}"))).collect(),
        )
        .unwrap()
    }

    fn store_with(medium: &InMemoryMedium, seed: StaticSeedSource) -> VersionedStore {
        VersionedStore::new(Arc::new(medium.clone()), Arc::new(seed))
    }

    #[tokio::test]
    async fn first_init_seeds_from_source_and_tags_version() {
        let medium = InMemoryMedium::new();
        let store = store_with(&medium, StaticSeedSource::new(vec![session("a", 1)]));

        let report = store.init().await.unwrap();
        assert_eq!(report.version, VersionDecision::Reseed);
        assert_eq!(report.seeded, Some(SeedOrigin::Source));
        assert_eq!(
            medium.raw(SCHEMA_VERSION_KEY).unwrap().as_deref(),
            Some(CURRENT_SCHEMA_VERSION)
        );
        assert_eq!(store.get_sessions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_init_is_a_no_op() {
        let medium = InMemoryMedium::new();
        let store = store_with(&medium, StaticSeedSource::new(vec![session("a", 1)]));
        store.init().await.unwrap();
        let before = medium.raw(SESSIONS_KEY).unwrap();

        let report = store.init().await.unwrap();
        assert_eq!(report.version, VersionDecision::Keep);
        assert_eq!(report.seeded, None);
        assert_eq!(medium.raw(SESSIONS_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn offline_seed_falls_back_to_builtin_catalog() {
        let medium = InMemoryMedium::new();
        let store = store_with(&medium, StaticSeedSource::offline());

        let report = store.init().await.unwrap();
        assert_eq!(report.seeded, Some(SeedOrigin::Fallback));
        let sessions = store.get_sessions().await.unwrap();
        assert!(!sessions.is_empty());
        assert!(sessions.iter().all(|s| !s.is_completed()));
    }

    #[tokio::test]
    async fn invalid_seed_catalog_falls_back() {
        let medium = InMemoryMedium::new();
        let store = store_with(
            &medium,
            StaticSeedSource::new(vec![session("dup", 1), session("dup", 2)]),
        );
        let report = store.init().await.unwrap();
        assert_eq!(report.seeded, Some(SeedOrigin::Fallback));
        assert_eq!(store.get_sessions().await.unwrap(), fallback_catalog());
    }

    #[tokio::test]
    async fn get_sessions_without_data_is_empty() {
        let store = store_with(&InMemoryMedium::new(), StaticSeedSource::offline());
        assert!(store.get_sessions().await.unwrap().is_empty());
        assert!(store.get_reflections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_unknown_id_writes_nothing() {
        let medium = InMemoryMedium::new();
        let store = store_with(&medium, StaticSeedSource::new(vec![session("a", 2)]));
        store.init().await.unwrap();
        let before = medium.raw(SESSIONS_KEY).unwrap();

        let found = store
            .update_session(SessionPatch::new(SessionId::new("missing")).with_journal("n", "i", "f"))
            .await
            .unwrap();
        assert!(!found);
        assert_eq!(medium.raw(SESSIONS_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn update_merges_and_rederives() {
        let medium = InMemoryMedium::new();
        let store = store_with(&medium, StaticSeedSource::new(vec![session("a", 2)]));
        store.init().await.unwrap();

        let patch = SessionPatch::new(SessionId::new("a"))
            .with_tasks(vec![Task::done("task 0"), Task::done("task 1")]);
        assert!(store.update_session(patch).await.unwrap());

        let stored = store.find_session(&SessionId::new("a")).await.unwrap().unwrap();
        assert!(stored.is_completed());
        assert_eq!(stored.topic(), "Topic a");
    }

    #[tokio::test]
    async fn version_bump_reseeds_sessions_but_keeps_reflections() {
        let medium = InMemoryMedium::new();
        let old = store_with(&medium, StaticSeedSource::new(vec![session("old", 1)]))
            .with_expected_version("1");
        old.init().await.unwrap();
        let reflection = Reflection::new(WeekId::new(1), fixed_now(), "VPCs", "", "").unwrap();
        old.save_reflection(reflection.clone()).await.unwrap();
        let reflections_before = medium.raw(REFLECTIONS_KEY).unwrap();

        let new = store_with(&medium, StaticSeedSource::new(vec![session("new", 1)]))
            .with_expected_version("2");
        let report = new.init().await.unwrap();

        assert_eq!(report.version, VersionDecision::Reseed);
        let ids: Vec<_> = new
            .get_sessions()
            .await
            .unwrap()
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["new".to_string()]);
        assert_eq!(medium.raw(REFLECTIONS_KEY).unwrap(), reflections_before);
        assert_eq!(new.get_reflections().await.unwrap(), vec![reflection]);
    }

    #[tokio::test]
    async fn clear_all_returns_to_first_run() {
        let medium = InMemoryMedium::new();
        let store = store_with(&medium, StaticSeedSource::new(vec![session("a", 1)]));
        store.init().await.unwrap();
        store
            .save_reflection(Reflection::new(WeekId::new(1), fixed_now(), "x", "", "").unwrap())
            .await
            .unwrap();

        store.clear_all().await.unwrap();
        assert!(medium.raw(SESSIONS_KEY).unwrap().is_none());
        assert!(medium.raw(REFLECTIONS_KEY).unwrap().is_none());
        assert!(medium.raw(SCHEMA_VERSION_KEY).unwrap().is_none());

        let report = store.init().await.unwrap();
        assert_eq!(report.version, VersionDecision::Reseed);
        assert_eq!(report.seeded, Some(SeedOrigin::Source));
    }

    #[tokio::test]
    async fn medium_failures_propagate() {
        let medium = InMemoryMedium::with_limit(64);
        let store = store_with(&medium, StaticSeedSource::new(vec![session("a", 1)]));
        let err = store.init().await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(medium.raw(SESSIONS_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn save_sessions_replaces_collection_and_keeps_it_on_quota_failure() {
        let single = serde_json::to_string(&[session("a", 2)]).unwrap();
        let medium = InMemoryMedium::with_limit(SESSIONS_KEY.len() + single.len() + 16);
        let store = store_with(&medium, StaticSeedSource::offline());

        store.save_sessions(&[session("a", 2)]).await.unwrap();
        let mut modified = store.get_sessions().await.unwrap();
        modified[0].set_task_completed(0, true).unwrap();
        store.save_sessions(&modified).await.unwrap();
        assert_eq!(store.get_sessions().await.unwrap(), modified);
        let before = medium.raw(SESSIONS_KEY).unwrap();

        let too_many = vec![session("a", 2), session("b", 2), session("c", 2)];
        let err = store.save_sessions(&too_many).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(medium.raw(SESSIONS_KEY).unwrap(), before);
        assert_eq!(store.get_sessions().await.unwrap(), modified);
    }

    #[tokio::test]
    async fn corrupt_stored_sessions_surface_as_serialization_errors() {
        let medium = InMemoryMedium::new();
        medium.write(SESSIONS_KEY, "{not json").await.unwrap();
        let store = store_with(&medium, StaticSeedSource::offline());
        let err = store.get_sessions().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
