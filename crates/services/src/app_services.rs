use std::sync::Arc;

use storage::repository::Storage;
use storage::seed::SeedSource;
use storage::store::{InitReport, VersionedStore};

use crate::Clock;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::reflection_service::ReflectionService;
use crate::session_service::SessionService;

/// Assembles app-facing services over one initialised store.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<VersionedStore>,
    init_report: InitReport,
    sessions: Arc<SessionService>,
    reflections: Arc<ReflectionService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, running store init first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        seed: Arc<dyn SeedSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock, seed).await
    }

    /// Build services over an already-open `Storage`, running store init first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the store cannot be initialised.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        seed: Arc<dyn SeedSource>,
    ) -> Result<Self, AppServicesError> {
        let store = Arc::new(VersionedStore::new(storage.medium, seed));
        let init_report = store.init().await?;

        Ok(Self {
            sessions: Arc::new(SessionService::new(Arc::clone(&store))),
            reflections: Arc::new(ReflectionService::new(clock, Arc::clone(&store))),
            dashboard: Arc::new(DashboardService::new(Arc::clone(&store))),
            store,
            init_report,
        })
    }

    #[must_use]
    pub fn store(&self) -> Arc<VersionedStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn init_report(&self) -> InitReport {
        self.init_report
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn reflections(&self) -> Arc<ReflectionService> {
        Arc::clone(&self.reflections)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}
