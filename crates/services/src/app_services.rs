use std::sync::Arc;

use prep_core::QuestionCatalog;
use prep_core::model::TutorSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_store::ProgressStore;
use crate::tutor_service::TutorService;

/// Everything the front-end needs, wired together.
pub struct AppServices {
    catalog: Arc<QuestionCatalog>,
    progress: ProgressStore,
    tutor: Arc<TutorService>,
    clock: Clock,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// embedded catalog is invalid.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        tutor_settings: TutorSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(storage, clock, tutor_settings).await
    }

    /// Build services over an already constructed storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Catalog` if the embedded catalog is invalid.
    pub async fn with_storage(
        storage: Storage,
        clock: Clock,
        tutor_settings: TutorSettings,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(QuestionCatalog::builtin()?);
        let progress =
            ProgressStore::initialize(clock, Arc::clone(&storage.progress), catalog.len()).await;
        let tutor = Arc::new(TutorService::new(tutor_settings));

        Ok(Self {
            catalog,
            progress,
            tutor,
            clock,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<QuestionCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressStore {
        &mut self.progress
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorService> {
        Arc::clone(&self.tutor)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }
}
