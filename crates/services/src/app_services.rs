use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::entry_service::EntryService;
use crate::error::ServicesInitError;
use crate::progress_service::ProgressService;

/// Assembles the read and write facades over one storage backend.
#[derive(Clone)]
pub struct HifzServices {
    progress: Arc<ProgressService>,
    entries: Arc<EntryService>,
}

impl HifzServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `ServicesInitError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, ServicesInitError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.students),
        ));
        let entries = Arc::new(EntryService::new(
            clock,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.students),
        ));
        Self { progress, entries }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn entries(&self) -> Arc<EntryService> {
        Arc::clone(&self.entries)
    }
}
