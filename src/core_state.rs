//! Process-wide application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and shared by
//! every request handler. It owns the runtime generator used for the
//! non-reproducible part of a diagnosis, so the engine itself stays free
//! of global randomness.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ServerConfig;
use crate::db;
use crate::diagnosis::{Catalog, DiagnosisEngine};
use crate::storage::{ReportStore, StorageError};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: ServerConfig,
    catalog: &'static Catalog,
    /// Runtime jitter source. Locked for the duration of one engine call.
    runtime_rng: Mutex<StdRng>,
    db_path: PathBuf,
    store: ReportStore,
}

impl CoreState {
    /// Prepare data directories, migrate the database and open the
    /// artifact store.
    pub fn open(config: ServerConfig) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.data_dir).map_err(StorageError::from)?;

        let db_path = config.database_path();
        // Opening once runs pending migrations before any request arrives.
        let conn = db::open_database(&db_path)?;
        let version = db::get_current_version(&conn);
        drop(conn);

        let store = ReportStore::open(&config.storage_dir())?;

        let catalog = Catalog::builtin();
        if let Err(e) = catalog.validate() {
            tracing::warn!(catalog_version = catalog.version(), "Disease catalog inconsistent: {e}");
        }

        tracing::info!(
            data_dir = %config.data_dir.display(),
            schema_version = version,
            rules = catalog.len(),
            "Core state ready"
        );

        Ok(Self {
            config,
            catalog,
            runtime_rng: Mutex::new(StdRng::from_entropy()),
            db_path,
            store,
        })
    }

    /// Replace the runtime generator with a seeded one.
    pub fn with_runtime_seed(self, seed: u64) -> Self {
        Self {
            runtime_rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn engine(&self) -> DiagnosisEngine<'static> {
        DiagnosisEngine::new(self.catalog)
    }

    /// Run `f` with exclusive access to the runtime generator.
    pub fn with_runtime_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, CoreError> {
        let mut rng = self
            .runtime_rng
            .lock()
            .map_err(|_| CoreError::LockPoisoned)?;
        Ok(f(&mut *rng))
    }

    /// Open a fresh database connection. One per request.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
