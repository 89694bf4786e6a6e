//! Startup wiring: turn a validated [`ConnectifyConfig`] into a [`Directory`].

use std::sync::Arc;

use checkin_core::scheduler::{JitterSource, SeededJitter, ThreadJitter};
use tracing::info;

use crate::config::{ConnectifyConfig, StoreBackend};
use crate::directory::Directory;
use crate::error::{ConnectifyError, Result};
use crate::store::{MemoryStore, RelationshipStore, SqliteStore};

/// Open the configured store backend.
///
/// # Errors
///
/// Returns [`ConnectifyError::Store`] if the SQLite database cannot be
/// opened or its schema applied.
pub fn open_store(config: &ConnectifyConfig) -> Result<Arc<dyn RelationshipStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!(table = %config.store.table, "using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            let path = config.store.database_path();
            let store = SqliteStore::open(&path).map_err(|e| {
                ConnectifyError::Store(format!("cannot open {}: {e}", path.display()))
            })?;
            info!(path = %path.display(), "opened sqlite store");
            Ok(Arc::new(store))
        }
    }
}

/// Jitter source for the configured seed: seeded when set, thread RNG otherwise.
pub fn jitter_source(config: &ConnectifyConfig) -> Arc<dyn JitterSource> {
    match config.scheduling.jitter_seed {
        Some(seed) => {
            info!(seed, "using seeded check-in jitter");
            Arc::new(SeededJitter::new(seed))
        }
        None => Arc::new(ThreadJitter),
    }
}

/// Validate `config`, open its store and assemble a directory.
///
/// # Errors
///
/// Returns [`ConnectifyError::Config`] for an invalid configuration or
/// [`ConnectifyError::Store`] if the store cannot be opened.
pub fn build_directory(config: &ConnectifyConfig) -> Result<Directory> {
    config.validate()?;
    let store = open_store(config)?;
    Ok(Directory::new(store).with_jitter(jitter_source(config)))
}
