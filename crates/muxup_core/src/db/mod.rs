//! Database layer for muxup, backed by redb.

/// Asset storage (the [`crate::EntityService`] implementation).
pub mod asset;
/// Mux settings storage.
pub mod settings;
/// Table definitions.
pub mod tables;

pub use asset::AssetDb;
pub use settings::SettingsDb;

use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;
use tables::REDB_FILE_NAME;

/// Database handle with access to the typed table accessors.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub assets: AssetDb,
    pub settings: SettingsDb,
}


impl Database {
    /// Open (or create) the database under `path` and initialize tables.
    ///
    /// `path` is a directory; the redb file lives inside it.
    ///
    /// # Returns
    /// A fully initialized [`Database`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, another process
    /// holds the database, or table initialization fails.
    pub fn new(path: &str) -> Result<Self, AppError> {
        let dir = Path::new(path);
        std::fs::create_dir_all(dir).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create database directory '{}': {}",
                dir.display(),
                err
            ))
        })?;

        let file = dir.join(REDB_FILE_NAME);
        let db = match redb::Database::create(&file) {
            Ok(db) => Arc::new(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "Database '{}' is already open in another process.\n\
                    Stop the other muxup-server instance or set DB_PATH to a different location.",
                    file.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!("Opened database at {}", file.display());

        Self::from_shared(db)
    }

    /// Build a database handle from an already opened redb instance.
    ///
    /// # Errors
    /// Returns an error if table initialization fails.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        Ok(Self {
            assets: AssetDb::new(db.clone())?,
            settings: SettingsDb::new(db.clone())?,
            db,
        })
    }
}
