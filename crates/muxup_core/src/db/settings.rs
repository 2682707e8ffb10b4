//! Mux settings storage backed by redb.

use crate::db::tables::{MUX_SETTINGS_KEY, SETTINGS};
use crate::error::AppError;
use crate::models::settings::MuxSettings;
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for the settings table.
pub struct SettingsDb {
    db: Arc<redb::Database>,
}

impl SettingsDb {
    /// Initialize the settings table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SETTINGS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Stored Mux settings, if any were saved.
    pub fn get(&self) -> Result<Option<MuxSettings>, AppError> {
        let read_txn = self.db.begin_read()?;
        let settings = read_txn.open_table(SETTINGS)?;
        match settings.get(MUX_SETTINGS_KEY)? {
            Some(value) => Ok(Some(bincode::deserialize(value.value())?)),
            None => Ok(None),
        }
    }

    /// Replace the stored Mux settings.
    pub fn put(&self, value: &MuxSettings) -> Result<(), AppError> {
        let encoded = bincode::serialize(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut settings = write_txn.open_table(SETTINGS)?;
            settings.insert(MUX_SETTINGS_KEY, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
